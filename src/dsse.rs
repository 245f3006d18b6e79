use std::{convert::TryFrom, fmt, str::FromStr};

use base64::engine::{
    general_purpose::{STANDARD as BASE64, URL_SAFE},
    Engine,
};

use crate::{error::InputError, models};

/// Media type of in-toto statements carried in DSSE payloads.
pub const INTOTO_PAYLOAD_TYPE: &str = "application/vnd.in-toto+json";

/// Dead Simple Signing Envelope (DSSE) as submitted to the log.
///
/// A payload, the media type it claims, and one or more detached signatures over
/// the PAE encoding of the two.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// The type/format of the payload being signed
    pub payload_type: PayloadType,
    /// The raw payload data in bytes
    pub payload: Vec<u8>,
    /// Signatures in submission order
    pub signatures: Vec<Signature>,
}

impl Envelope {
    /// Parses an envelope from its JSON representation.
    ///
    /// # Arguments
    /// * `bytes` - JSON bytes of the envelope
    ///
    /// # Returns
    /// * `Result<Self, InputError>` - Parsed envelope, or error if the JSON or its base64
    ///   fields are invalid
    pub fn try_from_json_slice(bytes: &[u8]) -> Result<Self, InputError> {
        let envelope: models::dsse::Envelope =
            serde_json::from_slice(bytes).map_err(InputError::InvalidEnvelope)?;
        Self::try_from(envelope)
    }

    /// Converts the envelope into a JSON string representation.
    pub fn into_json_string(self) -> Result<String, serde_json::Error> {
        let envelope = models::dsse::Envelope::from(self);
        serde_json::to_string(&envelope)
    }

    /// The PAE bytes every signature in this envelope is computed over.
    pub fn pae(&self) -> Vec<u8> {
        pae(&self.payload_type.to_string(), &self.payload)
    }
}

/// Pre-authentication encoding of `(payload_type, payload)`.
///
/// ```text
/// PAE(type, payload) = "DSSEv1" SP LEN(type) SP type SP LEN(payload) SP payload
/// ```
///
/// Lengths are ASCII decimal byte counts.
pub fn pae(payload_type: &str, payload: &[u8]) -> Vec<u8> {
    let type_len = payload_type.len().to_string();
    let payload_len = payload.len().to_string();

    let mut encoded = Vec::with_capacity(
        16 + type_len.len() + payload_type.len() + payload_len.len() + payload.len(),
    );
    encoded.extend_from_slice(b"DSSEv1 ");
    encoded.extend_from_slice(type_len.as_bytes());
    encoded.push(b' ');
    encoded.extend_from_slice(payload_type.as_bytes());
    encoded.push(b' ');
    encoded.extend_from_slice(payload_len.as_bytes());
    encoded.push(b' ');
    encoded.extend_from_slice(payload);
    encoded
}

/// Payload types the log knows something about.
///
/// Only the in-toto type is given structure (it gets deep-indexed); everything else
/// is carried through as an opaque string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadType {
    /// in-toto attestation in JSON format
    InTotoJson,
    /// Any other payload type
    Other(String),
}

impl fmt::Display for PayloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadType::InTotoJson => write!(f, "{}", INTOTO_PAYLOAD_TYPE),
            PayloadType::Other(s) => write!(f, "{}", s),
        }
    }
}

impl FromStr for PayloadType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            INTOTO_PAYLOAD_TYPE => Ok(PayloadType::InTotoJson),
            _ => Ok(PayloadType::Other(s.to_owned())),
        }
    }
}

impl From<&str> for PayloadType {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(payload_type) => payload_type,
            Err(never) => match never {},
        }
    }
}

/// Digital signature within a DSSE envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Optional, unauthenticated hint naming the signing key
    pub keyid: Option<String>,
    /// The actual signature bytes
    pub sig: Vec<u8>,
}

pub(crate) fn decode_base64(field: &str, value: &str) -> Result<Vec<u8>, InputError> {
    BASE64
        .decode(value)
        .map_err(|source| InputError::InvalidBase64 {
            field: field.to_owned(),
            source,
        })
}

impl TryFrom<models::dsse::Envelope> for Envelope {
    type Error = InputError;

    fn try_from(envelope: models::dsse::Envelope) -> Result<Self, InputError> {
        let models::dsse::Envelope {
            payload_type,
            payload,
            signatures,
        } = envelope;

        let payload_type = PayloadType::from(payload_type.as_str());

        let payload = decode_base64("payload", &payload)?;

        let signatures = signatures
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            payload_type,
            payload,
            signatures,
        })
    }
}

impl From<Envelope> for models::dsse::Envelope {
    fn from(envelope: Envelope) -> Self {
        let Envelope {
            payload_type,
            payload,
            signatures,
        } = envelope;

        let payload_type = payload_type.to_string();
        let payload = BASE64.encode(payload);
        let signatures = signatures.into_iter().map(Into::into).collect();

        Self {
            payload_type,
            payload,
            signatures,
        }
    }
}

/// Envelope signatures are standard base64, but URL-safe encodings are accepted too.
fn decode_signature(value: &str) -> Result<Vec<u8>, InputError> {
    decode_base64("sig", value).or_else(|err| URL_SAFE.decode(value).map_err(|_| err))
}

impl TryFrom<models::dsse::Signature> for Signature {
    type Error = InputError;

    fn try_from(signature: models::dsse::Signature) -> Result<Self, InputError> {
        let models::dsse::Signature { keyid, sig } = signature;

        let sig = decode_signature(&sig)?;

        Ok(Self { keyid, sig })
    }
}

impl From<Signature> for models::dsse::Signature {
    fn from(signature: Signature) -> Self {
        let Signature { keyid, sig } = signature;

        let sig = BASE64.encode(sig);

        Self { keyid, sig }
    }
}
