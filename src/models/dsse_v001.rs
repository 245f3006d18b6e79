use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{error::SchemaError, hash::HashAlgorithm};

/// Entry kind carried by every DSSE proposal.
pub const KIND: &str = "dsse";

/// Minimum number of signatures a DSSE v0.0.1 entry must carry.
pub const MIN_SIGNATURES: usize = 1;

/// A proposed log entry before its version-specific spec has been decoded.
///
/// `spec` stays untyped so the registry can pick a constructor by `api_version`
/// before anything else is parsed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProposedEntry {
    pub kind: String,
    pub api_version: String,
    pub spec: Value,
}

impl ProposedEntry {
    /// Parses a proposal from its JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SchemaError> {
        serde_json::from_slice(bytes).map_err(SchemaError::Malformed)
    }

    /// Serializes the proposal to JSON bytes.
    pub fn to_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// The `spec` of a DSSE v0.0.1 entry.
///
/// Every field is optional at the serde level so that a missing field surfaces as a
/// [`SchemaError::MissingField`] from [`DsseV001Schema::validate`] instead of an
/// opaque decode error.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DsseV001Schema {
    /// Base64 payload. Present in proposals, never in the canonical form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_hash: Option<PayloadHash>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signatures: Option<Vec<SignatureItem>>,
}

/// Hash of the PAE-encoded payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PayloadHash {
    #[serde(default)]
    pub algorithm: String,
    #[serde(default)]
    pub value: String,
}

/// One signature in a DSSE v0.0.1 entry, with the public key that verified it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SignatureItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyid: Option<String>,
    /// Base64 signature bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sig: Option<String>,
    /// Base64 of the public key's canonical (PEM) encoding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

impl DsseV001Schema {
    /// Decodes the typed spec out of an untyped proposal spec.
    pub fn from_value(spec: Value) -> Result<Self, SchemaError> {
        serde_json::from_value(spec).map_err(SchemaError::Malformed)
    }

    /// Field validation of a proposal.
    ///
    /// `payload`, `payloadType` and at least one signature are required. A
    /// `payloadHash.algorithm`, when set, must name a supported algorithm.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.payload.is_none() {
            return Err(SchemaError::MissingField("payload".to_owned()));
        }

        if let Some(payload_hash) = &self.payload_hash {
            if !payload_hash.algorithm.is_empty() {
                payload_hash
                    .algorithm
                    .parse::<HashAlgorithm>()
                    .map_err(|_| {
                        SchemaError::UnsupportedHashAlgorithm(payload_hash.algorithm.clone())
                    })?;
            }
        }

        if self.payload_type.is_none() {
            return Err(SchemaError::MissingField("payloadType".to_owned()));
        }

        let signatures = self
            .signatures
            .as_ref()
            .ok_or_else(|| SchemaError::MissingField("signatures".to_owned()))?;

        if signatures.len() < MIN_SIGNATURES {
            return Err(SchemaError::TooFewSignatures {
                min: MIN_SIGNATURES,
                found: signatures.len(),
            });
        }

        Ok(())
    }
}
