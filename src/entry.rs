use std::{collections::BTreeSet, fmt};

use log::{debug, info};

use crate::{
    artifact::ArtifactProperties,
    config::Config,
    dsse::{decode_base64, Envelope, PayloadType, Signature},
    error::{Error, SchemaError, VerificationError},
    hash::hash_payload,
    index::{derive_index_keys, DigestExtractors},
    matcher::match_keys,
    models::{dsse_v001::KIND, DsseV001Schema, ProposedEntry},
    record::{CanonicalRecord, API_VERSION},
};

/// What the log needs from a verified entry of any schema version.
pub trait EntryImpl: fmt::Debug + Send + Sync {
    /// Schema version of the entry.
    fn api_version(&self) -> &'static str;

    /// Bytes persisted and hashed by the log. Never contains the payload.
    fn canonicalize(&self) -> Result<Vec<u8>, Error>;

    /// Search keys for the entry.
    fn index_keys(&self) -> Result<BTreeSet<String>, Error>;

    /// The raw payload, if it is small enough to be stored next to the entry.
    fn attestation(&self) -> Option<&[u8]>;
}

/// A verified DSSE v0.0.1 entry.
///
/// Only constructed once every signature has been matched to a key, so holding one
/// means the canonical record is ready to commit.
#[derive(Debug, Clone)]
pub struct DsseV001Entry {
    record: CanonicalRecord,
    payload: Vec<u8>,
    max_attestation_size: usize,
}

impl DsseV001Entry {
    /// Ingests a proposed entry.
    ///
    /// Validates the proposal's fields, rebuilds the envelope and the candidate keys
    /// from the public keys recorded with each signature, and verifies it. Each
    /// signature must be verified by the key recorded next to it, and a supplied
    /// `payloadHash` must match the one computed here.
    pub fn unmarshal(proposed: &ProposedEntry, config: &Config) -> Result<Self, Error> {
        if proposed.kind != KIND {
            return Err(SchemaError::WrongKind(proposed.kind.clone()).into());
        }
        if proposed.api_version != API_VERSION {
            return Err(SchemaError::UnsupportedVersion(proposed.api_version.clone()).into());
        }

        let schema = DsseV001Schema::from_value(proposed.spec.clone())?;
        schema.validate()?;

        let DsseV001Schema {
            payload,
            payload_hash,
            payload_type,
            signatures,
        } = schema;
        let payload = payload.ok_or_else(|| SchemaError::MissingField("payload".to_owned()))?;
        let payload_type =
            payload_type.ok_or_else(|| SchemaError::MissingField("payloadType".to_owned()))?;
        let items = signatures.ok_or_else(|| SchemaError::MissingField("signatures".to_owned()))?;

        let payload = decode_base64("payload", &payload)?;

        let mut envelope_signatures = Vec::with_capacity(items.len());
        let mut public_keys = Vec::with_capacity(items.len());
        for (i, item) in items.into_iter().enumerate() {
            let sig = item
                .sig
                .ok_or_else(|| SchemaError::MissingField(format!("signatures.{i}.sig")))?;
            let public_key = item
                .public_key
                .ok_or_else(|| SchemaError::MissingField(format!("signatures.{i}.publicKey")))?;

            envelope_signatures.push(Signature {
                keyid: item.keyid,
                sig: decode_base64("sig", &sig)?,
            });
            public_keys.push(decode_base64("publicKey", &public_key)?);
        }

        let envelope = Envelope {
            payload_type: PayloadType::from(payload_type.as_str()),
            payload,
            signatures: envelope_signatures,
        };

        let binding = match_keys(&public_keys, &envelope)?;

        for (index, signature) in envelope.signatures.iter().enumerate() {
            let bound = binding.key_for(&signature.sig);
            let recorded = &binding.candidates()[index];
            if bound.map(|c| &c.key) != Some(&recorded.key) {
                return Err(VerificationError::KeyMismatch { index }.into());
            }
        }

        let digest = hash_payload(&payload_type, &envelope.payload);
        if let Some(supplied) = payload_hash.filter(|h| !h.value.is_empty()) {
            if !supplied.value.eq_ignore_ascii_case(&digest.value) {
                return Err(VerificationError::PayloadHashMismatch {
                    expected: supplied.value,
                    computed: digest.value,
                }
                .into());
            }
        }

        let record =
            CanonicalRecord::build(&payload_type, digest, &envelope.signatures, &binding)?;

        debug!(
            "verified dsse entry of type '{}' with {} signature(s)",
            record.payload_type,
            record.signatures.len()
        );

        Ok(Self {
            record,
            payload: envelope.payload,
            max_attestation_size: config.max_attestation_size,
        })
    }

    /// Builds a proposal from a raw DSSE envelope and candidate public keys.
    ///
    /// Every signature in the envelope must be verified by one of the keys. The
    /// returned proposal carries the payload and can be passed to
    /// [`DsseV001Entry::unmarshal`].
    pub fn create_from_artifact_properties(
        props: &ArtifactProperties,
    ) -> Result<ProposedEntry, Error> {
        let gathered = props.gather()?;

        let envelope = Envelope::try_from_json_slice(&gathered.envelope)?;

        let binding = match_keys(&gathered.public_keys, &envelope)?;

        let payload_type = envelope.payload_type.to_string();
        let digest = hash_payload(&payload_type, &envelope.payload);

        let record =
            CanonicalRecord::build(&payload_type, digest, &envelope.signatures, &binding)?;

        record.to_proposed_entry(Some(envelope.payload.as_slice()))
    }

    /// The canonical record of this entry.
    pub fn record(&self) -> &CanonicalRecord {
        &self.record
    }

    /// The verified payload.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Index keys using a caller-provided set of deep-indexing extractors.
    pub fn index_keys_with(
        &self,
        extractors: &DigestExtractors,
    ) -> Result<BTreeSet<String>, Error> {
        Ok(derive_index_keys(&self.record, &self.payload, extractors)?)
    }
}

impl EntryImpl for DsseV001Entry {
    fn api_version(&self) -> &'static str {
        self.record.api_version()
    }

    fn canonicalize(&self) -> Result<Vec<u8>, Error> {
        self.record.canonical_bytes()
    }

    fn index_keys(&self) -> Result<BTreeSet<String>, Error> {
        self.index_keys_with(&DigestExtractors::default())
    }

    fn attestation(&self) -> Option<&[u8]> {
        if self.payload.len() > self.max_attestation_size {
            info!(
                "Skipping attestation storage, size {} is greater than max {}",
                self.payload.len(),
                self.max_attestation_size
            );
            return None;
        }

        Some(&self.payload)
    }
}

#[cfg(all(test, feature = "key-p256", feature = "key-ed25519"))]
mod tests {
    use base64::engine::{general_purpose::STANDARD as BASE64, Engine};
    use serde_json::json;

    use super::*;
    use crate::{dsse::pae, hash::sha256_hex, pki::test_keys::*};

    fn envelope_json(payload_type: &str, payload: &[u8], sigs: &[Vec<u8>]) -> Vec<u8> {
        let signatures: Vec<_> = sigs
            .iter()
            .map(|sig| json!({ "sig": BASE64.encode(sig) }))
            .collect();

        serde_json::to_vec(&json!({
            "payloadType": payload_type,
            "payload": BASE64.encode(payload),
            "signatures": signatures,
        }))
        .unwrap()
    }

    fn proposal(payload: &[u8], items: serde_json::Value) -> ProposedEntry {
        ProposedEntry {
            kind: "dsse".to_owned(),
            api_version: "0.0.1".to_owned(),
            spec: json!({
                "payload": BASE64.encode(payload),
                "payloadType": "text",
                "signatures": items,
            }),
        }
    }

    #[test]
    fn proposal_round_trip_through_artifact_path() {
        let _ = env_logger::builder().is_test(true).try_init();

        let sig = p256_sign_der(1, &pae("text", b"hello"));
        let props = ArtifactProperties {
            artifact_bytes: Some(envelope_json("text", b"hello", &[sig])),
            public_keys_bytes: vec![p256_public_pem(1)],
            ..Default::default()
        };

        let proposed = DsseV001Entry::create_from_artifact_properties(&props).unwrap();
        let entry = DsseV001Entry::unmarshal(&proposed, &Config::default()).unwrap();

        assert_eq!(entry.api_version(), "0.0.1");
        assert_eq!(entry.payload(), b"hello");
        assert_eq!(
            entry.record().payload_hash.value,
            sha256_hex(b"DSSEv1 4 text 5 hello")
        );
    }

    #[test]
    fn proposal_with_wrong_kind_or_version_is_rejected() {
        let mut proposed = proposal(b"hello", json!([]));
        proposed.kind = "rekord".to_owned();
        assert!(matches!(
            DsseV001Entry::unmarshal(&proposed, &Config::default()),
            Err(Error::Schema(SchemaError::WrongKind(_)))
        ));

        let mut proposed = proposal(b"hello", json!([]));
        proposed.api_version = "0.0.2".to_owned();
        assert!(matches!(
            DsseV001Entry::unmarshal(&proposed, &Config::default()),
            Err(Error::Schema(SchemaError::UnsupportedVersion(_)))
        ));
    }

    #[test]
    fn schema_errors_come_before_cryptography() {
        let proposed = proposal(b"hello", json!([]));

        assert!(matches!(
            DsseV001Entry::unmarshal(&proposed, &Config::default()),
            Err(Error::Schema(SchemaError::TooFewSignatures { .. }))
        ));
    }

    #[test]
    fn proposal_signature_without_public_key_is_rejected() {
        let sig = p256_sign_der(1, &pae("text", b"hello"));
        let proposed = proposal(b"hello", json!([{ "sig": BASE64.encode(sig) }]));

        match DsseV001Entry::unmarshal(&proposed, &Config::default()) {
            Err(Error::Schema(SchemaError::MissingField(field))) => {
                assert_eq!(field, "signatures.0.publicKey")
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn proposal_must_pair_each_signature_with_its_own_key() {
        let message = pae("text", b"hello");
        let proposed = proposal(
            b"hello",
            json!([
                {
                    "sig": BASE64.encode(p256_sign_der(1, &message)),
                    "publicKey": BASE64.encode(p256_public_pem(2)),
                },
                {
                    "sig": BASE64.encode(p256_sign_der(2, &message)),
                    "publicKey": BASE64.encode(p256_public_pem(1)),
                },
            ]),
        );

        assert!(matches!(
            DsseV001Entry::unmarshal(&proposed, &Config::default()),
            Err(Error::Verification(VerificationError::KeyMismatch { index: 0 }))
        ));
    }

    #[test]
    fn proposal_payload_hash_must_match() {
        let sig = p256_sign_der(1, &pae("text", b"hello"));
        let mut proposed = proposal(
            b"hello",
            json!([{ "sig": BASE64.encode(sig), "publicKey": BASE64.encode(p256_public_pem(1)) }]),
        );
        proposed.spec["payloadHash"] =
            json!({ "algorithm": "sha256", "value": sha256_hex(b"hello") });

        assert!(matches!(
            DsseV001Entry::unmarshal(&proposed, &Config::default()),
            Err(Error::Verification(VerificationError::PayloadHashMismatch { .. }))
        ));

        proposed.spec["payloadHash"]["value"] = json!(sha256_hex(b"DSSEv1 4 text 5 hello"));
        DsseV001Entry::unmarshal(&proposed, &Config::default()).unwrap();
    }

    #[test]
    fn attestation_respects_the_cap() {
        let sig = ed25519_sign(4, &pae("text", b"hello"));
        let proposed = proposal(
            b"hello",
            json!([{
                "sig": BASE64.encode(sig),
                "publicKey": BASE64.encode(ed25519_public_pem(4)),
            }]),
        );

        let at_cap = DsseV001Entry::unmarshal(
            &proposed,
            &Config {
                max_attestation_size: 5,
            },
        )
        .unwrap();
        assert_eq!(at_cap.attestation(), Some(b"hello".as_slice()));

        let below_cap = DsseV001Entry::unmarshal(
            &proposed,
            &Config {
                max_attestation_size: 4,
            },
        )
        .unwrap();
        assert_eq!(below_cap.attestation(), None);
    }

    #[test]
    fn artifact_with_unparsable_envelope_is_rejected() {
        let props = ArtifactProperties {
            artifact_bytes: Some(b"not json".to_vec()),
            public_keys_bytes: vec![p256_public_pem(1)],
            ..Default::default()
        };

        assert!(matches!(
            DsseV001Entry::create_from_artifact_properties(&props),
            Err(Error::Input(crate::error::InputError::InvalidEnvelope(_)))
        ));
    }
}
