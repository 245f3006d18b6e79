use base64::engine::{general_purpose::STANDARD as BASE64, Engine};

use crate::{
    dsse::Signature,
    error::{Error, VerificationError},
    hash::PayloadDigest,
    matcher::VerifiedBinding,
    models::{self, dsse_v001::KIND, DsseV001Schema, ProposedEntry, SignatureItem},
};

/// Schema version of the records built here.
pub const API_VERSION: &str = "0.0.1";

/// The payload-free record committed to the log for a verified DSSE envelope.
///
/// Only the PAE hash of the payload is kept. Signatures stay in envelope order and each
/// carries the canonical encoding of the key that verified it.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRecord {
    pub payload_type: String,
    pub payload_hash: PayloadDigest,
    pub signatures: Vec<RecordSignature>,
}

/// One verified signature in a [`CanonicalRecord`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSignature {
    pub keyid: Option<String>,
    pub sig: Vec<u8>,
    /// Canonical (PEM SubjectPublicKeyInfo) bytes of the verifying key
    pub public_key: Vec<u8>,
}

impl CanonicalRecord {
    /// Assembles the record from a verified binding.
    ///
    /// `signatures` are the envelope's signatures in submission order; each must be
    /// present in `binding`.
    pub fn build(
        payload_type: &str,
        payload_hash: PayloadDigest,
        signatures: &[Signature],
        binding: &VerifiedBinding,
    ) -> Result<Self, Error> {
        let signatures = signatures
            .iter()
            .enumerate()
            .map(|(index, signature)| -> Result<RecordSignature, Error> {
                let candidate = binding.key_for(&signature.sig).ok_or_else(|| {
                    VerificationError::UnmatchedSignature {
                        index,
                        keyid: signature.keyid.clone(),
                    }
                })?;

                Ok(RecordSignature {
                    keyid: signature.keyid.clone(),
                    sig: signature.sig.clone(),
                    public_key: candidate.key.canonical_value()?,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(Self {
            payload_type: payload_type.to_owned(),
            payload_hash,
            signatures,
        })
    }

    pub fn api_version(&self) -> &'static str {
        API_VERSION
    }

    /// The record as a DSSE v0.0.1 spec, with `payload` attached only when given.
    pub fn to_schema(&self, payload: Option<&[u8]>) -> DsseV001Schema {
        let signatures = self
            .signatures
            .iter()
            .map(|s| SignatureItem {
                keyid: s.keyid.clone(),
                sig: Some(BASE64.encode(&s.sig)),
                public_key: Some(BASE64.encode(&s.public_key)),
            })
            .collect();

        DsseV001Schema {
            payload: payload.map(|p| BASE64.encode(p)),
            payload_hash: Some(models::PayloadHash::from(self.payload_hash.clone())),
            payload_type: Some(self.payload_type.clone()),
            signatures: Some(signatures),
        }
    }

    /// Wraps the record as a proposal, e.g. for resubmission through ingestion.
    pub fn to_proposed_entry(&self, payload: Option<&[u8]>) -> Result<ProposedEntry, Error> {
        let spec = serde_json::to_value(self.to_schema(payload)).map_err(Error::Encoding)?;

        Ok(ProposedEntry {
            kind: KIND.to_owned(),
            api_version: API_VERSION.to_owned(),
            spec,
        })
    }

    /// RFC 8785 (JCS) bytes of the payload-free entry.
    ///
    /// Same record, same bytes: these are what the log hashes and persists.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, Error> {
        let entry = self.to_proposed_entry(None)?;
        serde_jcs::to_vec(&entry).map_err(Error::Encoding)
    }
}
