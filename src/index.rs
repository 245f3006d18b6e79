use std::collections::{BTreeMap, BTreeSet};

use log::info;

use crate::{error::IndexError, hash::sha256_hex, record::CanonicalRecord};

/// Why an extractor could not read a payload of its type.
pub type ExtractError = Box<dyn std::error::Error + Send + Sync>;

/// Pulls `(algorithm, digest)` pairs out of a payload of one known type.
pub type DigestExtractor = fn(&[u8]) -> Result<Vec<(String, String)>, ExtractError>;

/// Payload types that get deep-indexed, and how.
///
/// Types with no extractor are indexed by payload hash and key hashes only.
#[derive(Debug, Clone)]
pub struct DigestExtractors {
    by_type: BTreeMap<String, DigestExtractor>,
}

impl DigestExtractors {
    /// No deep indexing for any payload type.
    pub fn empty() -> Self {
        Self {
            by_type: BTreeMap::new(),
        }
    }

    /// The built-in extractors (in-toto statements).
    pub fn with_defaults() -> Self {
        #[allow(unused_mut)]
        let mut extractors = Self::empty();

        #[cfg(feature = "intoto-attestation")]
        extractors.register(crate::dsse::INTOTO_PAYLOAD_TYPE, intoto_subject_digests);

        extractors
    }

    /// Adds or replaces the extractor for `payload_type`, returning the previous one.
    pub fn register(
        &mut self,
        payload_type: impl Into<String>,
        extractor: DigestExtractor,
    ) -> Option<DigestExtractor> {
        self.by_type.insert(payload_type.into(), extractor)
    }

    pub fn get(&self, payload_type: &str) -> Option<DigestExtractor> {
        self.by_type.get(payload_type).copied()
    }
}

impl Default for DigestExtractors {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(feature = "intoto-attestation")]
fn intoto_subject_digests(payload: &[u8]) -> Result<Vec<(String, String)>, ExtractError> {
    use crate::intoto_attestation::{parse_statement, subject_digests};

    let statement = parse_statement(payload)?;
    Ok(subject_digests(&statement))
}

/// Search keys for a verified entry.
///
/// Always includes the SHA-256 of the raw payload, the record's payload hash, and
/// the SHA-256 of every signature's canonical public key. Payload types with a
/// registered extractor add one `"<alg>:<digest>"` key per declared digest; a payload
/// that fails to parse as its declared type is an error.
pub fn derive_index_keys(
    record: &CanonicalRecord,
    payload: &[u8],
    extractors: &DigestExtractors,
) -> Result<BTreeSet<String>, IndexError> {
    let mut keys = BTreeSet::new();

    keys.insert(format!("sha256:{}", sha256_hex(payload)));
    keys.insert(record.payload_hash.to_index_key());

    for signature in &record.signatures {
        keys.insert(format!("sha256:{}", sha256_hex(&signature.public_key)));
    }

    match extractors.get(&record.payload_type) {
        Some(extract) => {
            let digests =
                extract(payload).map_err(|source| IndexError::MalformedStatement {
                    payload_type: record.payload_type.clone(),
                    source,
                })?;

            for (alg, digest) in digests {
                keys.insert(format!("{alg}:{digest}"));
            }
        }
        None => info!("Cannot index payload of type: {}", record.payload_type),
    }

    Ok(keys)
}
