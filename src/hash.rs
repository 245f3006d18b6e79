use sha2::{Digest, Sha256};

use crate::{dsse::pae, models};

/// Hash algorithms a DSSE v0.0.1 payload hash may use.
#[derive(Clone, Copy, PartialEq, Eq, Debug, strum::EnumString, strum::Display)]
pub enum HashAlgorithm {
    #[strum(serialize = "sha256")]
    Sha256,
}

/// Digest over the PAE encoding of a payload, bound to its payload type.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PayloadDigest {
    pub algorithm: HashAlgorithm,
    /// Lowercase hex digest
    pub value: String,
}

impl PayloadDigest {
    /// `"<algorithm>:<value>"`, the form used for index keys.
    pub fn to_index_key(&self) -> String {
        format!("{}:{}", self.algorithm, self.value)
    }
}

/// Hashes `(payload_type, payload)` for the log.
///
/// The PAE framing is always applied first, so two payload types never share a digest
/// for the same payload bytes.
pub fn hash_payload(payload_type: &str, payload: &[u8]) -> PayloadDigest {
    let encoded = pae(payload_type, payload);

    PayloadDigest {
        algorithm: HashAlgorithm::Sha256,
        value: sha256_hex(&encoded),
    }
}

/// Lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

impl From<PayloadDigest> for models::PayloadHash {
    fn from(digest: PayloadDigest) -> Self {
        let PayloadDigest { algorithm, value } = digest;

        Self {
            algorithm: algorithm.to_string(),
            value,
        }
    }
}
