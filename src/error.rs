use std::{io, path::PathBuf};

use thiserror::Error;

/// Result alias used across the entry pipeline.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every way admitting a DSSE entry can fail.
///
/// Each variant wraps one class of failure so the ingestion service can tell a
/// bad submission apart from a fault on our side (see [`Error::is_client_fault`]).
/// Nothing in this crate retries; every error is terminal for the call that produced it.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error(transparent)]
    Index(#[from] IndexError),

    /// Serializing a record we built ourselves failed.
    #[error("could not encode canonical entry: {0}")]
    Encoding(#[source] serde_json::Error),

    /// Re-encoding a public key that already parsed failed.
    #[error("could not encode public key: {0}")]
    KeyEncoding(#[source] pkcs8::spki::Error),
}

impl Error {
    /// True when the failure was caused by what the client submitted rather than by
    /// this service.
    pub fn is_client_fault(&self) -> bool {
        !matches!(self, Error::Encoding(_) | Error::KeyEncoding(_))
    }
}

/// Field-level validation of a proposed entry. Raised before any cryptography runs.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("missing required field '{0}'")]
    MissingField(String),

    #[error("unsupported payload hash algorithm '{0}'")]
    UnsupportedHashAlgorithm(String),

    #[error("at least {min} signature(s) required, found {found}")]
    TooFewSignatures { min: usize, found: usize },

    #[error("cannot unmarshal entry of kind '{0}' as dsse")]
    WrongKind(String),

    #[error("unsupported dsse api version '{0}'")]
    UnsupportedVersion(String),

    #[error("version '{0}' is already registered")]
    DuplicateVersion(String),

    #[error("malformed entry: {0}")]
    Malformed(#[source] serde_json::Error),
}

/// Problems with what the caller handed us: references, files, keys, envelopes.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("'{0}' is a remote reference; dsse artifacts and keys can only be read from local files")]
    RemoteReference(String),

    #[error("either artifact bytes or a path to the artifact file must be specified")]
    MissingArtifact,

    #[error("could not read '{}': {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not parse public key: {0}")]
    InvalidPublicKey(String),

    #[error("payload must be a valid dsse envelope: {0}")]
    InvalidEnvelope(#[source] serde_json::Error),

    #[error("could not decode base64 field '{field}': {source}")]
    InvalidBase64 {
        field: String,
        #[source]
        source: base64::DecodeError,
    },
}

/// The envelope's signatures could not be fully accounted for.
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("signature {index} (keyid {keyid:?}) has no key that verifies it")]
    UnmatchedSignature { index: usize, keyid: Option<String> },

    #[error("envelope carries no signatures")]
    NoSignatures,

    #[error("payload hash mismatch: expected {expected}, computed {computed}")]
    PayloadHashMismatch { expected: String, computed: String },

    #[error("signature {index} was not produced by the public key recorded with it")]
    KeyMismatch { index: usize },

    #[error("could not run signature verification: {0}")]
    Verifier(#[source] anyhow::Error),
}

/// Index derivation failed for a payload type that claims a structure.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("payload of type '{payload_type}' is not a valid statement: {source}")]
    MalformedStatement {
        payload_type: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
