/// Wire form of a DSSE envelope.
pub mod dsse;

/// Wire form of a DSSE v0.0.1 log entry and its schema checks.
pub mod dsse_v001;

pub use dsse_v001::{DsseV001Schema, PayloadHash, ProposedEntry, SignatureItem};
