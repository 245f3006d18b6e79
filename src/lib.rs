//! DSSE entries for a transparency log.
//!
//! This crate verifies Dead Simple Signing Envelopes against caller-supplied public
//! keys and turns them into canonical, payload-free log records with search keys.

/// Envelope and key inputs for building entries from raw artifacts
pub mod artifact;

/// Process-wide settings (attestation size cap)
pub mod config;

/// Dead Simple Signing Envelope (DSSE) parsing and PAE
pub mod dsse;

/// DSSE v0.0.1 entries: ingestion, canonicalization, indexing
pub mod entry;

/// Error taxonomy for entry handling
pub mod error;

/// Payload hashing
pub mod hash;

/// Search keys for verified entries
pub mod index;

/// In-Toto statement parsing for deep indexing
#[cfg(feature = "intoto-attestation")]
pub mod intoto_attestation;

/// Matching candidate public keys to envelope signatures
pub mod matcher;

/// Wire types of proposed and stored entries
pub mod models;

/// Public keys (ecdsa-p256, ed25519) and signature verification
pub mod pki;

/// Canonical, payload-free entry records
pub mod record;

/// Schema version dispatch
pub mod registry;

pub use config::Config;
pub use entry::{DsseV001Entry, EntryImpl};
pub use error::{Error, Result};
pub use registry::EntryRegistry;
