use std::collections::BTreeMap;

use log::{debug, trace};

use crate::{
    dsse::Envelope,
    error::{Error, VerificationError},
    hash::HashAlgorithm,
    pki::{load_verifier, verify_envelope, PublicKey},
};

/// A public key the caller offers as a possible signer of an envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateKey {
    /// Key bytes exactly as supplied
    pub raw: Vec<u8>,
    /// Parsed key
    pub key: PublicKey,
    /// Hex SHA-256 of the key's DER encoding
    pub id: String,
}

impl CandidateKey {
    /// Parses raw key bytes into a candidate.
    pub fn parse(raw: &[u8]) -> Result<Self, Error> {
        let key = PublicKey::from_bytes(raw)?;
        let id = key.key_id()?;

        Ok(Self {
            raw: raw.to_vec(),
            key,
            id,
        })
    }
}

/// Which candidate key verified which signature.
///
/// Only produced by [`match_keys`], and only when every signature in the envelope is
/// covered.
#[derive(Debug, Clone)]
pub struct VerifiedBinding {
    keys: Vec<CandidateKey>,
    by_sig: BTreeMap<Vec<u8>, usize>,
}

impl VerifiedBinding {
    /// The key that verified `sig`, if any.
    pub fn key_for(&self, sig: &[u8]) -> Option<&CandidateKey> {
        self.by_sig.get(sig).map(|&i| &self.keys[i])
    }

    /// Number of distinct signature values bound to a key.
    pub fn len(&self) -> usize {
        self.by_sig.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_sig.is_empty()
    }

    /// All candidate keys, in the order they were supplied.
    pub fn candidates(&self) -> &[CandidateKey] {
        &self.keys
    }

    /// Bound `(signature, key)` pairs ordered by signature bytes.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &CandidateKey)> {
        self.by_sig
            .iter()
            .map(|(sig, &i)| (sig.as_slice(), &self.keys[i]))
    }
}

/// Matches candidate public keys against the signatures of `envelope`.
///
/// Every candidate must parse; a malformed key aborts the whole match since the
/// caller vouched for it. Each key is tried against every signature over the
/// envelope's PAE. Keys that verify nothing are fine, but every signature must end
/// up with a key or the envelope is rejected with
/// [`VerificationError::UnmatchedSignature`].
pub fn match_keys(
    candidate_keys: &[Vec<u8>],
    envelope: &Envelope,
) -> Result<VerifiedBinding, Error> {
    let keys = candidate_keys
        .iter()
        .map(|raw| CandidateKey::parse(raw))
        .collect::<Result<Vec<_>, _>>()?;

    if envelope.signatures.is_empty() {
        return Err(VerificationError::NoSignatures.into());
    }

    let mut by_sig = BTreeMap::new();

    for (i, candidate) in keys.iter().enumerate() {
        let verifier = load_verifier(&candidate.key, HashAlgorithm::Sha256);
        let accepted =
            verify_envelope(envelope, &verifier).map_err(VerificationError::Verifier)?;

        trace!(
            "key {} ({}) verified {} of {} signature(s)",
            candidate.id,
            candidate.key.key_type(),
            accepted.len(),
            envelope.signatures.len()
        );

        for accept in accepted {
            by_sig.entry(accept.sig.to_vec()).or_insert(i);
        }
    }

    for (index, signature) in envelope.signatures.iter().enumerate() {
        if !by_sig.contains_key(&signature.sig) {
            debug!("rejecting envelope: signature {index} has no verifying key");
            return Err(VerificationError::UnmatchedSignature {
                index,
                keyid: signature.keyid.clone(),
            }
            .into());
        }
    }

    Ok(VerifiedBinding { keys, by_sig })
}
