use anyhow::{bail, Result};
use log::trace;

use super::PublicKey;
use crate::{dsse::Envelope, hash::HashAlgorithm};

/// Checks raw signatures against a single public key.
pub trait Verifier {
    /// Verifies `signature` over `data`. Any error means "does not verify".
    fn verify(&self, data: &[u8], signature: &[u8]) -> Result<()>;
}

/// A public key bound to the hash algorithm its signatures are computed with.
#[derive(Debug, Clone, Copy)]
pub struct KeyVerifier<'a> {
    key: &'a PublicKey,
    hash: HashAlgorithm,
}

/// Builds a verifier for `key`.
///
/// ECDSA and RSA keys hash with `hash`; Ed25519 signs the message directly and
/// ignores it.
pub fn load_verifier(key: &PublicKey, hash: HashAlgorithm) -> KeyVerifier<'_> {
    KeyVerifier { key, hash }
}

impl Verifier for KeyVerifier<'_> {
    fn verify(&self, data: &[u8], signature: &[u8]) -> Result<()> {
        match (self.key, self.hash) {
            #[cfg(feature = "key-p256")]
            (PublicKey::EcdsaP256(key), HashAlgorithm::Sha256) => {
                use p256::ecdsa::{signature::Verifier as _, Signature};

                // ASN.1 DER only: one signature must have exactly one encoding.
                let sig = Signature::from_der(signature)?;
                key.verify(data, &sig)?;
            }
            #[cfg(feature = "key-p384")]
            (PublicKey::EcdsaP384(key), HashAlgorithm::Sha256) => {
                use p384::ecdsa::{signature::hazmat::PrehashVerifier, Signature};
                use sha2::{Digest, Sha256};

                let sig = Signature::from_der(signature)?;
                key.verify_prehash(&Sha256::digest(data), &sig)?;
            }
            #[cfg(feature = "key-ed25519")]
            (PublicKey::Ed25519(key), _) => {
                let sig = ed25519_dalek::Signature::from_slice(signature)?;
                key.verify_strict(data, &sig)?;
            }
            #[cfg(feature = "key-rsa")]
            (PublicKey::Rsa(key), HashAlgorithm::Sha256) => {
                use rsa::{
                    pkcs1v15::{Signature, VerifyingKey},
                    signature::Verifier as _,
                };

                let sig = Signature::try_from(signature)?;
                VerifyingKey::<sha2::Sha256>::new(key.clone()).verify(data, &sig)?;
            }
        }

        Ok(())
    }
}

/// A signature in an envelope that a verifier accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptedSignature<'a> {
    /// Position of the signature in the envelope
    pub index: usize,
    /// The signature bytes
    pub sig: &'a [u8],
}

/// Runs every signature of `envelope` through `verifier` over the envelope's PAE.
///
/// Returns the signatures that verified, in envelope order. An envelope without
/// signatures is an error; a verifier that accepts nothing is not.
pub fn verify_envelope<'e>(
    envelope: &'e Envelope,
    verifier: &dyn Verifier,
) -> Result<Vec<AcceptedSignature<'e>>> {
    if envelope.signatures.is_empty() {
        bail!("envelope has no signatures");
    }

    let pae = envelope.pae();

    let accepted = envelope
        .signatures
        .iter()
        .enumerate()
        .filter_map(|(index, signature)| match verifier.verify(&pae, &signature.sig) {
            Ok(()) => Some(AcceptedSignature {
                index,
                sig: signature.sig.as_slice(),
            }),
            Err(e) => {
                trace!("signature {index} rejected: {e}");
                None
            }
        })
        .collect();

    Ok(accepted)
}
