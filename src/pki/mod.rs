/// Signature verification over parsed public keys
pub mod verifier;

use pkcs8::{DecodePublicKey, EncodePublicKey, LineEnding};

pub use verifier::{load_verifier, verify_envelope, AcceptedSignature, Verifier};

use crate::{
    error::{Error, InputError},
    hash::sha256_hex,
};

#[cfg(not(any(
    feature = "key-p256",
    feature = "key-p384",
    feature = "key-ed25519",
    feature = "key-rsa"
)))]
compile_error!("at least one `key-*` feature must be enabled");

/// Public key algorithms accepted as DSSE candidate keys.
#[derive(Clone, Copy, PartialEq, Debug, strum::EnumString, strum::Display)]
pub enum KeyType {
    /// ECDSA over NIST P-256
    #[strum(serialize = "ecdsa-p256")]
    EcdsaP256,
    /// ECDSA over NIST P-384
    #[strum(serialize = "ecdsa-p384")]
    EcdsaP384,
    /// Ed25519 (EdDSA)
    #[strum(serialize = "ed25519")]
    Ed25519,
    /// RSA with PKCS#1 v1.5 signatures
    #[strum(serialize = "rsa")]
    Rsa,
}

/// A parsed public key.
///
/// Keys are accepted as a PEM `PUBLIC KEY` block or as DER SubjectPublicKeyInfo, and
/// always re-serialized the same way by [`PublicKey::canonical_value`].
#[derive(Clone, Debug, PartialEq)]
pub enum PublicKey {
    #[cfg(feature = "key-p256")]
    EcdsaP256(p256::ecdsa::VerifyingKey),
    #[cfg(feature = "key-p384")]
    EcdsaP384(p384::ecdsa::VerifyingKey),
    #[cfg(feature = "key-ed25519")]
    Ed25519(ed25519_dalek::VerifyingKey),
    #[cfg(feature = "key-rsa")]
    Rsa(rsa::RsaPublicKey),
}

impl PublicKey {
    /// Parses key bytes, trying each supported key type in turn.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, InputError> {
        let mut failures = Vec::new();

        #[cfg(feature = "key-p256")]
        {
            match decode::<p256::ecdsa::VerifyingKey>(bytes) {
                Ok(key) => return Ok(PublicKey::EcdsaP256(key)),
                Err(e) => failures.push(format!("{}: {e}", KeyType::EcdsaP256)),
            }
        }

        #[cfg(feature = "key-p384")]
        {
            match decode::<p384::ecdsa::VerifyingKey>(bytes) {
                Ok(key) => return Ok(PublicKey::EcdsaP384(key)),
                Err(e) => failures.push(format!("{}: {e}", KeyType::EcdsaP384)),
            }
        }

        #[cfg(feature = "key-ed25519")]
        {
            match decode::<ed25519_dalek::VerifyingKey>(bytes) {
                Ok(key) => return Ok(PublicKey::Ed25519(key)),
                Err(e) => failures.push(format!("{}: {e}", KeyType::Ed25519)),
            }
        }

        #[cfg(feature = "key-rsa")]
        {
            match decode::<rsa::RsaPublicKey>(bytes) {
                Ok(key) => return Ok(PublicKey::Rsa(key)),
                Err(e) => failures.push(format!("{}: {e}", KeyType::Rsa)),
            }
        }

        Err(InputError::InvalidPublicKey(failures.join("; ")))
    }

    /// The algorithm family of this key.
    pub fn key_type(&self) -> KeyType {
        match self {
            #[cfg(feature = "key-p256")]
            PublicKey::EcdsaP256(_) => KeyType::EcdsaP256,
            #[cfg(feature = "key-p384")]
            PublicKey::EcdsaP384(_) => KeyType::EcdsaP384,
            #[cfg(feature = "key-ed25519")]
            PublicKey::Ed25519(_) => KeyType::Ed25519,
            #[cfg(feature = "key-rsa")]
            PublicKey::Rsa(_) => KeyType::Rsa,
        }
    }

    /// DER SubjectPublicKeyInfo of the key.
    pub fn to_der(&self) -> Result<Vec<u8>, Error> {
        let document = match self {
            #[cfg(feature = "key-p256")]
            PublicKey::EcdsaP256(key) => key.to_public_key_der(),
            #[cfg(feature = "key-p384")]
            PublicKey::EcdsaP384(key) => key.to_public_key_der(),
            #[cfg(feature = "key-ed25519")]
            PublicKey::Ed25519(key) => key.to_public_key_der(),
            #[cfg(feature = "key-rsa")]
            PublicKey::Rsa(key) => key.to_public_key_der(),
        }
        .map_err(Error::KeyEncoding)?;

        Ok(document.as_bytes().to_vec())
    }

    /// The canonical encoding stored in log entries: PEM SubjectPublicKeyInfo with
    /// LF line endings.
    pub fn canonical_value(&self) -> Result<Vec<u8>, Error> {
        let pem = match self {
            #[cfg(feature = "key-p256")]
            PublicKey::EcdsaP256(key) => key.to_public_key_pem(LineEnding::LF),
            #[cfg(feature = "key-p384")]
            PublicKey::EcdsaP384(key) => key.to_public_key_pem(LineEnding::LF),
            #[cfg(feature = "key-ed25519")]
            PublicKey::Ed25519(key) => key.to_public_key_pem(LineEnding::LF),
            #[cfg(feature = "key-rsa")]
            PublicKey::Rsa(key) => key.to_public_key_pem(LineEnding::LF),
        }
        .map_err(Error::KeyEncoding)?;

        Ok(pem.into_bytes())
    }

    /// Hex SHA-256 of the DER SubjectPublicKeyInfo.
    pub fn key_id(&self) -> Result<String, Error> {
        Ok(sha256_hex(&self.to_der()?))
    }
}

fn decode<K: DecodePublicKey>(bytes: &[u8]) -> pkcs8::spki::Result<K> {
    match as_pem(bytes) {
        Some(pem) => K::from_public_key_pem(pem),
        None => K::from_public_key_der(bytes),
    }
}

fn as_pem(bytes: &[u8]) -> Option<&str> {
    std::str::from_utf8(bytes)
        .ok()
        .map(str::trim)
        .filter(|s| s.starts_with("-----BEGIN"))
}
