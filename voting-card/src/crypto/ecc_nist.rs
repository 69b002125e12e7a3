//! NIST P-256 ECDSA Operations
//!
//! The card's signing key pair, SHA-256 ECDSA signatures and public key
//! export, using the p256 crate.

use std::fmt;

use log::debug;
use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use rand::rngs::OsRng;
use thiserror::Error;

/// ECC operation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EccError {
    #[error("invalid P-256 private key: {0}")]
    InvalidKey(String),

    #[error("output buffer too small: need {needed}, have {available}")]
    BufferTooSmall { needed: usize, available: usize },

    #[error("ECDSA signing failed: {0}")]
    SigningFailed(String),
}

/// P-256 key pair held by the card
///
/// The private half never leaves this crate.
pub struct CardKeyPair {
    signing_key: SigningKey,
}

impl CardKeyPair {
    /// Generate a fresh key pair
    pub fn generate() -> Self {
        debug!("Generating P-256 signing key pair");
        Self {
            signing_key: SigningKey::random(&mut OsRng),
        }
    }

    /// Rebuild a key pair from a 32-byte private scalar
    pub fn from_private_bytes(bytes: &[u8]) -> Result<Self, EccError> {
        let key_bytes: &[u8; 32] = bytes.try_into().map_err(|_| {
            EccError::InvalidKey(format!("expected 32 bytes, got {}", bytes.len()))
        })?;
        let signing_key = SigningKey::from_bytes(key_bytes.into())
            .map_err(|e| EccError::InvalidKey(e.to_string()))?;
        Ok(Self { signing_key })
    }

    pub(crate) fn private_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// Public half of the pair
    pub fn public_key(&self) -> &VerifyingKey {
        self.signing_key.verifying_key()
    }
}

impl fmt::Debug for CardKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardKeyPair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

/// NIST ECC Operations
pub struct EccNistOperations;

impl EccNistOperations {
    /// Uncompressed SEC1 point: 0x04 || X || Y
    pub const PUBLIC_KEY_SIZE: usize = 65;

    /// Upper bound of a DER-encoded P-256 signature
    pub const MAX_SIGNATURE_SIZE: usize = 72;

    /// Sign `message` with ECDSA over SHA-256.
    ///
    /// Nonces are derived per RFC 6979, so the same key and message always
    /// produce the same signature. The result is DER encoded.
    pub fn sign(private_key: &SigningKey, message: &[u8]) -> Result<Vec<u8>, EccError> {
        let signature: Signature = private_key
            .try_sign(message)
            .map_err(|e| EccError::SigningFailed(e.to_string()))?;
        let der = signature.to_der();

        debug!("Signed {} bytes, signature {} bytes", message.len(), der.as_bytes().len());
        Ok(der.as_bytes().to_vec())
    }

    /// Write the uncompressed public point into `out`, returning the byte count
    pub fn export_public_key(public_key: &VerifyingKey, out: &mut [u8]) -> Result<usize, EccError> {
        let point = public_key.to_encoded_point(false);
        let bytes = point.as_bytes();
        if out.len() < bytes.len() {
            return Err(EccError::BufferTooSmall {
                needed: bytes.len(),
                available: out.len(),
            });
        }
        out[..bytes.len()].copy_from_slice(bytes);
        Ok(bytes.len())
    }
}
