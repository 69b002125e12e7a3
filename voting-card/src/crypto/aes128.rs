//! AES-128 Operations
//!
//! AES-ECB without padding, used by the mutual-authentication handshake.
//! Callers are responsible for block alignment.

use aes::Aes128;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit, generic_array::GenericArray};
use log::debug;
use thiserror::Error;

/// AES operation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AesError {
    #[error("invalid AES key length: expected {expected}, got {actual}")]
    InvalidKey { expected: usize, actual: usize },

    #[error("data length {0} is not a positive multiple of the block size")]
    InvalidLength(usize),
}

/// AES-128 ECB Operations
pub struct AesOperations;

impl AesOperations {
    /// Block size for AES
    pub const BLOCK_SIZE: usize = 16;

    /// Key size for AES-128
    pub const KEY_SIZE: usize = 16;

    fn cipher(key: &[u8]) -> Result<Aes128, AesError> {
        if key.len() != Self::KEY_SIZE {
            return Err(AesError::InvalidKey {
                expected: Self::KEY_SIZE,
                actual: key.len(),
            });
        }
        Ok(Aes128::new(GenericArray::from_slice(key)))
    }

    fn check_aligned(data: &[u8]) -> Result<(), AesError> {
        if data.is_empty() || data.len() % Self::BLOCK_SIZE != 0 {
            return Err(AesError::InvalidLength(data.len()));
        }
        Ok(())
    }

    /// Encrypt whole blocks with AES-128-ECB
    pub fn encrypt_ecb(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, AesError> {
        Self::check_aligned(plaintext)?;
        let cipher = Self::cipher(key)?;

        debug!("AES-ECB encrypting {} bytes", plaintext.len());

        let mut result = plaintext.to_vec();
        for chunk in result.chunks_exact_mut(Self::BLOCK_SIZE) {
            cipher.encrypt_block(GenericArray::from_mut_slice(chunk));
        }
        Ok(result)
    }

    /// Decrypt whole blocks with AES-128-ECB
    pub fn decrypt_ecb(key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, AesError> {
        Self::check_aligned(ciphertext)?;
        let cipher = Self::cipher(key)?;

        debug!("AES-ECB decrypting {} bytes", ciphertext.len());

        let mut result = ciphertext.to_vec();
        for chunk in result.chunks_exact_mut(Self::BLOCK_SIZE) {
            cipher.decrypt_block(GenericArray::from_mut_slice(chunk));
        }
        Ok(result)
    }
}
