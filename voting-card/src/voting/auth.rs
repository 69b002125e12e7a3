//! Mutual authentication handshake
//!
//! Shared-key challenge-response in two commands:
//!
//! 1. DECRYPT AND CHECK: the reader sends `AES(k, card_nonce ‖ reader_nonce)`.
//!    A first block equal to the card nonce proves the reader holds `k`; the
//!    plaintext is retained in the session scratch buffer.
//! 2. RESPOND CHALLENGE: the card answers `AES(k, reader_nonce ‖ card_id)`,
//!    proving it holds `k` and binding the answer to the reader's nonce.
//!
//! Failed checks leave the session untouched. There is no retry counter.

use log::{debug, info, warn};
use subtle::ConstantTimeEq;

use crate::crypto::AesOperations;
use super::error::VotingError;
use super::session::{Session, FIELD_SIZE, SCRATCH_CAPACITY};

/// Handshake material needed for a challenge response
const RESPONSE_MATERIAL_LEN: usize = 2 * FIELD_SIZE;

/// Authentication protocol engine
pub struct AuthEngine;

impl AuthEngine {
    /// Decrypt the reader's challenge and compare its first block to the card nonce.
    ///
    /// On a match the plaintext is committed to scratch and the session
    /// becomes Authenticated. On a mismatch nothing changes.
    pub fn decrypt_and_check(session: &mut Session, ciphertext: &[u8]) -> Result<(), VotingError> {
        if ciphertext.len() > SCRATCH_CAPACITY {
            return Err(VotingError::InvalidLength);
        }
        let plaintext = AesOperations::decrypt_ecb(session.shared_key(), ciphertext)?;

        let matches: bool = plaintext[..FIELD_SIZE].ct_eq(session.card_nonce()).into();
        if !matches {
            warn!("Handshake rejected: card nonce mismatch");
            return Err(VotingError::AuthenticationFailed);
        }

        session.commit_handshake(&plaintext);
        info!("Reader authenticated ({} bytes of handshake material)", plaintext.len());
        Ok(())
    }

    /// Build `AES(k, reader_nonce ‖ card_id)` from the retained handshake.
    pub fn respond_challenge(session: &Session) -> Result<Vec<u8>, VotingError> {
        if !session.is_authenticated() {
            return Err(VotingError::NotAuthenticated);
        }

        let material = session.handshake_material();
        if material.len() < RESPONSE_MATERIAL_LEN {
            warn!("Challenge response requested with {} bytes of handshake material", material.len());
            return Err(VotingError::ProtocolSequence);
        }

        let mut reply = [0u8; RESPONSE_MATERIAL_LEN];
        reply[..FIELD_SIZE].copy_from_slice(&material[FIELD_SIZE..RESPONSE_MATERIAL_LEN]);
        reply[FIELD_SIZE..].copy_from_slice(session.card_identifier());

        let ciphertext = AesOperations::encrypt_ecb(session.shared_key(), &reply)?;
        debug!("Challenge response built");
        Ok(ciphertext)
    }

    /// Encrypt caller data under the shared key. No precondition.
    pub fn encrypt(session: &Session, plaintext: &[u8]) -> Result<Vec<u8>, VotingError> {
        Ok(AesOperations::encrypt_ecb(session.shared_key(), plaintext)?)
    }

    /// Decrypt caller data under the shared key. No precondition.
    pub fn decrypt(session: &Session, ciphertext: &[u8]) -> Result<Vec<u8>, VotingError> {
        Ok(AesOperations::decrypt_ecb(session.shared_key(), ciphertext)?)
    }
}
