//! Voting applet commands
//!
//! Decodes a parsed APDU into one [`Command`]. Only frame shape is checked
//! here; session preconditions belong to the handlers.

use std::convert::TryFrom;

use crate::apdu::{ins, APDU};
use super::asset::DEFAULT_READ_LEN;
use super::error::VotingError;
use super::session::{FIELD_SIZE, SCRATCH_CAPACITY};

/// Largest payload accepted by ENCRYPT BLOCK
pub const MAX_ENCRYPT_LEN: usize = SCRATCH_CAPACITY;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    GetServiceNonce,
    EncryptBlock { plaintext: &'a [u8] },
    DecryptAndCheck { ciphertext: &'a [u8] },
    RespondChallenge,
    /// Offset from P1‖P2, length from Le
    ReadAsset { offset: u16, max_len: usize },
    ExportPublicKey,
    SignAsset,
}

impl<'a> TryFrom<&'a APDU> for Command<'a> {
    type Error = VotingError;

    fn try_from(apdu: &'a APDU) -> Result<Self, VotingError> {
        let data = apdu.data.as_slice();

        match apdu.ins {
            ins::GET_SERVICE_NONCE => no_payload(data).map(|_| Self::GetServiceNonce),

            // The cipher rejects lengths that are not block multiples
            ins::ENCRYPT_BLOCK => {
                if data.is_empty() || data.len() > MAX_ENCRYPT_LEN {
                    return Err(VotingError::InvalidLength);
                }
                Ok(Self::EncryptBlock { plaintext: data })
            }

            // card_nonce, or card_nonce ‖ reader_nonce
            ins::DECRYPT_AND_CHECK => {
                if data.len() != FIELD_SIZE && data.len() != 2 * FIELD_SIZE {
                    return Err(VotingError::InvalidLength);
                }
                Ok(Self::DecryptAndCheck { ciphertext: data })
            }

            ins::RESPOND_CHALLENGE => no_payload(data).map(|_| Self::RespondChallenge),

            ins::READ_ASSET => {
                no_payload(data)?;
                Ok(Self::ReadAsset {
                    offset: apdu.p1p2(),
                    max_len: apdu.le.map_or(DEFAULT_READ_LEN, |le| le as usize),
                })
            }

            ins::EXPORT_PUBLIC_KEY => no_payload(data).map(|_| Self::ExportPublicKey),

            ins::SIGN_ASSET => no_payload(data).map(|_| Self::SignAsset),

            other => Err(VotingError::UnsupportedInstruction(other)),
        }
    }
}

fn no_payload(data: &[u8]) -> Result<(), VotingError> {
    if data.is_empty() {
        Ok(())
    } else {
        Err(VotingError::InvalidLength)
    }
}
