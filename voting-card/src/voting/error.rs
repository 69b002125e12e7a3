//! Voting applet errors
//!
//! Every error is converted into exactly one status word at the applet
//! boundary.

use thiserror::Error;

use crate::apdu::SW;
use crate::crypto::{AesError, EccError};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VotingError {
    /// Frame or crypto buffer length violates a fixed contract
    #[error("invalid data length")]
    InvalidLength,

    /// Offset or index out of range
    #[error("parameter out of range")]
    InvalidParameter,

    #[error("client is not authenticated")]
    NotAuthenticated,

    /// Decrypted challenge did not start with the card nonce
    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("unsupported instruction {0:#04X}")]
    UnsupportedInstruction(u8),

    /// Challenge response requested without 32 bytes of handshake material
    #[error("no handshake material for challenge response")]
    ProtocolSequence,

    /// Primitive rejected its inputs. Never expected with valid provisioning.
    #[error("cryptographic failure: {0}")]
    CryptoFailure(String),
}

impl VotingError {
    /// Status word reported to the reader
    pub fn status_word(&self) -> u16 {
        match self {
            Self::InvalidLength => SW::WRONG_LENGTH,
            Self::InvalidParameter => SW::WRONG_P1_P2,
            Self::NotAuthenticated | Self::ProtocolSequence => SW::CONDITIONS_NOT_SATISFIED,
            Self::AuthenticationFailed => SW::SECURITY_STATUS_NOT_SATISFIED,
            Self::UnsupportedInstruction(_) => SW::INS_NOT_SUPPORTED,
            Self::CryptoFailure(_) => SW::EXEC_ERROR,
        }
    }
}

impl From<AesError> for VotingError {
    fn from(e: AesError) -> Self {
        match e {
            AesError::InvalidLength(_) => Self::InvalidLength,
            AesError::InvalidKey { .. } => Self::CryptoFailure(e.to_string()),
        }
    }
}

impl From<EccError> for VotingError {
    fn from(e: EccError) -> Self {
        Self::CryptoFailure(e.to_string())
    }
}
