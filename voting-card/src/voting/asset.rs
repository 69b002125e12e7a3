//! Guarded Asset Store
//!
//! The protected voter record. Reading and signing it require an
//! authenticated session; the signing public key is always exportable.

use log::{debug, info};

use crate::crypto::EccNistOperations;
use super::error::VotingError;
use super::session::Session;

/// Read length used when the reader sends no Le
pub const DEFAULT_READ_LEN: usize = 256;

/// Fixed protected payload
#[derive(Debug, Clone)]
pub struct GuardedAsset {
    payload: Vec<u8>,
}

impl GuardedAsset {
    pub fn new(payload: Vec<u8>) -> Self {
        Self { payload }
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Read up to `max_len` bytes starting at `offset`.
    ///
    /// A read running past the end returns the remainder.
    pub fn read(&self, session: &Session, offset: usize, max_len: usize) -> Result<Vec<u8>, VotingError> {
        if !session.is_authenticated() {
            return Err(VotingError::NotAuthenticated);
        }
        if offset >= self.payload.len() {
            debug!("Asset read offset {} out of range (len {})", offset, self.payload.len());
            return Err(VotingError::InvalidParameter);
        }

        let end = offset + max_len.min(self.payload.len() - offset);
        debug!("Asset read {}..{}", offset, end);
        Ok(self.payload[offset..end].to_vec())
    }

    /// Sign the whole payload with the card key (ECDSA P-256, DER)
    pub fn sign(&self, session: &Session) -> Result<Vec<u8>, VotingError> {
        if !session.is_authenticated() {
            return Err(VotingError::NotAuthenticated);
        }

        let signature = EccNistOperations::sign(session.key_pair().private_key(), &self.payload)?;
        info!("Asset signed, signature {} bytes", signature.len());
        Ok(signature)
    }

    /// Uncompressed SEC1 point of the signing key
    pub fn export_signing_public_key(&self, session: &Session) -> Result<Vec<u8>, VotingError> {
        let mut out = [0u8; EccNistOperations::PUBLIC_KEY_SIZE];
        let written = EccNistOperations::export_public_key(session.key_pair().public_key(), &mut out)?;
        Ok(out[..written].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardConfig;
    use p256::ecdsa::signature::Verifier;
    use p256::ecdsa::{Signature, VerifyingKey};

    fn asset() -> GuardedAsset {
        GuardedAsset::new(CardConfig::DEFAULT_PROTECTED_ASSET.to_vec())
    }

    fn authenticated_session() -> Session {
        let mut session = Session::new(&CardConfig::default());
        session.select();
        session.commit_handshake(&[0u8; 32]);
        session
    }

    #[test]
    fn test_read_requires_authentication() {
        let mut session = Session::new(&CardConfig::default());
        session.select();
        assert_eq!(asset().read(&session, 0, 16), Err(VotingError::NotAuthenticated));
        assert_eq!(asset().sign(&session), Err(VotingError::NotAuthenticated));
    }

    #[test]
    fn test_read_chunks() {
        let session = authenticated_session();
        let asset = asset();

        assert_eq!(asset.read(&session, 0, 16).unwrap(), &CardConfig::DEFAULT_PROTECTED_ASSET[..16]);
        assert_eq!(
            asset.read(&session, 0x10, 0x20).unwrap(),
            &CardConfig::DEFAULT_PROTECTED_ASSET[0x10..0x30]
        );
        assert_eq!(asset.read(&session, 0, DEFAULT_READ_LEN).unwrap(), CardConfig::DEFAULT_PROTECTED_ASSET);
    }

    #[test]
    fn test_read_past_end_returns_remainder() {
        let session = authenticated_session();
        let asset = asset();
        let len = asset.len();

        let tail = asset.read(&session, len - 5, 100).unwrap();
        assert_eq!(tail, &CardConfig::DEFAULT_PROTECTED_ASSET[len - 5..]);
    }

    #[test]
    fn test_read_offset_out_of_range() {
        let session = authenticated_session();
        let asset = asset();
        assert_eq!(asset.read(&session, asset.len(), 1), Err(VotingError::InvalidParameter));
        assert_eq!(asset.read(&session, 0xFFFF, 1), Err(VotingError::InvalidParameter));
    }

    #[test]
    fn test_zero_length_read() {
        let session = authenticated_session();
        assert!(asset().read(&session, 0, 0).unwrap().is_empty());
    }

    #[test]
    fn test_signature_verifies_under_exported_key() {
        let session = authenticated_session();
        let asset = asset();

        let signature = asset.sign(&session).unwrap();
        let public = asset.export_signing_public_key(&session).unwrap();
        assert_eq!(public.len(), 65);
        assert_eq!(public[0], 0x04);

        let verifying_key = VerifyingKey::from_sec1_bytes(&public).unwrap();
        let signature = Signature::from_der(&signature).unwrap();
        assert!(verifying_key.verify(CardConfig::DEFAULT_PROTECTED_ASSET, &signature).is_ok());
        assert!(verifying_key.verify(b"some other record", &signature).is_err());
    }

    #[test]
    fn test_export_needs_no_authentication() {
        let session = Session::new(&CardConfig::default());
        assert_eq!(asset().export_signing_public_key(&session).unwrap().len(), 65);
    }
}
