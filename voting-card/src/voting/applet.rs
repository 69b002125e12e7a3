//! Voting Applet implementation
//!
//! Routes decoded commands to the authentication engine and the guarded
//! asset store, and turns their results into status words.

use std::convert::TryFrom;

use log::{debug, info, warn};

use crate::apdu::{Response, APDU};
use crate::card::CardConfig;
use crate::crypto::CardKeyPair;
use super::asset::GuardedAsset;
use super::auth::AuthEngine;
use super::command::Command;
use super::error::VotingError;
use super::session::Session;

/// Voting Card Applet
#[derive(Debug)]
pub struct VotingApplet {
    aid: Vec<u8>,
    session: Session,
    asset: GuardedAsset,
}

impl VotingApplet {
    /// Create the applet from provisioning data with a fresh signing key
    pub fn new(config: &CardConfig) -> Self {
        Self::with_key_pair(config, CardKeyPair::generate())
    }

    pub fn with_key_pair(config: &CardConfig, key_pair: CardKeyPair) -> Self {
        Self {
            aid: config.aid.clone(),
            session: Session::with_key_pair(config, key_pair),
            asset: GuardedAsset::new(config.protected_asset.clone()),
        }
    }

    /// Application identifier the card selects this applet by
    pub fn aid(&self) -> &[u8] {
        &self.aid
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Applet selected by the card
    pub fn select(&mut self) -> Response {
        self.session.select();
        info!("Voting applet selected");
        Response::ok()
    }

    /// Deselect, power-off or card reset
    pub fn reset(&mut self) {
        self.session.reset();
    }

    /// Process an APDU command and return the response
    pub fn process_apdu(&mut self, cmd: &APDU) -> Response {
        debug!("Voting APDU: INS={:02X} P1={:02X} P2={:02X} Lc={}", cmd.ins, cmd.p1, cmd.p2, cmd.data.len());

        match self.dispatch(cmd) {
            Ok(data) => Response::success(data),
            Err(err) => {
                match err {
                    VotingError::CryptoFailure(_) => warn!("INS {:02X} failed: {}", cmd.ins, err),
                    _ => debug!("INS {:02X} rejected: {}", cmd.ins, err),
                }
                Response::error(err.status_word())
            }
        }
    }

    fn dispatch(&mut self, cmd: &APDU) -> Result<Vec<u8>, VotingError> {
        match Command::try_from(cmd)? {
            Command::GetServiceNonce => Ok(self.session.card_nonce().to_vec()),
            Command::EncryptBlock { plaintext } => AuthEngine::encrypt(&self.session, plaintext),
            Command::DecryptAndCheck { ciphertext } => {
                AuthEngine::decrypt_and_check(&mut self.session, ciphertext)?;
                Ok(Vec::new())
            }
            Command::RespondChallenge => AuthEngine::respond_challenge(&self.session),
            Command::ReadAsset { offset, max_len } => {
                self.asset.read(&self.session, offset as usize, max_len)
            }
            Command::ExportPublicKey => self.asset.export_signing_public_key(&self.session),
            Command::SignAsset => self.asset.sign(&self.session),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apdu::{ins, SW};
    use crate::crypto::AesOperations;
    use crate::voting::session::AuthState;
    use p256::ecdsa::signature::Verifier;
    use p256::ecdsa::{Signature, VerifyingKey};

    const READER_NONCE: [u8; 16] = [0x5A; 16];

    fn selected_applet() -> VotingApplet {
        let mut applet = VotingApplet::new(&CardConfig::default());
        assert!(applet.select().is_okay());
        applet
    }

    fn handshake_apdu(first_block: &[u8; 16]) -> APDU {
        let mut plaintext = first_block.to_vec();
        plaintext.extend_from_slice(&READER_NONCE);
        let ciphertext = AesOperations::encrypt_ecb(&CardConfig::DEFAULT_SHARED_KEY, &plaintext).unwrap();
        APDU::with_data(0x80, ins::DECRYPT_AND_CHECK, 0, 0, ciphertext)
    }

    fn authenticate(applet: &mut VotingApplet) {
        let response = applet.process_apdu(&handshake_apdu(&CardConfig::DEFAULT_CARD_NONCE));
        assert_eq!(response.sw(), SW::SUCCESS);
        assert!(response.data.is_empty());
    }

    #[test]
    fn test_get_service_nonce() {
        let mut applet = selected_applet();
        let response = applet.process_apdu(&APDU::new(0x80, ins::GET_SERVICE_NONCE, 0, 0).with_le(16));
        assert!(response.is_okay());
        assert_eq!(response.data, CardConfig::DEFAULT_CARD_NONCE);
    }

    #[test]
    fn test_encrypt_block_status_words() {
        let mut applet = selected_applet();

        let response = applet.process_apdu(&APDU::with_data(0x80, ins::ENCRYPT_BLOCK, 0, 0, vec![0u8; 16]));
        assert!(response.is_okay());
        assert_eq!(response.data.len(), 16);

        let response = applet.process_apdu(&APDU::with_data(0x80, ins::ENCRYPT_BLOCK, 0, 0, vec![0u8; 17]));
        assert_eq!(response.sw(), SW::WRONG_LENGTH);
        assert_eq!(applet.session().auth_state(), AuthState::ServiceSelected);
    }

    #[test]
    fn test_protected_commands_before_handshake() {
        let mut applet = selected_applet();
        for ins_byte in [ins::RESPOND_CHALLENGE, ins::READ_ASSET, ins::SIGN_ASSET] {
            let response = applet.process_apdu(&APDU::new(0x80, ins_byte, 0, 0));
            assert_eq!(response.sw(), SW::CONDITIONS_NOT_SATISFIED, "INS {:02X}", ins_byte);
            assert!(response.data.is_empty());
        }
    }

    #[test]
    fn test_failed_handshake_status() {
        let mut applet = selected_applet();
        let response = applet.process_apdu(&handshake_apdu(&[0u8; 16]));
        assert_eq!(response.sw(), SW::SECURITY_STATUS_NOT_SATISFIED);
        assert_eq!(applet.session().auth_state(), AuthState::ServiceSelected);

        let response = applet.process_apdu(&APDU::with_data(0x80, ins::DECRYPT_AND_CHECK, 0, 0, vec![0u8; 20]));
        assert_eq!(response.sw(), SW::WRONG_LENGTH);
    }

    #[test]
    fn test_full_flow() {
        let mut applet = selected_applet();
        authenticate(&mut applet);

        let response = applet.process_apdu(&APDU::new(0x80, ins::RESPOND_CHALLENGE, 0, 0));
        assert!(response.is_okay());
        let reply = AesOperations::decrypt_ecb(&CardConfig::DEFAULT_SHARED_KEY, &response.data).unwrap();
        assert_eq!(&reply[..16], &READER_NONCE);
        assert_eq!(&reply[16..], &CardConfig::DEFAULT_CARD_IDENTIFIER);

        let response = applet.process_apdu(&APDU::new(0x80, ins::READ_ASSET, 0x00, 0x10).with_le(0x20));
        assert!(response.is_okay());
        assert_eq!(response.data, &CardConfig::DEFAULT_PROTECTED_ASSET[0x10..0x30]);

        let response = applet.process_apdu(&APDU::new(0x80, ins::READ_ASSET, 0x7F, 0x00));
        assert_eq!(response.sw(), SW::WRONG_P1_P2);

        let public = applet.process_apdu(&APDU::new(0x80, ins::EXPORT_PUBLIC_KEY, 0, 0));
        assert_eq!(public.data.len(), 65);

        let signed = applet.process_apdu(&APDU::new(0x80, ins::SIGN_ASSET, 0x01, 0));
        assert!(signed.is_okay());

        let verifying_key = VerifyingKey::from_sec1_bytes(&public.data).unwrap();
        let signature = Signature::from_der(&signed.data).unwrap();
        assert!(verifying_key.verify(CardConfig::DEFAULT_PROTECTED_ASSET, &signature).is_ok());
    }

    #[test]
    fn test_reselect_requires_new_handshake() {
        let mut applet = selected_applet();
        authenticate(&mut applet);
        applet.select();

        let response = applet.process_apdu(&APDU::new(0x80, ins::SIGN_ASSET, 0, 0));
        assert_eq!(response.sw(), SW::CONDITIONS_NOT_SATISFIED);
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let mut applet = selected_applet();
        authenticate(&mut applet);
        applet.reset();
        assert_eq!(applet.session().auth_state(), AuthState::Idle);
    }

    #[test]
    fn test_unknown_instruction() {
        let mut applet = selected_applet();
        let response = applet.process_apdu(&APDU::new(0x80, 0x99, 0, 0));
        assert_eq!(response.sw(), SW::INS_NOT_SUPPORTED);
    }

    #[test]
    fn test_custom_provisioning() {
        let mut config = CardConfig::default();
        config.aid = vec![0xA0, 0x00, 0x00, 0x00, 0x01];
        config.protected_asset = b"ballot".to_vec();
        let mut applet = VotingApplet::new(&config);
        assert_eq!(applet.aid(), &[0xA0, 0x00, 0x00, 0x00, 0x01]);

        applet.select();
        authenticate(&mut applet);
        let response = applet.process_apdu(&APDU::new(0x80, ins::READ_ASSET, 0, 0));
        assert_eq!(response.data, b"ballot");
    }
}
