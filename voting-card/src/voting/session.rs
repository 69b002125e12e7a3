//! Voting Session State
//!
//! Authentication state, the handshake scratch buffer and the card-held
//! secrets for one applet instance.
//!
//! Writers are fixed: `auth_state` and `scratch` change only through
//! [`Session::commit_handshake`] (decrypt-and-check) and the lifecycle
//! methods [`Session::select`] / [`Session::reset`]. Keys are immutable.

use std::fmt;

use log::debug;

use crate::card::CardConfig;
use crate::crypto::CardKeyPair;

/// Capacity of the handshake scratch buffer
pub const SCRATCH_CAPACITY: usize = 256;

/// Length of the nonce, identifier and key fields
pub const FIELD_SIZE: usize = 16;

/// Authentication state of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// Fresh session, applet not selected through the card
    Idle,
    /// Applet selected, no handshake yet
    ServiceSelected,
    /// Decrypt-and-check succeeded. Terminal until teardown.
    Authenticated,
}

/// Session held by the voting applet
pub struct Session {
    auth_state: AuthState,
    scratch: [u8; SCRATCH_CAPACITY],
    /// Bytes of `scratch` written by the last successful handshake
    scratch_len: usize,
    shared_key: [u8; FIELD_SIZE],
    card_nonce: [u8; FIELD_SIZE],
    card_identifier: [u8; FIELD_SIZE],
    key_pair: CardKeyPair,
}

impl Session {
    /// Create a session from provisioning data, generating the signing key pair
    pub fn new(config: &CardConfig) -> Self {
        Self::with_key_pair(config, CardKeyPair::generate())
    }

    /// Create a session with an existing signing key pair
    pub fn with_key_pair(config: &CardConfig, key_pair: CardKeyPair) -> Self {
        Self {
            auth_state: AuthState::Idle,
            scratch: [0u8; SCRATCH_CAPACITY],
            scratch_len: 0,
            shared_key: config.shared_key,
            card_nonce: config.card_nonce,
            card_identifier: config.card_identifier,
            key_pair,
        }
    }

    pub fn auth_state(&self) -> AuthState {
        self.auth_state
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth_state == AuthState::Authenticated
    }

    /// Applet selected by the card: tear down, then mark the service selected
    pub fn select(&mut self) {
        self.reset();
        self.auth_state = AuthState::ServiceSelected;
    }

    /// Session teardown on deselect, power-off or card reset.
    ///
    /// Returns to Idle and wipes the scratch buffer. Keys survive.
    pub fn reset(&mut self) {
        debug!("Session teardown from {:?}", self.auth_state);
        self.auth_state = AuthState::Idle;
        self.scratch.fill(0);
        self.scratch_len = 0;
    }

    /// Nonce the card expects as the first plaintext block
    pub fn card_nonce(&self) -> &[u8; FIELD_SIZE] {
        &self.card_nonce
    }

    pub(crate) fn shared_key(&self) -> &[u8; FIELD_SIZE] {
        &self.shared_key
    }

    pub(crate) fn card_identifier(&self) -> &[u8; FIELD_SIZE] {
        &self.card_identifier
    }

    pub(crate) fn key_pair(&self) -> &CardKeyPair {
        &self.key_pair
    }

    /// Store verified handshake plaintext and move to Authenticated.
    ///
    /// Only decrypt-and-check calls this, after the nonce matched.
    pub(super) fn commit_handshake(&mut self, plaintext: &[u8]) {
        let len = plaintext.len().min(SCRATCH_CAPACITY);
        self.scratch.fill(0);
        self.scratch[..len].copy_from_slice(&plaintext[..len]);
        self.scratch_len = len;
        self.auth_state = AuthState::Authenticated;
    }

    /// Plaintext retained by the last successful handshake
    pub(super) fn handshake_material(&self) -> &[u8] {
        &self.scratch[..self.scratch_len]
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("auth_state", &self.auth_state)
            .field("scratch_len", &self.scratch_len)
            .field("key_pair", &self.key_pair)
            .finish_non_exhaustive()
    }
}
