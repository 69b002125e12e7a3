//! Card provisioning configuration
//!
//! Everything the voting applet needs at creation time: its AID, the shared
//! AES key, the card nonce and identifier, and the protected voter record.
//! On disk this is JSON with base64-encoded byte fields.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// Environment variable naming a JSON provisioning file
pub const CONFIG_ENV_VAR: &str = "VOTING_CARD_CONFIG";

/// Largest asset addressable by a 15-bit P1P2 offset
pub const MAX_ASSET_LEN: usize = 0x7FFF;

/// Custom serde module for base64 encoding of byte vectors
mod base64_bytes {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}

/// Provisioning errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// On-disk form, byte fields as base64 strings
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CardConfigFile {
    #[serde(with = "base64_bytes")]
    aid: Vec<u8>,
    #[serde(with = "base64_bytes")]
    shared_key: Vec<u8>,
    #[serde(with = "base64_bytes")]
    card_nonce: Vec<u8>,
    #[serde(with = "base64_bytes")]
    card_identifier: Vec<u8>,
    #[serde(with = "base64_bytes")]
    protected_asset: Vec<u8>,
}

/// Validated provisioning data
#[derive(Clone, PartialEq, Eq)]
pub struct CardConfig {
    /// Application identifier matched by SELECT
    pub aid: Vec<u8>,
    /// AES-128 key shared with genuine readers
    pub shared_key: [u8; 16],
    /// Expected first plaintext block of the handshake
    pub card_nonce: [u8; 16],
    /// Disclosed only inside the encrypted challenge response
    pub card_identifier: [u8; 16],
    /// Voter record released after authentication
    pub protected_asset: Vec<u8>,
}

impl CardConfig {
    /// Default applet AID
    pub const DEFAULT_AID: &'static [u8] = &[0xAE, 0x33, 0x93, 0xEE, 0x01, 0x02];

    /// Default shared key. Insecure, replace via provisioning in any real deployment.
    pub const DEFAULT_SHARED_KEY: [u8; 16] = [
        0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07,
        0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F,
    ];

    pub const DEFAULT_CARD_NONCE: [u8; 16] = [
        0x01, 0x02, 0x03, 0x04, 0x05, 0x11, 0x12, 0x13,
        0x14, 0x15, 0x21, 0x22, 0x23, 0x24, 0x25, 0x26,
    ];

    pub const DEFAULT_CARD_IDENTIFIER: [u8; 16] = [
        0x01, 0x04, 0x03, 0x02, 0x05, 0x11, 0x12, 0x13,
        0x15, 0x14, 0x21, 0x22, 0x23, 0x24, 0x25, 0x26,
    ];

    /// Default voter record (AES-ECB encrypted JSON under the default key)
    pub const DEFAULT_PROTECTED_ASSET: &'static [u8] = &[
        0x7F, 0x73, 0x27, 0xF0, 0x74, 0x7C, 0xC4, 0xB7, 0xE6, 0x55, 0xF2, 0x48, 0x57, 0xDF, 0x89, 0x10,
        0x94, 0xD1, 0x09, 0x24, 0xBC, 0x30, 0x07, 0xDF, 0x1A, 0xC7, 0x1C, 0xAA, 0x83, 0x20, 0x41, 0x70,
        0xB4, 0x96, 0x51, 0x78, 0xD0, 0x30, 0x1A, 0xBD, 0xDE, 0x3F, 0xE1, 0xA1, 0xEF, 0x74, 0x16, 0x17,
        0x3A, 0x0F, 0x48, 0xD1, 0x5C, 0x26, 0xE3, 0x1B, 0x5F, 0x8E, 0x70, 0xC1, 0xCB, 0xD3, 0x13, 0x39,
        0x34, 0x27, 0xD7, 0x25, 0x2D, 0x63, 0x17, 0x1A, 0xF6, 0x19, 0x12, 0x0C, 0x93, 0x5D, 0xA3, 0x2F,
        0x28, 0xF1, 0x11, 0x9A, 0x44, 0xD2, 0x57, 0xE4, 0x48, 0x68, 0xAB, 0x06, 0x87, 0x68, 0x78, 0xD8,
        0x28, 0x6A, 0x20, 0xF3, 0x7C, 0x5C, 0x60, 0x08, 0xAE, 0x0A, 0x79, 0xE5, 0x6B, 0x1A, 0x22, 0x9E,
        0x5E, 0xCD, 0xE6, 0xFC, 0x88, 0x84, 0x1D, 0xBA, 0x3F, 0x7F, 0x50, 0x81, 0x63, 0x86, 0x21, 0xCB,
        0xA5, 0xE9, 0x8C, 0x4C, 0x07, 0x53, 0x7B, 0x75, 0x3C, 0x89, 0x5A, 0x6D, 0x47, 0x66, 0x9F, 0x8D,
        0xB4, 0xD7, 0x2E, 0x6C, 0xC8, 0x7F, 0x90, 0x2A, 0xCA, 0xBA, 0x8F, 0xCD, 0xA2, 0xB0, 0x64, 0xDD,
        0x82, 0x4D, 0x5F, 0x50, 0xF9, 0xB0, 0x9C, 0x63, 0xA0, 0x28, 0x99, 0x7E, 0x86, 0x3B, 0xC8, 0xBF,
        0x48, 0x07, 0xC0, 0x81, 0x2F, 0xF4, 0xDD, 0x14, 0x11, 0xE1, 0x4C, 0xB0, 0xEB, 0xD3, 0xB7, 0xCA,
    ];

    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let file: CardConfigFile = serde_json::from_str(json)?;
        Self::from_file(file)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load and validate a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_json(&content)?;
        info!("Loaded card provisioning from {:?}", path);
        Ok(config)
    }

    /// Load from `path` if given, falling back to the defaults on any failure
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            debug!("No provisioning file, using default card configuration");
            return Self::default();
        };
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to load provisioning from {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Load the file named by `VOTING_CARD_CONFIG`, or the defaults
    pub fn from_env() -> Self {
        let path = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
        Self::load_or_default(path.as_deref())
    }
}

fn fixed16(field: &'static str, bytes: Vec<u8>) -> Result<[u8; 16], ConfigError> {
    let len = bytes.len();
    bytes.try_into().map_err(|_| ConfigError::InvalidField {
        field,
        reason: format!("expected 16 bytes, got {}", len),
    })
}

impl CardConfig {
    fn from_file(file: CardConfigFile) -> Result<Self, ConfigError> {
        if !(5..=16).contains(&file.aid.len()) {
            return Err(ConfigError::InvalidField {
                field: "aid",
                reason: format!("expected 5 to 16 bytes, got {}", file.aid.len()),
            });
        }
        if file.protected_asset.is_empty() || file.protected_asset.len() > MAX_ASSET_LEN {
            return Err(ConfigError::InvalidField {
                field: "protected_asset",
                reason: format!("expected 1 to {} bytes, got {}", MAX_ASSET_LEN, file.protected_asset.len()),
            });
        }

        Ok(Self {
            aid: file.aid,
            shared_key: fixed16("shared_key", file.shared_key)?,
            card_nonce: fixed16("card_nonce", file.card_nonce)?,
            card_identifier: fixed16("card_identifier", file.card_identifier)?,
            protected_asset: file.protected_asset,
        })
    }

    fn to_file(&self) -> CardConfigFile {
        CardConfigFile {
            aid: self.aid.clone(),
            shared_key: self.shared_key.to_vec(),
            card_nonce: self.card_nonce.to_vec(),
            card_identifier: self.card_identifier.to_vec(),
            protected_asset: self.protected_asset.clone(),
        }
    }
}

impl Serialize for CardConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_file().serialize(serializer)
    }
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            aid: Self::DEFAULT_AID.to_vec(),
            shared_key: Self::DEFAULT_SHARED_KEY,
            card_nonce: Self::DEFAULT_CARD_NONCE,
            card_identifier: Self::DEFAULT_CARD_IDENTIFIER,
            protected_asset: Self::DEFAULT_PROTECTED_ASSET.to_vec(),
        }
    }
}

impl std::fmt::Debug for CardConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardConfig")
            .field("aid", &self.aid)
            .field("protected_asset_len", &self.protected_asset.len())
            .finish_non_exhaustive()
    }
}
