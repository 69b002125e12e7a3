//! Card-level plumbing
//!
//! ATR construction and the provisioning data the applet is created from.

pub mod atr;
pub mod config;

pub use atr::{build_atr, create_voting_atr};
pub use config::{CardConfig, ConfigError, CONFIG_ENV_VAR};
