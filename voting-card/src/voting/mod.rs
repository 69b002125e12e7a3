//! Voting Card Applet
//!
//! Shared-key mutual authentication guarding a signed voter record.

pub mod applet;
pub mod asset;
pub mod auth;
pub mod command;
pub mod error;
pub mod session;

pub use applet::VotingApplet;
pub use asset::GuardedAsset;
pub use auth::AuthEngine;
pub use command::Command;
pub use error::VotingError;
pub use session::{AuthState, Session};
