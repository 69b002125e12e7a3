//! Cryptographic Operations
//!
//! Block cipher and signature primitives used by the voting applet.

pub mod aes128;
pub mod ecc_nist;

pub use self::aes128::{AesError, AesOperations};
pub use self::ecc_nist::{CardKeyPair, EccError, EccNistOperations};
