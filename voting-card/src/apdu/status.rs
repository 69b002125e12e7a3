//! Status Word (SW) constants for APDU responses
//!
//! The subset of ISO 7816-4 status words the card emits.

/// Status Word constants
pub struct SW;

impl SW {
    pub const SUCCESS: u16 = 0x9000;

    /// Cryptographic primitive rejected its inputs
    pub const EXEC_ERROR: u16 = 0x6400;

    pub const WRONG_LENGTH: u16 = 0x6700;

    /// Handshake check failed
    pub const SECURITY_STATUS_NOT_SATISFIED: u16 = 0x6982;
    /// Not authenticated / not powered / no applet selected
    pub const CONDITIONS_NOT_SATISFIED: u16 = 0x6985;

    pub const FILE_NOT_FOUND: u16 = 0x6A82;

    pub const WRONG_P1_P2: u16 = 0x6B00;

    pub const INS_NOT_SUPPORTED: u16 = 0x6D00;

    /// Check if a status word indicates success
    #[inline]
    pub fn is_success(sw: u16) -> bool {
        sw == Self::SUCCESS
    }
}
