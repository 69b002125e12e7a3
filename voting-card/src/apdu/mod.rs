//! APDU (Application Protocol Data Unit) handling
//!
//! Command parsing and response building for ISO 7816-4 frames as they
//! arrive at the card.
//!
//! # Example
//! ```ignore
//! use voting_card::apdu::{parse_apdu, Response};
//!
//! // GET SERVICE NONCE, Le = 16
//! let apdu = parse_apdu(&[0x80, 0xCA, 0x00, 0x00, 0x10]).unwrap();
//! assert_eq!(apdu.ins, 0xCA);
//! assert_eq!(apdu.le, Some(16));
//!
//! let response = Response::success(vec![0x01, 0x02, 0x03]);
//! assert!(response.is_okay());
//! ```

mod response;
mod status;

pub use response::Response;
pub use status::SW;

use thiserror::Error;

/// Errors that can occur during APDU parsing
#[derive(Debug, Error, PartialEq, Eq)]
pub enum APDUError {
    #[error("APDU too short: expected at least 4 bytes, got {0}")]
    TooShort(usize),

    #[error("Lc/Le do not match the frame length")]
    InvalidLength,

    #[error("Invalid extended APDU format")]
    InvalidExtendedFormat,
}

/// A parsed command APDU
///
/// # Fields
/// - `cla`: Class byte (not interpreted by the voting applet)
/// - `ins`: Instruction byte, selects the handler
/// - `p1`, `p2`: Parameter bytes (READ ASSET uses them as a big-endian offset)
/// - `data`: Command data (may be empty)
/// - `le`: Expected response length (None if not specified)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct APDU {
    /// Class byte (CLA)
    pub cla: u8,
    /// Instruction byte (INS)
    pub ins: u8,
    /// Parameter 1 (P1)
    pub p1: u8,
    /// Parameter 2 (P2)
    pub p2: u8,
    /// Command data (may be empty)
    pub data: Vec<u8>,
    /// Expected response length (Le), None if not specified
    pub le: Option<u32>,
}

impl APDU {
    /// Create a header-only APDU (case 1)
    pub fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: Vec::new(),
            le: None,
        }
    }

    /// Create an APDU carrying command data (case 3)
    pub fn with_data(cla: u8, ins: u8, p1: u8, p2: u8, data: Vec<u8>) -> Self {
        Self {
            data,
            ..Self::new(cla, ins, p1, p2)
        }
    }

    /// Set the expected response length
    pub fn with_le(mut self, le: u32) -> Self {
        self.le = Some(le);
        self
    }

    /// P1-P2 combined as a big-endian u16
    pub fn p1p2(&self) -> u16 {
        u16::from_be_bytes([self.p1, self.p2])
    }

    /// Serialize back to short-format wire bytes.
    ///
    /// Used by readers and tests; data longer than 255 bytes is not
    /// representable in short format and is rejected.
    pub fn to_bytes(&self) -> Result<Vec<u8>, APDUError> {
        if self.data.len() > 255 || self.le.map_or(false, |le| le > 256) {
            return Err(APDUError::InvalidLength);
        }
        let mut out = vec![self.cla, self.ins, self.p1, self.p2];
        if !self.data.is_empty() {
            out.push(self.data.len() as u8);
            out.extend_from_slice(&self.data);
        }
        if let Some(le) = self.le {
            // Le = 256 is encoded as 0x00
            out.push(le as u8);
        }
        Ok(out)
    }
}

/// Short Le byte: 0x00 means 256
fn short_le(byte: u8) -> u32 {
    if byte == 0 {
        256
    } else {
        byte as u32
    }
}

/// Extended Le word: 0x0000 means 65536
fn extended_le(hi: u8, lo: u8) -> u32 {
    match u16::from_be_bytes([hi, lo]) {
        0 => 65536,
        n => n as u32,
    }
}

/// Parse raw bytes into an APDU
///
/// Supports both short and extended formats:
/// - Short: CLA INS P1 P2 [Lc Data] [Le]
/// - Extended: CLA INS P1 P2 00 Lc1 Lc2 Data [Le1 Le2]
pub fn parse_apdu(data: &[u8]) -> Result<APDU, APDUError> {
    let (header, body) = match data {
        [cla, ins, p1, p2, body @ ..] => (APDU::new(*cla, *ins, *p1, *p2), body),
        _ => return Err(APDUError::TooShort(data.len())),
    };

    if body.is_empty() {
        return Ok(header);
    }

    // A leading 00 followed by at least two more bytes announces extended length
    if body[0] == 0x00 && body.len() >= 3 {
        let ext = &body[1..];
        let lc = u16::from_be_bytes([ext[0], ext[1]]) as usize;
        let consistent = ext.len() == 2 || ext.len() == 2 + lc || ext.len() == 2 + lc + 2;
        if consistent {
            return parse_extended(header, ext);
        }
        // Some T=1 stacks prefix a short APDU with 00; accept it if the rest parses
        if let Ok(apdu) = parse_short(header.clone(), ext) {
            return Ok(apdu);
        }
    }

    parse_short(header, body)
}

fn parse_short(mut apdu: APDU, body: &[u8]) -> Result<APDU, APDUError> {
    match body {
        [] => Ok(apdu),
        // Case 2: Le only
        [le] => {
            apdu.le = Some(short_le(*le));
            Ok(apdu)
        }
        [lc, rest @ ..] => {
            let lc = *lc as usize;
            if rest.len() == lc {
                // Case 3: Lc + data
                apdu.data = rest.to_vec();
                Ok(apdu)
            } else if rest.len() == lc + 1 {
                // Case 4: Lc + data + Le
                apdu.data = rest[..lc].to_vec();
                apdu.le = Some(short_le(rest[lc]));
                Ok(apdu)
            } else {
                Err(APDUError::InvalidLength)
            }
        }
    }
}

fn parse_extended(mut apdu: APDU, body: &[u8]) -> Result<APDU, APDUError> {
    if body.len() < 2 {
        return Err(APDUError::InvalidExtendedFormat);
    }

    // Case 2E: extended Le only
    if body.len() == 2 {
        apdu.le = Some(extended_le(body[0], body[1]));
        return Ok(apdu);
    }

    let lc = u16::from_be_bytes([body[0], body[1]]) as usize;
    let rest = &body[2..];
    if rest.len() < lc {
        return Err(APDUError::InvalidLength);
    }
    apdu.data = rest[..lc].to_vec();

    match &rest[lc..] {
        // Case 3E
        [] => Ok(apdu),
        // Case 4E
        [hi, lo] => {
            apdu.le = Some(extended_le(*hi, *lo));
            Ok(apdu)
        }
        _ => Err(APDUError::InvalidExtendedFormat),
    }
}

/// Instruction bytes understood by the card
pub mod ins {
    /// Card-level applet selection
    pub const SELECT: u8 = 0xA4;
    pub const GET_SERVICE_NONCE: u8 = 0xCA;
    pub const ENCRYPT_BLOCK: u8 = 0x10;
    pub const DECRYPT_AND_CHECK: u8 = 0x11;
    pub const RESPOND_CHALLENGE: u8 = 0x12;
    pub const READ_ASSET: u8 = 0x13;
    pub const SIGN_ASSET: u8 = 0x51;
    pub const EXPORT_PUBLIC_KEY: u8 = 0x52;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case1_no_data_no_le() {
        let apdu = parse_apdu(&[0x80, 0x12, 0x00, 0x00]).unwrap();
        assert_eq!(apdu.cla, 0x80);
        assert_eq!(apdu.ins, ins::RESPOND_CHALLENGE);
        assert!(apdu.data.is_empty());
        assert!(apdu.le.is_none());
    }

    #[test]
    fn test_case2_le_zero_means_256() {
        let apdu = parse_apdu(&[0x80, 0x13, 0x00, 0x00, 0x00]).unwrap();
        assert!(apdu.data.is_empty());
        assert_eq!(apdu.le, Some(256));
    }

    #[test]
    fn test_case3_lc_data() {
        let mut raw = vec![0x80, 0x11, 0x00, 0x00, 0x10];
        raw.extend_from_slice(&[0xAB; 16]);
        let apdu = parse_apdu(&raw).unwrap();
        assert_eq!(apdu.ins, ins::DECRYPT_AND_CHECK);
        assert_eq!(apdu.data, vec![0xAB; 16]);
        assert!(apdu.le.is_none());
    }

    #[test]
    fn test_case4_lc_data_le() {
        let apdu = parse_apdu(&[0x00, 0xA4, 0x04, 0x00, 0x06, 0xAE, 0x33, 0x93, 0xEE, 0x01, 0x02, 0x00]).unwrap();
        assert_eq!(apdu.ins, ins::SELECT);
        assert_eq!(apdu.data, vec![0xAE, 0x33, 0x93, 0xEE, 0x01, 0x02]);
        assert_eq!(apdu.le, Some(256));
    }

    #[test]
    fn test_extended_lc_data_le() {
        let mut raw = vec![0x80, 0x10, 0x00, 0x00, 0x00, 0x01, 0x00];
        raw.extend_from_slice(&[0x11; 256]);
        raw.extend_from_slice(&[0x01, 0x00]);
        let apdu = parse_apdu(&raw).unwrap();
        assert_eq!(apdu.data.len(), 256);
        assert_eq!(apdu.le, Some(256));
    }

    #[test]
    fn test_extended_le_only() {
        let apdu = parse_apdu(&[0x80, 0x13, 0x00, 0x10, 0x00, 0x00, 0x00]).unwrap();
        assert!(apdu.data.is_empty());
        assert_eq!(apdu.le, Some(65536));
    }

    #[test]
    fn test_lc_mismatch() {
        assert_eq!(
            parse_apdu(&[0x80, 0x10, 0x00, 0x00, 0x10, 0x01, 0x02]),
            Err(APDUError::InvalidLength)
        );
    }

    #[test]
    fn test_p1p2_offset() {
        let apdu = parse_apdu(&[0x80, 0x13, 0x01, 0x02]).unwrap();
        assert_eq!(apdu.p1p2(), 0x0102);
    }

    #[test]
    fn test_too_short() {
        assert!(matches!(
            parse_apdu(&[0x80, 0xCA, 0x00]),
            Err(APDUError::TooShort(3))
        ));
    }

    #[test]
    fn test_to_bytes_reparses() {
        let apdu = APDU::with_data(0x80, 0x10, 0x00, 0x00, vec![0x42; 32]).with_le(256);
        let raw = apdu.to_bytes().unwrap();
        assert_eq!(raw[4], 32);
        assert_eq!(*raw.last().unwrap(), 0x00);
        assert_eq!(parse_apdu(&raw).unwrap(), apdu);
    }
}
