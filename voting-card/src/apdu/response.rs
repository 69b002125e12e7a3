//! APDU Response handling
//!
//! A response is the payload the card sends back followed by SW1/SW2.

use super::status::SW;

/// A response APDU
///
/// # Example
/// ```ignore
/// let response = Response::success(vec![0x01, 0x02]);
/// assert!(response.is_okay());
///
/// let error = Response::error(SW::CONDITIONS_NOT_SATISFIED);
/// assert!(!error.is_okay());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Response data (without status words)
    pub data: Vec<u8>,
    /// Status word 1 (SW1)
    pub sw1: u8,
    /// Status word 2 (SW2)
    pub sw2: u8,
}

impl Response {
    /// Create a new response with data and status word
    pub fn new(data: Vec<u8>, sw: u16) -> Self {
        let [sw1, sw2] = sw.to_be_bytes();
        Self { data, sw1, sw2 }
    }

    /// Success (0x9000) with data
    pub fn success(data: Vec<u8>) -> Self {
        Self::new(data, SW::SUCCESS)
    }

    /// Success (0x9000) without data
    pub fn ok() -> Self {
        Self::success(Vec::new())
    }

    /// Error status word, no data
    pub fn error(sw: u16) -> Self {
        Self::new(Vec::new(), sw)
    }

    /// True for 0x9000
    pub fn is_okay(&self) -> bool {
        self.sw() == SW::SUCCESS
    }

    /// Combined status word
    pub fn sw(&self) -> u16 {
        u16::from_be_bytes([self.sw1, self.sw2])
    }

    /// Wire form: data ‖ SW1 ‖ SW2
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(self.data.len() + 2);
        result.extend_from_slice(&self.data);
        result.push(self.sw1);
        result.push(self.sw2);
        result
    }

    /// Split a raw response received from the card.
    ///
    /// Returns None when fewer than two bytes are present.
    pub fn from_bytes(raw: &[u8]) -> Option<Self> {
        let split = raw.len().checked_sub(2)?;
        let (data, sw) = raw.split_at(split);
        Some(Self {
            data: data.to_vec(),
            sw1: sw[0],
            sw2: sw[1],
        })
    }

    /// Check if response has no data
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::ok()
    }
}

impl From<u16> for Response {
    /// Create an error response from a status word
    fn from(sw: u16) -> Self {
        Self::error(sw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_response() {
        let resp = Response::success(vec![0xDE, 0xAD, 0xBE, 0xEF]);
        assert!(resp.is_okay());
        assert_eq!(resp.sw(), 0x9000);
        assert_eq!(resp.to_bytes(), vec![0xDE, 0xAD, 0xBE, 0xEF, 0x90, 0x00]);
    }

    #[test]
    fn test_error_response() {
        let resp = Response::error(SW::SECURITY_STATUS_NOT_SATISFIED);
        assert!(!resp.is_okay());
        assert!(resp.is_empty());
        assert_eq!(resp.to_bytes(), vec![0x69, 0x82]);
    }

    #[test]
    fn test_from_bytes() {
        let resp = Response::from_bytes(&[0x01, 0x02, 0x90, 0x00]).unwrap();
        assert_eq!(resp.data, vec![0x01, 0x02]);
        assert!(resp.is_okay());

        let bare = Response::from_bytes(&[0x6D, 0x00]).unwrap();
        assert!(bare.is_empty());
        assert_eq!(bare.sw(), SW::INS_NOT_SUPPORTED);

        assert!(Response::from_bytes(&[0x90]).is_none());
    }

    #[test]
    fn test_from_sw() {
        let resp: Response = 0x6A82.into();
        assert_eq!(resp.sw(), SW::FILE_NOT_FOUND);
        assert!(!resp.is_okay());
    }
}
