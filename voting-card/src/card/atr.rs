//! ATR (Answer To Reset) handling
//!
//! Builds the ATR the virtual voting card returns on power-up and reset.

/// Build a T=1 ATR carrying the given historical bytes (at most 15)
pub fn build_atr(historical_bytes: &[u8]) -> Vec<u8> {
    let hist_len = historical_bytes.len().min(15);
    let mut atr = Vec::with_capacity(4 + hist_len);

    // TS: direct convention
    atr.push(0x3B);
    // T0: TD1 present, K historical bytes
    atr.push(0x80 | hist_len as u8);
    // TD1: T=1, no further interface bytes
    atr.push(0x01);
    atr.extend_from_slice(&historical_bytes[..hist_len]);

    // TCK: XOR of T0 through the last historical byte
    let tck = atr[1..].iter().fold(0u8, |acc, &b| acc ^ b);
    atr.push(tck);

    atr
}

/// ATR for the voting card
pub fn create_voting_atr() -> Vec<u8> {
    // ISO 7816-4 compact-TLV historical bytes
    let historical = [
        0x80, // Category indicator: compact TLV with status indicator
        0x31, 0xC0, // Card service data: select by full DF name
        0x73, 0x80, 0x21, 0x40, // Card capabilities: short + extended Lc/Le
        0x90, 0x00, // Status word: success
    ];

    build_atr(&historical)
}
