//! Helpers for computing cyclic redundancy checks.
//!
//! The same 16-bit check protects the document header (over its first twelve
//! bytes) and the whole document (over the header and all records).

const CRC_TABLE: [u16; 16] = [
    0x0000, 0xCC01, 0xD801, 0x1400, 0xF001, 0x3C00, 0x2800, 0xE401, 0xA001, 0x6C00, 0x7800,
    0xB401, 0x5000, 0x9C01, 0x8801, 0x4400,
];

/// Accumulate a single byte into a cyclic redundancy check value.
pub const fn update(mut crc: u16, b: u8) -> u16 {
    // Lower four bits.
    let tmp = CRC_TABLE[(crc & 0xF) as usize];
    crc = (crc >> 4) & 0x0FFF;
    crc = crc ^ tmp ^ CRC_TABLE[(b & 0xF) as usize];

    // Upper four bits.
    let tmp = CRC_TABLE[(crc & 0xF) as usize];
    crc = (crc >> 4) & 0x0FFF;
    crc ^ tmp ^ CRC_TABLE[((b >> 4) & 0xF) as usize]
}

/// Accumulate a slice of bytes into a cyclic redundancy check value.
pub fn compute_crc(init: u16, r: &[u8]) -> u16 {
    r.iter().fold(init, |acc, b| update(acc, *b))
}

/// Compute the cyclic redundancy check of a slice of bytes.
pub fn compute(r: &[u8]) -> u16 {
    compute_crc(0, r)
}
