//! C3 frame checksum
//!
//! CRC-16/ARC: bit-reversed polynomial 0xA001, zero seed, processed one
//! byte at a time (ported from libcrc's `crc_16`).

use tracing::trace;

/// Reversed CRC-16 polynomial
pub const CRC_POLY_16: u16 = 0xA001;

/// Default seed
pub const CRC_START_16: u16 = 0x0000;

fn divisor(mut byte: u16) -> u16 {
    let mut poly: u16 = 0;

    for _ in 0..8 {
        poly = if (poly ^ byte) & 0x0001 == 1 {
            (poly >> 1) ^ CRC_POLY_16
        } else {
            poly >> 1
        };
        byte >>= 1;
    }

    poly
}

/// Incremental CRC-16 calculation
///
/// # Examples
///
/// ```
/// use zkc3_core::checksum::Crc16;
///
/// let mut crc = Crc16::new();
/// crc.update(b"1234");
/// crc.update_str("56789");
/// assert_eq!(crc.value(), 0xBB3D);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crc16 {
    crc: u16,
}

impl Crc16 {
    pub fn new() -> Self {
        Self::with_seed(CRC_START_16)
    }

    pub fn with_seed(seed: u16) -> Self {
        Self { crc: seed }
    }

    pub fn add_byte(&mut self, byte: u8) {
        let msb = self.crc >> 8;
        self.crc = msb ^ divisor((self.crc ^ u16::from(byte)) & 0x00FF);
    }

    pub fn update(&mut self, data: &[u8]) {
        for &byte in data {
            self.add_byte(byte);
        }
    }

    /// Feed an ASCII fragment, one byte per character
    ///
    /// Non-ASCII characters contribute the low byte of their code point.
    pub fn update_str(&mut self, data: &str) {
        for c in data.chars() {
            self.add_byte(c as u32 as u8);
        }
    }

    pub fn value(&self) -> u16 {
        self.crc
    }
}

impl Default for Crc16 {
    fn default() -> Self {
        Self::new()
    }
}

/// Calculate the CRC-16 of a byte slice
///
/// # Examples
///
/// ```
/// use zkc3_core::checksum;
///
/// assert_eq!(checksum::crc16(b"123456789"), 0xBB3D);
/// ```
pub fn crc16(data: &[u8]) -> u16 {
    crc16_with_seed(data, CRC_START_16)
}

/// Calculate the CRC-16 of a byte slice, starting from `seed`
pub fn crc16_with_seed(data: &[u8], seed: u16) -> u16 {
    let mut crc = Crc16::with_seed(seed);
    crc.update(data);

    trace!(
        len = data.len(),
        checksum = format!("0x{:04X}", crc.value()),
        "Calculated checksum"
    );

    crc.value()
}

/// Calculate the CRC-16 over a sequence of ASCII fragments
pub fn crc16_str<'a>(fragments: impl IntoIterator<Item = &'a str>) -> u16 {
    let mut crc = Crc16::new();
    for fragment in fragments {
        crc.update_str(fragment);
    }
    crc.value()
}

/// Verify checksum
pub fn verify(data: &[u8], expected: u16) -> bool {
    crc16(data) == expected
}
