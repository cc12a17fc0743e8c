//! Table-driven CRC-16.
//!
//! Polynomial `0x1021`, MSB-first, no final XOR. The default start value is
//! `0xEF4A`, not zero, so this is not plain CRC-16/CCITT: check value for
//! `b"123456789"` is `0x89AC`.

/// Generator polynomial.
pub const CRC16_POLY: u16 = 0x1021;

/// Start value used by the framing layer unless configured otherwise.
pub const DEFAULT_CRC_START: u16 = 0xEF4A;

static CRC_TABLE: [u16; 256] = build_table();

const fn build_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = 0u16;
        let mut y = (i as u16) << 8;
        let mut bit = 0;
        while bit < 8 {
            let top = (crc ^ y) & 0x8000;
            crc <<= 1;
            if top != 0 {
                crc ^= CRC16_POLY;
            }
            y <<= 1;
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// CRC-16 engine. Cheap to copy; all instances share one static table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crc16 {
    start: u16,
}

impl Crc16 {
    /// Engine with the default start value.
    pub const fn new() -> Self {
        Self::with_start(DEFAULT_CRC_START)
    }

    /// Engine with an explicit start value.
    pub const fn with_start(start: u16) -> Self {
        Self { start }
    }

    /// The configured start value.
    pub const fn start(&self) -> u16 {
        self.start
    }

    /// The shared lookup table.
    pub fn table() -> &'static [u16; 256] {
        &CRC_TABLE
    }

    /// Checksum of `data`. Any length, including zero, is accepted.
    pub fn compute(&self, data: &[u8]) -> u16 {
        data.iter().fold(self.start, |crc, &byte| {
            let index = ((crc >> 8) ^ u16::from(byte)) & 0xFF;
            (crc << 8) ^ CRC_TABLE[index as usize]
        })
    }
}

impl Default for Crc16 {
    fn default() -> Self {
        Self::new()
    }
}

/// Checksum of `data` with the default start value.
pub fn crc16(data: &[u8]) -> u16 {
    Crc16::new().compute(data)
}
