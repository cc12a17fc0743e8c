//! Range checks for unsigned wire types.
//!
//! Unsigned values arrive as `i64` so that negative and oversized inputs can
//! be rejected instead of silently truncated. Every unsigned write path goes
//! through [`UnsignedKind::check`].

use std::fmt;

use crate::error::{CodecError, Result};

/// Unsigned wire integer kinds and their bit widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnsignedKind {
    U8,
    U16,
    U32,
}

impl UnsignedKind {
    /// Width of the kind on the wire, in bits.
    pub const fn bit_width(self) -> u32 {
        match self {
            UnsignedKind::U8 => 8,
            UnsignedKind::U16 => 16,
            UnsignedKind::U32 => 32,
        }
    }

    /// Largest accepted value, `2^width - 1`.
    pub const fn max(self) -> i64 {
        (1i64 << self.bit_width()) - 1
    }

    /// Accept `0 <= value <= 2^width - 1`, returning it narrowed to `u32`.
    pub fn check(self, value: i64) -> Result<u32> {
        if (0..=self.max()).contains(&value) {
            Ok(value as u32)
        } else {
            Err(CodecError::ValueOutOfRange { kind: self, value })
        }
    }
}

impl fmt::Display for UnsignedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UnsignedKind::U8 => "uint8",
            UnsignedKind::U16 => "uint16",
            UnsignedKind::U32 => "uint32",
        };
        f.write_str(name)
    }
}
