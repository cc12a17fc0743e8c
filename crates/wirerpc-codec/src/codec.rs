//! The codec contract shared by clients, servers and generated stubs.

use crate::error::Result;
use crate::message::MessageHeader;

/// Serializes typed values into a growable buffer and reads them back.
///
/// A codec is in write mode after creation or [`Codec::reset`], and in read
/// mode after [`Codec::set_array`]. Fields are written in declaration order
/// and read back in the same order; there are no tags.
///
/// Unsigned writes take `i64` so that negative and oversized values are
/// rejected with an error rather than truncated.
pub trait Codec: Send {
    /// Write the 8-byte envelope.
    fn start_write_message(&mut self, header: &MessageHeader);
    /// Read the 8-byte envelope, rejecting unknown versions and types.
    fn start_read_message(&mut self) -> Result<MessageHeader>;

    fn write_bool(&mut self, value: bool);
    fn write_int8(&mut self, value: i8);
    fn write_int16(&mut self, value: i16);
    fn write_int32(&mut self, value: i32);
    fn write_int64(&mut self, value: i64);
    fn write_uint8(&mut self, value: i64) -> Result<()>;
    fn write_uint16(&mut self, value: i64) -> Result<()>;
    fn write_uint32(&mut self, value: i64) -> Result<()>;
    /// Always fails: 64-bit unsigned values have no wire form in this codec.
    fn write_uint64(&mut self, value: u64) -> Result<()>;
    fn write_float(&mut self, value: f32);
    fn write_double(&mut self, value: f64);
    /// `u32` byte length followed by the UTF-8 bytes.
    fn write_string(&mut self, value: &str) -> Result<()>;
    /// `u32` byte length followed by the raw bytes.
    fn write_binary(&mut self, value: &[u8]) -> Result<()>;
    /// `u32` element count; elements follow.
    fn start_write_list(&mut self, len: usize) -> Result<()>;
    /// `u32` discriminator; the selected arm follows.
    fn start_write_union(&mut self, discriminator: u32);
    /// `u32` 1 when the optional value is present, 0 when it is null.
    fn write_null_flag(&mut self, present: bool);

    fn read_bool(&mut self) -> Result<bool>;
    fn read_int8(&mut self) -> Result<i8>;
    fn read_int16(&mut self) -> Result<i16>;
    fn read_int32(&mut self) -> Result<i32>;
    fn read_int64(&mut self) -> Result<i64>;
    fn read_uint8(&mut self) -> Result<u8>;
    fn read_uint16(&mut self) -> Result<u16>;
    fn read_uint32(&mut self) -> Result<u32>;
    /// Always fails, mirroring [`Codec::write_uint64`].
    fn read_uint64(&mut self) -> Result<u64>;
    fn read_float(&mut self) -> Result<f32>;
    fn read_double(&mut self) -> Result<f64>;
    fn read_string(&mut self) -> Result<String>;
    fn read_binary(&mut self) -> Result<Vec<u8>>;
    fn start_read_list(&mut self) -> Result<u32>;
    fn start_read_union(&mut self) -> Result<u32>;
    /// `true` when the optional value that follows is present.
    fn read_null_flag(&mut self) -> Result<bool>;

    /// Bytes written so far (write mode) or the wrapped bytes (read mode).
    fn array(&self) -> &[u8];
    /// Switch to read mode over a copy of `data`.
    fn set_array(&mut self, data: &[u8]);
    /// Discard all content and return to an empty write-mode buffer.
    fn reset(&mut self);
    /// Bytes left to read.
    fn remaining(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.array().is_empty()
    }
}
