//! Little-endian codec over a growable [`BytesMut`].

use bytes::{Buf, BufMut, BytesMut};

use crate::codec::Codec;
use crate::error::{CodecError, Result};
use crate::message::MessageHeader;
use crate::range::UnsignedKind;

/// Initial capacity of a write-mode buffer.
pub const DEFAULT_BUFFER_SIZE: usize = 256;

/// The standard wire codec.
///
/// Writes append at the end of the buffer; reads advance a cursor from the
/// front. When a write would not fit, capacity grows to
/// `(capacity + needed) * 2`.
pub struct BasicCodec {
    buf: BytesMut,
    read_pos: usize,
}

impl BasicCodec {
    /// Empty write-mode codec with [`DEFAULT_BUFFER_SIZE`] capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            read_pos: 0,
        }
    }

    /// Read-mode codec over a copy of `data`.
    pub fn from_slice(data: &[u8]) -> Self {
        Self {
            buf: BytesMut::from(data),
            read_pos: 0,
        }
    }

    /// Current buffer capacity.
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    fn prepare_for_write(&mut self, needed: usize) {
        let free = self.buf.capacity() - self.buf.len();
        if needed > free {
            let target = (self.buf.capacity() + needed) * 2;
            self.buf.reserve(target - self.buf.len());
        }
    }

    fn put_unsigned(&mut self, kind: UnsignedKind, value: i64) -> Result<()> {
        let value = kind.check(value)?;
        match kind {
            UnsignedKind::U8 => self.write_int8(value as u8 as i8),
            UnsignedKind::U16 => self.write_int16(value as u16 as i16),
            UnsignedKind::U32 => self.write_int32(value as i32),
        }
        Ok(())
    }

    fn put_length(&mut self, len: usize) -> Result<()> {
        let len = u32::try_from(len).map_err(|_| CodecError::LengthOverflow(len))?;
        self.prepare_for_write(4);
        self.buf.put_u32_le(len);
        Ok(())
    }

    fn take(&mut self, needed: usize) -> Result<&[u8]> {
        let remaining = self.remaining();
        if needed > remaining {
            return Err(CodecError::BufferUnderflow { needed, remaining });
        }
        let start = self.read_pos;
        self.read_pos += needed;
        Ok(&self.buf[start..start + needed])
    }

    fn take_length(&mut self) -> Result<usize> {
        Ok(self.take(4)?.get_u32_le() as usize)
    }
}

impl Default for BasicCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BasicCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCodec")
            .field("len", &self.buf.len())
            .field("capacity", &self.buf.capacity())
            .field("read_pos", &self.read_pos)
            .finish()
    }
}

impl Codec for BasicCodec {
    fn start_write_message(&mut self, header: &MessageHeader) {
        self.prepare_for_write(8);
        self.buf.put_u32_le(header.pack());
        self.buf.put_u32_le(header.sequence);
    }

    fn start_read_message(&mut self) -> Result<MessageHeader> {
        let word = self.read_uint32()?;
        let sequence = self.read_uint32()?;
        MessageHeader::unpack(word, sequence)
    }

    fn write_bool(&mut self, value: bool) {
        self.prepare_for_write(1);
        self.buf.put_u8(u8::from(value));
    }

    fn write_int8(&mut self, value: i8) {
        self.prepare_for_write(1);
        self.buf.put_i8(value);
    }

    fn write_int16(&mut self, value: i16) {
        self.prepare_for_write(2);
        self.buf.put_i16_le(value);
    }

    fn write_int32(&mut self, value: i32) {
        self.prepare_for_write(4);
        self.buf.put_i32_le(value);
    }

    fn write_int64(&mut self, value: i64) {
        self.prepare_for_write(8);
        self.buf.put_i64_le(value);
    }

    fn write_uint8(&mut self, value: i64) -> Result<()> {
        self.put_unsigned(UnsignedKind::U8, value)
    }

    fn write_uint16(&mut self, value: i64) -> Result<()> {
        self.put_unsigned(UnsignedKind::U16, value)
    }

    fn write_uint32(&mut self, value: i64) -> Result<()> {
        self.put_unsigned(UnsignedKind::U32, value)
    }

    fn write_uint64(&mut self, _value: u64) -> Result<()> {
        Err(CodecError::Unsupported("uint64"))
    }

    fn write_float(&mut self, value: f32) {
        self.prepare_for_write(4);
        self.buf.put_f32_le(value);
    }

    fn write_double(&mut self, value: f64) {
        self.prepare_for_write(8);
        self.buf.put_f64_le(value);
    }

    fn write_string(&mut self, value: &str) -> Result<()> {
        self.write_binary(value.as_bytes())
    }

    fn write_binary(&mut self, value: &[u8]) -> Result<()> {
        self.put_length(value.len())?;
        self.prepare_for_write(value.len());
        self.buf.put_slice(value);
        Ok(())
    }

    fn start_write_list(&mut self, len: usize) -> Result<()> {
        self.put_length(len)
    }

    fn start_write_union(&mut self, discriminator: u32) {
        self.prepare_for_write(4);
        self.buf.put_u32_le(discriminator);
    }

    fn write_null_flag(&mut self, present: bool) {
        self.prepare_for_write(4);
        self.buf.put_u32_le(u32::from(present));
    }

    fn read_bool(&mut self) -> Result<bool> {
        Ok(self.take(1)?[0] != 0)
    }

    fn read_int8(&mut self) -> Result<i8> {
        Ok(self.take(1)?.get_i8())
    }

    fn read_int16(&mut self) -> Result<i16> {
        Ok(self.take(2)?.get_i16_le())
    }

    fn read_int32(&mut self) -> Result<i32> {
        Ok(self.take(4)?.get_i32_le())
    }

    fn read_int64(&mut self) -> Result<i64> {
        Ok(self.take(8)?.get_i64_le())
    }

    fn read_uint8(&mut self) -> Result<u8> {
        Ok(self.take(1)?.get_u8())
    }

    fn read_uint16(&mut self) -> Result<u16> {
        Ok(self.take(2)?.get_u16_le())
    }

    fn read_uint32(&mut self) -> Result<u32> {
        Ok(self.take(4)?.get_u32_le())
    }

    fn read_uint64(&mut self) -> Result<u64> {
        Err(CodecError::Unsupported("uint64"))
    }

    fn read_float(&mut self) -> Result<f32> {
        Ok(self.take(4)?.get_f32_le())
    }

    fn read_double(&mut self) -> Result<f64> {
        Ok(self.take(8)?.get_f64_le())
    }

    fn read_string(&mut self) -> Result<String> {
        let raw = self.read_binary()?;
        Ok(String::from_utf8(raw)?)
    }

    fn read_binary(&mut self) -> Result<Vec<u8>> {
        let len = self.take_length()?;
        Ok(self.take(len)?.to_vec())
    }

    fn start_read_list(&mut self) -> Result<u32> {
        self.read_uint32()
    }

    fn start_read_union(&mut self) -> Result<u32> {
        self.read_uint32()
    }

    fn read_null_flag(&mut self) -> Result<bool> {
        Ok(self.read_uint32()? != 0)
    }

    fn array(&self) -> &[u8] {
        &self.buf
    }

    fn set_array(&mut self, data: &[u8]) {
        self.buf = BytesMut::from(data);
        self.read_pos = 0;
    }

    fn reset(&mut self) {
        self.buf = BytesMut::with_capacity(DEFAULT_BUFFER_SIZE);
        self.read_pos = 0;
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.read_pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{MessageType, CODEC_VERSION};

    fn reader(codec: &BasicCodec) -> BasicCodec {
        BasicCodec::from_slice(codec.array())
    }

    #[test]
    fn primitives_are_little_endian() {
        let mut codec = BasicCodec::new();
        codec.write_bool(true);
        codec.write_int16(0x0102);
        codec.write_int32(-2);
        codec.write_uint16(0xBEEF).unwrap();

        assert_eq!(
            codec.array(),
            &[0x01, 0x02, 0x01, 0xFE, 0xFF, 0xFF, 0xFF, 0xEF, 0xBE]
        );
    }

    #[test]
    fn mixed_fields_read_back_in_order() {
        let mut codec = BasicCodec::new();
        codec.write_int8(-5);
        codec.write_int64(i64::MIN);
        codec.write_uint8(255).unwrap();
        codec.write_uint32(u32::MAX.into()).unwrap();
        codec.write_float(1.5);
        codec.write_double(-0.25);
        codec.write_string("héllo").unwrap();
        codec.write_binary(&[0, 1, 2]).unwrap();
        codec.start_write_list(2).unwrap();
        codec.start_write_union(9);
        codec.write_null_flag(false);

        let mut r = reader(&codec);
        assert_eq!(r.read_int8().unwrap(), -5);
        assert_eq!(r.read_int64().unwrap(), i64::MIN);
        assert_eq!(r.read_uint8().unwrap(), 255);
        assert_eq!(r.read_uint32().unwrap(), u32::MAX);
        assert_eq!(r.read_float().unwrap(), 1.5);
        assert_eq!(r.read_double().unwrap(), -0.25);
        assert_eq!(r.read_string().unwrap(), "héllo");
        assert_eq!(r.read_binary().unwrap(), vec![0, 1, 2]);
        assert_eq!(r.start_read_list().unwrap(), 2);
        assert_eq!(r.start_read_union().unwrap(), 9);
        assert!(!r.read_null_flag().unwrap());
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn string_is_length_prefixed_utf8() {
        let mut codec = BasicCodec::new();
        codec.write_string("hi").unwrap();
        assert_eq!(codec.array(), &[2, 0, 0, 0, b'h', b'i']);
    }

    #[test]
    fn null_flag_is_a_u32() {
        let mut codec = BasicCodec::new();
        codec.write_null_flag(true);
        codec.write_null_flag(false);
        assert_eq!(codec.array(), &[1, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn unsigned_range_violations_leave_buffer_untouched() {
        let mut codec = BasicCodec::new();
        assert!(codec.write_uint8(256).is_err());
        assert!(codec.write_uint16(-1).is_err());
        assert!(codec.write_uint32(1 << 32).is_err());
        assert!(codec.is_empty());
    }

    #[test]
    fn uint64_is_unsupported() {
        let mut codec = BasicCodec::new();
        assert!(matches!(
            codec.write_uint64(1),
            Err(CodecError::Unsupported("uint64"))
        ));
        assert!(matches!(
            codec.read_uint64(),
            Err(CodecError::Unsupported("uint64"))
        ));
    }

    #[test]
    fn header_round_trip() {
        let header = MessageHeader::new(MessageType::Invocation, 2, 5, 41);
        let mut codec = BasicCodec::new();
        codec.start_write_message(&header);
        assert_eq!(codec.array().len(), 8);
        assert_eq!(codec.array()[3], CODEC_VERSION);

        let mut r = reader(&codec);
        assert_eq!(r.start_read_message().unwrap(), header);
    }

    #[test]
    fn header_with_wrong_version_is_rejected() {
        let mut codec = BasicCodec::new();
        codec.write_uint32(0x0702_0500).unwrap();
        codec.write_uint32(1).unwrap();

        let mut r = reader(&codec);
        assert!(matches!(
            r.start_read_message(),
            Err(CodecError::UnsupportedVersion { found: 7, .. })
        ));
    }

    #[test]
    fn short_buffer_underflows() {
        let mut r = BasicCodec::from_slice(&[1, 2, 3]);
        assert!(matches!(
            r.read_int32(),
            Err(CodecError::BufferUnderflow {
                needed: 4,
                remaining: 3
            })
        ));
    }

    #[test]
    fn truncated_string_underflows() {
        let mut r = BasicCodec::from_slice(&[10, 0, 0, 0, b'a']);
        assert!(matches!(
            r.read_string(),
            Err(CodecError::BufferUnderflow { needed: 10, .. })
        ));
    }

    #[test]
    fn invalid_utf8_is_reported() {
        let mut r = BasicCodec::from_slice(&[2, 0, 0, 0, 0xC3, 0x28]);
        assert!(matches!(r.read_string(), Err(CodecError::InvalidUtf8(_))));
    }

    #[test]
    fn grows_past_default_capacity() {
        let mut codec = BasicCodec::new();
        assert!(codec.capacity() >= DEFAULT_BUFFER_SIZE);

        let blob = vec![0xAB; 1000];
        codec.write_binary(&blob).unwrap();
        assert_eq!(codec.array().len(), 1004);
        assert!(codec.capacity() >= 1004);

        let mut r = reader(&codec);
        assert_eq!(r.read_binary().unwrap(), blob);
    }

    #[test]
    fn array_ignores_spare_capacity() {
        let mut codec = BasicCodec::with_capacity(1024);
        codec.write_int32(7);
        assert_eq!(codec.array(), &[7, 0, 0, 0]);
    }

    #[test]
    fn reset_returns_to_empty_write_mode() {
        let mut codec = BasicCodec::from_slice(&[1, 2, 3, 4]);
        codec.read_int16().unwrap();
        codec.reset();

        assert!(codec.is_empty());
        assert_eq!(codec.remaining(), 0);
        codec.write_bool(false);
        assert_eq!(codec.array(), &[0]);
    }

    #[test]
    fn set_array_rewinds_to_start() {
        let mut codec = BasicCodec::new();
        codec.write_int32(1);
        codec.set_array(&[9, 0, 0, 0]);
        assert_eq!(codec.read_int32().unwrap(), 9);
    }
}
