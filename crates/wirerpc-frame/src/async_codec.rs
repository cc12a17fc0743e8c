//! `tokio_util` codec for framing async byte streams.

use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use wirerpc_codec::Crc16;

use crate::codec::{decode_frame, encode_frame, FrameConfig};
use crate::error::{FrameError, Result};
use crate::format::FrameFormat;

/// Frames message bodies for `FramedRead` / `FramedWrite`.
///
/// Decoded items are verified bodies. Header and body checksum failures
/// surface as stream errors.
#[derive(Debug, Clone)]
pub struct RpcFrameCodec {
    format: FrameFormat,
    crc: Crc16,
    max_payload_size: usize,
}

impl RpcFrameCodec {
    pub fn new(format: FrameFormat) -> Self {
        Self::from_config(&FrameConfig::with_format(format))
    }

    pub fn from_config(config: &FrameConfig) -> Self {
        Self {
            format: config.format,
            crc: config.crc(),
            max_payload_size: config.max_payload_size,
        }
    }

    pub fn format(&self) -> FrameFormat {
        self.format
    }
}

impl Default for RpcFrameCodec {
    fn default() -> Self {
        Self::from_config(&FrameConfig::default())
    }
}

impl Decoder for RpcFrameCodec {
    type Item = Bytes;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>> {
        let frame = decode_frame(self.format, &self.crc, src, self.max_payload_size)?;
        if frame.is_none() {
            src.reserve(self.format.header_len());
        }
        Ok(frame.map(|frame| frame.body))
    }
}

impl Encoder<Bytes> for RpcFrameCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<()> {
        <Self as Encoder<&[u8]>>::encode(self, item.as_ref(), dst)
    }
}

impl Encoder<&[u8]> for RpcFrameCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &[u8], dst: &mut BytesMut) -> Result<()> {
        if item.len() > self.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: item.len(),
                max: self.max_payload_size,
            });
        }
        encode_frame(self.format, &self.crc, item, dst)
    }
}

#[cfg(test)]
mod tests {
    use futures_util::{SinkExt, StreamExt};
    use tokio::io::AsyncWriteExt;
    use tokio_util::codec::{FramedRead, FramedWrite};

    use super::*;

    #[tokio::test]
    async fn frames_cross_a_duplex_pipe() {
        for format in [FrameFormat::Basic, FrameFormat::Guarded] {
            let (client, server) = tokio::io::duplex(1024);
            let mut sink = FramedWrite::new(client, RpcFrameCodec::new(format));
            let mut stream = FramedRead::new(server, RpcFrameCodec::new(format));

            sink.send(Bytes::from_static(b"first")).await.unwrap();
            sink.send(Bytes::from_static(b"second")).await.unwrap();

            assert_eq!(stream.next().await.unwrap().unwrap().as_ref(), b"first");
            assert_eq!(stream.next().await.unwrap().unwrap().as_ref(), b"second");
        }
    }

    #[tokio::test]
    async fn split_writes_reassemble() {
        let mut wire = BytesMut::new();
        encode_frame(FrameFormat::Guarded, &Crc16::new(), b"fragmented", &mut wire).unwrap();

        let (mut client, server) = tokio::io::duplex(64);
        let mut stream = FramedRead::new(server, RpcFrameCodec::default());

        let writer = tokio::spawn(async move {
            for chunk in wire.chunks(3) {
                client.write_all(chunk).await.unwrap();
                tokio::task::yield_now().await;
            }
        });

        assert_eq!(stream.next().await.unwrap().unwrap().as_ref(), b"fragmented");
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn corrupted_body_is_a_stream_error() {
        let mut wire = BytesMut::new();
        encode_frame(FrameFormat::Basic, &Crc16::new(), b"payload", &mut wire).unwrap();
        wire[5] ^= 0x01;

        let (mut client, server) = tokio::io::duplex(64);
        client.write_all(&wire).await.unwrap();
        drop(client);

        let mut stream = FramedRead::new(server, RpcFrameCodec::new(FrameFormat::Basic));
        let err = stream.next().await.unwrap().unwrap_err();
        assert!(matches!(err, FrameError::InvalidCrc { .. }));
    }

    #[test]
    fn oversized_item_rejected() {
        let mut codec = RpcFrameCodec::from_config(&FrameConfig {
            max_payload_size: 2,
            ..FrameConfig::default()
        });
        let mut dst = BytesMut::new();
        let err = codec.encode(&b"abc"[..], &mut dst).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { size: 3, max: 2 }));
        assert!(dst.is_empty());
    }
}
