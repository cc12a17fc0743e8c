use crate::basic::BasicCodec;
use crate::codec::Codec;

/// Produces fresh codecs for each request or incoming message.
pub trait CodecFactory: Send + Sync {
    /// Empty write-mode codec.
    fn create(&self) -> Box<dyn Codec>;

    /// Read-mode codec over a copy of `data`.
    fn create_from(&self, data: &[u8]) -> Box<dyn Codec> {
        let mut codec = self.create();
        codec.set_array(data);
        codec
    }
}

/// Factory for [`BasicCodec`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicCodecFactory;

impl CodecFactory for BasicCodecFactory {
    fn create(&self) -> Box<dyn Codec> {
        Box::new(BasicCodec::new())
    }

    fn create_from(&self, data: &[u8]) -> Box<dyn Codec> {
        Box::new(BasicCodec::from_slice(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_is_empty_write_mode() {
        let codec = BasicCodecFactory.create();
        assert!(codec.is_empty());
    }

    #[test]
    fn create_from_reads_supplied_bytes() {
        let mut codec = BasicCodecFactory.create_from(&[0x2A, 0, 0, 0]);
        assert_eq!(codec.read_int32().unwrap(), 42);
        assert_eq!(codec.remaining(), 0);
    }

    #[test]
    fn factory_is_usable_as_trait_object() {
        let factory: Box<dyn CodecFactory> = Box::new(BasicCodecFactory);
        let mut codec = factory.create();
        codec.write_int8(1);
        assert_eq!(codec.array(), &[1]);
    }
}
