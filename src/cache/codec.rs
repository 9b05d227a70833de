//! Codec Module
//!
//! Byte-level transforms applied to values on their way to and from a backend.

use std::fmt;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::error::CodecError;

// == Codec Trait ==
/// A reversible byte transform (compression, encryption).
pub trait Codec: Send + Sync {
    fn name(&self) -> &str;

    fn encode(&self, data: Vec<u8>) -> Result<Vec<u8>, CodecError>;

    fn decode(&self, data: Vec<u8>) -> Result<Vec<u8>, CodecError>;
}

// == Zstd Codec ==
/// Zstandard compression.
#[derive(Debug, Clone, Copy)]
pub struct ZstdCodec {
    level: i32,
}

impl ZstdCodec {
    /// Creates a codec with the given compression level (1-22).
    pub fn new(level: i32) -> Self {
        Self { level }
    }
}

impl Default for ZstdCodec {
    fn default() -> Self {
        // Balanced compression
        Self::new(3)
    }
}

impl Codec for ZstdCodec {
    fn name(&self) -> &str {
        "zstd"
    }

    fn encode(&self, data: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        let compressed = zstd::encode_all(data.as_slice(), self.level)
            .map_err(|e| CodecError::new(self.name(), e.to_string()))?;
        debug!(input = data.len(), output = compressed.len(), "zstd compressed");
        Ok(compressed)
    }

    fn decode(&self, data: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        zstd::decode_all(data.as_slice()).map_err(|e| CodecError::new(self.name(), e.to_string()))
    }
}

// == Codec Pipeline ==
/// Per-cache value pipeline: serialize, compress, encrypt, and the reverse.
///
/// Stages that are not configured pass bytes through unchanged.
#[derive(Clone, Default)]
pub struct CodecPipeline {
    compression: Option<Arc<dyn Codec>>,
    encryption: Option<Arc<dyn Codec>>,
}

impl CodecPipeline {
    pub fn new(compression: Option<Arc<dyn Codec>>, encryption: Option<Arc<dyn Codec>>) -> Self {
        Self {
            compression,
            encryption,
        }
    }

    pub fn encode<V: Serialize + ?Sized>(&self, value: &V) -> Result<Vec<u8>, CodecError> {
        let mut bytes = serde_json::to_vec(value)?;
        if let Some(codec) = &self.compression {
            bytes = codec.encode(bytes)?;
        }
        if let Some(codec) = &self.encryption {
            bytes = codec.encode(bytes)?;
        }
        Ok(bytes)
    }

    pub fn decode<V: DeserializeOwned>(&self, mut bytes: Vec<u8>) -> Result<V, CodecError> {
        if let Some(codec) = &self.encryption {
            bytes = codec.decode(bytes)?;
        }
        if let Some(codec) = &self.compression {
            bytes = codec.decode(bytes)?;
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl fmt::Debug for CodecPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecPipeline")
            .field("compression", &self.compression.as_ref().map(|c| c.name()))
            .field("encryption", &self.encryption.as_ref().map(|c| c.name()))
            .finish()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    /// Reverses the byte order; enough to prove stage ordering.
    struct Reverse;

    impl Codec for Reverse {
        fn name(&self) -> &str {
            "reverse"
        }

        fn encode(&self, mut data: Vec<u8>) -> Result<Vec<u8>, CodecError> {
            data.reverse();
            Ok(data)
        }

        fn decode(&self, mut data: Vec<u8>) -> Result<Vec<u8>, CodecError> {
            data.reverse();
            Ok(data)
        }
    }

    #[test]
    fn test_passthrough_is_plain_json() {
        let pipeline = CodecPipeline::default();
        let bytes = pipeline.encode(&"hello").unwrap();
        assert_eq!(bytes, b"\"hello\"".to_vec());
        assert_eq!(pipeline.decode::<String>(bytes).unwrap(), "hello");
    }

    #[test]
    fn test_zstd_shrinks_repetitive_payload() {
        let pipeline = CodecPipeline::new(Some(Arc::new(ZstdCodec::default())), None);
        let value = "a".repeat(4096);

        let bytes = pipeline.encode(&value).unwrap();
        assert!(bytes.len() < 4096);
        assert_eq!(pipeline.decode::<String>(bytes).unwrap(), value);
    }

    #[test]
    fn test_encryption_runs_after_compression() {
        let zstd: Arc<dyn Codec> = Arc::new(ZstdCodec::default());
        let pipeline = CodecPipeline::new(Some(zstd.clone()), Some(Arc::new(Reverse)));

        let mut bytes = pipeline.encode(&vec![1, 2, 3]).unwrap();
        bytes.reverse();
        // undoing the outer stage leaves a valid zstd frame
        assert!(zstd.decode(bytes).is_ok());
    }

    #[test]
    fn test_zstd_rejects_garbage() {
        let err = ZstdCodec::default().decode(b"garbage".to_vec()).unwrap_err();
        assert_eq!(err.codec, "zstd");
    }

    #[test]
    fn test_decode_type_mismatch_is_codec_error() {
        let pipeline = CodecPipeline::default();
        let bytes = pipeline.encode(&"text").unwrap();
        let err = pipeline.decode::<u32>(bytes).unwrap_err();
        assert_eq!(err.codec, "json");
    }
}
