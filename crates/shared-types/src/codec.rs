//! # Versioned Codec
//!
//! Every encoded blob (blocks, transactions, atomic elements, ledger records)
//! starts with a big-endian `u16` codec version followed by the bincode body.
//!
//! The codec is an explicit handle: the node builds one `Codec` at start-up
//! and passes it (usually as `Arc<Codec>`) to every component that needs to
//! (de)serialize. It is immutable after construction.

use crate::errors::CodecError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Codec version written by this node.
pub const CODEC_VERSION: u16 = 0;

/// Default upper bound on a single encoded blob (2 MiB).
pub const DEFAULT_MAX_SIZE: usize = 2 * 1024 * 1024;

const VERSION_LEN: usize = 2;

#[derive(Debug, Clone)]
pub struct Codec {
    version: u16,
    max_size: usize,
}

impl Default for Codec {
    fn default() -> Self {
        Self::new(CODEC_VERSION, DEFAULT_MAX_SIZE)
    }
}

impl Codec {
    pub fn new(version: u16, max_size: usize) -> Self {
        Self { version, max_size }
    }

    pub fn version(&self) -> u16 {
        self.version
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Encode `value` with the version prefix.
    pub fn marshal<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        let body =
            bincode::serialize(value).map_err(|e| CodecError::Serialization(e.to_string()))?;
        let size = body.len() + VERSION_LEN;
        if size > self.max_size {
            return Err(CodecError::TooLarge {
                size,
                max: self.max_size,
            });
        }

        let mut out = Vec::with_capacity(size);
        out.extend_from_slice(&self.version.to_be_bytes());
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Decode a blob produced by [`Codec::marshal`].
    pub fn unmarshal<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        if bytes.len() > self.max_size {
            return Err(CodecError::TooLarge {
                size: bytes.len(),
                max: self.max_size,
            });
        }
        if bytes.len() < VERSION_LEN {
            return Err(CodecError::TooShort { len: bytes.len() });
        }

        let found = u16::from_be_bytes([bytes[0], bytes[1]]);
        if found != self.version {
            return Err(CodecError::UnknownVersion {
                expected: self.version,
                found,
            });
        }

        bincode::deserialize(&bytes[VERSION_LEN..])
            .map_err(|e| CodecError::Serialization(e.to_string()))
    }
}
