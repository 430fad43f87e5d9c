//! Canonical binary encoding
//!
//! Every persisted or submitted structure goes through `postcard`. Struct
//! fields are written in declaration order with no padding, so a value has
//! exactly one encoding and `decode(encode(x)) == x` holds for every type here.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Encoding errors
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Encoding failed: {0}")]
    Encode(postcard::Error),
    #[error("Decoding failed: {0}")]
    Decode(postcard::Error),
    #[error("{0} trailing bytes after decoded value")]
    TrailingBytes(usize),
}

/// Encode a value to its canonical bytes
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    postcard::to_allocvec(value).map_err(CodecError::Encode)
}

/// Decode a value, requiring that the input is consumed exactly
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    let (value, rest) = postcard::take_from_bytes(bytes).map_err(CodecError::Decode)?;
    if !rest.is_empty() {
        return Err(CodecError::TrailingBytes(rest.len()));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        a: u64,
        b: Option<Vec<u8>>,
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = encode(&Sample { a: 1, b: None }).unwrap();
        bytes.push(0);
        assert!(matches!(
            decode::<Sample>(&bytes),
            Err(CodecError::TrailingBytes(1))
        ));
    }

    #[test]
    fn test_truncated_input_rejected() {
        let bytes = encode(&Sample {
            a: u64::MAX,
            b: Some(vec![1, 2, 3]),
        })
        .unwrap();
        assert!(matches!(
            decode::<Sample>(&bytes[..bytes.len() - 1]),
            Err(CodecError::Decode(_))
        ));
    }
}
