use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

pub const MAX_VALUE_SIZE: usize = 5 * 1024 * 1024;

/// Key under which the reports collection is persisted locally.
pub const REPORTS_STORE_KEY: &str = "bikeReports";
/// Key under which the sightings collection is persisted locally.
pub const SIGHTINGS_STORE_KEY: &str = "bikeSightings";

/// Decodes a stored collection. An absent value is the empty
/// collection, never an error.
pub fn decode_collection<T: DeserializeOwned>(bytes: Option<&[u8]>) -> Result<Vec<T>, KvCodecError> {
    match bytes {
        None => Ok(Vec::new()),
        Some(bytes) => {
            serde_json::from_slice(bytes).map_err(|e| KvCodecError::Deserialization {
                message: e.to_string(),
            })
        }
    }
}

pub fn encode_collection<T: Serialize>(records: &[T]) -> Result<Vec<u8>, KvCodecError> {
    let bytes = serde_json::to_vec(records).map_err(|e| KvCodecError::Serialization {
        message: e.to_string(),
    })?;

    if bytes.len() > MAX_VALUE_SIZE {
        return Err(KvCodecError::ValueTooLarge {
            size: bytes.len(),
            max: MAX_VALUE_SIZE,
        });
    }

    Ok(bytes)
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum KvCodecError {
    #[error("Stored value of {size} bytes exceeds maximum of {max} bytes")]
    ValueTooLarge { size: usize, max: usize },
    #[error("Failed to serialize records: {message}")]
    Serialization { message: String },
    #[error("Failed to deserialize records: {message}")]
    Deserialization { message: String },
}

impl KvCodecError {
    #[must_use]
    pub const fn is_corrupt_data(&self) -> bool {
        matches!(self, Self::Deserialization { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_value_decodes_to_empty_collection() {
        let records: Vec<String> = decode_collection(None).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_corrupt_value_is_an_error_not_empty() {
        let result: Result<Vec<String>, _> = decode_collection(Some(b"not json"));
        assert!(result.unwrap_err().is_corrupt_data());
    }

    #[test]
    fn test_encode_rejects_oversized_collections() {
        let records = vec!["x".repeat(MAX_VALUE_SIZE)];
        assert!(matches!(
            encode_collection(&records),
            Err(KvCodecError::ValueTooLarge { .. })
        ));
    }

    #[test]
    fn test_empty_collection_encodes_as_json_array() {
        let bytes = encode_collection::<String>(&[]).unwrap();
        assert_eq!(bytes, b"[]");
    }
}
