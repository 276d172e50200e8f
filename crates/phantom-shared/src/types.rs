use std::fmt;
use std::str::FromStr;

use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::OBJECT_ID_SIZE;
use crate::error::IdError;

/// Resource identifier for movies, comments and users.
///
/// Twelve bytes, rendered canonically as 24 lowercase hex characters. Fresh
/// ids carry the creation second in their first four bytes so they sort
/// roughly by age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub [u8; OBJECT_ID_SIZE]);

impl ObjectId {
    pub fn new() -> Self {
        let secs = chrono::Utc::now().timestamp() as u32;
        let mut bytes = [0u8; OBJECT_ID_SIZE];
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        rand::rngs::OsRng.fill_bytes(&mut bytes[4..]);
        Self(bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse the canonical 24-hex-character form.
    pub fn parse_hex(s: &str) -> Result<Self, IdError> {
        if s.len() != OBJECT_ID_SIZE * 2 {
            return Err(IdError::InvalidLength(s.len()));
        }
        let bytes = hex::decode(s).map_err(|_| IdError::InvalidHex)?;
        let mut arr = [0u8; OBJECT_ID_SIZE];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hex(s)
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_roundtrip() {
        let id = ObjectId::new();
        let hex = id.to_hex();
        assert_eq!(hex.len(), 24);
        assert_eq!(ObjectId::parse_hex(&hex).unwrap(), id);
    }

    #[test]
    fn test_accepts_uppercase() {
        let id = ObjectId::parse_hex("573A1390F29313CAABCD4135").unwrap();
        assert_eq!(id.to_string(), "573a1390f29313caabcd4135");
    }

    #[test]
    fn test_rejects_wrong_length() {
        assert_eq!(
            ObjectId::parse_hex("573a1390f29313caabcd41"),
            Err(IdError::InvalidLength(22))
        );
    }

    #[test]
    fn test_rejects_non_hex() {
        assert_eq!(
            ObjectId::parse_hex("zzzzzzzzzzzzzzzzzzzzzzzz"),
            Err(IdError::InvalidHex)
        );
    }

    #[test]
    fn test_serde_as_string() {
        let id = ObjectId::parse_hex("573a1390f29313caabcd4135").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"573a1390f29313caabcd4135\"");
        let back: ObjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_fresh_ids_differ() {
        assert_ne!(ObjectId::new(), ObjectId::new());
    }
}
