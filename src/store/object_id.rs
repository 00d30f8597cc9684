//! Store-native object identifiers.
//!
//! A native identifier is 12 bytes rendered as 24 hex characters. Anything
//! else the route receives is treated as a literal string key.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Length of a native identifier in bytes.
pub const OBJECT_ID_LEN: usize = 12;

/// A store-generated 12-byte identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; OBJECT_ID_LEN]);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObjectIdError {
    #[error("expected {expected} hex characters, got {actual}")]
    Length { expected: usize, actual: usize },

    #[error("invalid hex: {0}")]
    Hex(String),
}

impl ObjectId {
    pub fn bytes(&self) -> [u8; OBJECT_ID_LEN] {
        self.0
    }

    /// Parse the 24-character hex form. Both letter cases are accepted.
    pub fn parse_str(s: &str) -> Result<Self, ObjectIdError> {
        if s.len() != OBJECT_ID_LEN * 2 {
            return Err(ObjectIdError::Length {
                expected: OBJECT_ID_LEN * 2,
                actual: s.len(),
            });
        }
        let mut bytes = [0u8; OBJECT_ID_LEN];
        hex::decode_to_slice(s, &mut bytes).map_err(|e| ObjectIdError::Hex(e.to_string()))?;
        Ok(Self(bytes))
    }

    /// Whether `s` is a valid native identifier.
    pub fn is_valid(s: &str) -> bool {
        Self::parse_str(s).is_ok()
    }
}

impl FromStr for ObjectId {
    type Err = ObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}
