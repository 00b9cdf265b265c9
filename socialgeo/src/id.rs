use std::fmt;
use std::str::FromStr;

use nanoid::nanoid;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::DemoError;

/// Alphabet used for generated record keys (no ambiguous glyphs).
const RECORD_KEY_ALPHABET: &[char] = &[
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'J', 'K', 'L', 'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y',
    'Z', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'j', 'm', 'n', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9',
];
/// Generated keys have the same length as the ones SurrealDB hands out.
const RECORD_KEY_LENGTH: usize = 20;

/// Generates a new record key.
pub fn generate_record_key() -> String {
    nanoid!(RECORD_KEY_LENGTH, RECORD_KEY_ALPHABET)
}

/// Identifier of a stored record, `table:key`.
///
/// Assigned by the storage service when the record is created and never
/// changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId {
    table: String,
    key: String,
}

impl RecordId {
    pub fn new(table: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            key: key.into(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.table, self.key)
    }
}

impl FromStr for RecordId {
    type Err = DemoError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.split_once(':') {
            Some((table, key)) if !table.is_empty() && !key.is_empty() => Ok(Self::new(table, key)),
            _ => Err(DemoError::InvalidRecordId {
                value: value.to_string(),
            }),
        }
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
