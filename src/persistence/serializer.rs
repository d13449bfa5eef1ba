//! Serializer Module
//!
//! Encodes and decodes snapshots as JSON text or bincode binary.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::PersistError;

// == Payload ==
/// Encoded snapshot bytes, tagged with their representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Binary(Vec<u8>),
}

impl Payload {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Payload::Text(text) => text.as_bytes(),
            Payload::Binary(bytes) => bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

// == Serializer Kind ==
/// Snapshot formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerializerKind {
    /// Human-readable JSON
    Json,
    /// Compact bincode
    Bincode,
}

impl SerializerKind {
    /// File extension forced onto snapshot paths.
    pub fn extension(self) -> &'static str {
        match self {
            SerializerKind::Json => "json",
            SerializerKind::Bincode => "bin",
        }
    }

    /// Binary formats carry entries natively; text formats need an explicit
    /// timestamp representation.
    pub fn is_binary(self) -> bool {
        matches!(self, SerializerKind::Bincode)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SerializerKind::Json => "json",
            SerializerKind::Bincode => "bincode",
        }
    }

    /// Encodes a value into this format.
    pub fn encode<T>(self, value: &T) -> Result<Payload, PersistError>
    where
        T: Serialize + ?Sized,
    {
        match self {
            SerializerKind::Json => Ok(Payload::Text(serde_json::to_string_pretty(value)?)),
            SerializerKind::Bincode => Ok(Payload::Binary(bincode::serialize(value)?)),
        }
    }

    /// Decodes a value from a payload produced by this format.
    pub fn decode<T>(self, payload: &Payload) -> Result<T, PersistError>
    where
        T: DeserializeOwned,
    {
        match (self, payload) {
            (SerializerKind::Json, Payload::Text(text)) => Ok(serde_json::from_str(text)?),
            (SerializerKind::Bincode, Payload::Binary(bytes)) => Ok(bincode::deserialize(bytes)?),
            (SerializerKind::Json, Payload::Binary(_)) => {
                Err(PersistError::FormatMismatch { expected: "text" })
            }
            (SerializerKind::Bincode, Payload::Text(_)) => {
                Err(PersistError::FormatMismatch { expected: "binary" })
            }
        }
    }
}

impl fmt::Display for SerializerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SerializerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(SerializerKind::Json),
            "bincode" | "binary" | "bin" => Ok(SerializerKind::Bincode),
            other => Err(format!("unknown serializer '{}'", other)),
        }
    }
}
