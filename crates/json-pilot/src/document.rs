//! Versioned documents and their embedded migration metadata.

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{kind_of, Error, Result};
use crate::sort::sort_map;

/// Reserved key under which migration metadata is stored in a document.
pub const PILOT_KEY: &str = "__pilot";

/// Migration progress recorded inside a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Metadata {
    /// Highest patch version already applied.
    #[serde(deserialize_with = "deserialize_version")]
    pub version: u64,
    /// Unix timestamp (seconds) of the last change to `version`.
    pub last_migrated: i64,
}

impl Metadata {
    pub fn new(version: u64, last_migrated: i64) -> Self {
        Self {
            version,
            last_migrated,
        }
    }

    /// JSON form stored under [`PILOT_KEY`].
    pub fn to_value(&self) -> Value {
        json!({
            "version": self.version,
            "last_migrated": self.last_migrated,
        })
    }
}

/// Reads a non-negative integer, accepting integral floats such as `3.0`.
pub(crate) fn read_integer(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    if f.fract() != 0.0 || f < 0.0 || f > u64::MAX as f64 {
        return None;
    }
    Some(f as u64)
}

fn deserialize_version<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    read_integer(&raw).ok_or_else(|| {
        de::Error::custom(format!(
            "invalid version {raw}, expected a non-negative integer"
        ))
    })
}

/// A JSON object document that may carry migration metadata.
///
/// Everything except [`PILOT_KEY`] is an open mapping of string keys to
/// arbitrary JSON values; key insertion order is preserved.
///
/// # Examples
///
/// ```
/// use json_pilot::{Document, Metadata};
/// use serde_json::json;
///
/// let mut doc = Document::try_from(json!({"name": "John Doe"})).unwrap();
/// assert!(!doc.has_metadata());
/// assert_eq!(doc.version(), 0);
///
/// doc.set_metadata(Metadata::new(2, 1_700_000_000));
/// assert_eq!(doc.version(), 2);
/// assert_eq!(doc.metadata(), Some(Metadata::new(2, 1_700_000_000)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    /// Creates an empty, unversioned document.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Parses a document from JSON text.
    ///
    /// # Errors
    ///
    /// - `Error::Json` if `text` is not valid JSON
    /// - `Error::NotAnObject` if the top-level value is not an object
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::try_from(value)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn as_map_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns `true` if the document has a [`PILOT_KEY`] entry, well-formed
    /// or not.
    pub fn has_metadata(&self) -> bool {
        self.0.contains_key(PILOT_KEY)
    }

    /// Returns the metadata if the [`PILOT_KEY`] entry is well-formed.
    pub fn metadata(&self) -> Option<Metadata> {
        self.0
            .get(PILOT_KEY)
            .and_then(|raw| Metadata::deserialize(raw).ok())
    }

    /// Current schema version.
    ///
    /// A missing entry, or one whose `version` is not a non-negative
    /// integer, reads as version 0 so every patch applies.
    pub fn version(&self) -> u64 {
        self.0
            .get(PILOT_KEY)
            .and_then(|raw| raw.get("version"))
            .and_then(read_integer)
            .unwrap_or(0)
    }

    /// Replaces the metadata entry, keeping its position if it already
    /// exists.
    pub fn set_metadata(&mut self, metadata: Metadata) {
        self.0.insert(PILOT_KEY.to_owned(), metadata.to_value());
    }

    /// Returns a copy with every nested object's keys sorted.
    ///
    /// See [`crate::sort::sort_keys`] for the ordering.
    pub fn sorted(&self) -> Self {
        Self(sort_map(&self.0))
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        doc.into_value()
    }
}

impl TryFrom<Value> for Document {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(Error::NotAnObject(kind_of(&other))),
        }
    }
}
