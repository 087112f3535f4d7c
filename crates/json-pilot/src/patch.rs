//! Version patches: the default data a document must contain once it
//! reaches a given schema version.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::document::read_integer;
use crate::error::{kind_of, Error, Result};

/// A single version entry.
///
/// Deserializing goes through [`Patch::from_value`], so the typed path
/// accepts and rejects exactly what a lenient [`PatchSet`] keeps and drops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct Patch {
    /// Schema version this patch brings a document to. Must be positive to
    /// be applied.
    pub version: u64,
    /// Keys and subtrees that must exist at `version`.
    pub default_data: Map<String, Value>,
}

impl Patch {
    pub fn new(version: u64, default_data: Map<String, Value>) -> Self {
        Self {
            version,
            default_data,
        }
    }

    /// Builds a patch from an untyped entry, returning `None` for anything
    /// that could not be applied.
    ///
    /// The version must be a positive integer (`2.0` counts) and the body,
    /// read from `default_data` or the legacy `migration` key, must be a
    /// non-empty object.
    ///
    /// # Examples
    ///
    /// ```
    /// use json_pilot::Patch;
    /// use serde_json::json;
    ///
    /// let patch = Patch::from_value(&json!({"version": 2, "default_data": {"age": 0}})).unwrap();
    /// assert_eq!(patch.version, 2);
    ///
    /// assert!(Patch::from_value(&json!({"version": 0, "default_data": {"age": 0}})).is_none());
    /// assert!(Patch::from_value(&json!({"version": 1.5, "default_data": {"age": 0}})).is_none());
    /// assert!(Patch::from_value(&json!({"version": 3, "default_data": {}})).is_none());
    /// ```
    pub fn from_value(entry: &Value) -> Option<Self> {
        let entry = entry.as_object()?;
        let version = entry.get("version").and_then(positive_integer)?;
        let body = entry
            .get("default_data")
            .or_else(|| entry.get("migration"))?
            .as_object()?;
        let patch = Self::new(version, body.clone());
        patch.is_applicable().then_some(patch)
    }

    /// Returns `true` if the patch survives normalization.
    pub fn is_applicable(&self) -> bool {
        self.version > 0 && !self.default_data.is_empty()
    }
}

fn positive_integer(value: &Value) -> Option<u64> {
    read_integer(value).filter(|version| *version > 0)
}

impl TryFrom<Value> for Patch {
    type Error = Error;

    fn try_from(entry: Value) -> Result<Self> {
        Self::from_value(&entry).ok_or(Error::InvalidPatch)
    }
}

/// An ordered collection of patches, as supplied by the caller.
///
/// Entries are kept in the order given; [`PatchSet::normalized`] produces
/// the application order. Deserializing is lenient: entries rejected by
/// [`Patch::from_value`] are dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PatchSet(Vec<Patch>);

impl PatchSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Reads a patch set from a JSON array, skipping malformed entries.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotAnArray` if `value` is not an array.
    pub fn from_value(value: &Value) -> Result<Self> {
        let entries = value
            .as_array()
            .ok_or_else(|| Error::NotAnArray(kind_of(value)))?;
        Ok(Self::from_entries(entries))
    }

    /// Parses a patch set from JSON text.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    fn from_entries(entries: &[Value]) -> Self {
        let mut patches = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            match Patch::from_value(entry) {
                Some(patch) => patches.push(patch),
                None => tracing::trace!(index, "dropping malformed patch entry"),
            }
        }
        Self(patches)
    }

    pub fn push(&mut self, patch: Patch) {
        self.0.push(patch);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Patch> {
        self.0.iter()
    }

    /// Highest version among applicable patches.
    pub fn latest_version(&self) -> Option<u64> {
        self.iter()
            .filter(|p| p.is_applicable())
            .map(|p| p.version)
            .max()
    }

    /// Patches in application order.
    ///
    /// Drops entries with a zero version or an empty body, then sorts the
    /// rest ascending by version. The sort is stable and duplicates are
    /// kept; the driver skips a repeated version once the first has been
    /// applied.
    pub fn normalized(&self) -> Vec<&Patch> {
        let mut patches: Vec<&Patch> = self.iter().filter(|p| p.is_applicable()).collect();
        patches.sort_by_key(|p| p.version);
        patches
    }
}

impl From<Vec<Patch>> for PatchSet {
    fn from(patches: Vec<Patch>) -> Self {
        Self(patches)
    }
}

impl FromIterator<Patch> for PatchSet {
    fn from_iter<I: IntoIterator<Item = Patch>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a PatchSet {
    type Item = &'a Patch;
    type IntoIter = std::slice::Iter<'a, Patch>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<'de> Deserialize<'de> for PatchSet {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries = Vec::<Value>::deserialize(deserializer)?;
        Ok(Self::from_entries(&entries))
    }
}
