use serde::{Deserialize, Serialize};

/// Options for a migration run.
///
/// Deserializes from the camelCase form hosts usually keep next to their
/// patch definitions:
///
/// ```
/// use json_pilot::MigrateOptions;
///
/// let options: MigrateOptions = serde_json::from_str(r#"{"targetVersion": 2, "sort": true}"#).unwrap();
/// assert_eq!(options.effective_target(), Some(2));
/// assert!(options.sort);
///
/// let options: MigrateOptions = serde_json::from_str("{}").unwrap();
/// assert_eq!(options, MigrateOptions::default());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MigrateOptions {
    /// Highest version to apply. `None` or a value `<= 0` applies every
    /// pending patch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_version: Option<i64>,
    /// Sort object keys case-insensitively before returning.
    pub sort: bool,
}

impl MigrateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target_version(mut self, target_version: i64) -> Self {
        self.target_version = Some(target_version);
        self
    }

    pub fn with_sort(mut self, sort: bool) -> Self {
        self.sort = sort;
        self
    }

    /// The version ceiling, if one is in effect.
    pub fn effective_target(&self) -> Option<u64> {
        self.target_version
            .filter(|target| *target > 0)
            .and_then(|target| u64::try_from(target).ok())
    }
}
