//! json-pilot - versioned JSON document migration.
//!
//! A document records the schema version it has reached under the reserved
//! `__pilot` key. Each [`Patch`] lists the keys a document must contain at
//! its version; migrating fills in whatever is missing, patch by patch in
//! version order, and never overwrites a value the document already has.
//!
//! # Example
//!
//! ```
//! use json_pilot::{migrate_value, MigrateOptions};
//! use serde_json::json;
//!
//! let patches = json!([
//!     {"version": 1, "default_data": {"user": {"id": 0, "name": ""}}},
//!     {"version": 2, "default_data": {"user": {"id": 0, "email": "", "name": ""}}},
//!     {"version": 3, "default_data": {"inventory": {"limit": 100, "items": []}}},
//! ]);
//! let doc = json!({"user": {"id": 1, "name": "Random User"}});
//!
//! let options = MigrateOptions::new().with_target_version(2);
//! let migrated = migrate_value(&doc, &patches, &options).unwrap();
//!
//! assert_eq!(migrated["user"], json!({"id": 1, "name": "Random User", "email": ""}));
//! assert_eq!(migrated["__pilot"]["version"], json!(2));
//! assert!(migrated.get("inventory").is_none());
//! ```

pub mod clock;
pub mod document;
pub mod error;
pub mod merge;
pub mod migrate;
pub mod options;
pub mod patch;
pub mod sort;

pub use clock::{Clock, FixedClock, SystemClock};
pub use document::{Document, Metadata, PILOT_KEY};
pub use error::{Error, Result};
pub use merge::{merge, merge_into, merge_value};
pub use migrate::{migrate, migrate_value, Migrator};
pub use options::MigrateOptions;
pub use patch::{Patch, PatchSet};
pub use sort::{key_cmp, sort_keys, sort_map};
