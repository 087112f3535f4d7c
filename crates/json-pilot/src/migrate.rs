//! The migration driver.

use serde_json::Value;
use tracing::{debug, trace};

use crate::clock::{Clock, SystemClock};
use crate::document::{Document, Metadata};
use crate::error::Result;
use crate::merge::merge_into;
use crate::options::MigrateOptions;
use crate::patch::PatchSet;

/// Applies pending patches to documents, stamping `last_migrated` from `C`.
///
/// A migrator holds no state besides its clock, so one instance can serve
/// any number of documents.
///
/// # Examples
///
/// ```
/// use json_pilot::{Document, FixedClock, MigrateOptions, Migrator, Patch, PatchSet};
/// use serde_json::json;
///
/// let patches = PatchSet::from(vec![
///     Patch::new(1, json!({"name": "Default Name"}).as_object().cloned().unwrap()),
///     Patch::new(2, json!({"name": "Default Name", "age": 0}).as_object().cloned().unwrap()),
/// ]);
/// let doc = Document::try_from(json!({
///     "name": "John Doe",
///     "__pilot": {"version": 1, "last_migrated": 0},
/// }))
/// .unwrap();
///
/// let migrated = Migrator::with_clock(FixedClock(1_700_000_000))
///     .migrate(&doc, &patches, &MigrateOptions::default());
///
/// assert_eq!(
///     migrated.into_value(),
///     json!({
///         "name": "John Doe",
///         "age": 0,
///         "__pilot": {"version": 2, "last_migrated": 1_700_000_000},
///     })
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct Migrator<C = SystemClock> {
    clock: C,
}

impl Migrator<SystemClock> {
    pub fn new() -> Self {
        Self { clock: SystemClock }
    }
}

impl<C: Clock> Migrator<C> {
    pub fn with_clock(clock: C) -> Self {
        Self { clock }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Brings a copy of `document` up to date with `patches`.
    ///
    /// The input is never modified. An unversioned document gets metadata
    /// at version 0 first, so every patch applies to it. Patches at or
    /// below the document's version, or above the options' target version,
    /// are skipped; each applied patch merges its defaults in (see
    /// [`crate::merge::merge`]) and advances the metadata.
    ///
    /// An empty patch set returns the copy as soon as metadata is in place,
    /// without sorting.
    pub fn migrate(
        &self,
        document: &Document,
        patches: &PatchSet,
        options: &MigrateOptions,
    ) -> Document {
        let mut working = document.clone();

        if !working.has_metadata() {
            debug!("no pilot metadata found, treating document as version 0");
            working.set_metadata(Metadata::new(0, self.clock.now()));
        }

        if patches.is_empty() {
            return working;
        }

        let target = options.effective_target();
        for patch in patches.normalized() {
            let current = working.version();
            if patch.version <= current {
                trace!(version = patch.version, current, "patch already applied");
                continue;
            }
            if target.is_some_and(|target| patch.version > target) {
                trace!(version = patch.version, ?target, "patch above target version");
                continue;
            }

            debug!(version = patch.version, "migrating to version {}", patch.version);
            merge_into(&patch.default_data, working.as_map_mut());
            working.set_metadata(Metadata::new(patch.version, self.clock.now()));
        }

        if options.sort {
            working = working.sorted();
        }

        working
    }

    /// [`Migrator::migrate`] over untyped JSON.
    ///
    /// # Errors
    ///
    /// - `Error::NotAnObject` if `document` is not an object
    /// - `Error::NotAnArray` if `patches` is not an array
    ///
    /// Malformed entries inside `patches` are skipped, not reported.
    pub fn migrate_value(
        &self,
        document: &Value,
        patches: &Value,
        options: &MigrateOptions,
    ) -> Result<Value> {
        let document = Document::try_from(document.clone())?;
        let patches = PatchSet::from_value(patches)?;
        Ok(self.migrate(&document, &patches, options).into_value())
    }
}

/// Migrates `document` using the system clock.
///
/// See [`Migrator::migrate`].
pub fn migrate(document: &Document, patches: &PatchSet, options: &MigrateOptions) -> Document {
    Migrator::new().migrate(document, patches, options)
}

/// Migrates an untyped document using the system clock.
///
/// See [`Migrator::migrate_value`].
pub fn migrate_value(document: &Value, patches: &Value, options: &MigrateOptions) -> Result<Value> {
    Migrator::new().migrate_value(document, patches, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::PILOT_KEY;
    use crate::error::Error;
    use crate::patch::Patch;
    use serde_json::json;

    const NOW: i64 = 1_700_000_000;

    fn migrator() -> Migrator<crate::clock::FixedClock> {
        Migrator::with_clock(crate::clock::FixedClock(NOW))
    }

    fn doc(value: Value) -> Document {
        Document::try_from(value).unwrap()
    }

    fn patch(version: u64, data: Value) -> Patch {
        Patch::new(version, data.as_object().cloned().unwrap())
    }

    #[test]
    fn stamps_from_the_injected_clock() {
        let migrator = migrator();
        assert_eq!(migrator.clock().now(), NOW);

        let out = migrator.migrate(&doc(json!({})), &PatchSet::new(), &MigrateOptions::default());
        assert_eq!(out.metadata(), Some(Metadata::new(0, migrator.clock().now())));
    }

    #[test]
    fn synthesizes_metadata_on_empty_patch_set() {
        let out = migrator().migrate(
            &doc(json!({"user": {"id": 1}})),
            &PatchSet::new(),
            &MigrateOptions::default(),
        );
        assert_eq!(
            out.into_value(),
            json!({"user": {"id": 1}, "__pilot": {"version": 0, "last_migrated": NOW}})
        );
    }

    #[test]
    fn empty_patch_set_skips_sorting() {
        let input = doc(json!({"b": 1, "a": 2, "__pilot": {"version": 0, "last_migrated": 0}}));
        let out = migrator().migrate(&input, &PatchSet::new(), &MigrateOptions::new().with_sort(true));
        let keys: Vec<_> = out.as_map().keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a", "__pilot"]);
    }

    #[test]
    fn applies_patches_in_version_order() {
        let patches = PatchSet::from(vec![
            patch(2, json!({"second": true, "first": "from 2"})),
            patch(1, json!({"first": "from 1"})),
        ]);
        let out = migrator().migrate(&doc(json!({})), &patches, &MigrateOptions::default());
        assert_eq!(out.get("first"), Some(&json!("from 1")));
        assert_eq!(out.get("second"), Some(&json!(true)));
        assert_eq!(out.metadata(), Some(Metadata::new(2, NOW)));
    }

    #[test]
    fn stops_at_target_version() {
        let patches = PatchSet::from(vec![
            patch(1, json!({"a": 1})),
            patch(2, json!({"b": 2})),
            patch(3, json!({"c": 3})),
        ]);
        let out = migrator().migrate(
            &doc(json!({})),
            &patches,
            &MigrateOptions::new().with_target_version(2),
        );
        assert_eq!(out.version(), 2);
        assert!(out.get("c").is_none());
    }

    #[test]
    fn untouched_when_nothing_applies() {
        let input = doc(json!({"__pilot": {"version": 5, "last_migrated": 11}, "x": 1}));
        let patches = PatchSet::from(vec![patch(3, json!({"y": 2}))]);
        let out = migrator().migrate(&input, &patches, &MigrateOptions::default());
        assert_eq!(out, input);
    }

    #[test]
    fn malformed_metadata_is_replaced_once_a_patch_applies() {
        let patches = PatchSet::from(vec![patch(1, json!({"a": 1}))]);

        let out = migrator().migrate(
            &doc(json!({"__pilot": "broken"})),
            &patches,
            &MigrateOptions::default(),
        );
        assert_eq!(out.metadata(), Some(Metadata::new(1, NOW)));

        let out = migrator().migrate(
            &doc(json!({"__pilot": "broken"})),
            &PatchSet::from(vec![patch(0, json!({"a": 1}))]),
            &MigrateOptions::default(),
        );
        assert_eq!(out.get(PILOT_KEY), Some(&json!("broken")));
    }

    #[test]
    fn duplicate_versions_apply_once() {
        let patches = PatchSet::from(vec![
            patch(1, json!({"a": 1})),
            patch(1, json!({"b": 1})),
        ]);
        let out = migrator().migrate(&doc(json!({})), &patches, &MigrateOptions::default());
        assert_eq!(out.get("a"), Some(&json!(1)));
        assert!(out.get("b").is_none());
    }

    #[test]
    fn sorts_when_requested() {
        let patches = PatchSet::from(vec![patch(1, json!({"Zeta": {"b": 1, "a": 2}, "alpha": 0}))]);
        let out = migrator().migrate(
            &doc(json!({"mid": 1})),
            &patches,
            &MigrateOptions::new().with_sort(true),
        );
        let keys: Vec<_> = out.as_map().keys().cloned().collect();
        assert_eq!(keys, vec!["__pilot", "alpha", "mid", "Zeta"]);
        let nested: Vec<_> = out.get("Zeta").unwrap().as_object().unwrap().keys().cloned().collect();
        assert_eq!(nested, vec!["a", "b"]);
    }

    #[test]
    fn caller_document_is_not_mutated() {
        let input = doc(json!({"user": {"id": 1}}));
        let before = input.clone();
        let patches = PatchSet::from(vec![patch(1, json!({"user": {"name": ""}}))]);
        let _ = migrator().migrate(&input, &patches, &MigrateOptions::default());
        assert_eq!(input, before);
    }

    #[test]
    fn migrate_value_boundary() {
        let out = migrator()
            .migrate_value(
                &json!({"a": 1}),
                &json!([{"version": 1, "migration": {"b": 2}}, {"version": "x"}]),
                &MigrateOptions::default(),
            )
            .unwrap();
        assert_eq!(
            out,
            json!({"a": 1, "b": 2, "__pilot": {"version": 1, "last_migrated": NOW}})
        );

        assert!(matches!(
            migrator().migrate_value(&json!([]), &json!([]), &MigrateOptions::default()),
            Err(Error::NotAnObject("array"))
        ));
        assert!(matches!(
            migrator().migrate_value(&json!({}), &json!(null), &MigrateOptions::default()),
            Err(Error::NotAnArray("null"))
        ));
    }

    #[test]
    fn system_clock_stamps_current_time() {
        let out = migrate(
            &doc(json!({})),
            &PatchSet::from(vec![patch(1, json!({"a": 1}))]),
            &MigrateOptions::default(),
        );
        let stamped = out.metadata().unwrap().last_migrated;
        assert!(stamped > NOW);
    }
}
