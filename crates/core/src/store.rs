//! Storage collaborator for License records.
//!
//! [`LicenseStore`] is the seam the registry persists through. Implementations are the
//! final authority on uniqueness of `name`, `canonical_url` and `slug`, and they enforce
//! protect-on-delete: a license that content still references cannot be removed unless
//! the caller asks for the references to be nullified.
//!
//! [`MemoryLicenseStore`] is a complete in-process implementation guarded by an `RwLock`.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::constants::field;
use crate::license::{License, LicenseDraft, LicenseId};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unique constraint violated on {field}")]
    UniqueViolation { field: &'static str },
    #[error("license {id} is still referenced by {references} content entities")]
    Protected { id: LicenseId, references: usize },
    #[error("license {0} not found")]
    NotFound(LicenseId),
    #[error("license store lock poisoned")]
    Poisoned,
    #[error("storage backend failure: {0}")]
    Backend(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// What happens to content references when a license is deleted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Refuse deletion while any content entity references the license.
    #[default]
    Protect,
    /// Delete and drop every reference, leaving the content unlicensed.
    Nullify,
}

/// A content entity that holds a reference to a license.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentRef {
    pub entity_type: String,
    pub entity_id: String,
}

impl ContentRef {
    pub fn new(entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
        }
    }
}

/// Values that must be unique across all stored licenses.
#[derive(Clone, Copy, Debug)]
pub struct UniqueProbe<'a> {
    pub name: &'a str,
    pub canonical_url: &'a str,
    pub slug: Option<&'a str>,
}

pub trait LicenseStore: Send + Sync {
    /// Every slug currently in use.
    fn slugs(&self) -> StoreResult<HashSet<String>>;

    fn get(&self, id: LicenseId) -> StoreResult<Option<License>>;

    fn find_by_slug(&self, slug: &str) -> StoreResult<Option<License>>;

    /// All licenses, ordered by name.
    fn list(&self) -> StoreResult<Vec<License>>;

    /// Names of the fields in `probe` already used by a license other than `exclude`.
    fn find_conflicts(
        &self,
        probe: UniqueProbe<'_>,
        exclude: Option<LicenseId>,
    ) -> StoreResult<Vec<&'static str>>;

    /// Persists a new license, assigning its identity.
    fn insert(&self, draft: LicenseDraft) -> StoreResult<License>;

    /// Replaces the stored copy of an existing license.
    fn update(&self, license: &License) -> StoreResult<License>;

    /// Removes a license; returns the references nullified under [`DeletePolicy::Nullify`].
    fn delete(&self, id: LicenseId, policy: DeletePolicy) -> StoreResult<Vec<ContentRef>>;

    fn reference_count(&self, id: LicenseId) -> StoreResult<usize>;
}

#[derive(Debug, Default)]
struct MemoryState {
    licenses: BTreeMap<LicenseId, License>,
    references: HashMap<LicenseId, HashSet<ContentRef>>,
}

impl MemoryState {
    fn conflicts(&self, probe: UniqueProbe<'_>, exclude: Option<LicenseId>) -> Vec<&'static str> {
        let mut fields = Vec::new();
        let others = || {
            self.licenses
                .values()
                .filter(move |l| Some(l.id()) != exclude)
        };

        if others().any(|l| l.name == probe.name) {
            fields.push(field::NAME);
        }
        if others().any(|l| l.canonical_url == probe.canonical_url) {
            fields.push(field::CANONICAL_URL);
        }
        if let Some(slug) = probe.slug {
            if others().any(|l| l.slug == slug) {
                fields.push(field::SLUG);
            }
        }
        fields
    }

    fn ensure_unique(&self, license: &License, exclude: Option<LicenseId>) -> StoreResult<()> {
        let probe = UniqueProbe {
            name: &license.name,
            canonical_url: &license.canonical_url,
            slug: Some(&license.slug),
        };
        match self.conflicts(probe, exclude).first() {
            Some(&field) => Err(StoreError::UniqueViolation { field }),
            None => Ok(()),
        }
    }
}

/// In-memory [`LicenseStore`].
#[derive(Debug, Default)]
pub struct MemoryLicenseStore {
    state: RwLock<MemoryState>,
}

impl MemoryLicenseStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, MemoryState>> {
        self.state.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, MemoryState>> {
        self.state.write().map_err(|_| StoreError::Poisoned)
    }

    /// Records that `content` references the license `id`.
    pub fn attach_reference(&self, id: LicenseId, content: ContentRef) -> StoreResult<()> {
        let mut state = self.write()?;
        if !state.licenses.contains_key(&id) {
            return Err(StoreError::NotFound(id));
        }
        state.references.entry(id).or_default().insert(content);
        Ok(())
    }

    /// Removes a reference; returns whether it existed.
    pub fn detach_reference(&self, id: LicenseId, content: &ContentRef) -> StoreResult<bool> {
        let mut state = self.write()?;
        Ok(state
            .references
            .get_mut(&id)
            .is_some_and(|refs| refs.remove(content)))
    }
}

impl LicenseStore for MemoryLicenseStore {
    fn slugs(&self) -> StoreResult<HashSet<String>> {
        Ok(self.read()?.licenses.values().map(|l| l.slug.clone()).collect())
    }

    fn get(&self, id: LicenseId) -> StoreResult<Option<License>> {
        Ok(self.read()?.licenses.get(&id).cloned())
    }

    fn find_by_slug(&self, slug: &str) -> StoreResult<Option<License>> {
        Ok(self
            .read()?
            .licenses
            .values()
            .find(|l| l.slug == slug)
            .cloned())
    }

    fn list(&self) -> StoreResult<Vec<License>> {
        let mut licenses: Vec<License> = self.read()?.licenses.values().cloned().collect();
        licenses.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(licenses)
    }

    fn find_conflicts(
        &self,
        probe: UniqueProbe<'_>,
        exclude: Option<LicenseId>,
    ) -> StoreResult<Vec<&'static str>> {
        Ok(self.read()?.conflicts(probe, exclude))
    }

    fn insert(&self, draft: LicenseDraft) -> StoreResult<License> {
        let mut state = self.write()?;
        let license = draft.into_license(LicenseId::new());
        state.ensure_unique(&license, None)?;
        state.licenses.insert(license.id(), license.clone());
        Ok(license)
    }

    fn update(&self, license: &License) -> StoreResult<License> {
        let mut state = self.write()?;
        if !state.licenses.contains_key(&license.id()) {
            return Err(StoreError::NotFound(license.id()));
        }
        state.ensure_unique(license, Some(license.id()))?;
        state.licenses.insert(license.id(), license.clone());
        Ok(license.clone())
    }

    fn delete(&self, id: LicenseId, policy: DeletePolicy) -> StoreResult<Vec<ContentRef>> {
        let mut state = self.write()?;
        if !state.licenses.contains_key(&id) {
            return Err(StoreError::NotFound(id));
        }

        let references = state.references.get(&id).map_or(0, HashSet::len);
        if references > 0 && policy == DeletePolicy::Protect {
            return Err(StoreError::Protected { id, references });
        }

        state.licenses.remove(&id);
        let mut nullified: Vec<ContentRef> = state
            .references
            .remove(&id)
            .map(|refs| refs.into_iter().collect())
            .unwrap_or_default();
        nullified.sort();
        Ok(nullified)
    }

    fn reference_count(&self, id: LicenseId) -> StoreResult<usize> {
        Ok(self.read()?.references.get(&id).map_or(0, HashSet::len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn draft(name: &str, url: &str, slug: &str) -> LicenseDraft {
        LicenseDraft {
            name: name.into(),
            canonical_url: url.into(),
            description: None,
            text: "License text".into(),
            slug: slug.into(),
            is_active: true,
            deprecated_date: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn insert_enforces_each_unique_column() {
        let store = MemoryLicenseStore::new();
        store
            .insert(draft("MIT License", "https://opensource.org/licenses/MIT", "mit"))
            .expect("first insert should succeed");

        let cases = [
            (draft("MIT License", "https://example.com/a", "a"), field::NAME),
            (
                draft("Other", "https://opensource.org/licenses/MIT", "b"),
                field::CANONICAL_URL,
            ),
            (draft("Other", "https://example.com/c", "mit"), field::SLUG),
        ];
        for (draft, expected) in cases {
            let err = store.insert(draft).expect_err("duplicate should be rejected");
            assert!(
                matches!(err, StoreError::UniqueViolation { field } if field == expected),
                "expected violation on {expected}, got {err:?}"
            );
        }
    }

    #[test]
    fn update_does_not_conflict_with_itself() {
        let store = MemoryLicenseStore::new();
        let mut license = store
            .insert(draft("BSD License", "https://example.com/bsd", "bsd-license"))
            .expect("insert should succeed");

        license.text = "Updated text".into();
        let saved = store.update(&license).expect("self update should succeed");
        assert_eq!(saved.text, "Updated text");
    }

    #[test]
    fn find_conflicts_reports_all_taken_fields() {
        let store = MemoryLicenseStore::new();
        let existing = store
            .insert(draft("MIT License", "https://example.com/mit", "mit"))
            .expect("insert should succeed");

        let probe = UniqueProbe {
            name: "MIT License",
            canonical_url: "https://example.com/mit",
            slug: Some("mit"),
        };
        let conflicts = store.find_conflicts(probe, None).expect("query should succeed");
        assert_eq!(conflicts, vec![field::NAME, field::CANONICAL_URL, field::SLUG]);

        let conflicts = store
            .find_conflicts(probe, Some(existing.id()))
            .expect("query should succeed");
        assert!(conflicts.is_empty());
    }

    #[test]
    fn delete_is_protected_while_referenced() {
        let store = MemoryLicenseStore::new();
        let license = store
            .insert(draft("MIT License", "https://example.com/mit", "mit"))
            .expect("insert should succeed");
        let article = ContentRef::new("blog.Article", "42");
        store
            .attach_reference(license.id(), article.clone())
            .expect("attach should succeed");

        let err = store
            .delete(license.id(), DeletePolicy::Protect)
            .expect_err("referenced license must be protected");
        assert!(matches!(err, StoreError::Protected { references: 1, .. }));
        assert!(store.get(license.id()).expect("get").is_some());

        let nullified = store
            .delete(license.id(), DeletePolicy::Nullify)
            .expect("nullify delete should succeed");
        assert_eq!(nullified, vec![article]);
        assert!(store.get(license.id()).expect("get").is_none());
        assert_eq!(store.reference_count(license.id()).expect("count"), 0);
    }

    #[test]
    fn delete_succeeds_once_references_are_detached() {
        let store = MemoryLicenseStore::new();
        let license = store
            .insert(draft("MIT License", "https://example.com/mit", "mit"))
            .expect("insert should succeed");
        let article = ContentRef::new("blog.Article", "7");
        store
            .attach_reference(license.id(), article.clone())
            .expect("attach should succeed");

        assert!(store.detach_reference(license.id(), &article).expect("detach"));
        let nullified = store
            .delete(license.id(), DeletePolicy::Protect)
            .expect("unreferenced license can be deleted");
        assert!(nullified.is_empty());
    }

    #[test]
    fn attach_to_unknown_license_fails() {
        let store = MemoryLicenseStore::new();
        let err = store
            .attach_reference(LicenseId::new(), ContentRef::new("blog.Article", "1"))
            .expect_err("unknown license");
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn list_is_ordered_by_name() {
        let store = MemoryLicenseStore::new();
        for (name, slug) in [("Zlib", "zlib"), ("Apache 2.0", "apache"), ("MIT", "mit")] {
            store
                .insert(draft(name, &format!("https://example.com/{slug}"), slug))
                .expect("insert should succeed");
        }
        let names: Vec<String> = store
            .list()
            .expect("list should succeed")
            .into_iter()
            .map(|l| l.name)
            .collect();
        assert_eq!(names, vec!["Apache 2.0", "MIT", "Zlib"]);
    }
}
