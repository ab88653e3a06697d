//! License registry: the entry point for creating and maintaining license records.
//!
//! The registry validates input, assigns slugs and delegates persistence to a
//! [`LicenseStore`]. Uniqueness of name, canonical URL and slug is checked up front so
//! callers get field-scoped [`ValidationErrors`]; the store remains the final authority,
//! and a slug collision it reports (another writer won the race) is retried against a
//! fresh slug set up to [`LicensingConfig::slug_retry_limit`] times.

use std::sync::Arc;

use chrono::Utc;

use crate::catalog::CatalogClient;
use crate::config::LicensingConfig;
use crate::constants::field;
use crate::error::ValidationErrors;
use crate::license::{License, LicenseChanges, LicenseDraft, LicenseId, NewLicense};
use crate::slug;
use crate::store::{ContentRef, DeletePolicy, LicenseStore, StoreError, UniqueProbe};
use crate::validation::{validate_license, LicenseFields};
use crate::{LicensingError, LicensingResult};

fn unique_message(column: &str) -> String {
    let label = match column {
        field::CANONICAL_URL => "canonical URL",
        other => other,
    };
    format!("License with this {label} already exists.")
}

fn slug_exhausted(attempts: usize) -> ValidationErrors {
    ValidationErrors::single(
        field::SLUG,
        format!("Could not allocate a unique slug after {attempts} attempts."),
    )
}

/// Translates storage failures, turning unique violations into field-scoped errors.
fn store_failure(err: StoreError) -> LicensingError {
    match err {
        StoreError::UniqueViolation { field: column } => {
            ValidationErrors::single(column, unique_message(column)).into()
        }
        other => LicensingError::Store(other),
    }
}

#[derive(Clone)]
pub struct LicenseRegistry {
    store: Arc<dyn LicenseStore>,
    config: Arc<LicensingConfig>,
}

impl std::fmt::Debug for LicenseRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenseRegistry")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LicenseRegistry {
    pub fn new(store: Arc<dyn LicenseStore>, config: LicensingConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &LicensingConfig {
        &self.config
    }

    fn check_unique(&self, probe: UniqueProbe<'_>, exclude: Option<LicenseId>) -> LicensingResult<()> {
        let mut errors = ValidationErrors::new();
        for column in self.store.find_conflicts(probe, exclude)? {
            errors.add(column, unique_message(column));
        }
        errors.into_result()
    }

    /// Validates and persists a new license.
    ///
    /// When `attrs.slug` is empty the slug is derived from the name.
    ///
    /// # Errors
    ///
    /// Returns `LicensingError::Validation` for invalid input, a taken name, URL or
    /// explicit slug, or when no free slug could be allocated within the retry limit.
    /// Other storage failures are returned as `LicensingError::Store`.
    pub fn create(&self, attrs: NewLicense) -> LicensingResult<License> {
        validate_license(LicenseFields::from(&attrs)).into_result()?;

        let explicit_slug = attrs.explicit_slug().map(str::to_owned);
        self.check_unique(
            UniqueProbe {
                name: &attrs.name,
                canonical_url: &attrs.canonical_url,
                slug: explicit_slug.as_deref(),
            },
            None,
        )?;

        let created_at = Utc::now();
        let limit = self.config.slug_retry_limit();

        for attempt in 1..=limit {
            let slug = match &explicit_slug {
                Some(slug) => slug.clone(),
                None => slug::assign(&attrs.name, &self.store.slugs()?, None),
            };

            let draft = LicenseDraft {
                name: attrs.name.clone(),
                canonical_url: attrs.canonical_url.clone(),
                description: attrs.description.clone(),
                text: attrs.text.clone(),
                slug: slug.clone(),
                is_active: attrs.is_active,
                deprecated_date: attrs.deprecated_date,
                created_at,
            };

            match self.store.insert(draft) {
                Ok(license) => return Ok(license),
                Err(StoreError::UniqueViolation { field: field::SLUG }) if explicit_slug.is_none() => {
                    tracing::debug!(attempt, %slug, "derived slug taken in storage, retrying");
                }
                Err(err) => return Err(store_failure(err)),
            }
        }

        Err(slug_exhausted(limit).into())
    }

    /// Creates a license from its catalog entry.
    ///
    /// Unlike [`crate::catalog::enrich`], a failed lookup is an error here
    /// (`LicensingError::Catalog`) since there are no manual fields to fall back to.
    pub async fn import(&self, client: &CatalogClient, identifier: &str) -> LicensingResult<License> {
        let entry = client.fetch(identifier).await?;
        tracing::info!(identifier, name = %entry.name, "importing license from catalog");
        self.create(entry.to_new_license(Utc::now().date_naive()))
    }

    /// Applies `changes` to `license` and saves the result.
    pub fn update(&self, license: &License, changes: LicenseChanges) -> LicensingResult<License> {
        self.save(changes.apply_to(license))
    }

    /// Saves a modified copy of a stored license.
    ///
    /// The slug is only recomputed when it has been cleared; a rename alone leaves it
    /// untouched. The creation time of the stored record is always kept.
    pub fn save(&self, mut license: License) -> LicensingResult<License> {
        let id = license.id();
        let stored = self.store.get(id)?.ok_or(StoreError::NotFound(id))?;

        license.slug = license.slug.trim().to_owned();
        validate_license(LicenseFields::from(&license)).into_result()?;

        let regenerate = license.slug.is_empty();
        self.check_unique(
            UniqueProbe {
                name: &license.name,
                canonical_url: &license.canonical_url,
                slug: (!regenerate).then_some(license.slug.as_str()),
            },
            Some(id),
        )?;

        let now = Utc::now();
        let limit = self.config.slug_retry_limit();
        let mut candidate = license.revised_from(&stored, now);

        for attempt in 1..=limit {
            if regenerate {
                candidate.slug =
                    slug::assign(&candidate.name, &self.store.slugs()?, Some(&stored.slug));
            }

            match self.store.update(&candidate) {
                Ok(saved) => return Ok(saved),
                Err(StoreError::UniqueViolation { field: field::SLUG }) if regenerate => {
                    tracing::debug!(attempt, slug = %candidate.slug, "derived slug taken in storage, retrying");
                }
                Err(err) => return Err(store_failure(err)),
            }
        }

        Err(slug_exhausted(limit).into())
    }

    /// Active licenses ordered by name.
    pub fn recommended(&self) -> LicensingResult<Vec<License>> {
        let mut licenses: Vec<License> = self
            .store
            .list()?
            .into_iter()
            .filter(|l| l.is_active)
            .collect();
        licenses.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(licenses)
    }

    pub fn get(&self, id: LicenseId) -> LicensingResult<Option<License>> {
        Ok(self.store.get(id)?)
    }

    pub fn get_by_slug(&self, slug: &str) -> LicensingResult<Option<License>> {
        Ok(self.store.find_by_slug(slug)?)
    }

    /// All licenses ordered by name.
    pub fn list(&self) -> LicensingResult<Vec<License>> {
        Ok(self.store.list()?)
    }

    /// Deletes a license.
    ///
    /// Under [`DeletePolicy::Protect`] a license still referenced by content is refused
    /// with `StoreError::Protected`. Under [`DeletePolicy::Nullify`] the references that
    /// were dropped are returned.
    pub fn delete(&self, id: LicenseId, policy: DeletePolicy) -> LicensingResult<Vec<ContentRef>> {
        let nullified = self.store.delete(id, policy)?;
        if !nullified.is_empty() {
            tracing::info!(
                license = %id,
                references = nullified.len(),
                "deleted license and nullified content references"
            );
        }
        Ok(nullified)
    }
}
