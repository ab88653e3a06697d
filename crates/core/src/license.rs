//! The License entity and its input shapes.
//!
//! - [`NewLicense`] carries caller-supplied attributes for creation.
//! - [`LicenseChanges`] carries a partial update.
//! - [`LicenseDraft`] is a validated record that has not been assigned an id yet;
//!   storage turns it into a [`License`] with [`LicenseDraft::into_license`].
//!
//! `created_at` is only settable through a draft, so once a `License` exists its
//! creation time cannot be altered.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::SHORT_DESCRIPTION_LEN;

/// Storage-assigned identity of a License.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LicenseId(Uuid);

impl LicenseId {
    /// Allocates a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for LicenseId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LicenseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// A persisted license record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct License {
    id: LicenseId,
    pub name: String,
    pub canonical_url: String,
    pub description: Option<String>,
    pub text: String,
    pub slug: String,
    pub is_active: bool,
    pub deprecated_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl License {
    pub fn id(&self) -> LicenseId {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Alias for the license name, used by attribution text.
    pub fn full_name(&self) -> &str {
        &self.name
    }

    /// The description cut to 100 characters, or `"No description"` when blank.
    pub fn short_description(&self) -> String {
        match self.description.as_deref().map(str::trim) {
            None | Some("") => "No description".to_owned(),
            Some(description) => {
                if description.chars().count() > SHORT_DESCRIPTION_LEN {
                    let cut: String = description.chars().take(SHORT_DESCRIPTION_LEN).collect();
                    format!("{cut}...")
                } else {
                    description.to_owned()
                }
            }
        }
    }

    pub fn status_display(&self) -> &'static str {
        if self.is_active {
            "Active"
        } else {
            "Deprecated"
        }
    }

    /// Returns a copy stamped as a new revision of `stored`.
    ///
    /// The creation time always comes from the stored record and `updated_at` never
    /// moves backwards.
    pub(crate) fn revised_from(&self, stored: &License, now: DateTime<Utc>) -> Self {
        Self {
            created_at: stored.created_at,
            updated_at: now.max(stored.updated_at),
            ..self.clone()
        }
    }
}

impl std::fmt::Display for License {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// A validated license that storage has not yet assigned an identity to.
#[derive(Clone, Debug, PartialEq)]
pub struct LicenseDraft {
    pub name: String,
    pub canonical_url: String,
    pub description: Option<String>,
    pub text: String,
    pub slug: String,
    pub is_active: bool,
    pub deprecated_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl LicenseDraft {
    /// Binds the draft to a storage-assigned identity.
    pub fn into_license(self, id: LicenseId) -> License {
        License {
            id,
            name: self.name,
            canonical_url: self.canonical_url,
            description: self.description,
            text: self.text,
            slug: self.slug,
            is_active: self.is_active,
            deprecated_date: self.deprecated_date,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

fn default_active() -> bool {
    true
}

/// Attributes supplied when creating a license.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NewLicense {
    pub name: String,
    pub canonical_url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub text: String,
    /// Explicit slug; derived from `name` when `None` or empty.
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub deprecated_date: Option<NaiveDate>,
}

impl NewLicense {
    pub fn new(
        name: impl Into<String>,
        canonical_url: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            canonical_url: canonical_url.into(),
            description: None,
            text: text.into(),
            slug: None,
            is_active: true,
            deprecated_date: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    pub fn deprecated_date(mut self, date: Option<NaiveDate>) -> Self {
        self.deprecated_date = date;
        self
    }

    /// Marks the license deprecated as of `date`.
    pub fn deprecated_on(self, date: NaiveDate) -> Self {
        self.active(false).deprecated_date(Some(date))
    }

    /// The explicit slug, treating an empty string as absent.
    pub(crate) fn explicit_slug(&self) -> Option<&str> {
        self.slug.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// A partial update to an existing license. `None` leaves a field untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LicenseChanges {
    pub name: Option<String>,
    pub canonical_url: Option<String>,
    pub description: Option<Option<String>>,
    pub text: Option<String>,
    /// `Some("")` clears the slug so it is derived again from the name.
    pub slug: Option<String>,
    pub is_active: Option<bool>,
    pub deprecated_date: Option<Option<NaiveDate>>,
}

impl LicenseChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn canonical_url(mut self, url: impl Into<String>) -> Self {
        self.canonical_url = Some(url.into());
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn clear_slug(self) -> Self {
        self.slug("")
    }

    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    pub fn deprecated_date(mut self, date: Option<NaiveDate>) -> Self {
        self.deprecated_date = Some(date);
        self
    }

    /// Applies the changes to a copy of `license`.
    pub(crate) fn apply_to(self, license: &License) -> License {
        let mut updated = license.clone();
        if let Some(name) = self.name {
            updated.name = name;
        }
        if let Some(url) = self.canonical_url {
            updated.canonical_url = url;
        }
        if let Some(description) = self.description {
            updated.description = description;
        }
        if let Some(text) = self.text {
            updated.text = text;
        }
        if let Some(slug) = self.slug {
            updated.slug = slug;
        }
        if let Some(is_active) = self.is_active {
            updated.is_active = is_active;
        }
        if let Some(date) = self.deprecated_date {
            updated.deprecated_date = date;
        }
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mit(description: Option<&str>) -> License {
        LicenseDraft {
            name: "MIT License".into(),
            canonical_url: "https://opensource.org/licenses/MIT".into(),
            description: description.map(str::to_owned),
            text: "Permission is hereby granted, free of charge...".into(),
            slug: "mit-license".into(),
            is_active: true,
            deprecated_date: None,
            created_at: Utc::now(),
        }
        .into_license(LicenseId::new())
    }

    #[test]
    fn display_and_full_name_use_the_name() {
        let license = mit(None);
        assert_eq!(license.to_string(), "MIT License");
        assert_eq!(license.full_name(), "MIT License");
    }

    #[test]
    fn short_description_truncates_long_text() {
        let long = "A".repeat(150);
        let license = mit(Some(&long));
        assert_eq!(license.short_description(), format!("{}...", "A".repeat(100)));

        let license = mit(Some("A permissive license that allows for commercial use."));
        assert_eq!(
            license.short_description(),
            "A permissive license that allows for commercial use."
        );
    }

    #[test]
    fn short_description_falls_back_when_blank() {
        assert_eq!(mit(None).short_description(), "No description");
        assert_eq!(mit(Some("")).short_description(), "No description");
    }

    #[test]
    fn status_display_reflects_activity() {
        let mut license = mit(None);
        assert_eq!(license.status_display(), "Active");
        license.is_active = false;
        assert_eq!(license.status_display(), "Deprecated");
    }

    #[test]
    fn draft_sets_matching_timestamps() {
        let license = mit(None);
        assert_eq!(license.created_at(), license.updated_at());
    }

    #[test]
    fn new_license_deserializes_with_defaults() {
        let attrs: NewLicense = serde_json::from_str(
            r#"{"name": "Test License", "canonical_url": "https://example.com/test-license"}"#,
        )
        .expect("minimal attributes should deserialize");
        assert!(attrs.is_active);
        assert_eq!(attrs.description, None);
        assert_eq!(attrs.slug, None);
        assert_eq!(attrs.text, "");
    }

    #[test]
    fn changes_leave_untouched_fields_alone() {
        let license = mit(Some("original"));
        let updated = LicenseChanges::new()
            .text("Updated text")
            .description(None)
            .apply_to(&license);

        assert_eq!(updated.text, "Updated text");
        assert_eq!(updated.description, None);
        assert_eq!(updated.name, license.name);
        assert_eq!(updated.slug, license.slug);
        assert_eq!(updated.id(), license.id());
    }
}
