//! Input validation for license records.
//!
//! Every check reports into a [`ValidationErrors`] map keyed by field name, so a single
//! pass collects all problems with a record rather than stopping at the first one.

use chrono::NaiveDate;
use licensing_types::{NonEmptyText, TextError};
use url::Url;

use crate::constants::{
    field, ALLOWED_URL_SCHEMES, CANONICAL_URL_MAX_LEN, NAME_MAX_LEN, SLUG_MAX_LEN,
};
use crate::error::ValidationErrors;
use crate::license::{License, NewLicense};
use crate::slug::is_valid_slug;

pub const BLANK_MESSAGE: &str = "This field cannot be blank.";
pub const INVALID_URL_MESSAGE: &str = "Enter a valid URL.";
pub const INVALID_SLUG_MESSAGE: &str =
    "Enter a valid slug consisting of letters, numbers, underscores or hyphens.";
pub const DEPRECATED_WITHOUT_DATE_MESSAGE: &str =
    "Deprecated licenses must have a deprecated date.";
pub const ACTIVE_WITH_DATE_MESSAGE: &str = "Active licenses should not have a deprecated date.";

/// Borrowed view over the validated fields of a license, whatever shape it arrives in.
#[derive(Clone, Copy, Debug)]
pub struct LicenseFields<'a> {
    pub name: &'a str,
    pub canonical_url: &'a str,
    pub text: &'a str,
    /// `None` when the slug is still to be derived.
    pub slug: Option<&'a str>,
    pub is_active: bool,
    pub deprecated_date: Option<NaiveDate>,
}

impl<'a> From<&'a NewLicense> for LicenseFields<'a> {
    fn from(attrs: &'a NewLicense) -> Self {
        Self {
            name: &attrs.name,
            canonical_url: &attrs.canonical_url,
            text: &attrs.text,
            slug: attrs.explicit_slug(),
            is_active: attrs.is_active,
            deprecated_date: attrs.deprecated_date,
        }
    }
}

impl<'a> From<&'a License> for LicenseFields<'a> {
    fn from(license: &'a License) -> Self {
        let slug = license.slug.trim();
        Self {
            name: &license.name,
            canonical_url: &license.canonical_url,
            text: &license.text,
            slug: (!slug.is_empty()).then_some(slug),
            is_active: license.is_active,
            deprecated_date: license.deprecated_date,
        }
    }
}

/// Runs every field and cross-field check, returning all violations found.
pub fn validate_license(fields: LicenseFields<'_>) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    if let Err(message) = check_bounded_text(fields.name, NAME_MAX_LEN) {
        errors.add(field::NAME, message);
    }
    if let Err(message) = check_canonical_url(fields.canonical_url) {
        errors.add(field::CANONICAL_URL, message);
    }
    if fields.text.trim().is_empty() {
        errors.add(field::TEXT, BLANK_MESSAGE);
    }
    if let Some(slug) = fields.slug {
        if let Err(message) = check_slug(slug) {
            errors.add(field::SLUG, message);
        }
    }
    errors.merge(validate_deprecation(fields.is_active, fields.deprecated_date));

    errors
}

/// Cross-field invariant: a license is deprecated exactly when it carries a deprecation date.
pub fn validate_deprecation(is_active: bool, deprecated_date: Option<NaiveDate>) -> ValidationErrors {
    match (is_active, deprecated_date) {
        (false, None) => {
            ValidationErrors::single(field::DEPRECATED_DATE, DEPRECATED_WITHOUT_DATE_MESSAGE)
        }
        (true, Some(_)) => {
            ValidationErrors::single(field::DEPRECATED_DATE, ACTIVE_WITH_DATE_MESSAGE)
        }
        _ => ValidationErrors::new(),
    }
}

fn check_bounded_text(value: &str, max: usize) -> Result<NonEmptyText, String> {
    match NonEmptyText::with_max_len(value, max) {
        Ok(text) => Ok(text),
        Err(TextError::Empty) => Err(BLANK_MESSAGE.to_owned()),
        Err(TextError::TooLong { max, actual }) => Err(format!(
            "Ensure this value has at most {max} characters (it has {actual})."
        )),
    }
}

/// Validates a canonical URL: non-empty, bounded, absolute, with an accepted scheme and a host.
pub fn check_canonical_url(value: &str) -> Result<(), String> {
    let trimmed = check_bounded_text(value, CANONICAL_URL_MAX_LEN)?;

    if trimmed.as_str() != value || value.chars().any(char::is_whitespace) {
        return Err(INVALID_URL_MESSAGE.to_owned());
    }

    let url = Url::parse(value).map_err(|_| INVALID_URL_MESSAGE.to_owned())?;
    let scheme_ok = ALLOWED_URL_SCHEMES.contains(&url.scheme());
    let host_ok = url.host_str().is_some_and(|host| !host.is_empty());

    if scheme_ok && host_ok {
        Ok(())
    } else {
        Err(INVALID_URL_MESSAGE.to_owned())
    }
}

/// Validates an explicitly supplied slug.
pub fn check_slug(value: &str) -> Result<(), String> {
    let slug = check_bounded_text(value, SLUG_MAX_LEN)?;
    if slug.as_str() == value && is_valid_slug(slug.as_str()) {
        Ok(())
    } else {
        Err(INVALID_SLUG_MESSAGE.to_owned())
    }
}
