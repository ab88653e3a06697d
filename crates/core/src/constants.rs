//! Constants used throughout the licensing core crate.
//!
//! Field names, length limits and defaults live here so that validation,
//! storage and configuration agree on the same values.

/// App-qualified label of the License entity type, as referenced by content fields.
pub const LICENSE_ENTITY_LABEL: &str = "licensing.License";

/// Bare entity name of the License type.
pub const LICENSE_ENTITY_NAME: &str = "License";

/// Maximum number of characters in a license name.
pub const NAME_MAX_LEN: usize = 255;

/// Maximum number of characters in a canonical URL.
pub const CANONICAL_URL_MAX_LEN: usize = 500;

/// Maximum number of characters in a slug.
pub const SLUG_MAX_LEN: usize = 255;

/// Slug used when a name normalises to nothing.
pub const SLUG_FALLBACK: &str = "license";

/// Creator shown when a content entity exposes no creator.
pub const UNKNOWN_CREATOR: &str = "Unknown";

/// Number of description characters kept by `License::short_description`.
pub const SHORT_DESCRIPTION_LEN: usize = 100;

/// Default number of slug allocation attempts when storage reports a slug collision.
pub const DEFAULT_SLUG_RETRY_LIMIT: usize = 5;

/// Default base URL of the SPDX license-list JSON documents.
pub const DEFAULT_CATALOG_URL: &str = "https://spdx.org/licenses/";

/// Default timeout for catalog requests.
pub const DEFAULT_CATALOG_TIMEOUT_SECS: u64 = 10;

/// URL schemes accepted for canonical license URLs.
pub const ALLOWED_URL_SCHEMES: [&str; 4] = ["http", "https", "ftp", "ftps"];

/// Field names used as keys in validation error maps.
pub mod field {
    pub const NAME: &str = "name";
    pub const CANONICAL_URL: &str = "canonical_url";
    pub const TEXT: &str = "text";
    pub const SLUG: &str = "slug";
    pub const DEPRECATED_DATE: &str = "deprecated_date";
}
