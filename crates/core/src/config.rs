//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the registry
//! and catalog client. The `*_from_env_value` helpers take the raw values rather than
//! reading the environment, so that tests and multi-threaded runtimes never depend on
//! process-wide state during request handling.

use url::Url;

use crate::constants::{
    DEFAULT_CATALOG_TIMEOUT_SECS, DEFAULT_CATALOG_URL, DEFAULT_SLUG_RETRY_LIMIT,
};
use crate::{LicensingError, LicensingResult};

/// Environment variable for [`LicensingConfig::slug_retry_limit`].
pub const SLUG_RETRY_LIMIT_ENV: &str = "LICENSING_SLUG_RETRY_LIMIT";
/// Environment variable for [`LicensingConfig::catalog_base_url`].
pub const CATALOG_URL_ENV: &str = "LICENSING_CATALOG_URL";
/// Environment variable for [`LicensingConfig::catalog_timeout_secs`].
pub const CATALOG_TIMEOUT_ENV: &str = "LICENSING_CATALOG_TIMEOUT_SECS";

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct LicensingConfig {
    slug_retry_limit: usize,
    catalog_base_url: Url,
    catalog_timeout_secs: u64,
}

impl LicensingConfig {
    /// Create a new `LicensingConfig`.
    pub fn new(
        slug_retry_limit: usize,
        catalog_base_url: Url,
        catalog_timeout_secs: u64,
    ) -> LicensingResult<Self> {
        if slug_retry_limit == 0 {
            return Err(LicensingError::InvalidConfig(
                "slug_retry_limit must be at least 1".into(),
            ));
        }
        if catalog_timeout_secs == 0 {
            return Err(LicensingError::InvalidConfig(
                "catalog_timeout_secs must be at least 1".into(),
            ));
        }
        if !matches!(catalog_base_url.scheme(), "http" | "https") {
            return Err(LicensingError::InvalidConfig(
                "catalog base URL must use http or https".into(),
            ));
        }

        Ok(Self {
            slug_retry_limit,
            catalog_base_url: with_trailing_slash(catalog_base_url),
            catalog_timeout_secs,
        })
    }

    /// Resolve configuration from the process environment.
    ///
    /// Intended to be called exactly once, at startup.
    pub fn from_env() -> LicensingResult<Self> {
        Self::new(
            slug_retry_limit_from_env_value(std::env::var(SLUG_RETRY_LIMIT_ENV).ok())?,
            catalog_url_from_env_value(std::env::var(CATALOG_URL_ENV).ok())?,
            catalog_timeout_from_env_value(std::env::var(CATALOG_TIMEOUT_ENV).ok())?,
        )
    }

    /// Maximum number of attempts to allocate a slug when storage reports a collision.
    pub fn slug_retry_limit(&self) -> usize {
        self.slug_retry_limit
    }

    /// Base URL the catalog client resolves `<identifier>.json` documents against.
    pub fn catalog_base_url(&self) -> &Url {
        &self.catalog_base_url
    }

    pub fn catalog_timeout_secs(&self) -> u64 {
        self.catalog_timeout_secs
    }
}

impl Default for LicensingConfig {
    fn default() -> Self {
        Self {
            slug_retry_limit: DEFAULT_SLUG_RETRY_LIMIT,
            catalog_base_url: default_catalog_url(),
            catalog_timeout_secs: DEFAULT_CATALOG_TIMEOUT_SECS,
        }
    }
}

fn default_catalog_url() -> Url {
    match Url::parse(DEFAULT_CATALOG_URL) {
        Ok(url) => url,
        Err(_) => unreachable!("DEFAULT_CATALOG_URL is a valid URL"),
    }
}

// Url::join drops the last path segment unless the base ends with '/'.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the slug retry limit from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default.
pub fn slug_retry_limit_from_env_value(value: Option<String>) -> LicensingResult<usize> {
    match non_blank(value) {
        None => Ok(DEFAULT_SLUG_RETRY_LIMIT),
        Some(v) => v.parse::<usize>().map_err(|_| {
            LicensingError::InvalidConfig(format!(
                "{SLUG_RETRY_LIMIT_ENV} must be a positive integer, got {v:?}"
            ))
        }),
    }
}

/// Parse the catalog base URL from an optional string value.
pub fn catalog_url_from_env_value(value: Option<String>) -> LicensingResult<Url> {
    match non_blank(value) {
        None => Ok(default_catalog_url()),
        Some(v) => Url::parse(&v).map_err(|e| {
            LicensingError::InvalidConfig(format!("{CATALOG_URL_ENV} is not a valid URL: {e}"))
        }),
    }
}

/// Parse the catalog request timeout from an optional string value.
pub fn catalog_timeout_from_env_value(value: Option<String>) -> LicensingResult<u64> {
    match non_blank(value) {
        None => Ok(DEFAULT_CATALOG_TIMEOUT_SECS),
        Some(v) => v.parse::<u64>().map_err(|_| {
            LicensingError::InvalidConfig(format!(
                "{CATALOG_TIMEOUT_ENV} must be a whole number of seconds, got {v:?}"
            ))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_fall_back_to_defaults() {
        assert_eq!(
            slug_retry_limit_from_env_value(Some("  ".into())).unwrap(),
            DEFAULT_SLUG_RETRY_LIMIT
        );
        assert_eq!(
            catalog_timeout_from_env_value(None).unwrap(),
            DEFAULT_CATALOG_TIMEOUT_SECS
        );
        assert_eq!(
            catalog_url_from_env_value(None).unwrap().as_str(),
            DEFAULT_CATALOG_URL
        );
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(matches!(
            slug_retry_limit_from_env_value(Some("five".into())),
            Err(LicensingError::InvalidConfig(_))
        ));
        assert!(matches!(
            catalog_timeout_from_env_value(Some("-1".into())),
            Err(LicensingError::InvalidConfig(_))
        ));
        assert!(matches!(
            catalog_url_from_env_value(Some("not a url".into())),
            Err(LicensingError::InvalidConfig(_))
        ));
    }

    #[test]
    fn new_rejects_zero_limits() {
        let url = Url::parse("https://spdx.org/licenses/").unwrap();
        assert!(LicensingConfig::new(0, url.clone(), 10).is_err());
        assert!(LicensingConfig::new(3, url, 0).is_err());
    }

    #[test]
    fn new_rejects_non_http_catalog() {
        let url = Url::parse("file:///tmp/licenses/").unwrap();
        assert!(LicensingConfig::new(3, url, 10).is_err());
    }

    #[test]
    fn new_normalises_catalog_base_path() {
        let url = Url::parse("http://127.0.0.1:9000/licenses").unwrap();
        let cfg = LicensingConfig::new(3, url, 5).expect("valid config");
        assert_eq!(cfg.catalog_base_url().as_str(), "http://127.0.0.1:9000/licenses/");
        assert_eq!(cfg.slug_retry_limit(), 3);
        assert_eq!(cfg.catalog_timeout_secs(), 5);
    }

    #[test]
    fn default_matches_constants() {
        let cfg = LicensingConfig::default();
        assert_eq!(cfg.slug_retry_limit(), DEFAULT_SLUG_RETRY_LIMIT);
        assert_eq!(cfg.catalog_base_url().as_str(), DEFAULT_CATALOG_URL);
    }
}
