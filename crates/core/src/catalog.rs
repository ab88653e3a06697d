//! Client for an external license catalog (SPDX license-list data).
//!
//! The catalog serves one JSON document per short identifier at
//! `{base_url}/{identifier}.json`. Fetching is a convenience for filling in license
//! records: [`enrich`] never fails, and when the catalog is unreachable or does not
//! know the identifier the manually supplied attributes are used unchanged.

use std::time::Duration;

use chrono::NaiveDate;
use licensing_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::LicensingConfig;
use crate::license::NewLicense;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("invalid license identifier {0:?}")]
    InvalidIdentifier(String),
    #[error("failed to build catalog HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("catalog returned HTTP {status} for {identifier}")]
    Status { identifier: String, status: u16 },
    #[error("failed to decode catalog entry for {identifier}: {source}")]
    Deserialization {
        identifier: String,
        #[source]
        source: reqwest::Error,
    },
}

/// License data as published by the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub identifier: String,
    pub name: NonEmptyText,
    pub text: String,
    pub html_text: Option<String>,
    pub template: Option<String>,
    pub see_also_urls: Vec<String>,
    pub deprecated: bool,
}

/// Wire shape of an SPDX license-list JSON document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpdxLicenseDocument {
    #[serde(default)]
    license_id: Option<String>,
    name: NonEmptyText,
    license_text: String,
    #[serde(default)]
    license_text_html: Option<String>,
    #[serde(default)]
    standard_license_template: Option<String>,
    #[serde(default)]
    see_also: Vec<String>,
    #[serde(default)]
    is_deprecated_license_id: bool,
}

impl SpdxLicenseDocument {
    fn into_entry(self, requested: &str) -> CatalogEntry {
        CatalogEntry {
            identifier: self.license_id.unwrap_or_else(|| requested.to_owned()),
            name: self.name,
            text: self.license_text,
            html_text: self.license_text_html,
            template: self.standard_license_template,
            see_also_urls: self.see_also,
            deprecated: self.is_deprecated_license_id,
        }
    }
}

impl CatalogEntry {
    /// License attributes taken from this entry.
    ///
    /// The first `seeAlso` URL becomes the canonical URL. Deprecated entries are
    /// marked deprecated as of `today`.
    pub fn to_new_license(&self, today: NaiveDate) -> NewLicense {
        let canonical_url = self
            .see_also_urls
            .iter()
            .find(|u| !is_blank(u))
            .cloned()
            .unwrap_or_default();
        let attrs = NewLicense::new(self.name.as_str(), canonical_url, self.text.clone());
        if self.deprecated {
            attrs.deprecated_on(today)
        } else {
            attrs
        }
    }
}

/// SPDX identifiers are letters, digits, `.`, `-` and `+`.
fn is_valid_identifier(identifier: &str) -> bool {
    !identifier.is_empty()
        && identifier.len() <= 128
        && identifier
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'+'))
        && !identifier.starts_with('.')
}

#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: Url,
}

impl CatalogClient {
    pub fn new(config: &LicensingConfig) -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.catalog_timeout_secs()))
            .build()
            .map_err(CatalogError::Client)?;

        Ok(Self {
            http,
            base_url: config.catalog_base_url().clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn document_url(&self, identifier: &str) -> Result<Url, CatalogError> {
        if !is_valid_identifier(identifier) {
            return Err(CatalogError::InvalidIdentifier(identifier.to_owned()));
        }
        self.base_url
            .join(&format!("{identifier}.json"))
            .map_err(|_| CatalogError::InvalidIdentifier(identifier.to_owned()))
    }

    /// Fetches the catalog entry for a short identifier such as `"MIT"`.
    pub async fn fetch(&self, identifier: &str) -> Result<CatalogEntry, CatalogError> {
        let url = self.document_url(identifier)?;

        let resp = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|source| CatalogError::Http {
                url: url.to_string(),
                source,
            })?;

        if !resp.status().is_success() {
            return Err(CatalogError::Status {
                identifier: identifier.to_owned(),
                status: resp.status().as_u16(),
            });
        }

        let document: SpdxLicenseDocument =
            resp.json()
                .await
                .map_err(|source| CatalogError::Deserialization {
                    identifier: identifier.to_owned(),
                    source,
                })?;

        Ok(document.into_entry(identifier))
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Fills the blank fields of `attrs` from the catalog entry for `identifier`.
///
/// Fields the caller already supplied always win. Catalog failures are logged and
/// leave `attrs` untouched.
pub async fn enrich(client: &CatalogClient, identifier: &str, mut attrs: NewLicense) -> NewLicense {
    let entry = match client.fetch(identifier).await {
        Ok(entry) => entry,
        Err(err) => {
            tracing::warn!(
                identifier,
                error = %err,
                "license catalog lookup failed, keeping supplied fields"
            );
            return attrs;
        }
    };

    if is_blank(&attrs.name) {
        attrs.name = entry.name.into_inner();
    }
    if is_blank(&attrs.text) {
        attrs.text = entry.text;
    }
    if is_blank(&attrs.canonical_url) {
        if let Some(url) = entry.see_also_urls.into_iter().find(|u| !is_blank(u)) {
            attrs.canonical_url = url;
        }
    }
    tracing::debug!(identifier, "enriched license attributes from catalog");
    attrs
}
