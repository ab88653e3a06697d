use std::collections::BTreeMap;
use std::fmt;

use crate::catalog::CatalogError;
use crate::fields::FieldError;
use crate::store::StoreError;

/// Field-scoped business-rule violations collected during a validation pass.
///
/// Keys are the offending field names (see [`crate::constants::field`]), values are
/// human-readable messages in the order they were raised.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<&'static str, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set holding a single message for `field`.
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    /// Messages recorded for `field`, empty if the field is valid.
    pub fn messages(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.errors.keys().copied()
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.errors {
            self.errors.entry(field).or_default().extend(messages);
        }
    }

    /// Converts the collected errors into a result, `Ok` when nothing was recorded.
    pub fn into_result(self) -> LicensingResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(LicensingError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.errors {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LicensingError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("license field misconfigured: {0}")]
    Field(#[from] FieldError),
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
    #[error("license catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl LicensingError {
    /// Returns the field-scoped errors if this is a validation failure.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            LicensingError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for LicensingError {
    fn from(errors: ValidationErrors) -> Self {
        LicensingError::Validation(errors)
    }
}

pub type LicensingResult<T> = std::result::Result<T, LicensingError>;
