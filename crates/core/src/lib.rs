//! # Licensing Core
//!
//! Content licensing for a publishing system: license records, slug assignment,
//! validation of license reference fields on content types, and attribution
//! resolution for display.
//!
//! - [`registry::LicenseRegistry`] creates and maintains [`License`] records through a
//!   [`store::LicenseStore`].
//! - [`fields`] checks at registration time that a content type's license field is a
//!   reference to License.
//! - [`attribution`] turns an arbitrary content entity into an [`AttributionContext`]
//!   and never fails while doing so.
//! - [`catalog`] optionally fills license records from the SPDX license list.
//!
//! **No transport concerns**: HTTP, rendering engines and database backends live with
//! the caller; this crate only defines the seams they plug into.

pub mod attribution;
pub mod catalog;
pub mod categories;
pub mod config;
pub mod constants;
pub mod error;
pub mod fields;
pub mod license;
pub mod registry;
pub mod slug;
pub mod store;
pub mod validation;

pub use attribution::{resolve, AttributionContext, Attributable, CreatorEntity, Linkable};
pub use config::LicensingConfig;
pub use error::{LicensingError, LicensingResult, ValidationErrors};
pub use fields::{FieldError, LicenseField};
pub use license::{License, LicenseChanges, LicenseId, NewLicense};
pub use licensing_types::{NonEmptyText, TextError};
pub use registry::LicenseRegistry;
pub use store::{DeletePolicy, LicenseStore, MemoryLicenseStore, StoreError};
