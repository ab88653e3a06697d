//! License reference fields on content entity types.
//!
//! Content entity types describe their fields with [`EntityType`] / [`FieldDescriptor`].
//! A type that carries a license declares a single-valued reference field whose target
//! is the License entity; [`LicenseField`] builds such a descriptor.
//!
//! Checks here run at registration time, once per entity type and field, so that a
//! misconfigured field fails startup instead of surfacing during a request:
//!
//! - [`inspect`] reports what a reference field points at, or a [`FieldError`] when the
//!   field is missing or is not a single-valued reference.
//! - [`validate`] answers "does this field reference License?" on top of `inspect`.
//! - [`LicenseFieldRegistry`] records the entity/field pairs that passed.

use crate::constants::{LICENSE_ENTITY_LABEL, LICENSE_ENTITY_NAME};
use crate::license::License;
use crate::store::DeletePolicy;
use crate::LicensingResult;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("{entity} has no field '{field}'")]
    NotFound { entity: String, field: String },
    #[error("{entity}.{field} is not a valid license field: expected a single-valued reference, found {found}")]
    InvalidKind {
        entity: String,
        field: String,
        found: &'static str,
    },
    #[error("{entity}.{field} references {target}, not {expected}")]
    WrongTarget {
        entity: String,
        field: String,
        target: String,
        expected: &'static str,
    },
}

/// Scalar field kinds; none of them can hold a license.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalarKind {
    Text,
    Integer,
    Boolean,
    Date,
    DateTime,
    Url,
}

/// How a reference field names the entity type it points at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReferenceTarget {
    /// The target type has been resolved to a descriptor.
    Resolved(EntityType),
    /// The target is named by label (`"app.Entity"`) or bare entity name.
    ByName(String),
}

impl ReferenceTarget {
    pub fn label(&self) -> &str {
        match self {
            ReferenceTarget::Resolved(entity) => entity.label(),
            ReferenceTarget::ByName(name) => name,
        }
    }

    /// True if the target is the License entity. Labels compare case-insensitively.
    pub fn is_license(&self) -> bool {
        let label = self.label();
        label.eq_ignore_ascii_case(LICENSE_ENTITY_LABEL)
            || label.eq_ignore_ascii_case(LICENSE_ENTITY_NAME)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Scalar(ScalarKind),
    Reference {
        target: ReferenceTarget,
        on_delete: DeletePolicy,
        nullable: bool,
    },
    ManyReference {
        target: ReferenceTarget,
    },
}

impl FieldKind {
    fn describe(&self) -> &'static str {
        match self {
            FieldKind::Scalar(_) => "scalar field",
            FieldKind::Reference { .. } => "reference field",
            FieldKind::ManyReference { .. } => "many-valued reference field",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
    pub verbose_name: Option<String>,
    pub help_text: Option<String>,
}

impl FieldDescriptor {
    pub fn scalar(name: impl Into<String>, kind: ScalarKind) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Scalar(kind),
            verbose_name: None,
            help_text: None,
        }
    }

    pub fn reference(name: impl Into<String>, target: ReferenceTarget) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Reference {
                target,
                on_delete: DeletePolicy::Protect,
                nullable: false,
            },
            verbose_name: None,
            help_text: None,
        }
    }

    pub fn many_reference(name: impl Into<String>, target: ReferenceTarget) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::ManyReference { target },
            verbose_name: None,
            help_text: None,
        }
    }
}

/// Field layout of a content entity type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityType {
    app: String,
    name: String,
    label: String,
    fields: Vec<FieldDescriptor>,
}

impl EntityType {
    pub fn new(app: impl Into<String>, name: impl Into<String>) -> Self {
        let app = app.into();
        let name = name.into();
        let label = format!("{app}.{name}");
        Self {
            app,
            name,
            label,
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn app(&self) -> &str {
        &self.app
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `"app.Entity"`.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// What a well-formed reference field points at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldTarget {
    License,
    Other(String),
}

impl FieldTarget {
    pub fn is_license(&self) -> bool {
        matches!(self, FieldTarget::License)
    }
}

/// Resolves the target of `entity.field_name`.
///
/// Errors mean the field is misconfigured; `Ok` always describes a usable
/// single-valued reference, whichever type it targets.
pub fn inspect(entity: &EntityType, field_name: &str) -> Result<FieldTarget, FieldError> {
    let field = entity.field(field_name).ok_or_else(|| FieldError::NotFound {
        entity: entity.label().to_owned(),
        field: field_name.to_owned(),
    })?;

    match &field.kind {
        FieldKind::Reference { target, .. } if target.is_license() => Ok(FieldTarget::License),
        FieldKind::Reference { target, .. } => Ok(FieldTarget::Other(target.label().to_owned())),
        other => Err(FieldError::InvalidKind {
            entity: entity.label().to_owned(),
            field: field_name.to_owned(),
            found: other.describe(),
        }),
    }
}

/// Returns whether `entity.field_name` is a reference to the License entity.
///
/// A reference to some other type is `Ok(false)`; a missing or non-reference field is an error.
pub fn validate(entity: &EntityType, field_name: &str) -> Result<bool, FieldError> {
    inspect(entity, field_name).map(|target| target.is_license())
}

const DEFAULT_VERBOSE_NAME: &str = "license";
const DEFAULT_VERBOSE_NAME_PLURAL: &str = "licenses";
const DEFAULT_HELP_TEXT: &str = "The license under which this content is published";

/// Builder for a field that references the License entity.
///
/// ```
/// use licensing_core::fields::{validate, EntityType, LicenseField};
///
/// let article = EntityType::new("blog", "Article")
///     .with_field(LicenseField::new().build("content_license"));
/// assert!(validate(&article, "content_license").unwrap());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LicenseField {
    many: bool,
    on_delete: DeletePolicy,
    nullable: bool,
    verbose_name: Option<String>,
    help_text: Option<String>,
}

impl Default for LicenseField {
    fn default() -> Self {
        Self::new()
    }
}

impl LicenseField {
    /// A single-valued license reference, protected on delete.
    pub fn new() -> Self {
        Self {
            many: false,
            on_delete: DeletePolicy::Protect,
            nullable: false,
            verbose_name: None,
            help_text: None,
        }
    }

    /// A many-valued license reference.
    pub fn many() -> Self {
        Self {
            many: true,
            ..Self::new()
        }
    }

    pub fn on_delete(mut self, policy: DeletePolicy) -> Self {
        self.on_delete = policy;
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn verbose_name(mut self, verbose_name: impl Into<String>) -> Self {
        self.verbose_name = Some(verbose_name.into());
        self
    }

    pub fn help_text(mut self, help_text: impl Into<String>) -> Self {
        self.help_text = Some(help_text.into());
        self
    }

    pub fn build(&self, field_name: impl Into<String>) -> FieldDescriptor {
        let target = ReferenceTarget::ByName(LICENSE_ENTITY_LABEL.to_owned());
        let (kind, default_verbose) = if self.many {
            (FieldKind::ManyReference { target }, DEFAULT_VERBOSE_NAME_PLURAL)
        } else {
            (
                FieldKind::Reference {
                    target,
                    on_delete: self.on_delete,
                    nullable: self.nullable,
                },
                DEFAULT_VERBOSE_NAME,
            )
        };

        FieldDescriptor {
            name: field_name.into(),
            kind,
            verbose_name: Some(
                self.verbose_name
                    .clone()
                    .unwrap_or_else(|| default_verbose.to_owned()),
            ),
            help_text: Some(
                self.help_text
                    .clone()
                    .unwrap_or_else(|| DEFAULT_HELP_TEXT.to_owned()),
            ),
        }
    }
}

/// A value derived from a license field, named the way templates look it up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DerivedDisplay {
    /// `get_<field>_display`
    pub accessor: String,
    pub value: String,
}

/// Display value for a license field: the license name, or empty when unset.
pub fn display_accessor(field_name: &str, license: Option<&License>) -> DerivedDisplay {
    DerivedDisplay {
        accessor: format!("get_{field_name}_display"),
        value: license.map(|l| l.name.clone()).unwrap_or_default(),
    }
}

/// A content entity field confirmed to reference License.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisteredField {
    pub entity: String,
    pub field: String,
}

/// Startup registry of content entity fields that carry a license.
///
/// Registration validates each pair once; later lookups are plain reads.
#[derive(Clone, Debug, Default)]
pub struct LicenseFieldRegistry {
    registered: Vec<RegisteredField>,
}

impl LicenseFieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and records `entity.field_name` as a license field.
    ///
    /// Registering the same pair twice is a no-op. Misconfiguration is returned as
    /// `LicensingError::Field` so startup code can propagate it with `?`.
    pub fn register(&mut self, entity: &EntityType, field_name: &str) -> LicensingResult<()> {
        match inspect(entity, field_name)? {
            FieldTarget::License => {}
            FieldTarget::Other(target) => {
                return Err(FieldError::WrongTarget {
                    entity: entity.label().to_owned(),
                    field: field_name.to_owned(),
                    target,
                    expected: LICENSE_ENTITY_LABEL,
                }
                .into());
            }
        }

        if self.is_registered(entity.label(), field_name) {
            return Ok(());
        }

        tracing::info!(
            entity = entity.label(),
            field = field_name,
            "registered license field"
        );
        self.registered.push(RegisteredField {
            entity: entity.label().to_owned(),
            field: field_name.to_owned(),
        });
        Ok(())
    }

    pub fn is_registered(&self, entity_label: &str, field_name: &str) -> bool {
        self.registered
            .iter()
            .any(|r| r.entity == entity_label && r.field == field_name)
    }

    /// The first registered license field of `entity_label`, if any.
    pub fn license_field_for(&self, entity_label: &str) -> Option<&str> {
        self.registered
            .iter()
            .find(|r| r.entity == entity_label)
            .map(|r| r.field.as_str())
    }

    pub fn registered(&self) -> &[RegisteredField] {
        &self.registered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LicensingError;

    fn user_type() -> EntityType {
        EntityType::new("auth", "User").with_field(FieldDescriptor::scalar("username", ScalarKind::Text))
    }

    fn dataset_type() -> EntityType {
        EntityType::new("research", "Dataset")
            .with_field(FieldDescriptor::scalar("name", ScalarKind::Text))
            .with_field(LicenseField::new().build("license"))
            .with_field(FieldDescriptor::reference(
                "owner",
                ReferenceTarget::Resolved(user_type()),
            ))
            .with_field(LicenseField::many().build("licenses"))
    }

    #[test]
    fn validate_missing_field_is_not_found() {
        let err = validate(&dataset_type(), "nonexistent").expect_err("missing field");
        assert!(matches!(err, FieldError::NotFound { .. }));
        assert!(err.to_string().contains("has no field 'nonexistent'"));
    }

    #[test]
    fn validate_scalar_field_is_invalid_kind() {
        let err = validate(&dataset_type(), "name").expect_err("scalar field");
        assert!(matches!(err, FieldError::InvalidKind { found: "scalar field", .. }));
        assert!(err.to_string().contains("is not a valid license field"));
    }

    #[test]
    fn validate_many_reference_is_invalid_kind() {
        let err = validate(&dataset_type(), "licenses").expect_err("many-valued field");
        assert!(matches!(err, FieldError::InvalidKind { .. }));
    }

    #[test]
    fn validate_reference_to_other_type_is_false() {
        assert_eq!(validate(&dataset_type(), "owner"), Ok(false));
        assert_eq!(
            inspect(&dataset_type(), "owner"),
            Ok(FieldTarget::Other("auth.User".into()))
        );
    }

    #[test]
    fn validate_reference_to_license_is_true() {
        assert_eq!(validate(&dataset_type(), "license"), Ok(true));
    }

    #[test]
    fn by_name_targets_match_case_insensitively() {
        let entity = EntityType::new("blog", "Post")
            .with_field(FieldDescriptor::reference(
                "lowercase",
                ReferenceTarget::ByName("licensing.license".into()),
            ))
            .with_field(FieldDescriptor::reference(
                "bare",
                ReferenceTarget::ByName("License".into()),
            ))
            .with_field(FieldDescriptor::reference(
                "other",
                ReferenceTarget::ByName("auth.User".into()),
            ));

        assert_eq!(validate(&entity, "lowercase"), Ok(true));
        assert_eq!(validate(&entity, "bare"), Ok(true));
        assert_eq!(validate(&entity, "other"), Ok(false));
    }

    #[test]
    fn resolved_license_target_is_recognised() {
        let license_type = EntityType::new("licensing", "License");
        let entity = EntityType::new("blog", "Post").with_field(FieldDescriptor::reference(
            "license",
            ReferenceTarget::Resolved(license_type),
        ));
        assert_eq!(validate(&entity, "license"), Ok(true));
    }

    #[test]
    fn license_field_defaults() {
        let field = LicenseField::new().build("license");
        assert_eq!(
            field.kind,
            FieldKind::Reference {
                target: ReferenceTarget::ByName("licensing.License".into()),
                on_delete: DeletePolicy::Protect,
                nullable: false,
            }
        );
        assert_eq!(field.verbose_name.as_deref(), Some("license"));
        assert_eq!(
            field.help_text.as_deref(),
            Some("The license under which this content is published")
        );
    }

    #[test]
    fn license_field_custom_values() {
        let field = LicenseField::new()
            .on_delete(DeletePolicy::Nullify)
            .nullable(true)
            .verbose_name("Custom License")
            .help_text("Custom help text")
            .build("license");

        assert!(matches!(
            field.kind,
            FieldKind::Reference {
                on_delete: DeletePolicy::Nullify,
                nullable: true,
                ..
            }
        ));
        assert_eq!(field.verbose_name.as_deref(), Some("Custom License"));
        assert_eq!(field.help_text.as_deref(), Some("Custom help text"));
        assert_eq!(
            LicenseField::many().build("licenses").verbose_name.as_deref(),
            Some("licenses")
        );
    }

    #[test]
    fn display_accessor_is_named_after_field() {
        let display = display_accessor("content_license", None);
        assert_eq!(display.accessor, "get_content_license_display");
        assert_eq!(display.value, "");
    }

    #[test]
    fn registry_accepts_license_fields_once() {
        let mut registry = LicenseFieldRegistry::new();
        let dataset = dataset_type();

        registry.register(&dataset, "license").expect("valid license field");
        registry.register(&dataset, "license").expect("re-registration is a no-op");

        assert_eq!(registry.registered().len(), 1);
        assert_eq!(registry.license_field_for("research.Dataset"), Some("license"));
        assert_eq!(registry.license_field_for("auth.User"), None);
    }

    #[test]
    fn registry_ignores_repeat_of_a_later_field() {
        let mut registry = LicenseFieldRegistry::new();
        let dataset = dataset_type().with_field(LicenseField::new().build("data_license"));

        registry.register(&dataset, "license").expect("first field");
        registry.register(&dataset, "data_license").expect("second field");
        registry.register(&dataset, "data_license").expect("repeat is a no-op");
        registry.register(&dataset, "license").expect("repeat is a no-op");

        assert_eq!(registry.registered().len(), 2);
        assert!(registry.is_registered("research.Dataset", "data_license"));
        assert!(!registry.is_registered("research.Dataset", "owner"));
    }

    #[test]
    fn registry_rejects_misconfigured_fields() {
        let mut registry = LicenseFieldRegistry::new();
        let dataset = dataset_type();

        assert!(matches!(
            registry.register(&dataset, "owner"),
            Err(LicensingError::Field(FieldError::WrongTarget { .. }))
        ));
        assert!(matches!(
            registry.register(&dataset, "name"),
            Err(LicensingError::Field(FieldError::InvalidKind { .. }))
        ));
        assert!(matches!(
            registry.register(&dataset, "missing"),
            Err(LicensingError::Field(FieldError::NotFound { .. }))
        ));
        assert!(registry.registered().is_empty());
    }
}
