//! Attribution for licensed content.
//!
//! [`resolve`] turns any [`Attributable`] content entity into an [`AttributionContext`]
//! for display. Content types opt into each piece of attribution through capabilities:
//!
//! - [`Linkable::absolute_url`] for the content link and the creator link,
//! - [`Attributable::creators`] / [`Attributable::creator`] for the credited creator.
//!
//! Resolution never fails. Each capability is probed on its own; an error, a panic, or a
//! capability the type does not implement all read as "absent", are logged as a warning,
//! and resolution carries on with the next field.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use serde::Serialize;

use crate::constants::UNKNOWN_CREATOR;
use crate::license::License;

/// Failure reported by a capability implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ProbeError(String);

impl ProbeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

pub type ProbeResult<T> = std::result::Result<T, ProbeError>;

/// Something that may be addressable by an absolute URL.
pub trait Linkable {
    /// `Ok(None)` when the object has no URL.
    fn absolute_url(&self) -> ProbeResult<Option<String>> {
        Ok(None)
    }
}

/// A creator object credited for content.
pub trait CreatorEntity: Linkable {
    fn display_name(&self) -> ProbeResult<String>;

    fn type_name(&self) -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }
}

/// A creator as exposed by a content entity.
#[derive(Clone, Copy)]
pub enum CreatorRef<'a> {
    /// A plain credit line such as `"Jane Doe"`.
    Text(&'a str),
    Entity(&'a dyn CreatorEntity),
}

impl CreatorRef<'_> {
    fn is_truthy(&self) -> bool {
        match self {
            CreatorRef::Text(text) => !text.trim().is_empty(),
            CreatorRef::Entity(_) => true,
        }
    }
}

impl std::fmt::Debug for CreatorRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CreatorRef::Text(text) => f.debug_tuple("Text").field(text).finish(),
            CreatorRef::Entity(entity) => f.debug_tuple("Entity").field(&entity.type_name()).finish(),
        }
    }
}

/// Content that can be credited in an attribution line.
pub trait Attributable: Linkable {
    /// Human-readable title of the content.
    fn title(&self) -> ProbeResult<String>;

    /// Collective creator credit; takes precedence over [`Attributable::creator`].
    fn creators(&self) -> ProbeResult<Option<CreatorRef<'_>>> {
        Ok(None)
    }

    fn creator(&self) -> ProbeResult<Option<CreatorRef<'_>>> {
        Ok(None)
    }

    fn type_name(&self) -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }
}

/// Display context for one piece of licensed content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AttributionContext {
    pub title: String,
    pub link: Option<String>,
    pub creator: String,
    pub creator_link: Option<String>,
}

impl AttributionContext {
    /// True when no creator could be resolved.
    pub fn creator_is_unknown(&self) -> bool {
        self.creator == UNKNOWN_CREATOR
    }
}

fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

/// Runs one capability probe, absorbing errors and panics.
fn probe<T>(entity: &str, capability: &'static str, f: impl FnOnce() -> ProbeResult<T>) -> Option<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Some(value),
        Ok(Err(err)) => {
            tracing::warn!(
                entity,
                capability,
                error = %err,
                "Error getting license attribution"
            );
            None
        }
        Err(payload) => {
            tracing::warn!(
                entity,
                capability,
                panic = %panic_message(payload.as_ref()),
                "Error getting license attribution: capability panicked"
            );
            None
        }
    }
}

fn entity_type_name(entity: &dyn Attributable) -> &'static str {
    probe("unknown", "type_name", || Ok(entity.type_name())).unwrap_or("Object")
}

fn creator_type_name(creator: &dyn CreatorEntity) -> &'static str {
    probe("unknown", "type_name", || Ok(creator.type_name())).unwrap_or("Object")
}

fn resolve_creator<'a>(entity: &'a dyn Attributable, type_name: &str) -> Option<CreatorRef<'a>> {
    let creators = probe(type_name, "creators", || entity.creators()).flatten();
    if let Some(creators) = creators.filter(CreatorRef::is_truthy) {
        return Some(creators);
    }
    probe(type_name, "creator", || entity.creator())
        .flatten()
        .filter(CreatorRef::is_truthy)
}

/// Builds the attribution context for `entity`. Never fails.
pub fn resolve(entity: &dyn Attributable) -> AttributionContext {
    let type_name = entity_type_name(entity);

    let title = probe(type_name, "title", || entity.title())
        .unwrap_or_else(|| format!("{type_name} object"));

    let link = probe(type_name, "absolute_url", || entity.absolute_url()).flatten();

    let (creator, creator_link) = match resolve_creator(entity, type_name) {
        None => (UNKNOWN_CREATOR.to_owned(), None),
        Some(CreatorRef::Text(text)) => (text.to_owned(), None),
        Some(CreatorRef::Entity(creator)) => {
            let creator_type = creator_type_name(creator);
            let name = probe(creator_type, "display_name", || creator.display_name())
                .unwrap_or_else(|| format!("{creator_type} object"));
            let url = probe(creator_type, "absolute_url", || creator.absolute_url()).flatten();
            (name, url)
        }
    };

    AttributionContext {
        title,
        link,
        creator,
        creator_link,
    }
}

/// The entity's own `creator`, ignoring `creators`. `None` when absent, blank, or failing.
pub fn license_creator(entity: &dyn Attributable) -> Option<CreatorRef<'_>> {
    let type_name = entity_type_name(entity);
    probe(type_name, "creator", || entity.creator())
        .flatten()
        .filter(CreatorRef::is_truthy)
}

/// Everything a renderer needs to display a license notice for one piece of content.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AttributionView {
    pub license: License,
    pub attribution: AttributionContext,
}

/// Bundles `license` with the resolved attribution for `entity`.
pub fn attribution_context(entity: &dyn Attributable, license: &License) -> AttributionView {
    AttributionView {
        license: license.clone(),
        attribution: resolve(entity),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("template not found: {0}")]
    TemplateNotFound(String),
    #[error("render failed: {0}")]
    Failed(String),
}

/// Rendering collaborator that turns an attribution view into displayable markup or text.
pub trait SnippetRenderer {
    fn render(&self, view: &AttributionView) -> Result<String, RenderError>;
}

/// Renders `"<title> by <creator> is licensed under <license> (<url>)"`.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainTextRenderer;

impl SnippetRenderer for PlainTextRenderer {
    fn render(&self, view: &AttributionView) -> Result<String, RenderError> {
        let attribution = &view.attribution;
        let mut line = attribution.title.clone();
        if !attribution.creator_is_unknown() {
            line.push_str(" by ");
            line.push_str(&attribution.creator);
        }
        line.push_str(&format!(
            " is licensed under {} ({})",
            view.license.full_name(),
            view.license.canonical_url
        ));
        Ok(line)
    }
}

/// Renders the license notice for `entity`, or an empty string when there is no
/// license or rendering fails.
pub fn snippet(
    entity: &dyn Attributable,
    license: Option<&License>,
    renderer: &dyn SnippetRenderer,
) -> String {
    let Some(license) = license else {
        return String::new();
    };

    let view = attribution_context(entity, license);
    let type_name = entity_type_name(entity);
    probe(type_name, "render", || {
        renderer
            .render(&view)
            .map_err(|e| ProbeError::new(e.to_string()))
    })
    .unwrap_or_else(|| {
        tracing::warn!(entity = type_name, license = %license.slug, "Error generating license snippet");
        String::new()
    })
}
