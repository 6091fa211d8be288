//! Slice types: the unit of content a component publishes into the registry.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::DEFAULT_SLICE_ORDER;

/// Free-form metadata attached to a slice.
///
/// Opaque to the registry and serializer; only emptiness is ever checked.
pub type SliceMeta = BTreeMap<String, serde_json::Value>;

/// Error returned when constructing an invalid slice id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SliceIdError {
    /// The id was empty or whitespace only.
    #[error("Slice id must not be empty")]
    Empty,
}

/// Unique identifier for a slice within a registry.
///
/// Caller-supplied ids should be namespaced by the owning component
/// (`"home:hero"`); generated ids are `slice-<uuid>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SliceId(String);

impl SliceId {
    /// Create a slice id, rejecting empty strings.
    pub fn new(id: impl Into<String>) -> Result<Self, SliceIdError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(SliceIdError::Empty);
        }
        Ok(Self(id))
    }

    /// Generate a fresh id for a component instance that did not supply one.
    pub fn generate() -> Self {
        Self(format!("slice-{}", Uuid::new_v4()))
    }

    /// Get the id as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SliceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SliceId {
    type Error = SliceIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SliceId> for String {
    fn from(id: SliceId) -> Self {
        id.0
    }
}

/// Classification of a slice, shown in the serialized metadata line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SliceKind {
    /// A whole page.
    Page,
    /// A section within a page.
    Section,
    /// The hero block at the top of a page.
    Hero,
    /// Navigation.
    Nav,
    /// Footer.
    Footer,
    /// A testimonial.
    Testimonial,
    /// Anything else.
    Generic,
}

impl SliceKind {
    /// Parse a kind from its lowercase name.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "page" => Some(Self::Page),
            "section" => Some(Self::Section),
            "hero" => Some(Self::Hero),
            "nav" => Some(Self::Nav),
            "footer" => Some(Self::Footer),
            "testimonial" => Some(Self::Testimonial),
            "generic" => Some(Self::Generic),
            _ => None,
        }
    }
}

impl Default for SliceKind {
    fn default() -> Self {
        Self::Generic
    }
}

impl fmt::Display for SliceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page => write!(f, "page"),
            Self::Section => write!(f, "section"),
            Self::Hero => write!(f, "hero"),
            Self::Nav => write!(f, "nav"),
            Self::Footer => write!(f, "footer"),
            Self::Testimonial => write!(f, "testimonial"),
            Self::Generic => write!(f, "generic"),
        }
    }
}

/// A registered content fragment.
///
/// Slices are immutable once registered: the registry stores them behind an
/// `Arc` and every change goes through `Registry::update_slice`, which
/// replaces the stored value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slice {
    /// Registry key.
    pub id: SliceId,
    /// Display classification.
    #[serde(rename = "type")]
    pub kind: SliceKind,
    /// Optional heading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Markdown payload, emitted verbatim.
    pub content: String,
    /// Ascending sort key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<f64>,
    /// Owning route, or `"global"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Opaque metadata.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: SliceMeta,
}

impl Slice {
    /// Create a slice with the required fields.
    pub fn new(id: SliceId, kind: SliceKind, content: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            title: None,
            content: content.into(),
            order: None,
            path: None,
            meta: SliceMeta::new(),
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the sort key.
    pub fn with_order(mut self, order: f64) -> Self {
        self.order = Some(order);
        self
    }

    /// Set the owning route.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Add a metadata entry.
    pub fn with_meta(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }

    /// Sort key with the default applied.
    pub fn effective_order(&self) -> f64 {
        self.order.unwrap_or(DEFAULT_SLICE_ORDER)
    }

    /// Build a slice from a patch when no entry exists yet.
    pub(crate) fn from_patch(id: SliceId, patch: SlicePatch) -> Self {
        let mut slice = Self::new(id, SliceKind::default(), String::new());
        patch.apply_to(&mut slice);
        slice
    }
}

/// Shallow partial update for a slice.
///
/// `None` leaves a field untouched. For optional fields, `Some(None)` clears
/// the field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlicePatch {
    /// New kind.
    #[serde(default, rename = "type")]
    pub kind: Option<SliceKind>,
    /// New title, or `Some(None)` to clear it.
    #[serde(default)]
    pub title: Option<Option<String>>,
    /// New content.
    #[serde(default)]
    pub content: Option<String>,
    /// New sort key, or `Some(None)` to clear it.
    #[serde(default)]
    pub order: Option<Option<f64>>,
    /// New path, or `Some(None)` to clear it.
    #[serde(default)]
    pub path: Option<Option<String>>,
    /// Replacement metadata.
    #[serde(default)]
    pub meta: Option<SliceMeta>,
}

impl SlicePatch {
    /// Create an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the content.
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Replace the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(Some(title.into()));
        self
    }

    /// Replace the sort key.
    pub fn order(mut self, order: f64) -> Self {
        self.order = Some(Some(order));
        self
    }

    /// Replace the kind.
    pub fn kind(mut self, kind: SliceKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Whether applying this patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.kind.is_none()
            && self.title.is_none()
            && self.content.is_none()
            && self.order.is_none()
            && self.path.is_none()
            && self.meta.is_none()
    }

    /// Merge this patch into `slice`.
    pub fn apply_to(self, slice: &mut Slice) {
        if let Some(kind) = self.kind {
            slice.kind = kind;
        }
        if let Some(title) = self.title {
            slice.title = title;
        }
        if let Some(content) = self.content {
            slice.content = content;
        }
        if let Some(order) = self.order {
            slice.order = order;
        }
        if let Some(path) = self.path {
            slice.path = path;
        }
        if let Some(meta) = self.meta {
            slice.meta = meta;
        }
    }
}

/// What a component publishes: a slice minus its (optional) id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SliceDescriptor {
    /// Explicit id; generated per handle when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SliceId>,
    /// Display classification.
    #[serde(default, rename = "type")]
    pub kind: SliceKind,
    /// Optional heading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Markdown payload.
    #[serde(default)]
    pub content: String,
    /// Ascending sort key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<f64>,
    /// Owning route, or `"global"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Opaque metadata.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: SliceMeta,
}

impl SliceDescriptor {
    /// Create a descriptor with the required fields.
    pub fn new(kind: SliceKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            ..Self::default()
        }
    }

    /// Pin an explicit id.
    pub fn with_id(mut self, id: SliceId) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the sort key.
    pub fn with_order(mut self, order: f64) -> Self {
        self.order = Some(order);
        self
    }

    /// Set the owning route.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Add a metadata entry.
    pub fn with_meta(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }

    /// Resolve into a full slice under `id`.
    pub fn into_slice(self, id: SliceId) -> Slice {
        Slice {
            id,
            kind: self.kind,
            title: self.title,
            content: self.content,
            order: self.order,
            path: self.path,
            meta: self.meta,
        }
    }
}

/// A descriptor replaces every field wholesale when used as a patch.
impl From<SliceDescriptor> for SlicePatch {
    fn from(descriptor: SliceDescriptor) -> Self {
        Self {
            kind: Some(descriptor.kind),
            title: Some(descriptor.title),
            content: Some(descriptor.content),
            order: Some(descriptor.order),
            path: Some(descriptor.path),
            meta: Some(descriptor.meta),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> SliceId {
        SliceId::new(s).unwrap()
    }

    #[test]
    fn test_slice_id_rejects_empty() {
        assert_eq!(SliceId::new(""), Err(SliceIdError::Empty));
        assert_eq!(SliceId::new("   "), Err(SliceIdError::Empty));
        assert!(SliceId::new("home:hero").is_ok());
    }

    #[test]
    fn test_generated_ids_are_distinct() {
        let a = SliceId::generate();
        let b = SliceId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("slice-"));
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        let json = serde_json::to_string(&SliceKind::Testimonial).unwrap();
        assert_eq!(json, "\"testimonial\"");
        assert_eq!(SliceKind::from_str("HERO"), Some(SliceKind::Hero));
        assert_eq!(SliceKind::from_str("banner"), None);
    }

    #[test]
    fn test_effective_order_defaults() {
        let unordered = Slice::new(id("a"), SliceKind::Section, "x");
        assert_eq!(unordered.effective_order(), DEFAULT_SLICE_ORDER);
        assert_eq!(unordered.with_order(5.0).effective_order(), 5.0);
    }

    #[test]
    fn test_patch_merges_shallowly() {
        let mut slice = Slice::new(id("x"), SliceKind::Hero, "A")
            .with_title("Old")
            .with_path("/");

        SlicePatch::new().content("B").apply_to(&mut slice);

        assert_eq!(slice.content, "B");
        assert_eq!(slice.title.as_deref(), Some("Old"));
        assert_eq!(slice.path.as_deref(), Some("/"));
        assert_eq!(slice.kind, SliceKind::Hero);
    }

    #[test]
    fn test_descriptor_patch_replaces_wholesale() {
        let mut slice = Slice::new(id("x"), SliceKind::Hero, "A")
            .with_title("Old")
            .with_order(10.0);

        let patch: SlicePatch = SliceDescriptor::new(SliceKind::Section, "B").into();
        patch.apply_to(&mut slice);

        assert_eq!(slice.kind, SliceKind::Section);
        assert_eq!(slice.content, "B");
        assert_eq!(slice.title, None);
        assert_eq!(slice.order, None);
    }

    #[test]
    fn test_from_patch_uses_defaults() {
        let slice = Slice::from_patch(id("late"), SlicePatch::new().content("only content"));
        assert_eq!(slice.kind, SliceKind::Generic);
        assert_eq!(slice.content, "only content");
        assert!(slice.title.is_none());
    }

    #[test]
    fn test_descriptor_deserializes_from_json() {
        let json = r#"{"type":"nav","title":"Nav","content":"- Home","order":20,"path":"global"}"#;
        let descriptor: SliceDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(descriptor.kind, SliceKind::Nav);
        assert_eq!(descriptor.order, Some(20.0));
        assert!(descriptor.id.is_none());

        let bad = r#"{"id":"","type":"nav","content":"x"}"#;
        assert!(serde_json::from_str::<SliceDescriptor>(bad).is_err());
    }
}
