//! Site content manifests.
//!
//! A manifest is a JSON object whose `slices` list holds descriptors for content that is
//! mounted for the life of the process (navigation, footer, or a static page
//! served by the HTTP surface). Mounting goes through the same
//! [`Registry::publish`] path a page component uses, and the caller keeps
//! the returned handles.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use crate::handle::SliceHandle;
use crate::registry::Registry;
use crate::types::{SliceDescriptor, SliceId, SliceKind};
use crate::GLOBAL_PATH;

/// Error type for manifest loading.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// The manifest file could not be read.
    #[error("Failed to read content manifest: {0}")]
    Io(#[from] std::io::Error),

    /// The manifest is not valid JSON for a descriptor list.
    #[error("Invalid content manifest: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two descriptors pin the same id.
    #[error("Duplicate slice id in manifest: {0}")]
    DuplicateId(SliceId),
}

/// An ordered list of descriptors to mount together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteContent {
    /// Descriptors in manifest order.
    pub slices: Vec<SliceDescriptor>,
}

impl SiteContent {
    /// Create a manifest from descriptors, rejecting duplicate explicit ids.
    pub fn new(slices: Vec<SliceDescriptor>) -> Result<Self, ContentError> {
        let content = Self { slices };
        content.validate()?;
        Ok(content)
    }

    /// Parse a manifest from JSON text.
    pub fn from_json(json: &str) -> Result<Self, ContentError> {
        let content: Self = serde_json::from_str(json)?;
        content.validate()?;
        Ok(content)
    }

    /// Read and parse a manifest file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ContentError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let content = Self::from_json(&json)?;
        tracing::info!(
            path = %path.as_ref().display(),
            slice_count = content.slices.len(),
            "content manifest loaded"
        );
        Ok(content)
    }

    /// Built-in global navigation and footer.
    pub fn site_chrome(nav_links: &[(&str, &str)], footer: &str) -> Self {
        let nav = nav_links
            .iter()
            .map(|(label, href)| format!("- [{}]({})", label, href))
            .collect::<Vec<_>>()
            .join("\n");

        Self {
            slices: vec![
                SliceDescriptor::new(SliceKind::Nav, nav)
                    .with_title("Navigation")
                    .with_order(0.0)
                    .with_path(GLOBAL_PATH),
                SliceDescriptor::new(SliceKind::Footer, footer)
                    .with_title("Footer")
                    .with_order(9999.0)
                    .with_path(GLOBAL_PATH),
            ],
        }
    }

    fn validate(&self) -> Result<(), ContentError> {
        let mut seen = BTreeSet::new();
        for id in self.slices.iter().filter_map(|d| d.id.as_ref()) {
            if !seen.insert(id) {
                return Err(ContentError::DuplicateId(id.clone()));
            }
        }
        Ok(())
    }

    /// Number of descriptors.
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    /// Check if the manifest is empty.
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// Publish every descriptor. The slices stay registered until the
    /// returned handles are dropped.
    pub fn mount(&self, registry: &Registry) -> Vec<SliceHandle> {
        self.slices
            .iter()
            .map(|descriptor| registry.publish(descriptor.clone(), descriptor))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"{
        "slices": [
            {"id": "nav", "type": "nav", "title": "Nav", "content": "- Home\n- Contact", "order": 20, "path": "global"},
            {"type": "hero", "title": "Hero", "content": "Headline text", "order": 10, "path": "/"},
            {"type": "footer", "content": "Footer stuff"}
        ]
    }"#;

    #[test]
    fn test_parse_and_mount() {
        let content = SiteContent::from_json(MANIFEST).unwrap();
        assert_eq!(content.len(), 3);

        let registry = Registry::in_memory();
        let handles = content.mount(&registry);
        assert_eq!(registry.len(), 3);
        assert_eq!(handles[0].id().as_str(), "nav");

        drop(handles);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let json = r#"{"slices":[{"id":"a","content":"1"},{"id":"a","content":"2"}]}"#;
        assert!(matches!(
            SiteContent::from_json(json),
            Err(ContentError::DuplicateId(id)) if id.as_str() == "a"
        ));
    }

    #[test]
    fn test_malformed_manifest() {
        assert!(matches!(SiteContent::from_json("[1,2"), Err(ContentError::Parse(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("content.json");
        std::fs::write(&path, MANIFEST).unwrap();

        let content = SiteContent::load(&path).unwrap();
        assert_eq!(content.slices[1].kind, SliceKind::Hero);

        let missing = SiteContent::load(dir.path().join("missing.json"));
        assert!(matches!(missing, Err(ContentError::Io(_))));
    }

    #[test]
    fn test_site_chrome_brackets_page_content() {
        let registry = Registry::in_memory();
        let _chrome = SiteContent::site_chrome(&[("Home", "/"), ("Blog", "/blog")], "© Site")
            .mount(&registry);
        let _page = registry.publish(SliceDescriptor::new(SliceKind::Page, "Body"), &());

        let ordered = registry.ordered_slices();
        assert_eq!(ordered[0].kind, SliceKind::Nav);
        assert_eq!(ordered[0].content, "- [Home](/)\n- [Blog](/blog)");
        assert_eq!(ordered[1].kind, SliceKind::Page);
        assert_eq!(ordered[2].kind, SliceKind::Footer);
        assert_eq!(ordered[2].path.as_deref(), Some(GLOBAL_PATH));
    }
}
