//! Markdown serializer for the registry.
//!
//! ## Output Format
//!
//! ```text
//! # Machine View
//!
//! Generated: 2026-01-01T00:00:00.000Z
//! Route: /blog
//! Mode: machine
//!
//! ---
//!
//! ## Hero
//! > type: hero | path: /
//!
//! Headline text
//!
//! ```
//!
//! Slices are emitted in ascending effective order (missing order counts as
//! [`DEFAULT_SLICE_ORDER`](crate::DEFAULT_SLICE_ORDER)); ties keep
//! registration order. Content is trimmed and otherwise emitted verbatim.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Instant;

use crate::canonical::canonical_hash_hex;
use crate::config::MachineViewConfig;
use crate::registry::Registry;
use crate::telemetry::record_document_rendered;
use crate::types::{Mode, Slice};

/// Options controlling the document's fixed text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializerConfig {
    /// Text of the top-level title line.
    pub document_title: String,
    /// Heading used for slices without a title.
    pub fallback_heading: String,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            document_title: "Machine View".to_string(),
            fallback_heading: "Untitled section".to_string(),
        }
    }
}

impl From<&MachineViewConfig> for SerializerConfig {
    fn from(config: &MachineViewConfig) -> Self {
        Self {
            document_title: config.document_title.clone(),
            fallback_heading: config.fallback_heading.clone(),
        }
    }
}

/// A rendered machine-view document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineDocument {
    /// The Markdown text.
    pub markdown: String,
    /// When the document was rendered.
    pub generated_at: DateTime<Utc>,
    /// Route shown in the header.
    pub route: String,
    /// Mode shown in the header.
    pub mode: Mode,
    /// Number of slice sections.
    pub slice_count: usize,
    /// Hash of everything except the timestamp.
    ///
    /// Equal fingerprints mean the documents differ at most in their
    /// `Generated:` line.
    pub fingerprint: String,
}

/// Fingerprint input: the document minus its timestamp.
#[derive(Serialize)]
struct FingerprintInput<'a> {
    config: &'a SerializerConfig,
    route: &'a str,
    mode: Mode,
    slices: Vec<&'a Slice>,
}

/// Renders registry snapshots as Markdown.
#[derive(Debug, Clone, Default)]
pub struct MarkdownSerializer {
    config: SerializerConfig,
}

impl MarkdownSerializer {
    /// Create a serializer with the given config.
    pub fn new(config: SerializerConfig) -> Self {
        Self { config }
    }

    /// The active config.
    pub fn config(&self) -> &SerializerConfig {
        &self.config
    }

    /// Render the registry's current snapshot, timestamped now.
    pub fn render(&self, registry: &Registry, route: &str) -> MachineDocument {
        let start = Instant::now();
        let document = self.render_at(&registry.ordered_slices(), route, registry.mode(), Utc::now());

        record_document_rendered(
            document.slice_count,
            document.markdown.len(),
            start.elapsed().as_micros() as u64,
        );
        document
    }

    /// Render `slices` as of `generated_at`.
    ///
    /// Pure: the output depends only on the arguments. Slices are sorted by
    /// effective order with a stable sort, so input order breaks ties.
    pub fn render_at(
        &self,
        slices: &[Arc<Slice>],
        route: &str,
        mode: Mode,
        generated_at: DateTime<Utc>,
    ) -> MachineDocument {
        let mut ordered: Vec<&Slice> = slices.iter().map(Arc::as_ref).collect();
        ordered.sort_by(|a, b| a.effective_order().total_cmp(&b.effective_order()));

        let mut markdown = String::new();
        self.write_header(&mut markdown, route, mode, &generated_at);
        for slice in &ordered {
            self.write_slice(&mut markdown, slice);
        }

        let fingerprint = canonical_hash_hex(&FingerprintInput {
            config: &self.config,
            route,
            mode,
            slices: ordered.clone(),
        });

        MachineDocument {
            markdown,
            generated_at,
            route: route.to_string(),
            mode,
            slice_count: ordered.len(),
            fingerprint,
        }
    }

    fn write_header(&self, out: &mut String, route: &str, mode: Mode, generated_at: &DateTime<Utc>) {
        // Writing to a String cannot fail.
        let _ = writeln!(out, "# {}", self.config.document_title);
        out.push('\n');
        let _ = writeln!(
            out,
            "Generated: {}",
            generated_at.to_rfc3339_opts(SecondsFormat::Millis, true)
        );
        let _ = writeln!(out, "Route: {}", route);
        let _ = writeln!(out, "Mode: {}", mode);
        out.push('\n');
        out.push_str("---\n\n");
    }

    fn write_slice(&self, out: &mut String, slice: &Slice) {
        let heading = slice
            .title
            .as_deref()
            .unwrap_or(&self.config.fallback_heading);
        let _ = writeln!(out, "## {}", heading);

        match &slice.path {
            Some(path) => {
                let _ = writeln!(out, "> type: {} | path: {}", slice.kind, path);
            }
            None => {
                let _ = writeln!(out, "> type: {}", slice.kind);
            }
        }
        out.push('\n');
        out.push_str(slice.content.trim());
        out.push_str("\n\n");
    }
}

/// Render the registry with the default serializer config.
pub fn serialize_registry(registry: &Registry, route: &str) -> String {
    MarkdownSerializer::default().render(registry, route).markdown
}
