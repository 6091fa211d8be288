//! # machine-view
//!
//! Live content registry behind a site's machine-readable view.
//!
//! Page and section components publish what they render as Markdown
//! fragments ("slices"). The registry always holds exactly the slices of the
//! components currently mounted, and the serializer turns that snapshot into
//! one ordered Markdown document an agent can read or a user can paste into
//! a prompt.
//!
//! ## Architecture
//!
//! ```text
//! Component → Registry::publish → SliceHandle ──drop──→ unregister
//!                   ↓
//!               Registry ──→ MarkdownSerializer ──→ MachineDocument
//!                   ↑                                     ↓
//!            PreferenceStore (mode)            MachineViewOverlay → Clipboard
//! ```
//!
//! ## Guarantees
//!
//! - A handle unregisters its slice exactly once, on close or drop
//! - A stale owner can never remove or overwrite a slice re-registered under
//!   the same id by someone else
//! - Slices are emitted by ascending order (missing order = 1000), ties in
//!   registration order
//! - Two renders with no mutation in between differ only in the timestamp

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod store;
pub mod registry;
pub mod handle;
pub mod serializer;
pub mod overlay;
pub mod content;
pub mod config;
pub mod canonical;
pub mod telemetry;

#[cfg(feature = "service")]
pub mod service;

// Re-exports
pub use types::{Mode, Slice, SliceDescriptor, SliceId, SliceIdError, SliceKind, SliceMeta, SlicePatch};
pub use store::{FilePreferenceStore, InMemoryPreferenceStore, PreferenceStore, StoreError};
pub use registry::{OwnerToken, Registry, RegistryEvent, Subscription};
pub use handle::SliceHandle;
pub use serializer::{serialize_registry, MachineDocument, MarkdownSerializer, SerializerConfig};
pub use overlay::{
    Clipboard, ClipboardError, Key, KeyOutcome, KeyPress, MachineViewOverlay, MemoryClipboard,
    Modifiers, RouteSource, SharedRoute, StaticRoute,
};
pub use content::{ContentError, SiteContent};
pub use config::MachineViewConfig;
pub use canonical::{canonical_hash, canonical_hash_hex, to_canonical_bytes};

// Service re-exports (when service feature is enabled)
#[cfg(feature = "service")]
pub use service::{create_router, ServiceState};

/// Sort key assumed for slices without an explicit order.
pub const DEFAULT_SLICE_ORDER: f64 = 1000.0;

/// Durable storage key for the persisted mode.
pub const MODE_STORAGE_KEY: &str = "machine-view:mode";

/// `path` value for slices shared by every route.
pub const GLOBAL_PATH: &str = "global";
