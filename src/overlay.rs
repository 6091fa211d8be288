//! Mode toggle and overlay controller.
//!
//! The overlay is the consumer-facing side of the registry: it flips the
//! mode, answers whether page scroll must be suppressed, renders the
//! document while the machine view is open, and copies it to the clipboard.
//! Keyboard accelerators are thin wrappers over `Registry::toggle_mode` and
//! `Registry::set_mode`; the overlay holds no mode state of its own.

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::MachineViewConfig;
use crate::registry::Registry;
use crate::serializer::{MachineDocument, MarkdownSerializer, SerializerConfig};
use crate::telemetry::record_copy;
use crate::types::Mode;

// ─────────────────────────────────────────────────────────────────────────────
// Route source
// ─────────────────────────────────────────────────────────────────────────────

/// Supplies the current route path, polled at render time.
pub trait RouteSource: Send + Sync {
    /// The route the user is currently on.
    fn current_route(&self) -> String;
}

impl<F> RouteSource for F
where
    F: Fn() -> String + Send + Sync,
{
    fn current_route(&self) -> String {
        self()
    }
}

/// A route that never changes.
#[derive(Debug, Clone)]
pub struct StaticRoute(pub String);

impl RouteSource for StaticRoute {
    fn current_route(&self) -> String {
        self.0.clone()
    }
}

/// A route the host router updates on navigation.
#[derive(Debug, Clone, Default)]
pub struct SharedRoute(Arc<RwLock<String>>);

impl SharedRoute {
    /// Create a shared route starting at `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self(Arc::new(RwLock::new(path.into())))
    }

    /// Record a navigation.
    pub fn navigate(&self, path: impl Into<String>) {
        *self.0.write() = path.into();
    }
}

impl RouteSource for SharedRoute {
    fn current_route(&self) -> String {
        self.0.read().clone()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Clipboard
// ─────────────────────────────────────────────────────────────────────────────

/// Error returned by a clipboard backend.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClipboardError {
    /// The user or platform denied clipboard access.
    #[error("Clipboard access denied")]
    Denied,
    /// No clipboard exists in this environment.
    #[error("Clipboard unavailable: {0}")]
    Unavailable(String),
}

/// Destination for copied text.
pub trait Clipboard {
    /// Replace the clipboard contents with `text`.
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// Clipboard that keeps the last copied text in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    contents: Option<String>,
    deny: bool,
}

impl MemoryClipboard {
    /// Create an empty clipboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clipboard that refuses every write.
    pub fn denied() -> Self {
        Self {
            contents: None,
            deny: true,
        }
    }

    /// Last copied text.
    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }
}

impl Clipboard for MemoryClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        if self.deny {
            return Err(ClipboardError::Denied);
        }
        self.contents = Some(text.to_string());
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Keyboard
// ─────────────────────────────────────────────────────────────────────────────

/// Key identity for overlay accelerators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A printable character.
    Char(char),
    /// The Escape key.
    Escape,
    /// Anything else.
    Other,
}

/// Modifier keys held during a press.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Control.
    pub ctrl: bool,
    /// Alt / Option.
    pub alt: bool,
    /// Meta / Command.
    pub meta: bool,
}

impl Modifiers {
    /// Whether any command modifier is held. Shift is not one.
    pub fn any(&self) -> bool {
        self.ctrl || self.alt || self.meta
    }
}

/// A key press delivered to the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    /// Which key.
    pub key: Key,
    /// Held modifiers.
    pub modifiers: Modifiers,
    /// Whether focus is in a text input, textarea or contenteditable.
    pub in_editable: bool,
}

impl KeyPress {
    /// An unmodified press outside any editable field.
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::default(),
            in_editable: false,
        }
    }
}

/// What the overlay did with a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The mode changed to the contained value.
    ModeChanged(Mode),
    /// The key is not an overlay accelerator in this state.
    Ignored,
}

// ─────────────────────────────────────────────────────────────────────────────
// Overlay
// ─────────────────────────────────────────────────────────────────────────────

/// Overlay controller bound to one registry.
pub struct MachineViewOverlay<C: Clipboard> {
    registry: Registry,
    serializer: MarkdownSerializer,
    route: Arc<dyn RouteSource>,
    clipboard: C,
    toggle_key: char,
    copied_duration: Duration,
    copied_until: Option<Instant>,
}

impl<C: Clipboard> MachineViewOverlay<C> {
    /// Create an overlay with default settings.
    pub fn new(registry: Registry, route: Arc<dyn RouteSource>, clipboard: C) -> Self {
        Self::with_config(registry, route, clipboard, &MachineViewConfig::default())
    }

    /// Create an overlay from a config.
    pub fn with_config(
        registry: Registry,
        route: Arc<dyn RouteSource>,
        clipboard: C,
        config: &MachineViewConfig,
    ) -> Self {
        Self {
            registry,
            serializer: MarkdownSerializer::new(SerializerConfig::from(config)),
            route,
            clipboard,
            toggle_key: config.toggle_key.to_ascii_lowercase(),
            copied_duration: config.copied_indicator(),
            copied_until: None,
        }
    }

    /// Current mode, read from the registry.
    pub fn mode(&self) -> Mode {
        self.registry.mode()
    }

    /// Open or close the machine view.
    pub fn toggle(&mut self) -> Mode {
        self.registry.toggle_mode()
    }

    /// Close the machine view.
    pub fn close(&mut self) {
        self.registry.set_mode(Mode::Human);
    }

    /// Whether scrolling of the underlying page must be suppressed.
    pub fn scroll_locked(&self) -> bool {
        self.mode().is_machine()
    }

    /// Apply keyboard accelerators.
    ///
    /// The toggle letter works only unmodified and outside editable fields;
    /// Escape closes the machine view.
    pub fn handle_key(&mut self, press: &KeyPress) -> KeyOutcome {
        match press.key {
            Key::Escape if self.mode().is_machine() => {
                self.close();
                KeyOutcome::ModeChanged(Mode::Human)
            }
            Key::Char(c)
                if c.to_ascii_lowercase() == self.toggle_key
                    && !press.modifiers.any()
                    && !press.in_editable =>
            {
                KeyOutcome::ModeChanged(self.toggle())
            }
            _ => KeyOutcome::Ignored,
        }
    }

    /// The document to show, or `None` while in human mode.
    pub fn document(&self) -> Option<MachineDocument> {
        if !self.mode().is_machine() {
            return None;
        }
        Some(self.render())
    }

    /// Render the current registry regardless of mode.
    pub fn render(&self) -> MachineDocument {
        self.serializer
            .render(&self.registry, &self.route.current_route())
    }

    /// Copy the current document to the clipboard.
    pub fn copy(&mut self) -> bool {
        self.copy_at(Instant::now())
    }

    /// Copy as of `now`. Failure is swallowed; success lights the copied
    /// indicator until `now + copied duration`.
    pub fn copy_at(&mut self, now: Instant) -> bool {
        let document = self.render();
        match self.clipboard.write_text(&document.markdown) {
            Ok(()) => {
                self.copied_until = Some(now + self.copied_duration);
                record_copy(true);
                true
            }
            Err(e) => {
                tracing::debug!(error = %e, "clipboard copy failed");
                record_copy(false);
                false
            }
        }
    }

    /// Whether the copied indicator is lit.
    pub fn is_copied(&self) -> bool {
        self.is_copied_at(Instant::now())
    }

    /// Whether the copied indicator is lit at `now`.
    pub fn is_copied_at(&self, now: Instant) -> bool {
        self.copied_until.is_some_and(|until| now < until)
    }

    /// The clipboard backend.
    pub fn clipboard(&self) -> &C {
        &self.clipboard
    }

    /// The registry this overlay reads.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}
