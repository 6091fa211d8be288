//! The registry store: every slice currently published, plus the display mode.
//!
//! ## Ownership
//!
//! Each `register_slice` call mints a fresh [`OwnerToken`]. Unregistering or
//! updating requires the token of the current owner, so a stale owner whose
//! id was taken over by a later registration cannot remove or overwrite the
//! newer slice.
//!
//! ## Ordering
//!
//! Entries carry a registration sequence number. [`Registry::ordered_slices`]
//! sorts by effective order ascending, then by sequence ascending, which is
//! the order the serializer emits.
//!
//! ## Transient states
//!
//! Mounts and unmounts during a route change arrive as separate calls, so a
//! reader between them can observe old-route and new-route slices together,
//! or neither. Nothing reads the registry implicitly during that window.

use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use crate::store::{InMemoryPreferenceStore, PreferenceStore};
use crate::telemetry::record_mode_change;
use crate::types::{Mode, Slice, SliceId, SlicePatch};
use crate::MODE_STORAGE_KEY;

/// Proof of ownership of a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OwnerToken(u64);

impl OwnerToken {
    /// Raw token value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for OwnerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "owner#{}", self.0)
    }
}

/// Change notification delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    /// A slice was inserted or replaced by a new owner.
    SliceRegistered(SliceId),
    /// A slice's fields were patched.
    SliceUpdated(SliceId),
    /// A slice was removed by its owner.
    SliceUnregistered(SliceId),
    /// The display mode changed.
    ModeChanged(Mode),
}

type Listener = Arc<dyn Fn(&RegistryEvent) + Send + Sync>;

#[derive(Debug)]
struct Entry {
    slice: Arc<Slice>,
    owner: OwnerToken,
    seq: u64,
}

#[derive(Debug, Default)]
struct RegistryState {
    entries: HashMap<SliceId, Entry>,
    mode: Mode,
    next_seq: u64,
    version: u64,
}

impl RegistryState {
    fn bump(&mut self) {
        self.version += 1;
    }

    fn take_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

struct RegistryInner {
    state: RwLock<RegistryState>,
    listeners: RwLock<BTreeMap<u64, Listener>>,
    preferences: Arc<dyn PreferenceStore>,
    next_owner: AtomicU64,
    next_listener: AtomicU64,
}

/// Handle to a single registry instance.
///
/// Cloning is cheap and every clone refers to the same registry; create one
/// at startup and pass clones to every consumer.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

impl Registry {
    /// Create a registry, loading the persisted mode from `preferences`.
    ///
    /// A read failure or unrecognized stored value starts in `Human` mode.
    pub fn new(preferences: Arc<dyn PreferenceStore>) -> Self {
        let mode = match preferences.get(MODE_STORAGE_KEY) {
            Ok(value) => Mode::from_stored(value.as_deref()),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read persisted mode, defaulting to human");
                Mode::default()
            }
        };

        Self {
            inner: Arc::new(RegistryInner {
                state: RwLock::new(RegistryState {
                    mode,
                    ..RegistryState::default()
                }),
                listeners: RwLock::new(BTreeMap::new()),
                preferences,
                next_owner: AtomicU64::new(1),
                next_listener: AtomicU64::new(1),
            }),
        }
    }

    /// Create a registry backed by a fresh in-memory preference store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryPreferenceStore::new()))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Slice operations
    // ─────────────────────────────────────────────────────────────────────

    /// Insert or replace the entry at `slice.id`. Last write wins.
    ///
    /// Returns the token that owns the entry from now on.
    pub fn register_slice(&self, slice: Slice) -> OwnerToken {
        let owner = OwnerToken(self.inner.next_owner.fetch_add(1, Ordering::Relaxed));
        let id = slice.id.clone();

        {
            let mut state = self.inner.state.write();
            let seq = state.take_seq();
            let previous = state.entries.insert(
                id.clone(),
                Entry {
                    slice: Arc::new(slice),
                    owner,
                    seq,
                },
            );
            state.bump();

            if let Some(previous) = previous {
                tracing::debug!(
                    slice_id = %id,
                    previous_owner = %previous.owner,
                    owner = %owner,
                    "slice id taken over by new owner"
                );
            } else {
                tracing::debug!(slice_id = %id, owner = %owner, "slice registered");
            }
        }

        self.notify(&RegistryEvent::SliceRegistered(id));
        owner
    }

    /// Remove the entry at `id` if `owner` still owns it.
    ///
    /// Absent ids and entries owned by someone else are left alone. Returns
    /// whether an entry was removed.
    pub fn unregister_slice(&self, id: &SliceId, owner: OwnerToken) -> bool {
        let removed = {
            let mut state = self.inner.state.write();
            let current = state.entries.get(id).map(|entry| entry.owner);
            match current {
                Some(current) if current == owner => {
                    state.entries.remove(id);
                    state.bump();
                    true
                }
                Some(current) => {
                    tracing::debug!(
                        slice_id = %id,
                        owner = %owner,
                        current_owner = %current,
                        "ignoring unregister from non-owner"
                    );
                    false
                }
                None => false,
            }
        };

        if removed {
            tracing::debug!(slice_id = %id, owner = %owner, "slice unregistered");
            self.notify(&RegistryEvent::SliceUnregistered(id.clone()));
        }
        removed
    }

    /// Shallow-merge `patch` into the entry at `id`.
    ///
    /// When no entry exists, one is inserted from the patch over defaults and
    /// owned by `owner`. Patches from a non-owner are ignored.
    pub fn update_slice(&self, id: &SliceId, owner: OwnerToken, patch: SlicePatch) {
        let event = {
            let mut state = self.inner.state.write();
            let existing = state
                .entries
                .get(id)
                .map(|entry| (entry.owner, Arc::clone(&entry.slice)));

            match existing {
                Some((current, _)) if current != owner => {
                    tracing::debug!(
                        slice_id = %id,
                        owner = %owner,
                        current_owner = %current,
                        "ignoring update from non-owner"
                    );
                    None
                }
                Some((_, slice)) => {
                    let mut updated = (*slice).clone();
                    patch.apply_to(&mut updated);
                    if let Some(entry) = state.entries.get_mut(id) {
                        entry.slice = Arc::new(updated);
                    }
                    state.bump();
                    Some(RegistryEvent::SliceUpdated(id.clone()))
                }
                None => {
                    let seq = state.take_seq();
                    let slice = Slice::from_patch(id.clone(), patch);
                    state.entries.insert(
                        id.clone(),
                        Entry {
                            slice: Arc::new(slice),
                            owner,
                            seq,
                        },
                    );
                    state.bump();
                    tracing::debug!(slice_id = %id, owner = %owner, "update inserted missing slice");
                    Some(RegistryEvent::SliceRegistered(id.clone()))
                }
            }
        };

        if let Some(event) = event {
            self.notify(&event);
        }
    }

    /// Snapshot of all slices, in unspecified order.
    pub fn get_slices(&self) -> Vec<Arc<Slice>> {
        self.inner
            .state
            .read()
            .entries
            .values()
            .map(|entry| Arc::clone(&entry.slice))
            .collect()
    }

    /// Snapshot of all slices in emission order: effective order ascending,
    /// then registration sequence ascending.
    pub fn ordered_slices(&self) -> Vec<Arc<Slice>> {
        let state = self.inner.state.read();
        let mut entries: Vec<(f64, u64, Arc<Slice>)> = state
            .entries
            .values()
            .map(|entry| (entry.slice.effective_order(), entry.seq, Arc::clone(&entry.slice)))
            .collect();
        drop(state);

        entries.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        entries.into_iter().map(|(_, _, slice)| slice).collect()
    }

    /// Look up one slice.
    pub fn get(&self, id: &SliceId) -> Option<Arc<Slice>> {
        self.inner
            .state
            .read()
            .entries
            .get(id)
            .map(|entry| Arc::clone(&entry.slice))
    }

    /// Whether a slice is registered under `id`.
    pub fn contains(&self, id: &SliceId) -> bool {
        self.inner.state.read().entries.contains_key(id)
    }

    /// Current owner of `id`, if registered.
    pub fn owner_of(&self, id: &SliceId) -> Option<OwnerToken> {
        self.inner.state.read().entries.get(id).map(|entry| entry.owner)
    }

    /// Number of registered slices.
    pub fn len(&self) -> usize {
        self.inner.state.read().entries.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.state.read().entries.is_empty()
    }

    /// Counter bumped on every mutation.
    pub fn version(&self) -> u64 {
        self.inner.state.read().version
    }

    // ─────────────────────────────────────────────────────────────────────
    // Mode
    // ─────────────────────────────────────────────────────────────────────

    /// Current display mode.
    pub fn mode(&self) -> Mode {
        self.inner.state.read().mode
    }

    /// Set and persist the display mode.
    ///
    /// Storage failures are logged and ignored; the in-memory mode stays
    /// authoritative for this instance.
    pub fn set_mode(&self, mode: Mode) {
        self.transition_mode(|_| mode);
    }

    /// Flip between `Human` and `Machine`. Returns the new mode.
    ///
    /// The flip happens under the state lock, so concurrent toggles each
    /// take effect.
    pub fn toggle_mode(&self) -> Mode {
        self.transition_mode(|mode| mode.toggled())
    }

    fn transition_mode(&self, next: impl FnOnce(Mode) -> Mode) -> Mode {
        let (previous, mode) = {
            let mut state = self.inner.state.write();
            let previous = state.mode;
            let mode = next(previous);
            if previous != mode {
                state.mode = mode;
                state.bump();
            }
            (previous, mode)
        };

        if let Err(e) = self.inner.preferences.set(MODE_STORAGE_KEY, mode.as_str()) {
            tracing::warn!(error = %e, mode = %mode, "failed to persist mode");
        }

        if previous != mode {
            record_mode_change(previous, mode);
            self.notify(&RegistryEvent::ModeChanged(mode));
        }
        mode
    }

    // ─────────────────────────────────────────────────────────────────────
    // Subscriptions
    // ─────────────────────────────────────────────────────────────────────

    /// Register a listener called synchronously after every change.
    ///
    /// Listeners run after the state lock is released, so they may read the
    /// registry. Dropping the returned [`Subscription`] removes the listener.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&RegistryEvent) + Send + Sync + 'static,
    {
        let id = self.inner.next_listener.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.write().insert(id, Arc::new(listener));
        Subscription {
            registry: Arc::downgrade(&self.inner),
            id,
        }
    }

    fn notify(&self, event: &RegistryEvent) {
        let listeners: Vec<Listener> = self.inner.listeners.read().values().cloned().collect();
        for listener in listeners {
            listener(event);
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("Registry")
            .field("slices", &state.entries.len())
            .field("mode", &state.mode)
            .field("version", &state.version)
            .finish()
    }
}

/// Active listener registration. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    registry: Weak<RegistryInner>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.registry.upgrade() {
            inner.listeners.write().remove(&self.id);
        }
    }
}
