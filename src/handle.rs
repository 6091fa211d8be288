//! Slice lifecycle adapter.
//!
//! A component publishes its content with [`Registry::publish`] when it
//! mounts and keeps the returned [`SliceHandle`] for as long as it is
//! mounted. The handle republishes only when the component's declared
//! dependencies change, and unregisters exactly once when it is closed or
//! dropped.
//!
//! ```rust,ignore
//! let handle = registry.publish(
//!     SliceDescriptor::new(SliceKind::Hero, headline).with_order(10.0),
//!     &(&locale, &headline),
//! );
//! // ...later, on re-render:
//! handle.refresh(descriptor, &(&locale, &headline));
//! // unmount:
//! handle.close();
//! ```

use serde::Serialize;

use crate::canonical::canonical_hash;
use crate::registry::{OwnerToken, Registry};
use crate::types::{SliceDescriptor, SliceId};

/// Ownership of one published slice.
///
/// Not `Clone`: exactly one handle exists per registration, so the slice is
/// unregistered exactly once.
#[derive(Debug)]
#[must_use = "dropping a SliceHandle immediately unregisters its slice"]
pub struct SliceHandle {
    registry: Registry,
    id: SliceId,
    owner: OwnerToken,
    deps_fingerprint: u64,
}

impl Registry {
    /// Publish `descriptor` and return the handle that owns it.
    ///
    /// The slice id is the descriptor's id when given, otherwise a fresh
    /// generated id held for the handle's lifetime. `deps` is the set of
    /// inputs that, when changed, should trigger a republish.
    pub fn publish<D>(&self, descriptor: SliceDescriptor, deps: &D) -> SliceHandle
    where
        D: Serialize + ?Sized,
    {
        let id = descriptor.id.clone().unwrap_or_else(SliceId::generate);
        let owner = self.register_slice(descriptor.into_slice(id.clone()));

        SliceHandle {
            registry: self.clone(),
            id,
            owner,
            deps_fingerprint: canonical_hash(deps),
        }
    }
}

impl SliceHandle {
    /// The resolved slice id.
    pub fn id(&self) -> &SliceId {
        &self.id
    }

    /// The token under which the slice is registered.
    pub fn owner(&self) -> OwnerToken {
        self.owner
    }

    /// Republish `descriptor` if `deps` differ from the last publish.
    ///
    /// Every field is replaced wholesale; the descriptor's own id is ignored
    /// because a handle's id never changes. Returns whether an update was
    /// sent to the registry.
    pub fn refresh<D>(&mut self, descriptor: SliceDescriptor, deps: &D) -> bool
    where
        D: Serialize + ?Sized,
    {
        let fingerprint = canonical_hash(deps);
        if fingerprint == self.deps_fingerprint {
            return false;
        }

        self.deps_fingerprint = fingerprint;
        self.registry
            .update_slice(&self.id, self.owner, descriptor.into());
        true
    }

    /// Whether the registry still holds this handle's slice.
    ///
    /// `false` after another owner has taken over the id.
    pub fn is_registered(&self) -> bool {
        self.registry.owner_of(&self.id) == Some(self.owner)
    }

    /// Unregister the slice now.
    pub fn close(self) {
        // Drop performs the unregister.
    }
}

impl Drop for SliceHandle {
    fn drop(&mut self) {
        self.registry.unregister_slice(&self.id, self.owner);
    }
}
