//! Service state management.
//!
//! Holds the registry handle shared with the rest of the process and the
//! handles of slices the service itself published.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::MachineViewConfig;
use crate::handle::SliceHandle;
use crate::registry::Registry;
use crate::serializer::{MarkdownSerializer, SerializerConfig};
use crate::types::{SliceDescriptor, SliceId};

/// Error type for service-level slice operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// The id is registered by an owner other than the service.
    #[error("Slice id is held by another owner: {0}")]
    SliceIdTaken(SliceId),
}

/// Shared service state.
#[derive(Clone)]
pub struct ServiceState {
    /// The registry being served.
    pub registry: Registry,
    /// Serializer built from the service config.
    pub serializer: MarkdownSerializer,
    /// Active configuration.
    pub config: Arc<MachineViewConfig>,
    /// Slices published through `POST /api/slices`, by id.
    owned: Arc<Mutex<BTreeMap<SliceId, SliceHandle>>>,
}

impl ServiceState {
    /// Create service state over an existing registry.
    pub fn new(registry: Registry, config: MachineViewConfig) -> Self {
        Self {
            registry,
            serializer: MarkdownSerializer::new(SerializerConfig::from(&config)),
            config: Arc::new(config),
            owned: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Publish a slice owned by the service and return its id.
    ///
    /// Publishing again under an id the service already owns replaces that
    /// slice. An id currently held by some other owner is refused.
    pub fn publish(&self, descriptor: SliceDescriptor) -> Result<SliceId, ServiceError> {
        let mut owned = self.owned.lock();

        if let Some(id) = &descriptor.id {
            let held_by_service = owned.get(id).is_some_and(SliceHandle::is_registered);
            if self.registry.contains(id) && !held_by_service {
                return Err(ServiceError::SliceIdTaken(id.clone()));
            }
        }

        let handle = self.registry.publish(descriptor.clone(), &descriptor);
        let id = handle.id().clone();
        // The replaced handle no longer owns the entry, so dropping it is a
        // no-op in the registry.
        let previous = owned.insert(id.clone(), handle);
        drop(owned);
        drop(previous);
        Ok(id)
    }

    /// Remove a service-owned slice. Returns `false` if the service does not
    /// own `id`.
    pub fn retract(&self, id: &SliceId) -> bool {
        let handle = self.owned.lock().remove(id);
        match handle {
            Some(handle) => {
                handle.close();
                true
            }
            None => false,
        }
    }

    /// Number of service-owned slices.
    pub fn owned_count(&self) -> usize {
        self.owned.lock().len()
    }
}
