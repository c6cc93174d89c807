//! In-memory container registry.
//!
//! The registry itself is a plain owned value. Serialization of concurrent
//! operations is the lifecycle service's job: it keeps the registry behind
//! a single mutex for the whole of each operation.

use std::collections::{HashMap, HashSet};

use corral_common::types::{ContainerId, ContainerSummary};

use crate::container::ContainerRecord;

/// Authoritative mapping from identifier to container record.
#[derive(Debug, Default)]
pub struct Registry {
    records: HashMap<ContainerId, ContainerRecord>,
    /// Identifiers of deleted records, never handed out again.
    retired: HashSet<ContainerId>,
    /// Insertion order, for stable listings.
    order: Vec<ContainerId>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates an identifier that is neither live nor retired.
    #[must_use]
    pub fn allocate_id(&self) -> ContainerId {
        self.allocate_with(ContainerId::generate)
    }

    fn allocate_with(&self, mut generate: impl FnMut() -> ContainerId) -> ContainerId {
        loop {
            let id = generate();
            if !self.records.contains_key(&id) && !self.retired.contains(&id) {
                return id;
            }
            tracing::warn!(id = %id, "container id collision, regenerating");
        }
    }

    /// Registers a record.
    ///
    /// Returns `false` without touching the registry if the identifier is
    /// already live or retired.
    pub fn insert(&mut self, record: ContainerRecord) -> bool {
        let id = record.id().clone();
        if self.records.contains_key(&id) || self.retired.contains(&id) {
            return false;
        }
        self.order.push(id.clone());
        let _ = self.records.insert(id, record);
        true
    }

    /// Looks up a record.
    #[must_use]
    pub fn get(&self, id: &ContainerId) -> Option<&ContainerRecord> {
        self.records.get(id)
    }

    /// Looks up a record for mutation.
    pub fn get_mut(&mut self, id: &ContainerId) -> Option<&mut ContainerRecord> {
        self.records.get_mut(id)
    }

    /// Removes a record and retires its identifier.
    pub fn remove(&mut self, id: &ContainerId) -> Option<ContainerRecord> {
        let record = self.records.remove(id)?;
        self.order.retain(|live| live != id);
        let _ = self.retired.insert(id.clone());
        Some(record)
    }

    /// Snapshot of every record, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ContainerSummary> {
        self.order
            .iter()
            .filter_map(|id| self.records.get(id))
            .map(ContainerRecord::summary)
            .collect()
    }

    /// Number of live records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns whether the registry holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
