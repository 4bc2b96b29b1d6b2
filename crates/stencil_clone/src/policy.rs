//! Which components the cloner must leave alone.

use std::collections::BTreeSet;

use stencil_core::ecs::{
    ActionsContainer, Actor, Component, ComponentId, Fixtures, ItemStorage, Metadata, PhysicsBody,
    Transform,
};

/// The cloner's exclusion list.
///
/// Excluded components are never added to, removed from, or field-copied
/// onto a clone; whatever the destination's template provides is kept
/// untouched. The default set is engine-managed session, physics and
/// storage state. It is policy data, not a property of the algorithm, so
/// callers may widen or narrow it.
#[derive(Debug, Clone)]
pub struct CopyPolicy {
    excluded: BTreeSet<ComponentId>,
}

impl Default for CopyPolicy {
    fn default() -> Self {
        Self {
            excluded: [
                Actor::ID,
                ActionsContainer::ID,
                Fixtures::ID,
                PhysicsBody::ID,
                ItemStorage::ID,
            ]
            .into_iter()
            .collect(),
        }
    }
}

impl CopyPolicy {
    /// A policy excluding nothing beyond the structural set.
    pub fn empty() -> Self {
        Self {
            excluded: BTreeSet::new(),
        }
    }

    pub fn exclude(mut self, id: ComponentId) -> Self {
        self.excluded.insert(id);
        self
    }

    pub fn allow(mut self, id: ComponentId) -> Self {
        self.excluded.remove(&id);
        self
    }

    pub fn is_excluded(&self, id: ComponentId) -> bool {
        self.excluded.contains(&id)
    }

    /// Whether the cloner skips this component entirely.
    ///
    /// Metadata and transform are skipped regardless of the configured
    /// set: the world owns them, and the cloner reconciles display
    /// metadata and anchoring through dedicated operations instead.
    pub fn skips(&self, id: ComponentId) -> bool {
        id == Metadata::ID || id == Transform::ID || self.is_excluded(id)
    }
}
