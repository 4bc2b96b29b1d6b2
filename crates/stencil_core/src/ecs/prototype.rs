//! Prototypes: the template identities entities are instantiated from.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ecs::{Component, ErasedComponent, Replicate};

/// Stable identifier of a prototype.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrototypeId(String);

impl PrototypeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PrototypeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PrototypeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for PrototypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A template an entity is instantiated from: display metadata, default
/// anchoring and seed component instances (cloned per spawn).
pub struct Prototype {
    id: PrototypeId,
    name: String,
    description: String,
    anchored: bool,
    seeds: Vec<Box<dyn ErasedComponent>>,
}

impl Prototype {
    pub fn new(id: impl Into<PrototypeId>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            description: String::new(),
            anchored: false,
            seeds: Vec::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Whether freshly spawned instances start anchored.
    pub fn anchored(mut self, anchored: bool) -> Self {
        self.anchored = anchored;
        self
    }

    /// Add a seed component. Each spawn receives an independent copy.
    pub fn with<T>(mut self, component: T) -> Self
    where
        T: Component + Replicate + Clone + Default,
    {
        T::ensure_registered();
        self.seeds.push(Box::new(component));
        self
    }

    pub fn id(&self) -> &PrototypeId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn default_anchored(&self) -> bool {
        self.anchored
    }

    pub(crate) fn seeds(&self) -> &[Box<dyn ErasedComponent>] {
        &self.seeds
    }
}

impl fmt::Debug for Prototype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Prototype")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("seeds", &self.seeds.len())
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum PrototypeError {
    #[error("prototype {0} is already registered")]
    Duplicate(PrototypeId),
}

/// Registry of prototypes, owned by the world.
#[derive(Default)]
pub struct PrototypeRegistry {
    prototypes: HashMap<PrototypeId, Prototype>,
}

impl PrototypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, prototype: Prototype) -> Result<(), PrototypeError> {
        let id = prototype.id().clone();
        if self.prototypes.contains_key(&id) {
            return Err(PrototypeError::Duplicate(id));
        }
        self.prototypes.insert(id, prototype);
        Ok(())
    }

    pub fn get(&self, id: &PrototypeId) -> Option<&Prototype> {
        self.prototypes.get(id)
    }

    pub fn len(&self) -> usize {
        self.prototypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prototypes.is_empty()
    }
}
