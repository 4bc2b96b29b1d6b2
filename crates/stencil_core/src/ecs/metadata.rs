//! Display metadata and template identity.

use crate::ecs::{Component, ComponentId, Entity, PrototypeId, Replicate, World, WorldError};

/// Identity and display data for an entity.
///
/// `prototype` is the template identity the entity was instantiated from;
/// entities created without one cannot be cloned. Managed by the world's
/// metadata operations, never generically replicated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub name: String,
    pub description: String,
    pub prototype: Option<PrototypeId>,
}

impl Component for Metadata {
    const ID: ComponentId = 1;
    const NAME: &'static str = "Metadata";
}

impl Replicate for Metadata {
    fn replicate(&self, _dst: &mut Self) {}
}

impl World {
    pub fn set_entity_name(
        &mut self,
        entity: Entity,
        name: impl Into<String>,
    ) -> Result<(), WorldError> {
        self.metadata_mut(entity)?.name = name.into();
        Ok(())
    }

    pub fn set_entity_description(
        &mut self,
        entity: Entity,
        description: impl Into<String>,
    ) -> Result<(), WorldError> {
        self.metadata_mut(entity)?.description = description.into();
        Ok(())
    }

    pub fn entity_name(&self, entity: Entity) -> Option<&str> {
        self.get::<Metadata>(entity).map(|m| m.name.as_str())
    }

    /// The template identity the entity was instantiated from, if any.
    pub fn prototype_of(&self, entity: Entity) -> Option<&PrototypeId> {
        self.get::<Metadata>(entity)
            .and_then(|m| m.prototype.as_ref())
    }

    fn metadata_mut(&mut self, entity: Entity) -> Result<&mut Metadata, WorldError> {
        self.get_mut::<Metadata>(entity)
            .ok_or(WorldError::MissingComponent {
                entity,
                component: Metadata::NAME,
            })
    }
}
