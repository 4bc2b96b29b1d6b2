//! Containers: named slots and lists of contained entities.
//!
//! A container is owned by an entity's [`ContainerManager`] component and
//! holds references to child entities. Membership is mirrored in a reverse
//! map on the world so moving an entity between containers is cheap and a
//! forced insert can evict it from wherever it currently lives.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ecs::{Component, ComponentId, Entity, Replicate, Transform, World};

/// The kinds of container the engine supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerKind {
    /// Holds at most one entity.
    Slot,
    /// Ordered list of entities.
    List,
}

/// One named container: its kind and contained entities in insertion order.
#[derive(Debug, Clone)]
pub struct ContainerState {
    kind: ContainerKind,
    entities: Vec<Entity>,
}

impl ContainerState {
    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }
}

/// Component owning an entity's containers, keyed by name.
///
/// Never generically replicated: the cloning layer mirrors containers
/// entity by entity instead of copying the raw membership lists.
#[derive(Debug, Clone, Default)]
pub struct ContainerManager {
    containers: BTreeMap<String, ContainerState>,
}

impl ContainerManager {
    pub fn container(&self, id: &str) -> Option<&ContainerState> {
        self.containers.get(id)
    }

    /// Containers in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContainerState)> {
        self.containers.iter().map(|(id, state)| (id.as_str(), state))
    }

    /// Every contained entity, across all containers.
    pub fn all_entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.containers
            .values()
            .flat_map(|state| state.entities.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}

impl Component for ContainerManager {
    const ID: ComponentId = 3;
    const NAME: &'static str = "ContainerManager";
}

impl Replicate for ContainerManager {
    fn replicate(&self, _dst: &mut Self) {}
}

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("container owner {0} is not alive")]
    DeadOwner(Entity),
    #[error("entity {0} is not alive")]
    DeadEntity(Entity),
    #[error("no container named {container} on {owner}")]
    NoSuchContainer { owner: Entity, container: String },
    #[error("container {container} already exists as {found:?}, expected {expected:?}")]
    KindMismatch {
        container: String,
        expected: ContainerKind,
        found: ContainerKind,
    },
    #[error("slot {container} is already occupied")]
    SlotOccupied { container: String },
    #[error("entity {0} is already contained elsewhere")]
    AlreadyContained(Entity),
    #[error("inserting {entity} under {owner} would create a containment cycle")]
    ContainmentCycle { owner: Entity, entity: Entity },
}

impl World {
    /// Ensure a container of the given kind and name exists on an entity.
    ///
    /// Idempotent for a matching kind; an existing container of a
    /// different kind is a template-authoring bug and fails.
    pub fn ensure_container(
        &mut self,
        owner: Entity,
        container: &str,
        kind: ContainerKind,
    ) -> Result<(), ContainerError> {
        let record = self
            .record_mut(owner)
            .map_err(|_| ContainerError::DeadOwner(owner))?;
        let manager = record
            .components
            .entry(ContainerManager::ID)
            .or_insert_with(|| Box::<ContainerManager>::default())
            .as_any_mut()
            .downcast_mut::<ContainerManager>()
            .expect("container manager slot holds the wrong type");

        match manager.containers.get(container) {
            Some(state) if state.kind != kind => Err(ContainerError::KindMismatch {
                container: container.to_string(),
                expected: kind,
                found: state.kind,
            }),
            Some(_) => Ok(()),
            None => {
                manager.containers.insert(
                    container.to_string(),
                    ContainerState {
                        kind,
                        entities: Vec::new(),
                    },
                );
                Ok(())
            }
        }
    }

    /// Insert an entity into a container.
    ///
    /// With `force`, the entity is first evicted from whatever container it
    /// currently occupies, and an occupied slot evicts its occupant.
    /// Contained entities are detached from the map.
    pub fn insert_into_container(
        &mut self,
        owner: Entity,
        container: &str,
        entity: Entity,
        force: bool,
    ) -> Result<(), ContainerError> {
        if !self.contains(entity) {
            return Err(ContainerError::DeadEntity(entity));
        }
        if !self.contains(owner) {
            return Err(ContainerError::DeadOwner(owner));
        }
        // Containment is a forest: an entity may never hold itself, nor any
        // of its transitive holders.
        if entity == owner || self.is_held_within(owner, entity) {
            return Err(ContainerError::ContainmentCycle { owner, entity });
        }

        if self.containment.contains_key(&entity.index()) {
            if !force {
                return Err(ContainerError::AlreadyContained(entity));
            }
            self.remove_from_container(entity);
        }

        let evicted = {
            let manager = self
                .get_mut::<ContainerManager>(owner)
                .ok_or_else(|| ContainerError::NoSuchContainer {
                    owner,
                    container: container.to_string(),
                })?;
            let state = manager.containers.get_mut(container).ok_or_else(|| {
                ContainerError::NoSuchContainer {
                    owner,
                    container: container.to_string(),
                }
            })?;

            let mut evicted = None;
            if state.kind == ContainerKind::Slot && !state.entities.is_empty() {
                if !force {
                    return Err(ContainerError::SlotOccupied {
                        container: container.to_string(),
                    });
                }
                evicted = state.entities.pop();
            }
            state.entities.push(entity);
            evicted
        };

        if let Some(evicted) = evicted {
            self.containment.remove(&evicted.index());
        }
        self.containment
            .insert(entity.index(), (owner, container.to_string()));
        if let Some(transform) = self.get_mut::<Transform>(entity) {
            transform.placement = crate::ecs::Placement::Detached;
        }
        Ok(())
    }

    /// Remove an entity from whatever container holds it. Returns whether
    /// it was contained.
    pub fn remove_from_container(&mut self, entity: Entity) -> bool {
        let Some((owner, container)) = self.containment.remove(&entity.index()) else {
            return false;
        };
        if let Some(manager) = self.get_mut::<ContainerManager>(owner) {
            if let Some(state) = manager.containers.get_mut(&container) {
                state.entities.retain(|&e| e != entity);
            }
        }
        true
    }

    /// Entities held by a named container, in insertion order.
    pub fn contained_entities(&self, owner: Entity, container: &str) -> Option<&[Entity]> {
        self.get::<ContainerManager>(owner)?
            .container(container)
            .map(|state| state.entities())
    }

    /// Whether `entity` sits (transitively) inside a container owned by
    /// `ancestor`.
    fn is_held_within(&self, entity: Entity, ancestor: Entity) -> bool {
        let mut current = entity;
        while let Some((holder, _)) = self.containment.get(&current.index()) {
            if *holder == ancestor {
                return true;
            }
            current = *holder;
        }
        false
    }

    /// The container currently holding an entity, if any.
    pub fn container_of(&self, entity: Entity) -> Option<(Entity, &str)> {
        self.containment
            .get(&entity.index())
            .map(|(owner, container)| (*owner, container.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::Placement;

    fn world_with_entities(n: usize) -> (World, Vec<Entity>) {
        let mut world = World::new();
        let entities = (0..n)
            .map(|_| world.spawn_empty(Placement::World(glam::Vec2::ZERO)))
            .collect();
        (world, entities)
    }

    #[test]
    fn ensure_is_idempotent_for_matching_kind() {
        let (mut world, e) = world_with_entities(1);
        world.ensure_container(e[0], "stored", ContainerKind::List).unwrap();
        world.ensure_container(e[0], "stored", ContainerKind::List).unwrap();
        assert_eq!(world.contained_entities(e[0], "stored"), Some(&[][..]));
    }

    #[test]
    fn ensure_rejects_kind_mismatch() {
        let (mut world, e) = world_with_entities(1);
        world.ensure_container(e[0], "cell", ContainerKind::Slot).unwrap();
        let err = world
            .ensure_container(e[0], "cell", ContainerKind::List)
            .unwrap_err();
        assert!(matches!(err, ContainerError::KindMismatch { .. }));
    }

    #[test]
    fn insert_detaches_placement_and_tracks_membership() {
        let (mut world, e) = world_with_entities(2);
        world.ensure_container(e[0], "stored", ContainerKind::List).unwrap();
        world
            .insert_into_container(e[0], "stored", e[1], false)
            .unwrap();

        assert_eq!(world.contained_entities(e[0], "stored"), Some(&e[1..2]));
        assert_eq!(world.container_of(e[1]), Some((e[0], "stored")));
        assert_eq!(
            world.get::<Transform>(e[1]).unwrap().placement,
            Placement::Detached
        );
    }

    #[test]
    fn slot_occupancy() {
        let (mut world, e) = world_with_entities(3);
        world.ensure_container(e[0], "cell", ContainerKind::Slot).unwrap();
        world.insert_into_container(e[0], "cell", e[1], false).unwrap();

        let err = world
            .insert_into_container(e[0], "cell", e[2], false)
            .unwrap_err();
        assert!(matches!(err, ContainerError::SlotOccupied { .. }));

        // Forced insert evicts the occupant.
        world.insert_into_container(e[0], "cell", e[2], true).unwrap();
        assert_eq!(world.contained_entities(e[0], "cell"), Some(&e[2..3]));
        assert_eq!(world.container_of(e[1]), None);
    }

    #[test]
    fn self_containment_is_rejected() {
        let (mut world, e) = world_with_entities(1);
        world.ensure_container(e[0], "stored", ContainerKind::List).unwrap();
        let err = world
            .insert_into_container(e[0], "stored", e[0], false)
            .unwrap_err();
        assert!(matches!(err, ContainerError::ContainmentCycle { .. }));
        assert_eq!(world.contained_entities(e[0], "stored"), Some(&[][..]));
    }

    #[test]
    fn containment_cycles_are_rejected() {
        let (mut world, e) = world_with_entities(2);
        world.ensure_container(e[0], "stored", ContainerKind::List).unwrap();
        world.ensure_container(e[1], "stored", ContainerKind::List).unwrap();
        world.insert_into_container(e[0], "stored", e[1], false).unwrap();

        // e[0] holds e[1], so e[1] may not hold e[0], even with force.
        let err = world
            .insert_into_container(e[1], "stored", e[0], true)
            .unwrap_err();
        assert!(matches!(err, ContainerError::ContainmentCycle { .. }));
        assert_eq!(world.container_of(e[0]), None);
        assert_eq!(world.container_of(e[1]), Some((e[0], "stored")));
    }

    #[test]
    fn force_moves_between_containers() {
        let (mut world, e) = world_with_entities(3);
        world.ensure_container(e[0], "a", ContainerKind::List).unwrap();
        world.ensure_container(e[1], "b", ContainerKind::List).unwrap();
        world.insert_into_container(e[0], "a", e[2], false).unwrap();

        let err = world
            .insert_into_container(e[1], "b", e[2], false)
            .unwrap_err();
        assert!(matches!(err, ContainerError::AlreadyContained(_)));

        world.insert_into_container(e[1], "b", e[2], true).unwrap();
        assert_eq!(world.contained_entities(e[0], "a"), Some(&[][..]));
        assert_eq!(world.contained_entities(e[1], "b"), Some(&e[2..3]));
    }
}
