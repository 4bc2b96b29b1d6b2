// world.rs - Entity registry with deferred life-cycle start
//
// The world owns one record per live entity: a sorted map of type-erased
// component instances plus a started flag. Entities are created from
// prototypes in an uninitialized state; start hooks run only when a caller
// asks, which lets construction finish before any behavior activates.

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

use crate::ecs::{
    meta_of, register_builtin_components, Angle, Component, ComponentId, ContainerManager, Entity,
    EntityAllocator, ErasedComponent, Metadata, Placement, Prototype, PrototypeError, PrototypeId,
    PrototypeRegistry, Replicate, Transform,
};

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("entity {0} is not alive")]
    NoSuchEntity(Entity),
    #[error("unknown prototype {0}")]
    UnknownPrototype(PrototypeId),
    #[error("component id {0} is not registered")]
    UnregisteredComponent(ComponentId),
    #[error("entity {entity} has no {component} component")]
    MissingComponent {
        entity: Entity,
        component: &'static str,
    },
}

pub(crate) struct EntityRecord {
    pub(crate) components: BTreeMap<ComponentId, Box<dyn ErasedComponent>>,
    pub(crate) started: bool,
}

/// The entity registry.
///
/// Single-threaded by design: every operation runs to completion on the
/// calling thread, and consistency of partially built entities is
/// guaranteed by that alone.
pub struct World {
    allocator: EntityAllocator,
    entities: HashMap<u32, EntityRecord>,
    prototypes: PrototypeRegistry,
    /// Reverse containment map: contained entity index -> (owner, container).
    pub(crate) containment: HashMap<u32, (Entity, String)>,
}

impl World {
    pub fn new() -> Self {
        register_builtin_components();
        Self {
            allocator: EntityAllocator::new(),
            entities: HashMap::new(),
            prototypes: PrototypeRegistry::new(),
            containment: HashMap::new(),
        }
    }

    // ── Prototypes ──────────────────────────────────────────────────

    pub fn register_prototype(&mut self, prototype: Prototype) -> Result<(), PrototypeError> {
        self.prototypes.register(prototype)
    }

    pub fn prototype(&self, id: &PrototypeId) -> Option<&Prototype> {
        self.prototypes.get(id)
    }

    // ── Entity lifecycle ────────────────────────────────────────────

    /// Create an entity from a prototype, uninitialized: components are
    /// registered and populated from the prototype's seeds, but start
    /// hooks do not run until [`World::start_entity`].
    pub fn spawn_uninitialized(
        &mut self,
        prototype: &PrototypeId,
        placement: Placement,
        rotation: Angle,
    ) -> Result<Entity, WorldError> {
        let proto = self
            .prototypes
            .get(prototype)
            .ok_or_else(|| WorldError::UnknownPrototype(prototype.clone()))?;

        let mut components: BTreeMap<ComponentId, Box<dyn ErasedComponent>> = proto
            .seeds()
            .iter()
            .map(|seed| (seed.component_id(), seed.clone_boxed()))
            .collect();
        let metadata = Metadata {
            name: proto.name().to_string(),
            description: proto.description().to_string(),
            prototype: Some(prototype.clone()),
        };
        let transform = Transform {
            placement,
            rotation,
            anchored: proto.default_anchored(),
        };
        components.insert(Metadata::ID, Box::new(metadata));
        components.insert(Transform::ID, Box::new(transform));

        let entity = self.allocator.alloc();
        self.entities.insert(
            entity.index(),
            EntityRecord {
                components,
                started: false,
            },
        );
        tracing::debug!(%entity, prototype = %prototype, "spawned uninitialized entity");
        Ok(entity)
    }

    /// Create an entity with no prototype identity and only metadata and
    /// transform attached. Such entities cannot be cloned.
    pub fn spawn_empty(&mut self, placement: Placement) -> Entity {
        let mut components: BTreeMap<ComponentId, Box<dyn ErasedComponent>> = BTreeMap::new();
        components.insert(Metadata::ID, Box::<Metadata>::default());
        components.insert(
            Transform::ID,
            Box::new(Transform {
                placement,
                ..Transform::default()
            }),
        );
        let entity = self.allocator.alloc();
        self.entities.insert(
            entity.index(),
            EntityRecord {
                components,
                started: false,
            },
        );
        entity
    }

    /// Run the deferred start hooks for an entity, in component-id order.
    /// Starting an already started entity is a no-op.
    pub fn start_entity(&mut self, entity: Entity) -> Result<(), WorldError> {
        if !self.allocator.is_live(entity) {
            return Err(WorldError::NoSuchEntity(entity));
        }
        let record = self
            .entities
            .get_mut(&entity.index())
            .ok_or(WorldError::NoSuchEntity(entity))?;
        if record.started {
            return Ok(());
        }
        record.started = true;
        for component in record.components.values_mut() {
            component.start(entity);
        }
        tracing::debug!(%entity, "started entity");
        Ok(())
    }

    pub fn is_started(&self, entity: Entity) -> bool {
        self.record(entity).is_some_and(|r| r.started)
    }

    /// Destroy an entity: detaches it from any container, releases the
    /// entities it contained, and invalidates the handle.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if !self.allocator.is_live(entity) {
            return false;
        }
        self.remove_from_container(entity);
        if let Some(manager) = self.get::<ContainerManager>(entity) {
            let contained: Vec<Entity> = manager.all_entities().collect();
            for child in contained {
                self.containment.remove(&child.index());
            }
        }
        self.entities.remove(&entity.index());
        self.allocator.free(entity)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.allocator.is_live(entity) && self.entities.contains_key(&entity.index())
    }

    // ── Components ──────────────────────────────────────────────────

    /// Attach a component instance, replacing any existing instance of the
    /// same type.
    pub fn attach<T>(&mut self, entity: Entity, component: T) -> Result<(), WorldError>
    where
        T: Component + Replicate + Clone + Default,
    {
        T::ensure_registered();
        let record = self.record_mut(entity)?;
        record.components.insert(T::ID, Box::new(component));
        Ok(())
    }

    /// Attach a default-constructed instance of a registered component
    /// type. Keeps any existing instance.
    pub fn attach_default(&mut self, entity: Entity, id: ComponentId) -> Result<(), WorldError> {
        let meta = meta_of(id).ok_or(WorldError::UnregisteredComponent(id))?;
        let record = self.record_mut(entity)?;
        record
            .components
            .entry(id)
            .or_insert_with(meta.default_fn);
        Ok(())
    }

    /// Detach a component by id. Returns whether an instance was removed.
    pub fn remove_component(
        &mut self,
        entity: Entity,
        id: ComponentId,
    ) -> Result<bool, WorldError> {
        if id == ContainerManager::ID {
            // Dropping the manager releases everything it contained.
            if let Some(manager) = self.get::<ContainerManager>(entity) {
                let contained: Vec<Entity> = manager.all_entities().collect();
                for child in contained {
                    self.containment.remove(&child.index());
                }
            }
        }
        let record = self.record_mut(entity)?;
        Ok(record.components.remove(&id).is_some())
    }

    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.record(entity)?
            .components
            .get(&T::ID)?
            .as_any()
            .downcast_ref::<T>()
    }

    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.record_mut(entity)
            .ok()?
            .components
            .get_mut(&T::ID)?
            .as_any_mut()
            .downcast_mut::<T>()
    }

    pub fn get_erased(&self, entity: Entity, id: ComponentId) -> Option<&dyn ErasedComponent> {
        self.record(entity)?.components.get(&id).map(|b| b.as_ref())
    }

    pub fn get_erased_mut(
        &mut self,
        entity: Entity,
        id: ComponentId,
    ) -> Option<&mut dyn ErasedComponent> {
        self.record_mut(entity)
            .ok()?
            .components
            .get_mut(&id)
            .map(|b| b.as_mut())
    }

    /// Independent boxed snapshot of one component instance.
    pub fn clone_component(
        &self,
        entity: Entity,
        id: ComponentId,
    ) -> Option<Box<dyn ErasedComponent>> {
        self.get_erased(entity, id).map(|c| c.clone_boxed())
    }

    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.has_id(entity, T::ID)
    }

    pub fn has_id(&self, entity: Entity, id: ComponentId) -> bool {
        self.record(entity)
            .is_some_and(|r| r.components.contains_key(&id))
    }

    /// Sorted ids of the components attached to an entity.
    pub fn component_ids(&self, entity: Entity) -> Option<Vec<ComponentId>> {
        self.record(entity)
            .map(|r| r.components.keys().copied().collect())
    }

    pub fn live_entity_count(&self) -> usize {
        self.entities.len()
    }

    fn record(&self, entity: Entity) -> Option<&EntityRecord> {
        if !self.allocator.is_live(entity) {
            return None;
        }
        self.entities.get(&entity.index())
    }

    pub(crate) fn record_mut(&mut self, entity: Entity) -> Result<&mut EntityRecord, WorldError> {
        if !self.allocator.is_live(entity) {
            return Err(WorldError::NoSuchEntity(entity));
        }
        self.entities
            .get_mut(&entity.index())
            .ok_or(WorldError::NoSuchEntity(entity))
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::define_component;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default, Debug, PartialEq)]
    struct Charge {
        level: u32,
    }
    define_component!(Charge, 100, "Charge");

    impl Replicate for Charge {
        fn replicate(&self, dst: &mut Self) {
            dst.level = self.level;
        }
    }

    #[derive(Clone, Default)]
    struct StartProbe {
        log: Option<Arc<Mutex<Vec<Entity>>>>,
    }

    impl Component for StartProbe {
        const ID: ComponentId = 101;
        const NAME: &'static str = "StartProbe";

        fn on_start(&mut self, entity: Entity) {
            if let Some(log) = &self.log {
                log.lock().unwrap().push(entity);
            }
        }
    }

    impl Replicate for StartProbe {
        fn replicate(&self, dst: &mut Self) {
            dst.log = self.log.clone();
        }
    }

    fn test_world() -> World {
        let mut world = World::new();
        world
            .register_prototype(
                Prototype::new("battery")
                    .named("battery")
                    .described("a small battery")
                    .with(Charge { level: 7 }),
            )
            .unwrap();
        world
    }

    #[test]
    fn spawn_from_prototype_seeds_components() {
        let mut world = test_world();
        let entity = world
            .spawn_uninitialized(&"battery".into(), Placement::Detached, Angle::ZERO)
            .unwrap();

        assert_eq!(world.get::<Charge>(entity), Some(&Charge { level: 7 }));
        assert_eq!(world.entity_name(entity), Some("battery"));
        assert_eq!(world.prototype_of(entity), Some(&"battery".into()));
        assert!(!world.is_started(entity));
    }

    #[test]
    fn prototype_seeds_are_independent_per_spawn() {
        let mut world = test_world();
        let a = world
            .spawn_uninitialized(&"battery".into(), Placement::Detached, Angle::ZERO)
            .unwrap();
        let b = world
            .spawn_uninitialized(&"battery".into(), Placement::Detached, Angle::ZERO)
            .unwrap();

        world.get_mut::<Charge>(a).unwrap().level = 99;
        assert_eq!(world.get::<Charge>(b).unwrap().level, 7);
    }

    #[test]
    fn spawn_unknown_prototype_fails() {
        let mut world = World::new();
        let err = world
            .spawn_uninitialized(&"missing".into(), Placement::Detached, Angle::ZERO)
            .unwrap_err();
        assert!(matches!(err, WorldError::UnknownPrototype(_)));
    }

    #[test]
    fn start_runs_hooks_once() {
        let mut world = test_world();
        let entity = world
            .spawn_uninitialized(&"battery".into(), Placement::Detached, Angle::ZERO)
            .unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        world
            .attach(
                entity,
                StartProbe {
                    log: Some(log.clone()),
                },
            )
            .unwrap();

        world.start_entity(entity).unwrap();
        world.start_entity(entity).unwrap();

        assert!(world.is_started(entity));
        assert_eq!(log.lock().unwrap().as_slice(), &[entity]);
    }

    #[test]
    fn despawn_invalidates_handle() {
        let mut world = test_world();
        let entity = world
            .spawn_uninitialized(&"battery".into(), Placement::Detached, Angle::ZERO)
            .unwrap();
        assert!(world.despawn(entity));
        assert!(!world.contains(entity));
        assert!(world.get::<Charge>(entity).is_none());
        assert!(!world.despawn(entity));
    }

    #[test]
    fn attach_default_requires_registration() {
        let mut world = test_world();
        let entity = world.spawn_empty(Placement::Detached);
        let err = world.attach_default(entity, 9999).unwrap_err();
        assert!(matches!(err, WorldError::UnregisteredComponent(9999)));

        world.attach_default(entity, Charge::ID).unwrap();
        assert_eq!(world.get::<Charge>(entity), Some(&Charge::default()));
    }
}
