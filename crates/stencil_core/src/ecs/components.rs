//! Engine-managed components.
//!
//! These hold session-bound, physics-simulation or storage state that the
//! engine maintains itself. None of them declares copyable fields: naively
//! duplicating a session binding would let two entities claim one player's
//! input, and physics/storage state is rebuilt by the engine on start.

use crate::define_component;
use crate::ecs::{ContainerManager, Entity, Metadata, Replicate, Transform};

/// Binds an entity to a player session.
#[derive(Debug, Clone, Default)]
pub struct Actor {
    pub session: Option<u64>,
}
define_component!(Actor, 4, "Actor");

impl Replicate for Actor {
    fn replicate(&self, _dst: &mut Self) {}
}

/// Holds the action entities granted to an entity.
#[derive(Debug, Clone, Default)]
pub struct ActionsContainer {
    pub actions: Vec<Entity>,
}
define_component!(ActionsContainer, 5, "ActionsContainer");

impl Replicate for ActionsContainer {
    fn replicate(&self, _dst: &mut Self) {}
}

/// Collision fixture data.
#[derive(Debug, Clone, Default)]
pub struct Fixtures {
    pub fixture_count: u32,
}
define_component!(Fixtures, 6, "Fixtures");

impl Replicate for Fixtures {
    fn replicate(&self, _dst: &mut Self) {}
}

/// Physical body simulation state.
#[derive(Debug, Clone, Default)]
pub struct PhysicsBody {
    pub mass: f32,
    pub awake: bool,
}
define_component!(PhysicsBody, 7, "PhysicsBody");

impl Replicate for PhysicsBody {
    fn replicate(&self, _dst: &mut Self) {}
}

/// Generic item storage (grids, stacks, weight limits).
#[derive(Debug, Clone, Default)]
pub struct ItemStorage {
    pub capacity: u32,
    pub items: Vec<Entity>,
}
define_component!(ItemStorage, 8, "ItemStorage");

impl Replicate for ItemStorage {
    fn replicate(&self, _dst: &mut Self) {}
}

/// Register every built-in component type. Called by `World::new`.
pub fn register_builtin_components() {
    use crate::ecs::Component;

    Metadata::ensure_registered();
    Transform::ensure_registered();
    ContainerManager::ensure_registered();
    Actor::ensure_registered();
    ActionsContainer::ensure_registered();
    Fixtures::ensure_registered();
    PhysicsBody::ensure_registered();
    ItemStorage::ensure_registered();
}
