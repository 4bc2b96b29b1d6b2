//! Simulation substrate core types.
//!
//! Entities are generational handles into a [`World`] that stores one
//! type-erased component instance per registered component type. Components
//! carry runtime metadata (a factory and a replication function) in a
//! process-global registry, entities are instantiated from [`Prototype`]
//! template identities, and life-cycle start is deferred until a caller
//! explicitly asks for it.

mod component;
mod components;
mod container;
mod entity;
mod metadata;
mod prototype;
mod transform;
mod world;

pub use component::{
    meta_of, meta_of_name, register_component, Component, ComponentError, ComponentId,
    ComponentMeta, ErasedComponent, Replicate,
};
pub use components::{
    register_builtin_components, ActionsContainer, Actor, Fixtures, ItemStorage, PhysicsBody,
};
pub use container::{ContainerError, ContainerKind, ContainerManager, ContainerState};
pub use entity::{Entity, EntityAllocator};
pub use metadata::Metadata;
pub use prototype::{Prototype, PrototypeError, PrototypeId, PrototypeRegistry};
pub use transform::{Angle, Placement, Transform};
pub use world::{World, WorldError};
