//! Spatial placement, rotation and anchoring.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::ecs::{Component, ComponentId, Entity, Replicate, World, WorldError};

/// Where an entity lives.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Placement {
    /// Absolute world coordinates.
    World(Vec2),
    /// Coordinates relative to another entity.
    Relative { parent: Entity, offset: Vec2 },
    /// No placement (limbo). Contained entities live here.
    Detached,
}

impl Default for Placement {
    fn default() -> Self {
        Placement::Detached
    }
}

/// Rotation in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Angle(pub f32);

impl Angle {
    pub const ZERO: Angle = Angle(0.0);
}

/// Spatial state of an entity. Managed by the world, never generically
/// replicated; the cloning layer reconciles anchoring explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform {
    pub placement: Placement,
    pub rotation: Angle,
    pub anchored: bool,
}

impl Component for Transform {
    const ID: ComponentId = 2;
    const NAME: &'static str = "Transform";
}

impl Replicate for Transform {
    fn replicate(&self, _dst: &mut Self) {}
}

impl World {
    /// Anchor an entity at its current position.
    pub fn anchor_entity(&mut self, entity: Entity) -> Result<(), WorldError> {
        self.transform_mut(entity)?.anchored = true;
        Ok(())
    }

    /// Release an entity's anchoring.
    pub fn unanchor_entity(&mut self, entity: Entity) -> Result<(), WorldError> {
        self.transform_mut(entity)?.anchored = false;
        Ok(())
    }

    pub fn is_anchored(&self, entity: Entity) -> bool {
        self.get::<Transform>(entity).is_some_and(|t| t.anchored)
    }

    fn transform_mut(&mut self, entity: Entity) -> Result<&mut Transform, WorldError> {
        self.get_mut::<Transform>(entity)
            .ok_or(WorldError::MissingComponent {
                entity,
                component: Transform::NAME,
            })
    }
}
