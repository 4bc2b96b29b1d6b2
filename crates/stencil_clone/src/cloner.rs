// cloner.rs - Deep entity copy
//
// A copy is built in four phases: resolve the source (identity, template,
// spatial state), stage a snapshot of its copyable components and container
// topology, instantiate an uninitialized entity from the source's template
// identity and reconcile it against the snapshot, then run the deferred
// start hooks for the whole subtree in one batch. Resolution happens
// entirely before the destination exists, so a resolution failure creates
// nothing.

use std::collections::BTreeSet;

use thiserror::Error;

use stencil_core::glam::Vec2;

use stencil_core::ecs::{
    Angle, Component, ComponentError, ComponentId, ContainerError, ContainerKind,
    ContainerManager, Entity, ErasedComponent, Metadata, Placement, PrototypeId, Transform, World,
    WorldError,
};

use crate::policy::CopyPolicy;

#[derive(Debug, Error)]
pub enum CloneError {
    /// The source entity, or its metadata/transform, cannot be resolved.
    #[error("source entity {0} could not be resolved")]
    SourceUnresolved(Entity),
    /// The source carries no template identity to instantiate a copy from.
    #[error("source entity {0} has no template identity")]
    MissingPrototype(Entity),
    #[error(transparent)]
    World(#[from] WorldError),
    #[error(transparent)]
    Component(#[from] ComponentError),
    #[error(transparent)]
    Container(#[from] ContainerError),
}

/// One-shot description of a copy: destination placement, rotation, an
/// optional container to force the copy into, and whether to run start
/// hooks once the subtree is built.
#[derive(Debug, Clone)]
pub struct CloneRequest {
    placement: Placement,
    rotation: Angle,
    container: Option<(Entity, String)>,
    initialize: bool,
}

impl CloneRequest {
    /// Copy to absolute world coordinates.
    pub fn at(position: Vec2) -> Self {
        Self {
            placement: Placement::World(position),
            rotation: Angle::ZERO,
            container: None,
            initialize: true,
        }
    }

    /// Copy to coordinates relative to another entity.
    pub fn relative_to(parent: Entity, offset: Vec2) -> Self {
        Self {
            placement: Placement::Relative { parent, offset },
            rotation: Angle::ZERO,
            container: None,
            initialize: true,
        }
    }

    /// Copy without any placement (limbo). Defaults to not initializing,
    /// since detached copies are usually staged into containers first.
    pub fn detached() -> Self {
        Self {
            placement: Placement::Detached,
            rotation: Angle::ZERO,
            container: None,
            initialize: false,
        }
    }

    pub fn rotated(mut self, rotation: Angle) -> Self {
        self.rotation = rotation;
        self
    }

    /// Force the finished copy into a container, overriding any placement.
    pub fn in_container(mut self, owner: Entity, container: impl Into<String>) -> Self {
        self.container = Some((owner, container.into()));
        self
    }

    pub fn initialize(mut self, initialize: bool) -> Self {
        self.initialize = initialize;
        self
    }
}

/// A contained child that failed to copy. Siblings and the parent copy
/// proceed regardless.
#[derive(Debug)]
pub struct ChildFailure {
    pub container: String,
    pub source: Entity,
    pub error: CloneError,
}

/// Result of a successful copy.
#[derive(Debug)]
pub struct CloneOutcome {
    /// The new entity.
    pub entity: Entity,
    /// Every recursively copied descendant, in collection order. When the
    /// request asked for initialization these have already been started;
    /// otherwise the caller owns starting them.
    pub children: Vec<Entity>,
    /// Contained children that could not be copied.
    pub failures: Vec<ChildFailure>,
}

/// Deep-copies entities.
///
/// The component set of a copy equals the source's set minus the policy's
/// exclusions, irrespective of what the destination template would provide
/// by default. Per-field data flows through each component type's
/// [`Replicate`](stencil_core::ecs::Replicate) declaration.
#[derive(Debug, Clone, Default)]
pub struct EntityCloner {
    policy: CopyPolicy,
}

impl EntityCloner {
    pub fn new(policy: CopyPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &CopyPolicy {
        &self.policy
    }

    /// Convenience wrapper: the copied entity, or None on failure. Partial
    /// child failures are already logged and do not fail the copy.
    pub fn copy_entity(
        &self,
        world: &mut World,
        source: Entity,
        request: CloneRequest,
    ) -> Option<Entity> {
        self.try_copy(world, source, request)
            .map(|outcome| outcome.entity)
            .ok()
    }

    /// Copy `source` according to `request`.
    ///
    /// Fails without creating anything if the source cannot be resolved or
    /// has no template identity. A contained child failing to copy is
    /// collected into the outcome (and logged) but does not abort its
    /// siblings or the parent copy; a container whose kind conflicts with
    /// the destination's template is a fatal authoring error.
    pub fn try_copy(
        &self,
        world: &mut World,
        source: Entity,
        request: CloneRequest,
    ) -> Result<CloneOutcome, CloneError> {
        // Resolve identity, display metadata and spatial state.
        let metadata = world
            .get::<Metadata>(source)
            .ok_or(CloneError::SourceUnresolved(source))?;
        let prototype: PrototypeId = metadata
            .prototype
            .clone()
            .ok_or(CloneError::MissingPrototype(source))?;
        let source_name = metadata.name.clone();
        let source_description = metadata.description.clone();
        let source_transform = *world
            .get::<Transform>(source)
            .ok_or(CloneError::SourceUnresolved(source))?;

        // Stage a snapshot of the copyable component set and the container
        // topology before the destination exists.
        let source_ids = world
            .component_ids(source)
            .ok_or(CloneError::SourceUnresolved(source))?;
        let mut snapshot: Vec<Box<dyn ErasedComponent>> = Vec::new();
        let mut source_has_manager = false;
        let mut source_containers: Vec<(String, ContainerKind, Vec<Entity>)> = Vec::new();
        for &id in &source_ids {
            if self.policy.skips(id) {
                continue;
            }
            if id == ContainerManager::ID {
                source_has_manager = true;
                if let Some(manager) = world.get::<ContainerManager>(source) {
                    for (name, state) in manager.iter() {
                        source_containers.push((
                            name.to_string(),
                            state.kind(),
                            state.entities().to_vec(),
                        ));
                    }
                }
                continue;
            }
            if let Some(component) = world.clone_component(source, id) {
                snapshot.push(component);
            }
        }

        // Instantiate from the source's template identity, uninitialized.
        let copy = world.spawn_uninitialized(&prototype, request.placement, request.rotation)?;

        // Attach whatever the template did not provide.
        let mut copyable: BTreeSet<ComponentId> =
            snapshot.iter().map(|c| c.component_id()).collect();
        if source_has_manager {
            copyable.insert(ContainerManager::ID);
            world.attach_default(copy, ContainerManager::ID)?;
        }
        for component in &snapshot {
            let id = component.component_id();
            if !world.has_id(copy, id) {
                world.attach_default(copy, id)?;
            }
        }

        // Drop components the source does not carry.
        let copy_ids = world
            .component_ids(copy)
            .ok_or(WorldError::NoSuchEntity(copy))?;
        for id in copy_ids {
            if self.policy.skips(id) {
                continue;
            }
            if !copyable.contains(&id) {
                world.remove_component(copy, id)?;
            }
        }

        // Field copy through each type's replication function.
        for component in &snapshot {
            let id = component.component_id();
            let destination =
                world
                    .get_erased_mut(copy, id)
                    .ok_or(WorldError::MissingComponent {
                        entity: copy,
                        component: component.component_name(),
                    })?;
            destination.replicate_from(component.as_ref())?;
        }

        // Mirror containers, collecting every descendant for deferred start.
        let mut children = Vec::new();
        let mut failures = Vec::new();
        for (name, kind, contained) in &source_containers {
            world.ensure_container(copy, name, *kind)?;
            for &child in contained {
                let child_request = CloneRequest::detached().in_container(copy, name.clone());
                match self.try_copy(world, child, child_request) {
                    Ok(outcome) => {
                        children.push(outcome.entity);
                        children.extend(outcome.children);
                        failures.extend(outcome.failures);
                    }
                    Err(error) => failures.push(ChildFailure {
                        container: name.clone(),
                        source: child,
                        error,
                    }),
                }
            }
        }
        if !failures.is_empty() {
            tracing::error!(
                target: "entity.copy",
                %source,
                %copy,
                failed = failures.len(),
                "failed to fully copy contained entities"
            );
        }

        // Display metadata.
        world.set_entity_name(copy, source_name)?;
        world.set_entity_description(copy, source_description)?;

        // Anchoring reconciliation.
        if source_transform.anchored && !world.is_anchored(copy) {
            world.anchor_entity(copy)?;
        } else if !source_transform.anchored && world.is_anchored(copy) {
            world.unanchor_entity(copy)?;
        }

        // A caller-supplied container overrides placement.
        if let Some((owner, container)) = &request.container {
            world.insert_into_container(*owner, container, copy, true)?;
        }

        // Deferred start: the copy first, then every descendant in
        // collection order.
        if request.initialize {
            world.start_entity(copy)?;
            for &child in &children {
                world.start_entity(child)?;
            }
        }

        Ok(CloneOutcome {
            entity: copy,
            children,
            failures,
        })
    }
}
