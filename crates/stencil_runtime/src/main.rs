//! Stencil Runtime
//!
//! Minimal binary that wires the substrate together and demonstrates a
//! deep entity copy: a containered source entity is cloned, children and
//! all, and the outcome is logged.

mod settings;

use anyhow::Result;

use stencil_clone::{CloneRequest, CopyPolicy, EntityCloner};
use stencil_core::define_component;
use stencil_core::ecs::{
    Angle, ContainerKind, Placement, Prototype, Replicate, World,
};
use stencil_core::glam::Vec2;

/// Stored energy. `level` is persistable; `draw` is recomputed at runtime.
#[derive(Debug, Clone, Default)]
struct Charge {
    level: u32,
    draw: f32,
}
define_component!(Charge, 100, "Charge");

impl Replicate for Charge {
    fn replicate(&self, dst: &mut Self) {
        dst.level = self.level;
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    tracing::info!("Stencil v{}", stencil_core::VERSION);

    let settings = match std::env::args().nth(1) {
        Some(path) => settings::DemoSettings::load(&path)?,
        None => settings::DemoSettings::default(),
    };
    tracing::info!(?settings, "demo settings");

    let mut world = World::new();
    world
        .register_prototype(
            Prototype::new("supply_crate")
                .named("supply crate")
                .described("holds spare parts")
                .with(Charge::default()),
        )?;
    world
        .register_prototype(
            Prototype::new("spare_part")
                .named("spare part")
                .with(Charge::default()),
        )?;

    // Build the source: a charged crate with contained parts.
    let source = world.spawn_uninitialized(
        &"supply_crate".into(),
        Placement::World(Vec2::ZERO),
        Angle::ZERO,
    )?;
    if let Some(charge) = world.get_mut::<Charge>(source) {
        charge.level = settings.charge_level;
    }
    if settings.anchored {
        world.anchor_entity(source)?;
    }
    world.ensure_container(source, "stored", ContainerKind::List)?;
    for _ in 0..settings.child_count {
        let part = world.spawn_uninitialized(
            &"spare_part".into(),
            Placement::Detached,
            Angle::ZERO,
        )?;
        world.insert_into_container(source, "stored", part, false)?;
    }
    world.start_entity(source)?;

    // Clone it.
    let cloner = EntityCloner::new(CopyPolicy::default());
    let outcome = cloner.try_copy(&mut world, source, CloneRequest::at(Vec2::new(5.0, 0.0)))?;

    tracing::info!(
        copy = %outcome.entity,
        children = outcome.children.len(),
        failures = outcome.failures.len(),
        "cloned {}",
        world.entity_name(outcome.entity).unwrap_or("<unnamed>"),
    );
    tracing::info!(
        level = world.get::<Charge>(outcome.entity).map(|c| c.level),
        draw = world.get::<Charge>(outcome.entity).map(|c| c.draw),
        anchored = world.is_anchored(outcome.entity),
        "copy state"
    );

    Ok(())
}
