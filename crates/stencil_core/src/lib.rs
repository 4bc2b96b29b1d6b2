//! Stencil Core
//!
//! Minimal simulation substrate the gameplay crates build on:
//! - Entity registry with generational handles and deferred start
//! - Runtime component registry (factory + per-type replication)
//! - Prototypes (template identities entities are instantiated from)
//! - Containers, display metadata, spatial transforms

pub mod ecs;

pub use glam;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
