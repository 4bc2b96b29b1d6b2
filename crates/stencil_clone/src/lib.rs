//! Deep entity cloning.
//!
//! Given a source entity, [`EntityCloner`] produces a new entity with the
//! same component set and per-field data, recursing into contained child
//! entities and deferring life-cycle start until the whole subtree is
//! built. Only fields a component declares in its
//! [`Replicate`](stencil_core::ecs::Replicate) implementation are copied;
//! engine-managed components are left alone per [`CopyPolicy`].

mod cloner;
mod policy;
mod strategy;

pub use cloner::{ChildFailure, CloneError, CloneOutcome, CloneRequest, EntityCloner};
pub use policy::CopyPolicy;
pub use strategy::{copy_with, strategy, CopyStrategy, SharedHandle};
