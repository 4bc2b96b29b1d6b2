// component.rs - Runtime component registration and replication
//
// Components are identified by u32 IDs, not Rust TypeIds, so tooling and
// save data can refer to them stably. The registry carries, per type, a
// factory for default instances and the metadata the cloning layer needs.

use once_cell::sync::Lazy;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;

use crate::ecs::Entity;

pub type ComponentId = u32;

/// Metadata describing a registered component type.
#[derive(Clone, Debug)]
pub struct ComponentMeta {
    pub id: ComponentId,
    pub name: &'static str,
    pub type_id: TypeId,
    /// Factory producing a default-constructed instance (registered, not
    /// yet populated).
    pub default_fn: fn() -> Box<dyn ErasedComponent>,
}

/// Global registry of component types.
static REGISTRY: Lazy<RwLock<HashMap<ComponentId, ComponentMeta>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Register a component's metadata.
///
/// Re-registration of the same type under the same id is a no-op;
/// registering a *different* type under an existing id is an authoring bug
/// and asserts.
pub fn register_component(meta: ComponentMeta) {
    let mut map = REGISTRY.write().unwrap();
    if let Some(prev) = map.insert(meta.id, meta.clone()) {
        assert_eq!(
            prev.type_id, meta.type_id,
            "Component id {} re-registered with a different type: was {}, now {}",
            meta.id, prev.name, meta.name
        );
    }
}

/// Look up component metadata by ID.
pub fn meta_of(id: ComponentId) -> Option<ComponentMeta> {
    REGISTRY.read().unwrap().get(&id).cloned()
}

/// Look up component metadata by name.
pub fn meta_of_name(name: &str) -> Option<ComponentMeta> {
    REGISTRY
        .read()
        .unwrap()
        .values()
        .find(|meta| meta.name == name)
        .cloned()
}

/// Trait for component types attachable to entities.
pub trait Component: 'static + Sized + Send + Sync {
    /// Globally unique component ID.
    const ID: ComponentId;

    /// Human-readable name for debugging.
    const NAME: &'static str;

    /// Deferred life-cycle hook, run once when the owning entity starts.
    fn on_start(&mut self, _entity: Entity) {}

    /// Register this component's metadata with the global registry.
    /// Should be called once during startup.
    fn ensure_registered()
    where
        Self: Replicate + Clone + Default,
    {
        register_component(ComponentMeta {
            id: Self::ID,
            name: Self::NAME,
            type_id: TypeId::of::<Self>(),
            default_fn: default_boxed::<Self>,
        });
    }
}

/// Per-type copy declaration: which fields participate in cloning.
///
/// `replicate` copies exactly the persistable fields of `self` onto `dst`,
/// leaving runtime/derived state on `dst` untouched. Deep-copy fields with
/// `Clone`; fields with shared or otherwise custom semantics go through a
/// copy strategy.
pub trait Replicate {
    fn replicate(&self, dst: &mut Self);
}

#[derive(Debug, Error)]
pub enum ComponentError {
    #[error("cannot replicate {found} into {expected}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("component id {component_id} is not registered")]
    NotRegistered { component_id: ComponentId },
}

/// Object-safe facade over a component instance.
///
/// Implemented for every `Component + Replicate + Clone + Default` type, so
/// the world can store heterogeneous components and the cloning layer can
/// snapshot and replicate them without knowing concrete types.
pub trait ErasedComponent: Any + Send + Sync {
    fn component_id(&self) -> ComponentId;
    fn component_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Independent boxed copy of this instance.
    fn clone_boxed(&self) -> Box<dyn ErasedComponent>;

    /// Copy `src`'s persistable fields onto `self`.
    fn replicate_from(&mut self, src: &dyn ErasedComponent) -> Result<(), ComponentError>;

    /// Run the deferred life-cycle start hook.
    fn start(&mut self, entity: Entity);
}

impl<T> ErasedComponent for T
where
    T: Component + Replicate + Clone + Default,
{
    fn component_id(&self) -> ComponentId {
        T::ID
    }

    fn component_name(&self) -> &'static str {
        T::NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn clone_boxed(&self) -> Box<dyn ErasedComponent> {
        Box::new(self.clone())
    }

    fn replicate_from(&mut self, src: &dyn ErasedComponent) -> Result<(), ComponentError> {
        let src = src
            .as_any()
            .downcast_ref::<T>()
            .ok_or(ComponentError::TypeMismatch {
                expected: T::NAME,
                found: src.component_name(),
            })?;
        src.replicate(self);
        Ok(())
    }

    fn start(&mut self, entity: Entity) {
        Component::on_start(self, entity);
    }
}

fn default_boxed<T>() -> Box<dyn ErasedComponent>
where
    T: Component + Replicate + Clone + Default,
{
    Box::new(T::default())
}

/// Helper macro to implement the Component trait.
///
/// Components with a life-cycle hook implement the trait by hand instead.
///
/// # Example
/// ```ignore
/// #[derive(Clone, Default)]
/// struct Health { current: u32 }
///
/// define_component!(Health, 110, "Health");
/// ```
#[macro_export]
macro_rules! define_component {
    ($ty:ty, $id:expr, $name:expr) => {
        impl $crate::ecs::Component for $ty {
            const ID: $crate::ecs::ComponentId = $id;
            const NAME: &'static str = $name;
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default, PartialEq, Debug)]
    struct Flavor {
        taste: String,
    }
    define_component!(Flavor, 900, "Flavor");

    impl Replicate for Flavor {
        fn replicate(&self, dst: &mut Self) {
            dst.taste = self.taste.clone();
        }
    }

    #[derive(Clone, Default)]
    struct Aroma;
    define_component!(Aroma, 901, "Aroma");

    impl Replicate for Aroma {
        fn replicate(&self, _dst: &mut Self) {}
    }

    #[test]
    fn registry_round_trip() {
        Flavor::ensure_registered();
        let meta = meta_of(Flavor::ID).unwrap();
        assert_eq!(meta.name, "Flavor");
        assert_eq!(meta_of_name("Flavor").unwrap().id, Flavor::ID);

        let fresh = (meta.default_fn)();
        assert_eq!(fresh.component_id(), Flavor::ID);
    }

    #[test]
    fn replicate_from_rejects_type_mismatch() {
        let src = Aroma;
        let mut dst = Flavor::default();
        let err = ErasedComponent::replicate_from(&mut dst, &src).unwrap_err();
        assert!(matches!(err, ComponentError::TypeMismatch { .. }));
    }

    #[test]
    fn replicate_from_copies_declared_fields() {
        let src = Flavor {
            taste: "bitter".into(),
        };
        let mut dst = Flavor::default();
        ErasedComponent::replicate_from(&mut dst, &src).unwrap();
        assert_eq!(dst, src);
    }
}
