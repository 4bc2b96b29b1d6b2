// strategy.rs - Custom per-field copy strategies
//
// Most fields replicate through plain Clone. Fields with different copy
// semantics go through a CopyStrategy; strategy instances are constructed
// once and cached for the lifetime of the process.

use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::any::{Any, TypeId};
use std::sync::Arc;

/// A reusable copy strategy for one field type.
pub trait CopyStrategy<T>: Default + Send + Sync + 'static {
    fn create_copy(&self, value: &T) -> T;
}

/// Strategy type -> cached instance.
static STRATEGIES: Lazy<DashMap<TypeId, Arc<dyn Any + Send + Sync>>> = Lazy::new(DashMap::new);

/// Fetch the cached instance of strategy `S`, constructing it on first use.
pub fn strategy<S: Default + Send + Sync + 'static>() -> Arc<S> {
    let entry = STRATEGIES
        .entry(TypeId::of::<S>())
        .or_insert_with(|| Arc::new(S::default()) as Arc<dyn Any + Send + Sync>);
    Arc::clone(entry.value())
        .downcast::<S>()
        .expect("strategy cache entry holds the wrong type for its key")
}

/// Copy a field value through strategy `S`.
pub fn copy_with<S, T>(value: &T) -> T
where
    S: CopyStrategy<T>,
{
    strategy::<S>().create_copy(value)
}

/// Strategy for fields whose copies intentionally share the underlying
/// allocation: the copy is a new `Arc` handle, not a deep copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct SharedHandle;

impl<T: ?Sized + Send + Sync + 'static> CopyStrategy<Arc<T>> for SharedHandle {
    fn create_copy(&self, value: &Arc<T>) -> Arc<T> {
        Arc::clone(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static CONSTRUCTIONS: AtomicUsize = AtomicUsize::new(0);

    struct Doubling;

    impl Default for Doubling {
        fn default() -> Self {
            CONSTRUCTIONS.fetch_add(1, Ordering::SeqCst);
            Doubling
        }
    }

    impl CopyStrategy<u32> for Doubling {
        fn create_copy(&self, value: &u32) -> u32 {
            value * 2
        }
    }

    #[test]
    fn strategies_are_constructed_once() {
        assert_eq!(copy_with::<Doubling, u32>(&21), 42);
        assert_eq!(copy_with::<Doubling, u32>(&2), 4);
        assert_eq!(CONSTRUCTIONS.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&strategy::<Doubling>(), &strategy::<Doubling>()));
    }

    #[test]
    fn shared_handle_clones_the_handle_not_the_value() {
        let original = Arc::new(vec![1, 2, 3]);
        let copy = copy_with::<SharedHandle, _>(&original);
        assert!(Arc::ptr_eq(&original, &copy));
    }
}
