//! Entity handle with generational index
//!
//! Entities are lightweight handles (8 bytes) that reference records in the
//! World. The generation counter prevents use-after-free bugs.

use serde::{Deserialize, Serialize};

/// Entity handle (generation-indexed for safety)
///
/// Format: [32-bit index | 32-bit generation]
/// - Index: Position in the entity record table
/// - Generation: Incremented on entity destruction (prevents use-after-free)
///
/// Example:
/// ```ignore
/// let entity = world.spawn_empty(Placement::Detached);
/// world.despawn(entity);
/// // entity handle is now invalid (generation mismatch)
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity {
    index: u32,
    generation: u32,
}

impl Entity {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Serialize to 64-bit integer (for save files and logs)
    pub fn to_bits(&self) -> u64 {
        ((self.generation as u64) << 32) | (self.index as u64)
    }

    /// Deserialize from 64-bit integer
    pub fn from_bits(bits: u64) -> Self {
        Self {
            index: bits as u32,
            generation: (bits >> 32) as u32,
        }
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Allocates entity indices, reusing freed slots and bumping generations so
/// stale handles fail validation.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    generations: Vec<u32>,
    free: Vec<u32>,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a handle (reuses a freed slot if available).
    pub fn alloc(&mut self) -> Entity {
        if let Some(index) = self.free.pop() {
            Entity::new(index, self.generations[index as usize])
        } else {
            let index = self.generations.len() as u32;
            self.generations.push(0);
            Entity::new(index, 0)
        }
    }

    /// Free a handle (increments the slot's generation).
    ///
    /// Returns false if the handle was already stale.
    pub fn free(&mut self, entity: Entity) -> bool {
        if !self.is_live(entity) {
            return false;
        }
        self.generations[entity.index as usize] = entity.generation.wrapping_add(1);
        self.free.push(entity.index);
        true
    }

    /// Validate that a handle's generation matches the current generation.
    pub fn is_live(&self, entity: Entity) -> bool {
        self.generations
            .get(entity.index as usize)
            .is_some_and(|&generation| generation == entity.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_roundtrip() {
        let entity = Entity::new(17, 3);
        assert_eq!(Entity::from_bits(entity.to_bits()), entity);
    }

    #[test]
    fn freed_slot_is_reused_with_new_generation() {
        let mut alloc = EntityAllocator::new();
        let a = alloc.alloc();
        assert!(alloc.free(a));
        assert!(!alloc.is_live(a));

        let b = alloc.alloc();
        assert_eq!(b.index(), a.index());
        assert_ne!(b.generation(), a.generation());
        assert!(alloc.is_live(b));
        // Double free is rejected.
        assert!(alloc.free(b));
        assert!(!alloc.free(b));
    }
}
