//! Generational slot arenas backing the registry.
//!
//! Every field, attribute and value created during a trace lives in one of
//! these arenas, and the handles the registry hands out are `(index,
//! generation)` pairs. Freed slots go on a free list and are reused by later
//! insertions with a bumped generation, so a stale handle can always be told
//! apart from a live one: the sweep paths skip it silently, the direct access
//! paths treat it as a caller bug and panic.

/// Raw `(index, generation)` handle into an [`Arena`].
///
/// The typed handles (`FieldId`, `AttrId`, `ValueId`) are thin wrappers over
/// this so they cannot be mixed up across arenas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct RawId {
    index: u32,
    generation: u32,
}

impl RawId {
    /// Returns the raw slot index.
    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }
}

struct Slot<T> {
    generation: u32,
    entry: Option<T>,
}

/// Dense storage with slot reuse.
///
/// `kind` names what the arena stores ("field", "attribute", "value") and
/// only appears in panic messages for stale-handle access.
pub(crate) struct Arena<T> {
    kind: &'static str,
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
}

impl<T> Arena<T> {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            slots: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Inserts an entry, reusing a freed slot when one is available.
    ///
    /// Reuse bumps the slot's generation so handles to the previous occupant
    /// are detectably dead.
    pub fn insert(&mut self, entry: T) -> RawId {
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.entry = Some(entry);
            RawId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = u32::try_from(self.slots.len()).expect("arena index out of u32 range");
            self.slots.push(Slot {
                generation: 0,
                entry: Some(entry),
            });
            RawId { index, generation: 0 }
        }
    }

    /// Returns a reference to a live entry.
    ///
    /// # Panics
    /// Panics if the slot was freed or reused since the handle was issued.
    pub fn get(&self, id: RawId) -> &T {
        self.get_if_live(id)
            .unwrap_or_else(|| panic!("{} arena: slot {} is freed or stale", self.kind, id.index))
    }

    /// Returns a mutable reference to a live entry.
    ///
    /// # Panics
    /// Panics if the slot was freed or reused since the handle was issued.
    pub fn get_mut(&mut self, id: RawId) -> &mut T {
        let kind = self.kind;
        self.get_mut_if_live(id)
            .unwrap_or_else(|| panic!("{kind} arena: slot {} is freed or stale", id.index))
    }

    /// Returns the entry if the handle still points at a live slot.
    pub fn get_if_live(&self, id: RawId) -> Option<&T> {
        let slot = self.slots.get(id.index())?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.as_ref()
    }

    /// Mutable variant of [`Arena::get_if_live`].
    pub fn get_mut_if_live(&mut self, id: RawId) -> Option<&mut T> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.as_mut()
    }

    /// Frees a slot, returning its entry.
    ///
    /// Freed slots are skipped by the iteration methods and reused by later
    /// insertions. Releasing an already-freed or stale handle returns `None`.
    pub fn release(&mut self, id: RawId) -> Option<T> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation {
            return None;
        }
        let entry = slot.entry.take()?;
        self.free_list.push(id.index);
        Some(entry)
    }

    /// Iterates over live entries only; freed slots are skipped.
    pub fn iter_live(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter_map(|slot| slot.entry.as_ref())
    }

    /// Mutable variant of [`Arena::iter_live`], used by the commit/checkout sweeps.
    pub fn iter_live_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots.iter_mut().filter_map(|slot| slot.entry.as_mut())
    }

    /// Number of live entries.
    pub fn live_count(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    /// Number of freed slots awaiting reuse.
    pub fn free_count(&self) -> usize {
        self.free_list.len()
    }

    /// Total slot count (live + free).
    pub fn total_count(&self) -> usize {
        self.slots.len()
    }

    /// Drops every entry while keeping the slots' generation state.
    ///
    /// All outstanding handles become stale: the slots are freed, not
    /// forgotten, so insertions in the next trace reuse them with a bumped
    /// generation and pre-clear handles stay detectably dead. Used when a
    /// trace completes or is abandoned.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            slot.entry = None;
        }
        let len = u32::try_from(self.slots.len()).expect("arena index out of u32 range");
        self.free_list.clear();
        self.free_list.extend((0..len).rev());
    }
}

impl<T> std::fmt::Debug for Arena<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("kind", &self.kind)
            .field("live", &self.live_count())
            .field("free", &self.free_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get() {
        let mut arena = Arena::new("test");
        let a = arena.insert(1);
        let b = arena.insert(2);
        assert_eq!(*arena.get(a), 1);
        assert_eq!(*arena.get(b), 2);
        assert_eq!(arena.live_count(), 2);
    }

    #[test]
    fn released_slot_is_skipped_and_reused() {
        let mut arena = Arena::new("test");
        let a = arena.insert(1);
        let b = arena.insert(2);
        assert_eq!(arena.release(a), Some(1));
        assert_eq!(arena.live_count(), 1);
        assert!(arena.get_if_live(a).is_none());
        assert_eq!(arena.iter_live().copied().collect::<Vec<_>>(), vec![2]);

        // Reuse bumps the generation: the old handle stays dead.
        let c = arena.insert(3);
        assert_eq!(c.index(), a.index());
        assert_ne!(c, a);
        assert!(arena.get_if_live(a).is_none());
        assert_eq!(*arena.get(c), 3);
        assert_eq!(*arena.get(b), 2);
    }

    #[test]
    fn double_release_is_none() {
        let mut arena = Arena::new("test");
        let a = arena.insert(7);
        assert_eq!(arena.release(a), Some(7));
        assert_eq!(arena.release(a), None);
    }

    #[test]
    #[should_panic(expected = "freed or stale")]
    fn stale_get_panics() {
        let mut arena = Arena::new("test");
        let a = arena.insert(7);
        arena.release(a);
        let _ = arena.get(a);
    }

    #[test]
    fn clear_invalidates_everything() {
        let mut arena = Arena::new("test");
        let a = arena.insert(7);
        arena.clear();
        assert_eq!(arena.live_count(), 0);
        assert!(arena.get_if_live(a).is_none());
    }

    #[test]
    fn cleared_handles_stay_dead_after_reuse() {
        let mut arena = Arena::new("test");
        let a = arena.insert(7);
        arena.clear();

        // The next insertion reuses the slot with a bumped generation, so
        // the pre-clear handle must not resolve to the new entry.
        let b = arena.insert(8);
        assert_eq!(b.index(), a.index());
        assert_ne!(b, a);
        assert!(arena.get_if_live(a).is_none());
        assert_eq!(*arena.get(b), 8);
    }
}
