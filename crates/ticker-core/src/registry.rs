use smallvec::SmallVec;

use crate::Tick;

/// Ordered tick slots with lazy removal.
///
/// Removal tombstones a slot in place so that indices captured by an
/// in-flight cycle stay valid. Tombstones are dropped by [`compact`](Self::compact).
#[derive(Default)]
pub(crate) struct TickRegistry {
    slots: SmallVec<[Option<Tick>; 8]>,
    tombstones: usize,
}

impl TickRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn position(&self, tick: &Tick) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|live| live.same_as(tick)))
    }

    /// Appends `tick` unless it is already live. Returns whether it was added.
    pub(crate) fn insert(&mut self, tick: Tick) -> bool {
        if self.position(&tick).is_some() {
            return false;
        }
        self.slots.push(Some(tick));
        true
    }

    /// Tombstones the live slot holding `tick`. Returns whether one was found.
    pub(crate) fn remove(&mut self, tick: &Tick) -> bool {
        match self.position(tick) {
            Some(index) => {
                self.slots[index] = None;
                self.tombstones += 1;
                true
            }
            None => false,
        }
    }

    pub(crate) fn contains(&self, tick: &Tick) -> bool {
        self.position(tick).is_some()
    }

    /// Tombstones every live slot and returns how many were cleared.
    pub(crate) fn clear(&mut self) -> usize {
        let mut cleared = 0;
        for slot in self.slots.iter_mut() {
            if slot.take().is_some() {
                cleared += 1;
            }
        }
        self.tombstones += cleared;
        cleared
    }

    /// Returns the tick stored at `index`, or `None` for tombstones and
    /// out-of-range indices.
    pub(crate) fn get(&self, index: usize) -> Option<Tick> {
        self.slots.get(index).and_then(Clone::clone)
    }

    /// Number of physical slots, tombstones included.
    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn live_count(&self) -> usize {
        self.slots.len() - self.tombstones
    }

    pub(crate) fn needs_compaction(&self) -> bool {
        self.tombstones > 0
    }

    pub(crate) fn live(&self) -> Vec<Tick> {
        self.slots.iter().flatten().cloned().collect()
    }

    /// Drops tombstoned slots, keeping live ticks in order. Returns the number
    /// of slots removed.
    pub(crate) fn compact(&mut self) -> usize {
        let removed = self.tombstones;
        if removed > 0 {
            self.slots.retain(|slot| slot.is_some());
            self.tombstones = 0;
        }
        removed
    }
}

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod tests;
