//! Iteration over a heap's mutable spaces.
//!
//! [`SpaceIterator`] walks slots [`SpaceId::FIRST_MUTABLE`] through
//! [`SpaceId::LAST_MUTABLE`] in ascending order and skips slots the heap did
//! not instantiate. The read-only space is never visited.

use std::iter::FusedIterator;

use heapline_core::{SpaceId, SpaceRegistry};

/// Cursor over the populated mutable spaces of a registry.
pub struct SpaceIterator<'h, R: SpaceRegistry + ?Sized> {
    registry: &'h R,
    cursor: usize,
}

impl<'h, R: SpaceRegistry + ?Sized> SpaceIterator<'h, R> {
    /// Start before the first mutable slot.
    pub fn new(registry: &'h R) -> Self {
        Self {
            registry,
            cursor: SpaceId::FIRST_MUTABLE.index(),
        }
    }

    /// Move the cursor to the next populated slot, if any.
    pub fn has_next(&mut self) -> bool {
        while self.cursor <= SpaceId::LAST_MUTABLE.index() {
            if self.current().is_some() {
                return true;
            }
            self.cursor += 1;
        }
        false
    }

    /// Return the slot found by [`has_next`](Self::has_next) and step past it.
    ///
    /// # Panics
    ///
    /// If the preceding `has_next` returned `false` or was not called.
    pub fn next_space(&mut self) -> &'h R::Space {
        let space = self
            .current()
            .expect("next_space called without a successful has_next");
        self.cursor += 1;
        space
    }

    fn current(&self) -> Option<&'h R::Space> {
        let registry: &'h R = self.registry;
        SpaceId::from_index(self.cursor).and_then(|id| registry.space(id))
    }
}

impl<'h, R: SpaceRegistry + ?Sized> Iterator for SpaceIterator<'h, R> {
    type Item = &'h R::Space;

    fn next(&mut self) -> Option<Self::Item> {
        if self.has_next() {
            Some(self.next_space())
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (SpaceId::LAST_MUTABLE.index() + 1).saturating_sub(self.cursor);
        (0, Some(left))
    }
}

impl<R: SpaceRegistry + ?Sized> FusedIterator for SpaceIterator<'_, R> {}

/// A fixed table with one optional slot per [`SpaceId`].
#[derive(Debug)]
pub struct SpaceTable<S> {
    slots: [Option<S>; SpaceId::COUNT],
}

impl<S> SpaceTable<S> {
    /// A table with every slot empty.
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }

    /// Put `space` in slot `id`, returning the previous occupant.
    pub fn insert(&mut self, id: SpaceId, space: S) -> Option<S> {
        self.slots[id.index()].replace(space)
    }

    /// Empty slot `id`.
    pub fn remove(&mut self, id: SpaceId) -> Option<S> {
        self.slots[id.index()].take()
    }

    /// The space in slot `id`.
    pub fn get(&self, id: SpaceId) -> Option<&S> {
        self.slots[id.index()].as_ref()
    }

    /// Mutable access to the space in slot `id`.
    pub fn get_mut(&mut self, id: SpaceId) -> Option<&mut S> {
        self.slots[id.index()].as_mut()
    }

    /// Iterate the populated mutable spaces.
    pub fn spaces(&self) -> SpaceIterator<'_, Self> {
        SpaceIterator::new(self)
    }
}

impl<S> Default for SpaceTable<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> SpaceRegistry for SpaceTable<S> {
    type Space = S;

    fn space(&self, id: SpaceId) -> Option<&S> {
        self.get(id)
    }
}
