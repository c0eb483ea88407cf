//! Slot storage with stable handles.
//!
//! Removed entries are threaded into a free list and their slots are reused
//! on a best effort basis by later insertions. Handles of unaffected entries
//! remain stable.

use std::marker::PhantomData;

/// Handle types addressing an [`Arena`].
pub(crate) trait ArenaIndex: Copy {
    fn from_index(index: usize) -> Self;
    fn index(self) -> usize;
}

#[derive(Debug, Clone, PartialEq)]
enum Entry<I, T> {
    /// No value is stored at this entry.
    /// Instead the entry contains the next index in the free list.
    Free(Option<I>),
    Occupied(T),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Arena<I, T> {
    entries: Vec<Entry<I, T>>,
    /// First free slot of the free list embedded in `entries`.
    free: Option<I>,
    len: usize,
    phantom: PhantomData<I>,
}

impl<I: ArenaIndex, T> Arena<I, T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            free: None,
            len: 0,
            phantom: PhantomData,
        }
    }

    pub fn insert(&mut self, value: T) -> I {
        self.len += 1;
        match self.free {
            Some(index) => {
                let slot = &mut self.entries[index.index()];
                let Entry::Free(next) = std::mem::replace(slot, Entry::Occupied(value)) else {
                    unreachable!("occupied entry on free list");
                };
                self.free = next;
                index
            }
            None => {
                let index = I::from_index(self.entries.len());
                self.entries.push(Entry::Occupied(value));
                index
            }
        }
    }

    pub fn remove(&mut self, index: I) -> Option<T> {
        let slot = self.entries.get_mut(index.index())?;
        if matches!(slot, Entry::Free(_)) {
            return None;
        }
        let Entry::Occupied(value) = std::mem::replace(slot, Entry::Free(self.free)) else {
            unreachable!();
        };
        self.free = Some(index);
        self.len -= 1;
        Some(value)
    }

    #[inline]
    pub fn get(&self, index: I) -> Option<&T> {
        match self.entries.get(index.index()) {
            Some(Entry::Occupied(value)) => Some(value),
            _ => None,
        }
    }

    #[inline]
    pub fn get_mut(&mut self, index: I) -> Option<&mut T> {
        match self.entries.get_mut(index.index()) {
            Some(Entry::Occupied(value)) => Some(value),
            _ => None,
        }
    }

    #[inline]
    pub fn contains(&self, index: I) -> bool {
        self.get(index).is_some()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Number of slots, occupied or free. Every handle indexes below this.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, entry)| match entry {
                Entry::Occupied(value) => Some((I::from_index(i), value)),
                Entry::Free(_) => None,
            })
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.free = None;
        self.len = 0;
    }
}

impl<I: ArenaIndex, T> Default for Arena<I, T> {
    fn default() -> Self {
        Self::new()
    }
}
