// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Generational slot storage
//!
//! Bodies, particles and force generators are owned by slot arenas and
//! referenced through small `Copy` handles. Each slot carries a generation
//! counter that is bumped on removal, so a handle to a removed value never
//! resolves to whatever reuses its slot later.

use std::fmt;

/// Raw generational index shared by all handle types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Index {
    slot: u32,
    generation: u32,
}

impl Index {
    pub(crate) fn new(slot: u32, generation: u32) -> Self {
        Index { slot, generation }
    }

    /// Slot position inside the owning arena
    pub fn slot(&self) -> u32 {
        self.slot
    }

    /// Generation of the slot when this index was issued
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.slot, self.generation)
    }
}

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot arena with generation-checked access
///
/// Removal bumps the slot generation and pushes the slot on a free list.
/// `take`/`restore` lift a value out temporarily without freeing the slot,
/// which lets a caller hold `&mut` to one value while reading the others.
#[derive(Debug, Clone)]
pub(crate) struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Arena<T> {
    pub(crate) fn new() -> Self {
        Arena {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    pub(crate) fn insert(&mut self, value: T) -> Index {
        self.len += 1;
        if let Some(slot) = self.free.pop() {
            let entry = &mut self.slots[slot as usize];
            entry.value = Some(value);
            return Index::new(slot, entry.generation);
        }

        let slot = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        Index::new(slot, 0)
    }

    pub(crate) fn remove(&mut self, index: Index) -> Option<T> {
        let entry = self.slots.get_mut(index.slot as usize)?;
        if entry.generation != index.generation {
            return None;
        }
        let value = entry.value.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(index.slot);
        self.len -= 1;
        Some(value)
    }

    pub(crate) fn get(&self, index: Index) -> Option<&T> {
        self.slots
            .get(index.slot as usize)
            .filter(|entry| entry.generation == index.generation)
            .and_then(|entry| entry.value.as_ref())
    }

    pub(crate) fn get_mut(&mut self, index: Index) -> Option<&mut T> {
        self.slots
            .get_mut(index.slot as usize)
            .filter(|entry| entry.generation == index.generation)
            .and_then(|entry| entry.value.as_mut())
    }

    /// Mutable access to two distinct live values
    pub(crate) fn get2_mut(&mut self, a: Index, b: Index) -> Option<(&mut T, &mut T)> {
        if a.slot == b.slot {
            return None;
        }
        self.get(a)?;
        self.get(b)?;

        let (low, high, swapped) = if a.slot < b.slot {
            (a.slot as usize, b.slot as usize, false)
        } else {
            (b.slot as usize, a.slot as usize, true)
        };
        let (head, tail) = self.slots.split_at_mut(high);
        let first = head[low].value.as_mut()?;
        let second = tail[0].value.as_mut()?;
        if swapped {
            Some((second, first))
        } else {
            Some((first, second))
        }
    }

    pub(crate) fn contains(&self, index: Index) -> bool {
        self.get(index).is_some()
    }

    /// Lift a value out of its slot without freeing the slot
    pub(crate) fn take(&mut self, index: Index) -> Option<T> {
        self.slots
            .get_mut(index.slot as usize)
            .filter(|entry| entry.generation == index.generation)
            .and_then(|entry| entry.value.take())
    }

    /// Put back a value lifted with [`Arena::take`]
    pub(crate) fn restore(&mut self, index: Index, value: T) {
        let entry = &mut self.slots[index.slot as usize];
        debug_assert_eq!(entry.generation, index.generation);
        debug_assert!(entry.value.is_none());
        entry.value = Some(value);
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn clear(&mut self) {
        for (slot, entry) in self.slots.iter_mut().enumerate() {
            if entry.value.take().is_some() {
                entry.generation = entry.generation.wrapping_add(1);
                self.free.push(slot as u32);
            }
        }
        self.len = 0;
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (Index, &T)> {
        self.slots.iter().enumerate().filter_map(|(slot, entry)| {
            entry
                .value
                .as_ref()
                .map(|value| (Index::new(slot as u32, entry.generation), value))
        })
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (Index, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(slot, entry)| {
            let generation = entry.generation;
            entry
                .value
                .as_mut()
                .map(|value| (Index::new(slot as u32, generation), value))
        })
    }

    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots.iter_mut().filter_map(|entry| entry.value.as_mut())
    }

    #[cfg(feature = "parallel")]
    pub(crate) fn par_values_mut(&mut self) -> impl rayon::iter::ParallelIterator<Item = &mut T>
    where
        T: Send,
    {
        use rayon::prelude::*;
        self.slots
            .par_iter_mut()
            .filter_map(|entry| entry.value.as_mut())
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}
