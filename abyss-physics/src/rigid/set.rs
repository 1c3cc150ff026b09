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
//! Body storage and handles

use crate::arena::{Arena, Index};
use crate::rigid::RigidBody;
use std::fmt;

/// Generational handle to a body in a [`BodySet`]
///
/// Handles stay valid until the body is removed. A handle to a removed body
/// never resolves, even after its slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(Index);

impl BodyHandle {
    /// Raw generational index
    pub fn index(&self) -> Index {
        self.0
    }
}

impl fmt::Display for BodyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Body({})", self.0)
    }
}

/// Owning storage for rigid bodies
#[derive(Debug, Clone, Default)]
pub struct BodySet {
    bodies: Arena<RigidBody>,
}

impl BodySet {
    /// Create an empty set
    pub fn new() -> Self {
        BodySet { bodies: Arena::new() }
    }

    /// Add a body and return its handle
    pub fn insert(&mut self, body: RigidBody) -> BodyHandle {
        BodyHandle(self.bodies.insert(body))
    }

    /// Remove a body; `None` if the handle is stale
    pub fn remove(&mut self, handle: BodyHandle) -> Option<RigidBody> {
        self.bodies.remove(handle.0)
    }

    /// Borrow a body
    pub fn get(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle.0)
    }

    /// Mutably borrow a body
    pub fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle.0)
    }

    /// Mutably borrow two distinct bodies at once
    pub fn get2_mut(
        &mut self,
        a: BodyHandle,
        b: BodyHandle,
    ) -> Option<(&mut RigidBody, &mut RigidBody)> {
        self.bodies.get2_mut(a.0, b.0)
    }

    /// Whether the handle refers to a live body
    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.bodies.contains(handle.0)
    }

    /// Number of live bodies
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.bodies.len() == 0
    }

    /// Iterate over live bodies
    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, &RigidBody)> {
        self.bodies.iter().map(|(i, b)| (BodyHandle(i), b))
    }

    /// Iterate mutably over live bodies
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (BodyHandle, &mut RigidBody)> {
        self.bodies.iter_mut().map(|(i, b)| (BodyHandle(i), b))
    }

    /// Clear accumulators and refresh derived data on every body
    pub fn start_frame(&mut self) {
        for body in self.bodies.values_mut() {
            body.clear_accumulators();
            body.calculate_derived_data();
        }
    }

    /// Integrate every body by `duration`
    pub fn integrate_all(&mut self, duration: f64) {
        #[cfg(feature = "parallel")]
        {
            use rayon::iter::ParallelIterator;
            self.bodies
                .par_values_mut()
                .for_each(|body| body.integrate(duration));
        }
        #[cfg(not(feature = "parallel"))]
        {
            for body in self.bodies.values_mut() {
                body.integrate(duration);
            }
        }
    }

    pub(crate) fn take(&mut self, handle: BodyHandle) -> Option<RigidBody> {
        self.bodies.take(handle.0)
    }

    pub(crate) fn restore(&mut self, handle: BodyHandle, body: RigidBody) {
        self.bodies.restore(handle.0, body);
    }
}
