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
//! Registry binding rigid-body force generators to bodies
//!
//! Mirrors [`ParticleForceRegistry`](crate::particle::ParticleForceRegistry):
//! generators are owned by the registry, registrations are applied once each
//! in insertion order, and a registration whose body is gone is skipped.

use crate::arena::{Arena, Index};
use crate::rigid::forces::ForceGenerator;
use crate::rigid::{BodyHandle, BodySet};
use std::fmt;
use tracing::{debug, warn};

/// Handle to a generator owned by a [`ForceRegistry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeneratorHandle(Index);

impl fmt::Display for GeneratorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Generator({})", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Registration {
    body: BodyHandle,
    generator: GeneratorHandle,
}

/// Ordered set of rigid-body force registrations
pub struct ForceRegistry {
    generators: Arena<Box<dyn ForceGenerator>>,
    registrations: Vec<Registration>,
    /// Whether to log warnings for registrations whose body went stale
    pub warn_on_stale_handles: bool,
}

impl ForceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        ForceRegistry {
            generators: Arena::new(),
            registrations: Vec::new(),
            warn_on_stale_handles: true,
        }
    }

    /// Take ownership of a generator
    pub fn insert_generator<G: ForceGenerator + 'static>(
        &mut self,
        generator: G,
    ) -> GeneratorHandle {
        self.insert_boxed(Box::new(generator))
    }

    /// Take ownership of a boxed generator
    pub fn insert_boxed(&mut self, generator: Box<dyn ForceGenerator>) -> GeneratorHandle {
        debug!("Inserting force generator '{}'", generator.name());
        GeneratorHandle(self.generators.insert(generator))
    }

    /// Drop a generator together with all of its registrations
    pub fn remove_generator(
        &mut self,
        generator: GeneratorHandle,
    ) -> Option<Box<dyn ForceGenerator>> {
        let removed = self.generators.remove(generator.0)?;
        self.registrations.retain(|reg| reg.generator != generator);
        debug!("Removed force generator '{}'", removed.name());
        Some(removed)
    }

    /// Borrow a generator
    pub fn generator(&self, generator: GeneratorHandle) -> Option<&dyn ForceGenerator> {
        self.generators.get(generator.0).map(|g| g.as_ref())
    }

    /// Borrow a generator as its concrete type
    pub fn generator_as<T: 'static>(&self, generator: GeneratorHandle) -> Option<&T> {
        self.generators
            .get(generator.0)
            .and_then(|g| g.as_any().downcast_ref::<T>())
    }

    /// Mutably borrow a generator as its concrete type, e.g. to retune it
    pub fn generator_as_mut<T: 'static>(&mut self, generator: GeneratorHandle) -> Option<&mut T> {
        self.generators
            .get_mut(generator.0)
            .and_then(|g| g.as_any_mut().downcast_mut::<T>())
    }

    /// Register `generator` to act on `body`
    ///
    /// # Panics
    ///
    /// Panics if the generator handle does not belong to this registry
    pub fn add(&mut self, body: BodyHandle, generator: GeneratorHandle) {
        assert!(
            self.generators.contains(generator.0),
            "Force generator is not owned by this registry"
        );
        self.registrations.push(Registration { body, generator });
    }

    /// Remove the first registration matching the pair
    ///
    /// Returns false if no such registration exists.
    pub fn remove(&mut self, body: BodyHandle, generator: GeneratorHandle) -> bool {
        let wanted = Registration { body, generator };
        match self.registrations.iter().position(|reg| *reg == wanted) {
            Some(pos) => {
                self.registrations.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Remove every registration targeting `body`
    pub fn remove_body(&mut self, body: BodyHandle) -> usize {
        let before = self.registrations.len();
        self.registrations.retain(|reg| reg.body != body);
        before - self.registrations.len()
    }

    /// Remove all registrations; generators stay owned by the registry
    pub fn clear(&mut self) {
        self.registrations.clear();
    }

    /// Number of registrations
    pub fn registration_count(&self) -> usize {
        self.registrations.len()
    }

    /// Number of owned generators
    pub fn generator_count(&self) -> usize {
        self.generators.len()
    }

    /// Iterate over registrations in application order
    pub fn registrations(&self) -> impl Iterator<Item = (BodyHandle, GeneratorHandle)> + '_ {
        self.registrations.iter().map(|reg| (reg.body, reg.generator))
    }

    /// Apply every registered generator once, in registration order
    ///
    /// Registrations whose body no longer exists are skipped. If a generator
    /// leaves a non-finite force or torque, its contribution is discarded.
    pub fn update_forces(&self, bodies: &mut BodySet, duration: f64) {
        for reg in &self.registrations {
            let Some(generator) = self.generators.get(reg.generator.0) else {
                continue;
            };
            let Some(mut body) = bodies.take(reg.body) else {
                if self.warn_on_stale_handles {
                    warn!(
                        "Skipping '{}': target {} is not in the world",
                        generator.name(),
                        reg.body
                    );
                }
                continue;
            };

            let force = body.accumulated_force();
            let torque = body.accumulated_torque();
            generator.update_force(&mut body, bodies, duration);
            if !body.accumulated_force().is_finite() || !body.accumulated_torque().is_finite() {
                warn!(
                    "Discarding non-finite force from '{}' on {}",
                    generator.name(),
                    reg.body
                );
                body.reset_accumulators(force, torque);
            }

            bodies.restore(reg.body, body);
        }
    }
}

impl Default for ForceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ForceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForceRegistry")
            .field("generators", &self.generators.len())
            .field("registrations", &self.registrations.len())
            .finish()
    }
}
