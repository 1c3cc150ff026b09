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
//! Registry binding particle force generators to particles
//!
//! The registry owns the generators and an ordered list of
//! `(particle, generator)` registrations. [`ParticleForceRegistry::update_forces`]
//! walks that list once in insertion order, so every registered pair applies
//! its force exactly once per step and the result is reproducible.
//!
//! Registering the same pair twice applies the force twice; that is up to the
//! caller.

use crate::arena::{Arena, Index};
use crate::particle::forces::ParticleForceGenerator;
use crate::particle::{ParticleHandle, ParticleSet};
use std::fmt;
use tracing::{debug, warn};

/// Handle to a generator owned by a [`ParticleForceRegistry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticleGeneratorHandle(Index);

impl fmt::Display for ParticleGeneratorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParticleGenerator({})", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Registration {
    particle: ParticleHandle,
    generator: ParticleGeneratorHandle,
}

/// Ordered set of particle force registrations
pub struct ParticleForceRegistry {
    generators: Arena<Box<dyn ParticleForceGenerator>>,
    registrations: Vec<Registration>,
    /// Whether to log warnings for registrations whose handles went stale
    pub warn_on_stale_handles: bool,
}

impl ParticleForceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        ParticleForceRegistry {
            generators: Arena::new(),
            registrations: Vec::new(),
            warn_on_stale_handles: true,
        }
    }

    /// Take ownership of a generator
    pub fn insert_generator<G: ParticleForceGenerator + 'static>(
        &mut self,
        generator: G,
    ) -> ParticleGeneratorHandle {
        self.insert_boxed(Box::new(generator))
    }

    /// Take ownership of a boxed generator
    pub fn insert_boxed(
        &mut self,
        generator: Box<dyn ParticleForceGenerator>,
    ) -> ParticleGeneratorHandle {
        debug!("Inserting particle force generator '{}'", generator.name());
        ParticleGeneratorHandle(self.generators.insert(generator))
    }

    /// Drop a generator together with all of its registrations
    pub fn remove_generator(
        &mut self,
        generator: ParticleGeneratorHandle,
    ) -> Option<Box<dyn ParticleForceGenerator>> {
        let removed = self.generators.remove(generator.0)?;
        self.registrations.retain(|reg| reg.generator != generator);
        Some(removed)
    }

    /// Borrow a generator
    pub fn generator(
        &self,
        generator: ParticleGeneratorHandle,
    ) -> Option<&dyn ParticleForceGenerator> {
        self.generators.get(generator.0).map(|g| g.as_ref())
    }

    /// Borrow a generator as its concrete type
    pub fn generator_as<T: 'static>(&self, generator: ParticleGeneratorHandle) -> Option<&T> {
        self.generators
            .get(generator.0)
            .and_then(|g| g.as_any().downcast_ref::<T>())
    }

    /// Mutably borrow a generator as its concrete type, e.g. to retune it
    pub fn generator_as_mut<T: 'static>(
        &mut self,
        generator: ParticleGeneratorHandle,
    ) -> Option<&mut T> {
        self.generators
            .get_mut(generator.0)
            .and_then(|g| g.as_any_mut().downcast_mut::<T>())
    }

    /// Register `generator` to act on `particle`
    ///
    /// # Panics
    ///
    /// Panics if the generator handle does not belong to this registry
    pub fn add(&mut self, particle: ParticleHandle, generator: ParticleGeneratorHandle) {
        assert!(
            self.generators.contains(generator.0),
            "Force generator is not owned by this registry"
        );
        self.registrations.push(Registration { particle, generator });
    }

    /// Remove the first registration matching the pair
    ///
    /// Returns false if no such registration exists.
    pub fn remove(&mut self, particle: ParticleHandle, generator: ParticleGeneratorHandle) -> bool {
        let wanted = Registration { particle, generator };
        match self.registrations.iter().position(|reg| *reg == wanted) {
            Some(pos) => {
                self.registrations.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Remove every registration targeting `particle`
    pub fn remove_particle(&mut self, particle: ParticleHandle) -> usize {
        let before = self.registrations.len();
        self.registrations.retain(|reg| reg.particle != particle);
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
    pub fn registrations(
        &self,
    ) -> impl Iterator<Item = (ParticleHandle, ParticleGeneratorHandle)> + '_ {
        self.registrations.iter().map(|reg| (reg.particle, reg.generator))
    }

    /// Apply every registered generator once, in registration order
    ///
    /// Registrations whose particle no longer exists are skipped. If a
    /// generator leaves a non-finite value in the accumulator, its
    /// contribution is discarded.
    pub fn update_forces(&self, particles: &mut ParticleSet, duration: f64) {
        for reg in &self.registrations {
            let Some(generator) = self.generators.get(reg.generator.0) else {
                continue;
            };
            let Some(mut particle) = particles.take(reg.particle) else {
                if self.warn_on_stale_handles {
                    warn!(
                        "Skipping '{}': target {} is not in the particle set",
                        generator.name(),
                        reg.particle
                    );
                }
                continue;
            };

            let before = particle.accumulated_force();
            generator.update_force(&mut particle, particles, duration);
            if !particle.accumulated_force().is_finite() {
                warn!(
                    "Discarding non-finite force from '{}' on {}",
                    generator.name(),
                    reg.particle
                );
                particle.reset_accumulator(before);
            }

            particles.restore(reg.particle, particle);
        }
    }
}

impl Default for ParticleForceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ParticleForceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParticleForceRegistry")
            .field("generators", &self.generators.len())
            .field("registrations", &self.registrations.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::{Particle, ParticleDrag, ParticleSpring};
    use glam::DVec2;
    use std::any::Any;

    struct ConstantForce(DVec2);

    impl ParticleForceGenerator for ConstantForce {
        fn update_force(&self, particle: &mut Particle, _particles: &ParticleSet, _duration: f64) {
            particle.add_force(self.0);
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn test_update_applies_each_pair_once() {
        let mut particles = ParticleSet::new();
        let a = particles.insert(Particle::with_mass(DVec2::ZERO, 1.0));
        let b = particles.insert(Particle::with_mass(DVec2::ZERO, 1.0));

        let mut registry = ParticleForceRegistry::new();
        let push = registry.insert_generator(ConstantForce(DVec2::new(1.0, 0.0)));
        registry.add(a, push);
        registry.add(b, push);
        registry.add(b, push);

        registry.update_forces(&mut particles, 0.1);
        assert_eq!(particles.get(a).unwrap().accumulated_force(), DVec2::new(1.0, 0.0));
        // Duplicate registration double-applies
        assert_eq!(particles.get(b).unwrap().accumulated_force(), DVec2::new(2.0, 0.0));
    }

    #[test]
    fn test_remove_exact_pair() {
        let mut particles = ParticleSet::new();
        let a = particles.insert(Particle::with_mass(DVec2::ZERO, 1.0));
        let b = particles.insert(Particle::with_mass(DVec2::ZERO, 1.0));

        let mut registry = ParticleForceRegistry::new();
        let g = registry.insert_generator(ConstantForce(DVec2::X));
        registry.add(a, g);
        registry.add(b, g);

        assert!(registry.remove(b, g));
        assert!(!registry.remove(b, g));
        assert_eq!(registry.registration_count(), 1);
        assert_eq!(registry.registrations().next(), Some((a, g)));
    }

    #[test]
    fn test_clear_keeps_generators() {
        let mut particles = ParticleSet::new();
        let a = particles.insert(Particle::with_mass(DVec2::ZERO, 1.0));
        let mut registry = ParticleForceRegistry::new();
        let g = registry.insert_generator(ParticleDrag::new(1.0, 0.0));
        registry.add(a, g);
        registry.clear();
        assert_eq!(registry.registration_count(), 0);
        assert_eq!(registry.generator_count(), 1);
    }

    #[test]
    fn test_remove_generator_drops_registrations() {
        let mut particles = ParticleSet::new();
        let a = particles.insert(Particle::with_mass(DVec2::ZERO, 1.0));
        let mut registry = ParticleForceRegistry::new();
        let g = registry.insert_generator(ConstantForce(DVec2::X));
        registry.add(a, g);
        assert!(registry.remove_generator(g).is_some());
        assert_eq!(registry.registration_count(), 0);
        assert!(registry.generator(g).is_none());
    }

    #[test]
    fn test_stale_particle_is_skipped() {
        let mut particles = ParticleSet::new();
        let a = particles.insert(Particle::with_mass(DVec2::ZERO, 1.0));
        let mut registry = ParticleForceRegistry::new();
        registry.warn_on_stale_handles = false;
        let g = registry.insert_generator(ConstantForce(DVec2::X));
        registry.add(a, g);
        particles.remove(a);
        registry.update_forces(&mut particles, 0.1);
        assert!(particles.is_empty());
    }

    #[test]
    fn test_non_finite_force_is_discarded() {
        let mut particles = ParticleSet::new();
        let a = particles.insert(Particle::with_mass(DVec2::ZERO, 1.0));
        let mut registry = ParticleForceRegistry::new();
        let good = registry.insert_generator(ConstantForce(DVec2::X));
        let bad = registry.insert_generator(ConstantForce(DVec2::new(f64::NAN, 0.0)));
        registry.add(a, good);
        registry.add(a, bad);
        registry.update_forces(&mut particles, 0.1);
        assert_eq!(particles.get(a).unwrap().accumulated_force(), DVec2::X);
    }

    #[test]
    fn test_spring_reads_other_particle() {
        let mut particles = ParticleSet::new();
        let a = particles.insert(Particle::with_mass(DVec2::new(2.0, 0.0), 1.0));
        let b = particles.insert(Particle::with_mass(DVec2::ZERO, 1.0));
        let mut registry = ParticleForceRegistry::new();
        let spring = registry.insert_generator(ParticleSpring::new(b, 3.0, 1.0));
        registry.add(a, spring);
        registry.update_forces(&mut particles, 0.1);
        let f = particles.get(a).unwrap().accumulated_force();
        assert!((f - DVec2::new(-3.0, 0.0)).length() < 1e-12);

        registry
            .generator_as_mut::<ParticleSpring>(spring)
            .unwrap()
            .spring_constant = 6.0;
        particles.clear_accumulators();
        registry.update_forces(&mut particles, 0.1);
        let f = particles.get(a).unwrap().accumulated_force();
        assert!((f - DVec2::new(-6.0, 0.0)).length() < 1e-12);
    }

    #[test]
    #[should_panic(expected = "Force generator is not owned by this registry")]
    fn test_add_unknown_generator() {
        let mut particles = ParticleSet::new();
        let a = particles.insert(Particle::with_mass(DVec2::ZERO, 1.0));
        let mut registry = ParticleForceRegistry::new();
        let g = registry.insert_generator(ConstantForce(DVec2::X));
        registry.remove_generator(g);
        registry.add(a, g);
    }
}
