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
//! Particle simulation driver
//!
//! A frame is `start_frame` followed by `run_physics(dt)`:
//!
//! 1. registered forces are applied
//! 2. every particle is integrated
//! 3. contact generators fill the contact buffer, up to the configured capacity
//! 4. the resolver corrects the generated contacts

use crate::config::ParticleWorldConfig;
use crate::particle::{
    Particle, ParticleContact, ParticleContactGenerator, ParticleContactResolver,
    ParticleForceRegistry, ParticleHandle, ParticleSet,
};
use std::fmt;
use tracing::{debug, warn};

/// Particles, their force registrations and their contact generators
pub struct ParticleWorld {
    particles: ParticleSet,
    registry: ParticleForceRegistry,
    contact_generators: Vec<Box<dyn ParticleContactGenerator>>,
    resolver: ParticleContactResolver,
    contacts: Vec<ParticleContact>,
    config: ParticleWorldConfig,
}

impl ParticleWorld {
    /// Create an empty world with default configuration
    pub fn new() -> Self {
        Self::with_config(ParticleWorldConfig::default())
    }

    /// Create an empty world
    pub fn with_config(config: ParticleWorldConfig) -> Self {
        let mut registry = ParticleForceRegistry::new();
        registry.warn_on_stale_handles = config.warn_on_stale_handles;
        ParticleWorld {
            particles: ParticleSet::new(),
            registry,
            contact_generators: Vec::new(),
            resolver: ParticleContactResolver::new(config.iterations_for(0)),
            contacts: Vec::with_capacity(config.max_contacts),
            config,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &ParticleWorldConfig {
        &self.config
    }

    /// Add a particle
    pub fn add_particle(&mut self, particle: Particle) -> ParticleHandle {
        let handle = self.particles.insert(particle);
        debug!("Added {}", handle);
        handle
    }

    /// Remove a particle and every force registration targeting it
    pub fn remove_particle(&mut self, handle: ParticleHandle) -> Option<Particle> {
        let removed = self.particles.remove(handle)?;
        let purged = self.registry.remove_particle(handle);
        debug!("Removed {} and {} registrations", handle, purged);
        Some(removed)
    }

    /// Borrow a particle
    pub fn particle(&self, handle: ParticleHandle) -> Option<&Particle> {
        self.particles.get(handle)
    }

    /// Mutably borrow a particle
    pub fn particle_mut(&mut self, handle: ParticleHandle) -> Option<&mut Particle> {
        self.particles.get_mut(handle)
    }

    /// All particles
    pub fn particles(&self) -> &ParticleSet {
        &self.particles
    }

    /// All particles, mutably
    pub fn particles_mut(&mut self) -> &mut ParticleSet {
        &mut self.particles
    }

    /// The force registry
    pub fn force_registry(&self) -> &ParticleForceRegistry {
        &self.registry
    }

    /// The force registry, mutably
    pub fn force_registry_mut(&mut self) -> &mut ParticleForceRegistry {
        &mut self.registry
    }

    /// Add a contact generator; generators run in insertion order
    pub fn add_contact_generator<G: ParticleContactGenerator + 'static>(&mut self, generator: G) {
        self.contact_generators.push(Box::new(generator));
    }

    /// Number of contact generators
    pub fn contact_generator_count(&self) -> usize {
        self.contact_generators.len()
    }

    /// Contacts generated during the last frame, after resolution
    pub fn contacts(&self) -> &[ParticleContact] {
        &self.contacts
    }

    /// The contact resolver
    pub fn resolver(&self) -> &ParticleContactResolver {
        &self.resolver
    }

    /// Clear every force accumulator
    pub fn start_frame(&mut self) {
        self.particles.clear_accumulators();
    }

    /// Fill the contact buffer from the generators; returns the count
    pub fn generate_contacts(&mut self) -> usize {
        self.contacts.clear();
        let mut remaining = self.config.max_contacts;

        for generator in &self.contact_generators {
            if remaining == 0 {
                warn!(
                    "Contact capacity of {} exhausted; remaining generators skipped this frame",
                    self.config.max_contacts
                );
                break;
            }
            let used = generator.add_contact(&self.particles, &mut self.contacts, remaining);
            remaining -= used.min(remaining);
        }

        self.contacts.len()
    }

    /// Apply forces, integrate, then generate and resolve contacts
    ///
    /// # Panics
    ///
    /// Panics if duration is non-positive, NaN, or infinite
    pub fn run_physics(&mut self, duration: f64) {
        assert!(
            duration > 0.0 && duration.is_finite(),
            "Timestep must be positive and finite"
        );

        self.registry.update_forces(&mut self.particles, duration);
        self.particles.integrate_all(duration);

        let used = self.generate_contacts();
        if used > 0 {
            self.resolver.set_iterations(self.config.iterations_for(used));
            self.resolver
                .resolve_contacts(&mut self.contacts, &mut self.particles, duration);
        }
    }

    /// `start_frame` followed by `run_physics`
    pub fn step(&mut self, duration: f64) {
        self.start_frame();
        self.run_physics(duration);
    }
}

impl Default for ParticleWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ParticleWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParticleWorld")
            .field("particles", &self.particles.len())
            .field("registry", &self.registry)
            .field("contact_generators", &self.contact_generators.len())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::{ParticleCable, ParticleRod};
    use glam::DVec2;

    #[test]
    fn test_step_integrates_particles() {
        let mut world = ParticleWorld::new();
        let p = world.add_particle(Particle::with_mass(DVec2::ZERO, 1.0).with_velocity(DVec2::X));
        world.step(0.5);
        assert!((world.particle(p).unwrap().position.x - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_contact_capacity_is_respected() {
        let mut world = ParticleWorld::with_config(ParticleWorldConfig::new(1));
        let a = world.add_particle(Particle::with_mass(DVec2::ZERO, 1.0));
        let b = world.add_particle(Particle::with_mass(DVec2::new(3.0, 0.0), 1.0));
        let c = world.add_particle(Particle::with_mass(DVec2::new(0.0, 3.0), 1.0));
        world.add_contact_generator(ParticleCable::new(a, b, 1.0, 0.0));
        world.add_contact_generator(ParticleCable::new(a, c, 1.0, 0.0));

        assert_eq!(world.generate_contacts(), 1);
        assert_eq!(world.contacts()[0].second, Some(b));
    }

    #[test]
    fn test_rod_is_enforced_each_step() {
        let mut world = ParticleWorld::new();
        let anchor = world.add_particle(Particle::new(DVec2::ZERO));
        let bob = world.add_particle(
            Particle::with_mass(DVec2::new(1.0, 0.0), 1.0)
                .with_acceleration(DVec2::new(0.0, -10.0)),
        );
        world.add_contact_generator(ParticleRod::new(anchor, bob, 1.0));

        for _ in 0..200 {
            world.step(0.01);
            let length = world.particle(bob).unwrap().position.length();
            assert!((length - 1.0).abs() < 1e-6);
        }
        assert_eq!(world.particle(anchor).unwrap().position, DVec2::ZERO);
    }

    #[test]
    fn test_remove_particle_purges_registrations() {
        let mut world = ParticleWorld::new();
        let p = world.add_particle(Particle::with_mass(DVec2::ZERO, 1.0));
        let g = world
            .force_registry_mut()
            .insert_generator(crate::particle::ParticleDrag::new(1.0, 1.0));
        world.force_registry_mut().add(p, g);
        assert!(world.remove_particle(p).is_some());
        assert_eq!(world.force_registry().registration_count(), 0);
        assert!(world.remove_particle(p).is_none());
    }

    #[test]
    #[should_panic(expected = "Timestep must be positive and finite")]
    fn test_negative_timestep() {
        ParticleWorld::new().run_physics(-0.1);
    }
}
