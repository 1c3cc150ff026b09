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
//! Point-mass physics
//!
//! A [`Particle`] has linear state only: position, velocity, a constant
//! acceleration field and a one-step force accumulator. Particles live in a
//! [`ParticleSet`] and are referenced by [`ParticleHandle`]s from force
//! generators, contacts and links.
//!
//! # Integration
//!
//! ```text
//! p' = p + v*dt
//! a  = a_const + F*inverse_mass
//! v' = (v + a*dt) * damping^dt
//! ```
//!
//! Damping is applied as `damping^dt` so the decay over a fixed span of time
//! does not depend on how that span is split into steps.

use crate::arena::{Arena, Index};
use glam::DVec2;
use std::fmt;

pub mod contact;
pub mod forces;
pub mod links;
pub mod registry;
pub mod world;

pub use contact::{ParticleContact, ParticleContactResolver};
pub use forces::{
    AnchoredParticleBungee, AnchoredParticleSpring, ParticleBungee, ParticleDrag,
    ParticleForceGenerator, ParticleSpring,
};
pub use links::{ParticleCable, ParticleContactGenerator, ParticleLink, ParticleRod};
pub use registry::{ParticleForceRegistry, ParticleGeneratorHandle};
pub use world::ParticleWorld;

/// A point mass with linear state
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// World-space position
    pub position: DVec2,
    /// Linear velocity
    pub velocity: DVec2,
    /// Constant acceleration field (e.g. gravity), zero by default
    pub acceleration: DVec2,
    damping: f64,
    inverse_mass: f64,
    force_accum: DVec2,
}

impl Particle {
    /// Create an immovable particle at `position`
    pub fn new(position: DVec2) -> Self {
        Particle {
            position,
            velocity: DVec2::ZERO,
            acceleration: DVec2::ZERO,
            damping: 1.0,
            inverse_mass: 0.0,
            force_accum: DVec2::ZERO,
        }
    }

    /// Create a particle with the given mass
    ///
    /// # Panics
    ///
    /// Panics if mass is non-positive, NaN, or infinite
    pub fn with_mass(position: DVec2, mass: f64) -> Self {
        let mut particle = Particle::new(position);
        particle.set_mass(mass);
        particle
    }

    /// Builder-style velocity setter
    pub fn with_velocity(mut self, velocity: DVec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// Builder-style damping setter
    pub fn with_damping(mut self, damping: f64) -> Self {
        self.set_damping(damping);
        self
    }

    /// Builder-style constant acceleration setter
    pub fn with_acceleration(mut self, acceleration: DVec2) -> Self {
        self.acceleration = acceleration;
        self
    }

    /// Set the mass, stored as its reciprocal
    ///
    /// # Panics
    ///
    /// Panics if mass is non-positive, NaN, or infinite
    pub fn set_mass(&mut self, mass: f64) {
        assert!(mass > 0.0 && mass.is_finite(), "Mass must be positive and finite");
        self.inverse_mass = 1.0 / mass;
    }

    /// Set the inverse mass directly; zero makes the particle immovable
    ///
    /// # Panics
    ///
    /// Panics if inverse mass is negative, NaN, or infinite
    pub fn set_inverse_mass(&mut self, inverse_mass: f64) {
        assert!(
            inverse_mass >= 0.0 && inverse_mass.is_finite(),
            "Inverse mass must be non-negative and finite"
        );
        self.inverse_mass = inverse_mass;
    }

    /// Set the damping factor
    ///
    /// # Panics
    ///
    /// Panics if damping is outside `(0, 1]`
    pub fn set_damping(&mut self, damping: f64) {
        assert!(damping > 0.0 && damping <= 1.0, "Damping must be in (0, 1]");
        self.damping = damping;
    }

    /// Fraction of velocity retained per second
    pub fn damping(&self) -> f64 {
        self.damping
    }

    /// Reciprocal of the mass; zero for immovable particles
    pub fn inverse_mass(&self) -> f64 {
        self.inverse_mass
    }

    /// Mass in kilograms; infinite for immovable particles
    pub fn mass(&self) -> f64 {
        if self.inverse_mass == 0.0 {
            f64::INFINITY
        } else {
            1.0 / self.inverse_mass
        }
    }

    /// Whether the particle responds to forces
    pub fn has_finite_mass(&self) -> bool {
        self.inverse_mass > 0.0
    }

    /// Force accumulated since the last clear
    pub fn accumulated_force(&self) -> DVec2 {
        self.force_accum
    }

    /// Add a force for the current step
    pub fn add_force(&mut self, force: DVec2) {
        self.force_accum += force;
    }

    /// Zero the force accumulator
    pub fn clear_accumulator(&mut self) {
        self.force_accum = DVec2::ZERO;
    }

    pub(crate) fn reset_accumulator(&mut self, force: DVec2) {
        self.force_accum = force;
    }

    /// Advance the particle by `duration` seconds
    ///
    /// Immovable particles are left untouched.
    ///
    /// # Panics
    ///
    /// Panics if duration is non-positive, NaN, or infinite
    pub fn integrate(&mut self, duration: f64) {
        assert!(
            duration > 0.0 && duration.is_finite(),
            "Timestep must be positive and finite"
        );
        if self.inverse_mass <= 0.0 {
            return;
        }

        self.position += self.velocity * duration;

        let resulting_acc = self.acceleration + self.force_accum * self.inverse_mass;
        self.velocity += resulting_acc * duration;
        self.velocity *= self.damping.powf(duration);
    }

    /// Kinetic energy, zero for immovable particles
    pub fn kinetic_energy(&self) -> f64 {
        if self.inverse_mass <= 0.0 {
            return 0.0;
        }
        0.5 * self.velocity.length_squared() / self.inverse_mass
    }
}

/// Generational handle to a particle in a [`ParticleSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticleHandle(Index);

impl ParticleHandle {
    /// Raw generational index
    pub fn index(&self) -> Index {
        self.0
    }
}

impl fmt::Display for ParticleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Particle({})", self.0)
    }
}

/// Owning storage for particles
#[derive(Debug, Clone, Default)]
pub struct ParticleSet {
    particles: Arena<Particle>,
}

impl ParticleSet {
    /// Create an empty set
    pub fn new() -> Self {
        ParticleSet {
            particles: Arena::new(),
        }
    }

    /// Add a particle and return its handle
    pub fn insert(&mut self, particle: Particle) -> ParticleHandle {
        ParticleHandle(self.particles.insert(particle))
    }

    /// Remove a particle; `None` if the handle is stale
    pub fn remove(&mut self, handle: ParticleHandle) -> Option<Particle> {
        self.particles.remove(handle.0)
    }

    /// Borrow a particle
    pub fn get(&self, handle: ParticleHandle) -> Option<&Particle> {
        self.particles.get(handle.0)
    }

    /// Mutably borrow a particle
    pub fn get_mut(&mut self, handle: ParticleHandle) -> Option<&mut Particle> {
        self.particles.get_mut(handle.0)
    }

    /// Mutably borrow two distinct particles at once
    pub fn get2_mut(
        &mut self,
        a: ParticleHandle,
        b: ParticleHandle,
    ) -> Option<(&mut Particle, &mut Particle)> {
        self.particles.get2_mut(a.0, b.0)
    }

    /// Whether the handle refers to a live particle
    pub fn contains(&self, handle: ParticleHandle) -> bool {
        self.particles.contains(handle.0)
    }

    /// Number of live particles
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.particles.len() == 0
    }

    /// Remove every particle, invalidating all handles
    pub fn clear(&mut self) {
        self.particles.clear();
    }

    /// Iterate over live particles
    pub fn iter(&self) -> impl Iterator<Item = (ParticleHandle, &Particle)> {
        self.particles.iter().map(|(i, p)| (ParticleHandle(i), p))
    }

    /// Iterate mutably over live particles
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ParticleHandle, &mut Particle)> {
        self.particles.iter_mut().map(|(i, p)| (ParticleHandle(i), p))
    }

    /// Zero every force accumulator
    pub fn clear_accumulators(&mut self) {
        for particle in self.particles.values_mut() {
            particle.clear_accumulator();
        }
    }

    /// Integrate every particle by `duration`
    pub fn integrate_all(&mut self, duration: f64) {
        #[cfg(feature = "parallel")]
        {
            use rayon::iter::ParallelIterator;
            self.particles
                .par_values_mut()
                .for_each(|particle| particle.integrate(duration));
        }
        #[cfg(not(feature = "parallel"))]
        {
            for particle in self.particles.values_mut() {
                particle.integrate(duration);
            }
        }
    }

    pub(crate) fn take(&mut self, handle: ParticleHandle) -> Option<Particle> {
        self.particles.take(handle.0)
    }

    pub(crate) fn restore(&mut self, handle: ParticleHandle, particle: Particle) {
        self.particles.restore(handle.0, particle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_particle_defaults_to_immovable() {
        let p = Particle::new(DVec2::ZERO);
        assert_eq!(p.inverse_mass(), 0.0);
        assert!(!p.has_finite_mass());
        assert!(p.mass().is_infinite());
    }

    #[test]
    fn test_add_force_accumulates() {
        let mut p = Particle::with_mass(DVec2::ZERO, 2.0);
        p.add_force(DVec2::new(1.0, 0.0));
        p.add_force(DVec2::new(0.0, 3.0));
        assert_eq!(p.accumulated_force(), DVec2::new(1.0, 3.0));
        p.clear_accumulator();
        assert_eq!(p.accumulated_force(), DVec2::ZERO);
    }

    #[test]
    fn test_integrate_order() {
        // Position uses the velocity from before this step's acceleration
        let mut p = Particle::with_mass(DVec2::ZERO, 1.0).with_velocity(DVec2::new(1.0, 0.0));
        p.add_force(DVec2::new(2.0, 0.0));
        p.integrate(0.5);
        assert!((p.position.x - 0.5).abs() < 1e-12);
        assert!((p.velocity.x - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_integrate_uses_constant_acceleration() {
        let mut p = Particle::with_mass(DVec2::ZERO, 1.0).with_acceleration(DVec2::new(0.0, -10.0));
        p.integrate(0.1);
        assert!((p.velocity.y + 1.0).abs() < 1e-12);
    }

    #[test]
    #[should_panic(expected = "Timestep must be positive and finite")]
    fn test_integrate_zero_timestep() {
        let mut p = Particle::with_mass(DVec2::ZERO, 1.0);
        p.integrate(0.0);
    }

    #[test]
    #[should_panic(expected = "Mass must be positive and finite")]
    fn test_zero_mass() {
        Particle::with_mass(DVec2::ZERO, 0.0);
    }

    #[test]
    #[should_panic(expected = "Damping must be in (0, 1]")]
    fn test_invalid_damping() {
        Particle::new(DVec2::ZERO).with_damping(1.5);
    }

    #[test]
    #[should_panic(expected = "Damping must be in (0, 1]")]
    fn test_zero_damping_rejected() {
        let mut p = Particle::with_mass(DVec2::ZERO, 1.0).with_damping(0.5);
        assert_eq!(p.damping(), 0.5);
        p.set_damping(0.0);
    }

    #[test]
    fn test_set_stale_handle() {
        let mut set = ParticleSet::new();
        let h = set.insert(Particle::new(DVec2::ZERO));
        assert!(set.remove(h).is_some());
        assert!(set.get(h).is_none());
        assert!(set.remove(h).is_none());
        assert!(set.is_empty());
    }

    #[test]
    fn test_set_integrate_all() {
        let mut set = ParticleSet::new();
        let moving = set.insert(Particle::with_mass(DVec2::ZERO, 1.0).with_velocity(DVec2::X));
        let fixed = set.insert(Particle::new(DVec2::ZERO).with_velocity(DVec2::X));
        set.integrate_all(1.0);
        assert_eq!(set.get(moving).unwrap().position, DVec2::X);
        assert_eq!(set.get(fixed).unwrap().position, DVec2::ZERO);
    }
}
