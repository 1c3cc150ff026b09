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
//! Particle force generators
//!
//! Each generator implements [`ParticleForceGenerator`] and adds its
//! contribution to a target particle's accumulator once per registered pair
//! per step. Generators only hold their own tuning parameters; a generator
//! that refers to another particle does so through a [`ParticleHandle`] and
//! reads it from the [`ParticleSet`] passed in by the registry.
//!
//! Directions are normalised with `try_normalize`. When the direction is
//! degenerate (zero length, NaN) the contribution is skipped for that step.

use crate::particle::{Particle, ParticleHandle, ParticleSet};
use glam::DVec2;
use std::any::Any;
use tracing::trace;

/// Trait for anything that can push on a particle
///
/// Implementations outside this crate (game-specific forces) plug in the same
/// way as the built-in laws below.
pub trait ParticleForceGenerator: Send + Sync {
    /// Add this generator's force to `particle` for the current step
    ///
    /// `particles` holds every other particle; the target itself has been
    /// lifted out of the set for the duration of the call.
    fn update_force(&self, particle: &mut Particle, particles: &ParticleSet, duration: f64);

    /// Get a descriptive name for logging
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Allow downcasting to the concrete generator type
    fn as_any(&self) -> &dyn Any;

    /// Allow mutable downcasting to the concrete generator type
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Linear plus quadratic drag opposing velocity
///
/// `F = -v̂ * (k1*|v| + k2*|v|²)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleDrag {
    /// Linear drag coefficient
    pub k1: f64,
    /// Quadratic drag coefficient
    pub k2: f64,
}

impl ParticleDrag {
    /// Create a drag generator
    pub fn new(k1: f64, k2: f64) -> Self {
        ParticleDrag { k1, k2 }
    }
}

impl ParticleForceGenerator for ParticleDrag {
    fn update_force(&self, particle: &mut Particle, _particles: &ParticleSet, _duration: f64) {
        let speed = particle.velocity.length();
        let Some(direction) = particle.velocity.try_normalize() else {
            return;
        };
        let drag = self.k1 * speed + self.k2 * speed * speed;
        particle.add_force(direction * -drag);
    }

    fn name(&self) -> &str {
        "ParticleDrag"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Hooke's-law force for a displacement `d` from the far end
///
/// Returns `None` when the direction is degenerate. With `slack` set, a
/// spring shorter than its rest length exerts nothing (bungee behaviour).
pub(crate) fn spring_force(
    d: DVec2,
    spring_constant: f64,
    rest_length: f64,
    slack: bool,
) -> Option<DVec2> {
    let length = d.length();
    if slack && length <= rest_length {
        return None;
    }
    let direction = d.try_normalize()?;
    let force = direction * -(spring_constant * (length - rest_length));
    if force.is_finite() {
        Some(force)
    } else {
        None
    }
}

/// Spring between the target and another particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleSpring {
    /// The particle at the other end
    pub other: ParticleHandle,
    /// Stiffness in N/m
    pub spring_constant: f64,
    /// Length at which the spring exerts no force
    pub rest_length: f64,
}

impl ParticleSpring {
    /// Create a spring to `other`
    pub fn new(other: ParticleHandle, spring_constant: f64, rest_length: f64) -> Self {
        ParticleSpring {
            other,
            spring_constant,
            rest_length,
        }
    }
}

impl ParticleForceGenerator for ParticleSpring {
    fn update_force(&self, particle: &mut Particle, particles: &ParticleSet, _duration: f64) {
        let Some(other) = particles.get(self.other) else {
            trace!("ParticleSpring: other end {} not available", self.other);
            return;
        };
        let d = particle.position - other.position;
        if let Some(force) = spring_force(d, self.spring_constant, self.rest_length, false) {
            particle.add_force(force);
        }
    }

    fn name(&self) -> &str {
        "ParticleSpring"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Spring between the target and a fixed world point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchoredParticleSpring {
    /// Fixed end of the spring
    pub anchor: DVec2,
    /// Stiffness in N/m
    pub spring_constant: f64,
    /// Length at which the spring exerts no force
    pub rest_length: f64,
}

impl AnchoredParticleSpring {
    /// Create a spring anchored at `anchor`
    pub fn new(anchor: DVec2, spring_constant: f64, rest_length: f64) -> Self {
        AnchoredParticleSpring {
            anchor,
            spring_constant,
            rest_length,
        }
    }
}

impl ParticleForceGenerator for AnchoredParticleSpring {
    fn update_force(&self, particle: &mut Particle, _particles: &ParticleSet, _duration: f64) {
        let d = particle.position - self.anchor;
        if let Some(force) = spring_force(d, self.spring_constant, self.rest_length, false) {
            particle.add_force(force);
        }
    }

    fn name(&self) -> &str {
        "AnchoredParticleSpring"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Spring to another particle that only pulls when stretched
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleBungee {
    /// The particle at the other end
    pub other: ParticleHandle,
    /// Stiffness in N/m
    pub spring_constant: f64,
    /// Length below which the bungee is slack
    pub rest_length: f64,
}

impl ParticleBungee {
    /// Create a bungee to `other`
    pub fn new(other: ParticleHandle, spring_constant: f64, rest_length: f64) -> Self {
        ParticleBungee {
            other,
            spring_constant,
            rest_length,
        }
    }
}

impl ParticleForceGenerator for ParticleBungee {
    fn update_force(&self, particle: &mut Particle, particles: &ParticleSet, _duration: f64) {
        let Some(other) = particles.get(self.other) else {
            trace!("ParticleBungee: other end {} not available", self.other);
            return;
        };
        let d = particle.position - other.position;
        if let Some(force) = spring_force(d, self.spring_constant, self.rest_length, true) {
            particle.add_force(force);
        }
    }

    fn name(&self) -> &str {
        "ParticleBungee"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Bungee to a fixed world point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchoredParticleBungee {
    /// Fixed end of the bungee
    pub anchor: DVec2,
    /// Stiffness in N/m
    pub spring_constant: f64,
    /// Length below which the bungee is slack
    pub rest_length: f64,
}

impl AnchoredParticleBungee {
    /// Create a bungee anchored at `anchor`
    pub fn new(anchor: DVec2, spring_constant: f64, rest_length: f64) -> Self {
        AnchoredParticleBungee {
            anchor,
            spring_constant,
            rest_length,
        }
    }
}

impl ParticleForceGenerator for AnchoredParticleBungee {
    fn update_force(&self, particle: &mut Particle, _particles: &ParticleSet, _duration: f64) {
        let d = particle.position - self.anchor;
        if let Some(force) = spring_force(d, self.spring_constant, self.rest_length, true) {
            particle.add_force(force);
        }
    }

    fn name(&self) -> &str {
        "AnchoredParticleBungee"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
