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
//! Link constraints expressed as contacts
//!
//! Cables and rods do not apply forces. Each step they inspect the distance
//! between their two particles and, when the constraint is violated, emit a
//! [`ParticleContact`] that the resolver then corrects like a collision.
//!
//! - [`ParticleCable`]: one-sided, resists stretching beyond `max_length`.
//! - [`ParticleRod`]: two-sided, holds an exact `length` within `tolerance`,
//!   never bounces.

use crate::particle::{ParticleContact, ParticleHandle, ParticleSet};
use glam::DVec2;
use tracing::trace;

/// Default slack allowed before a rod reports a violation, in metres
pub const DEFAULT_ROD_TOLERANCE: f64 = 1e-6;

/// Anything that produces contacts for the current step
pub trait ParticleContactGenerator: Send + Sync {
    /// Append up to `limit` contacts and return how many were written
    fn add_contact(
        &self,
        particles: &ParticleSet,
        contacts: &mut Vec<ParticleContact>,
        limit: usize,
    ) -> usize;
}

/// The pair of particles joined by a link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticleLink {
    /// Linked particles; contacts use the first as their first participant
    pub particles: [ParticleHandle; 2],
}

impl ParticleLink {
    /// Link two particles
    pub fn new(a: ParticleHandle, b: ParticleHandle) -> Self {
        ParticleLink { particles: [a, b] }
    }

    fn endpoints(&self, particles: &ParticleSet) -> Option<(DVec2, DVec2)> {
        let a = particles.get(self.particles[0])?;
        let b = particles.get(self.particles[1])?;
        Some((a.position, b.position))
    }

    /// Distance between the linked particles; `None` if either is gone
    pub fn current_length(&self, particles: &ParticleSet) -> Option<f64> {
        self.endpoints(particles).map(|(a, b)| (a - b).length())
    }

    fn contact(&self, normal: DVec2, penetration: f64, restitution: f64) -> ParticleContact {
        ParticleContact::new(
            self.particles[0],
            Some(self.particles[1]),
            normal,
            penetration,
            restitution,
        )
    }
}

/// Inextensible but slack-allowing cable
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleCable {
    /// The linked particles
    pub link: ParticleLink,
    /// Length beyond which the cable is taut
    pub max_length: f64,
    /// Bounciness when the cable snaps taut
    pub restitution: f64,
}

impl ParticleCable {
    /// Create a cable between `a` and `b`
    pub fn new(a: ParticleHandle, b: ParticleHandle, max_length: f64, restitution: f64) -> Self {
        ParticleCable {
            link: ParticleLink::new(a, b),
            max_length,
            restitution,
        }
    }
}

impl ParticleContactGenerator for ParticleCable {
    fn add_contact(
        &self,
        particles: &ParticleSet,
        contacts: &mut Vec<ParticleContact>,
        limit: usize,
    ) -> usize {
        if limit == 0 {
            return 0;
        }
        let Some((a, b)) = self.link.endpoints(particles) else {
            return 0;
        };

        let length = (b - a).length();
        if length < self.max_length {
            return 0;
        }
        let Some(normal) = (b - a).try_normalize() else {
            trace!("ParticleCable: coincident endpoints, no contact direction");
            return 0;
        };

        contacts.push(self.link.contact(normal, length - self.max_length, self.restitution));
        1
    }
}

/// Rigid rod of fixed length
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleRod {
    /// The linked particles
    pub link: ParticleLink,
    /// Length the rod maintains
    pub length: f64,
    /// Deviation from `length` that is still considered satisfied
    pub tolerance: f64,
}

impl ParticleRod {
    /// Create a rod between `a` and `b` using [`DEFAULT_ROD_TOLERANCE`]
    pub fn new(a: ParticleHandle, b: ParticleHandle, length: f64) -> Self {
        ParticleRod {
            link: ParticleLink::new(a, b),
            length,
            tolerance: DEFAULT_ROD_TOLERANCE,
        }
    }

    /// Builder-style tolerance setter
    ///
    /// # Panics
    ///
    /// Panics if tolerance is negative or NaN
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        assert!(tolerance >= 0.0, "Rod tolerance must be non-negative");
        self.tolerance = tolerance;
        self
    }
}

impl ParticleContactGenerator for ParticleRod {
    fn add_contact(
        &self,
        particles: &ParticleSet,
        contacts: &mut Vec<ParticleContact>,
        limit: usize,
    ) -> usize {
        if limit == 0 {
            return 0;
        }
        let Some((a, b)) = self.link.endpoints(particles) else {
            return 0;
        };

        let current = (b - a).length();
        if (current - self.length).abs() <= self.tolerance {
            return 0;
        }
        let Some(normal) = (b - a).try_normalize() else {
            trace!("ParticleRod: coincident endpoints, no contact direction");
            return 0;
        };

        let contact = if current > self.length {
            self.link.contact(normal, current - self.length, 0.0)
        } else {
            self.link.contact(-normal, self.length - current, 0.0)
        };
        contacts.push(contact);
        1
    }
}
