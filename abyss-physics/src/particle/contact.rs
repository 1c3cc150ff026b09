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
//! Impulse-based particle contact resolution
//!
//! A [`ParticleContact`] describes one pairwise contact (or a contact with
//! immovable scenery when the second participant is absent). Resolving a
//! contact runs two passes in order:
//!
//! 1. **Velocity**: if the participants approach along the normal, apply an
//!    impulse so the separating velocity becomes `-restitution * v_sep`,
//!    minus the part of the approach that this step's constant acceleration
//!    produced. That correction keeps resting contacts from jittering under
//!    gravity-like fields.
//! 2. **Interpenetration**: if the participants overlap, move both positions
//!    along the normal in proportion to their inverse masses. Velocities are
//!    not touched in this pass.
//!
//! The normal is expressed from the first participant's point of view: the
//! first particle is pushed along `+normal`, the second along `-normal`.
//!
//! [`ParticleContactResolver`] resolves a batch greedily: each iteration picks
//! the contact with the most negative separating velocity, resolves it, and
//! repeats until nothing approaches or overlaps or the iteration cap is hit.
//! A contact that still overlaps is eligible even while separating, otherwise
//! its positional correction would never run. A contact where neither
//! participant can move is skipped, since resolving it changes nothing. The
//! cap bounds work per frame; it does not change what a converged result is.

use crate::particle::{Particle, ParticleHandle, ParticleSet};
use glam::DVec2;
use tracing::debug;

/// A single particle contact for the current step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleContact {
    /// First participant; always present
    pub first: ParticleHandle,
    /// Second participant; `None` for contact with immovable scenery
    pub second: Option<ParticleHandle>,
    /// Unit contact normal from the first participant's point of view
    pub contact_normal: DVec2,
    /// Overlap along the normal; values `<= 0` mean no actual penetration
    pub penetration: f64,
    /// Coefficient of restitution in `[0, 1]`
    pub restitution: f64,
}

impl ParticleContact {
    /// Create a contact
    pub fn new(
        first: ParticleHandle,
        second: Option<ParticleHandle>,
        contact_normal: DVec2,
        penetration: f64,
        restitution: f64,
    ) -> Self {
        ParticleContact {
            first,
            second,
            contact_normal,
            penetration,
            restitution,
        }
    }

    /// Relative velocity projected on the normal; negative means approaching
    ///
    /// A contact whose participants are no longer in the set reports zero.
    pub fn separating_velocity(&self, particles: &ParticleSet) -> f64 {
        let Some(first) = particles.get(self.first) else {
            return 0.0;
        };
        let mut relative = first.velocity;
        if let Some(second) = self.second {
            match particles.get(second) {
                Some(second) => relative -= second.velocity,
                None => return 0.0,
            }
        }
        relative.dot(self.contact_normal)
    }

    /// Combined inverse mass of the participants
    ///
    /// Zero when neither can move or a participant is no longer in the set;
    /// such a contact cannot be resolved.
    pub fn total_inverse_mass(&self, particles: &ParticleSet) -> f64 {
        let Some(first) = particles.get(self.first) else {
            return 0.0;
        };
        match self.second {
            Some(second) => particles
                .get(second)
                .map_or(0.0, |second| first.inverse_mass() + second.inverse_mass()),
            None => first.inverse_mass(),
        }
    }

    /// Resolve velocity, then interpenetration
    pub fn resolve(&self, particles: &mut ParticleSet, duration: f64) {
        self.resolve_tracked(particles, duration);
    }

    /// Resolve and report how far each participant moved
    pub(crate) fn resolve_tracked(&self, particles: &mut ParticleSet, duration: f64) -> [DVec2; 2] {
        let Some((first, mut second)) = self.participants(particles) else {
            return [DVec2::ZERO; 2];
        };
        self.resolve_velocity(first, second.as_deref_mut(), duration);
        self.resolve_interpenetration(first, second)
    }

    fn participants<'a>(
        &self,
        particles: &'a mut ParticleSet,
    ) -> Option<(&'a mut Particle, Option<&'a mut Particle>)> {
        match self.second {
            Some(second) => {
                let (a, b) = particles.get2_mut(self.first, second)?;
                Some((a, Some(b)))
            }
            None => particles.get_mut(self.first).map(|a| (a, None)),
        }
    }

    fn resolve_velocity(&self, first: &mut Particle, second: Option<&mut Particle>, duration: f64) {
        let mut relative = first.velocity;
        if let Some(second) = second.as_deref() {
            relative -= second.velocity;
        }
        let separating = relative.dot(self.contact_normal);
        if separating > 0.0 {
            return;
        }

        let mut new_separating = -separating * self.restitution;

        // Remove the approach built up by constant acceleration this step
        let mut acc_caused = first.acceleration;
        if let Some(second) = second.as_deref() {
            acc_caused -= second.acceleration;
        }
        let acc_caused_separating = acc_caused.dot(self.contact_normal) * duration;
        if acc_caused_separating < 0.0 {
            new_separating += self.restitution * acc_caused_separating;
            if new_separating < 0.0 {
                new_separating = 0.0;
            }
        }

        let delta_velocity = new_separating - separating;

        let total_inverse_mass =
            first.inverse_mass() + second.as_deref().map_or(0.0, Particle::inverse_mass);
        if total_inverse_mass <= 0.0 {
            return;
        }

        let impulse_per_inverse_mass = self.contact_normal * (delta_velocity / total_inverse_mass);
        first.velocity += impulse_per_inverse_mass * first.inverse_mass();
        if let Some(second) = second {
            second.velocity -= impulse_per_inverse_mass * second.inverse_mass();
        }
    }

    fn resolve_interpenetration(
        &self,
        first: &mut Particle,
        second: Option<&mut Particle>,
    ) -> [DVec2; 2] {
        if self.penetration <= 0.0 {
            return [DVec2::ZERO; 2];
        }

        let total_inverse_mass =
            first.inverse_mass() + second.as_deref().map_or(0.0, Particle::inverse_mass);
        if total_inverse_mass <= 0.0 {
            return [DVec2::ZERO; 2];
        }

        let move_per_inverse_mass = self.contact_normal * (self.penetration / total_inverse_mass);

        let first_move = move_per_inverse_mass * first.inverse_mass();
        first.position += first_move;

        let second_move = match second {
            Some(second) => {
                let m = move_per_inverse_mass * -second.inverse_mass();
                second.position += m;
                m
            }
            None => DVec2::ZERO,
        };

        [first_move, second_move]
    }
}

/// Iterative worst-first contact resolver
#[derive(Debug, Clone)]
pub struct ParticleContactResolver {
    iterations: usize,
    iterations_used: usize,
}

impl ParticleContactResolver {
    /// Create a resolver that performs at most `iterations` resolutions per call
    pub fn new(iterations: usize) -> Self {
        ParticleContactResolver {
            iterations,
            iterations_used: 0,
        }
    }

    /// Change the iteration cap
    pub fn set_iterations(&mut self, iterations: usize) {
        self.iterations = iterations;
    }

    /// Current iteration cap
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Number of contacts resolved by the last call
    pub fn iterations_used(&self) -> usize {
        self.iterations_used
    }

    /// Resolve a batch of contacts
    ///
    /// Each iteration resolves only the contact with the most negative
    /// separating velocity among those approaching or overlapping. Contacts
    /// with no movable participant are never candidates.
    /// Penetrations of the other contacts are updated for the positional
    /// corrections just made, so a particle shared by several contacts is not
    /// pushed twice for the same overlap.
    pub fn resolve_contacts(
        &mut self,
        contacts: &mut [ParticleContact],
        particles: &mut ParticleSet,
        duration: f64,
    ) {
        self.iterations_used = 0;

        while self.iterations_used < self.iterations {
            let mut worst = f64::MAX;
            let mut worst_index = None;
            for (i, contact) in contacts.iter().enumerate() {
                let separating = contact.separating_velocity(particles);
                if separating < worst
                    && (separating < 0.0 || contact.penetration > 0.0)
                    && contact.total_inverse_mass(particles) > 0.0
                {
                    worst = separating;
                    worst_index = Some(i);
                }
            }

            let Some(index) = worst_index else {
                break;
            };

            let resolved = contacts[index];
            let [first_move, second_move] = resolved.resolve_tracked(particles, duration);

            for (i, contact) in contacts.iter_mut().enumerate() {
                if i == index {
                    continue;
                }
                if contact.first == resolved.first {
                    contact.penetration -= first_move.dot(contact.contact_normal);
                } else if Some(contact.first) == resolved.second {
                    contact.penetration -= second_move.dot(contact.contact_normal);
                }
                if let Some(second) = contact.second {
                    if second == resolved.first {
                        contact.penetration += first_move.dot(contact.contact_normal);
                    } else if Some(second) == resolved.second {
                        contact.penetration += second_move.dot(contact.contact_normal);
                    }
                }
            }
            if contacts[index].penetration > 0.0 {
                contacts[index].penetration = 0.0;
            }

            self.iterations_used += 1;
        }

        if self.iterations_used == self.iterations && self.iterations > 0 {
            debug!("Contact resolver stopped at its cap of {} iterations", self.iterations);
        }
    }
}
