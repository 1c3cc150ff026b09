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
//! Simulation configuration
//!
//! Vehicle tuning lives next to the vehicle types in [`crate::vehicle`].

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for a rigid-body [`World`](crate::World)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WorldConfig {
    /// Whether the force registry logs registrations whose body is gone
    pub warn_on_stale_handles: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            warn_on_stale_handles: true,
        }
    }
}

impl WorldConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Silence stale-handle warnings
    pub fn without_stale_handle_warnings(mut self) -> Self {
        self.warn_on_stale_handles = false;
        self
    }
}

/// Configuration for a [`ParticleWorld`](crate::particle::ParticleWorld)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParticleWorldConfig {
    /// Maximum number of contacts generated per frame
    pub max_contacts: usize,
    /// Resolver iteration cap; `None` uses twice the contacts generated
    pub resolver_iterations: Option<usize>,
    /// Whether the force registry logs registrations whose particle is gone
    pub warn_on_stale_handles: bool,
}

impl Default for ParticleWorldConfig {
    fn default() -> Self {
        ParticleWorldConfig {
            max_contacts: 256,
            resolver_iterations: None,
            warn_on_stale_handles: true,
        }
    }
}

impl ParticleWorldConfig {
    /// Create a configuration with a contact capacity
    ///
    /// # Panics
    ///
    /// Panics if `max_contacts` is zero
    pub fn new(max_contacts: usize) -> Self {
        assert!(max_contacts > 0, "Contact capacity must be at least 1");
        ParticleWorldConfig {
            max_contacts,
            ..Self::default()
        }
    }

    /// Use a fixed resolver iteration cap
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.resolver_iterations = Some(iterations);
        self
    }

    /// Silence stale-handle warnings
    pub fn without_stale_handle_warnings(mut self) -> Self {
        self.warn_on_stale_handles = false;
        self
    }

    /// Iteration cap to use for a frame that produced `contacts` contacts
    pub fn iterations_for(&self, contacts: usize) -> usize {
        self.resolver_iterations.unwrap_or(contacts * 2)
    }
}
