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
//! Rigid-body simulation driver
//!
//! One frame is a strict three-phase sequence:
//!
//! 1. [`World::start_frame`] clears accumulators and refreshes derived data
//! 2. [`World::run_physics`] applies every registered force
//! 3. [`World::run_physics`] integrates every body
//!
//! [`World::step`] runs the whole sequence. Running `run_physics` without a
//! preceding `start_frame` lets forces accumulate across frames.

use crate::config::WorldConfig;
use crate::rigid::{BodyHandle, BodySet, ForceRegistry, RigidBody};
use tracing::debug;

/// Owns the active bodies and the force registry
#[derive(Debug)]
pub struct World {
    bodies: BodySet,
    registry: ForceRegistry,
    config: WorldConfig,
}

impl World {
    /// Create an empty world with default configuration
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    /// Create an empty world
    pub fn with_config(config: WorldConfig) -> Self {
        let mut registry = ForceRegistry::new();
        registry.warn_on_stale_handles = config.warn_on_stale_handles;
        World {
            bodies: BodySet::new(),
            registry,
            config,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Add a body to the simulation
    pub fn add_body(&mut self, body: RigidBody) -> BodyHandle {
        let handle = self.bodies.insert(body);
        debug!("Added {}", handle);
        handle
    }

    /// Remove a body and every registration targeting it
    ///
    /// Removing a body that is not in the world is a no-op.
    pub fn remove_body(&mut self, handle: BodyHandle) -> Option<RigidBody> {
        let removed = self.bodies.remove(handle)?;
        let purged = self.registry.remove_body(handle);
        debug!("Removed {} and {} registrations", handle, purged);
        Some(removed)
    }

    /// Borrow a body
    pub fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle)
    }

    /// Mutably borrow a body
    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle)
    }

    /// All bodies
    pub fn bodies(&self) -> &BodySet {
        &self.bodies
    }

    /// Number of bodies
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// The force registry
    pub fn force_registry(&self) -> &ForceRegistry {
        &self.registry
    }

    /// The force registry, mutably
    pub fn force_registry_mut(&mut self) -> &mut ForceRegistry {
        &mut self.registry
    }

    /// Clear accumulators and refresh derived data on every body
    pub fn start_frame(&mut self) {
        self.bodies.start_frame();
    }

    /// Apply all registered forces, then integrate every body
    ///
    /// # Panics
    ///
    /// Panics if duration is non-positive, NaN, or infinite
    pub fn run_physics(&mut self, duration: f64) {
        assert!(
            duration > 0.0 && duration.is_finite(),
            "Timestep must be positive and finite"
        );
        self.registry.update_forces(&mut self.bodies, duration);
        self.bodies.integrate_all(duration);
    }

    /// `start_frame` followed by `run_physics`
    pub fn step(&mut self, duration: f64) {
        self.start_frame();
        self.run_physics(duration);
    }

    /// Check a timestep before committing to it
    ///
    /// Returns an error for invalid timesteps and for ones that are valid but
    /// likely to lose precision or stability.
    pub fn validate_timestep(duration: f64) -> Result<(), String> {
        if duration <= 0.0 || !duration.is_finite() {
            return Err(format!(
                "Invalid timestep: {}. Must be positive and finite.",
                duration
            ));
        }

        if duration < 1e-9 {
            return Err(format!(
                "Warning: Timestep {} is extremely small and may cause precision loss with f64.",
                duration
            ));
        }

        if duration > 1.0 {
            return Err(format!(
                "Warning: Timestep {} is large and may cause instability. \
                Consider using smaller timesteps for better accuracy.",
                duration
            ));
        }

        Ok(())
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rigid::{Gravity, Spring};
    use glam::DVec2;

    #[test]
    fn test_step_applies_registered_forces() {
        let mut world = World::new();
        let body = world.add_body(RigidBody::with_mass(DVec2::ZERO, 2.0, 1.0));
        let gravity = world
            .force_registry_mut()
            .insert_generator(Gravity::new(DVec2::new(0.0, -10.0)));
        world.force_registry_mut().add(body, gravity);

        world.step(0.1);
        let b = world.body(body).unwrap();
        assert!((b.velocity.y + 1.0).abs() < 1e-12);
        assert!((b.position.y + 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_start_frame_prevents_accumulation() {
        let mut world = World::new();
        let body = world.add_body(RigidBody::with_mass(DVec2::ZERO, 1.0, 1.0));
        world.body_mut(body).unwrap().add_force(DVec2::X);
        world.start_frame();
        world.run_physics(1.0);
        assert_eq!(world.body(body).unwrap().velocity, DVec2::ZERO);
    }

    #[test]
    fn test_remove_body_twice_is_noop() {
        let mut world = World::new();
        let body = world.add_body(RigidBody::new(DVec2::ZERO));
        assert!(world.remove_body(body).is_some());
        assert!(world.remove_body(body).is_none());
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn test_spring_survives_removed_partner() {
        let mut world = World::with_config(WorldConfig::new().without_stale_handle_warnings());
        let anchor = world.add_body(RigidBody::new(DVec2::ZERO));
        let bob = world.add_body(RigidBody::with_mass(DVec2::new(2.0, 0.0), 1.0, 1.0));
        let spring = world
            .force_registry_mut()
            .insert_generator(Spring::new(DVec2::ZERO, anchor, DVec2::ZERO, 10.0, 1.0));
        world.force_registry_mut().add(bob, spring);

        world.remove_body(anchor);
        world.step(0.1);
        assert_eq!(world.body(bob).unwrap().velocity, DVec2::ZERO);
        assert_eq!(world.force_registry().registration_count(), 1);
    }

    #[test]
    fn test_validate_timestep() {
        assert!(World::validate_timestep(1.0 / 60.0).is_ok());
        assert!(World::validate_timestep(0.0).is_err());
        assert!(World::validate_timestep(f64::NAN).is_err());
        assert!(World::validate_timestep(1e-12).is_err());
        assert!(World::validate_timestep(2.0).is_err());
    }

    #[test]
    #[should_panic(expected = "Timestep must be positive and finite")]
    fn test_run_physics_rejects_zero() {
        World::new().run_physics(0.0);
    }
}
