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
//! Rigid-body force generators
//!
//! Rigid generators may apply forces off the centre of mass and therefore
//! produce torque. Attachment points are given in body-local coordinates and
//! transformed with the body's current rotation matrix, which the world
//! refreshes at the start of every frame.

use crate::particle::forces::spring_force;
use crate::rigid::{BodyHandle, BodySet, RigidBody};
use glam::DVec2;
use std::any::Any;
use tracing::trace;

/// Trait for anything that can push on a rigid body
///
/// The vehicle layer's tyre model implements this alongside the built-in
/// laws below.
pub trait ForceGenerator: Send + Sync {
    /// Add this generator's force and torque to `body` for the current step
    ///
    /// `bodies` holds every other body; the target has been lifted out of
    /// the set for the duration of the call.
    fn update_force(&self, body: &mut RigidBody, bodies: &BodySet, duration: f64);

    /// Get a descriptive name for logging
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Allow downcasting to the concrete generator type
    fn as_any(&self) -> &dyn Any;

    /// Allow mutable downcasting to the concrete generator type
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Uniform gravitational field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gravity {
    /// Acceleration due to gravity
    pub gravity: DVec2,
}

impl Gravity {
    /// Create a gravity generator
    pub fn new(gravity: DVec2) -> Self {
        Gravity { gravity }
    }
}

impl ForceGenerator for Gravity {
    fn update_force(&self, body: &mut RigidBody, _bodies: &BodySet, _duration: f64) {
        if !body.has_finite_mass() {
            return;
        }
        body.add_force(self.gravity * body.mass());
    }

    fn name(&self) -> &str {
        "Gravity"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Buoyancy from a liquid whose surface is the line `y = water_height`
///
/// The submerged fraction of the attachment point grows linearly from 0 at
/// `water_height + max_depth` to 1 at `water_height - max_depth`. The upward
/// force is `liquid_density * volume * fraction`, applied at the attachment
/// point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Buoyancy {
    /// Centre of buoyancy in body-local coordinates
    pub centre: DVec2,
    /// Half the depth over which the body goes from dry to submerged
    pub max_depth: f64,
    /// Displaced volume when fully submerged
    pub volume: f64,
    /// Height of the liquid surface
    pub water_height: f64,
    /// Liquid density, e.g. 1000 for water
    pub liquid_density: f64,
}

impl Buoyancy {
    /// Create a buoyancy generator
    ///
    /// # Panics
    ///
    /// Panics if `max_depth` is not positive
    pub fn new(
        centre: DVec2,
        max_depth: f64,
        volume: f64,
        water_height: f64,
        liquid_density: f64,
    ) -> Self {
        assert!(max_depth > 0.0, "Buoyancy max depth must be positive");
        Buoyancy {
            centre,
            max_depth,
            volume,
            water_height,
            liquid_density,
        }
    }

    /// Submerged fraction in `[0, 1]` for a point at height `depth`
    pub fn submerged_fraction(&self, depth: f64) -> f64 {
        if depth >= self.water_height + self.max_depth {
            return 0.0;
        }
        if depth <= self.water_height - self.max_depth {
            return 1.0;
        }
        (self.water_height + self.max_depth - depth) / (2.0 * self.max_depth)
    }
}

impl ForceGenerator for Buoyancy {
    fn update_force(&self, body: &mut RigidBody, _bodies: &BodySet, _duration: f64) {
        let depth = body.point_in_world_space(self.centre).y;
        let fraction = self.submerged_fraction(depth);
        if fraction <= 0.0 {
            return;
        }
        let force = DVec2::new(0.0, self.liquid_density * self.volume * fraction);
        body.add_force_at_body_point(force, self.centre);
    }

    fn name(&self) -> &str {
        "Buoyancy"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Linear plus quadratic drag through the centre of mass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drag {
    /// Linear drag coefficient
    pub k1: f64,
    /// Quadratic drag coefficient
    pub k2: f64,
}

impl Drag {
    /// Create a drag generator
    pub fn new(k1: f64, k2: f64) -> Self {
        Drag { k1, k2 }
    }
}

impl ForceGenerator for Drag {
    fn update_force(&self, body: &mut RigidBody, _bodies: &BodySet, _duration: f64) {
        let speed = body.velocity.length();
        let Some(direction) = body.velocity.try_normalize() else {
            return;
        };
        let drag = self.k1 * speed + self.k2 * speed * speed;
        body.add_force(direction * -drag);
    }

    fn name(&self) -> &str {
        "Drag"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Spring between a point on the target and a point on another body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spring {
    /// Attachment on the target, body-local
    pub connection_point: DVec2,
    /// The body at the other end
    pub other: BodyHandle,
    /// Attachment on the other body, in its local coordinates
    pub other_connection_point: DVec2,
    /// Stiffness in N/m
    pub spring_constant: f64,
    /// Length at which the spring exerts no force
    pub rest_length: f64,
}

impl Spring {
    /// Create a spring to `other`
    pub fn new(
        connection_point: DVec2,
        other: BodyHandle,
        other_connection_point: DVec2,
        spring_constant: f64,
        rest_length: f64,
    ) -> Self {
        Spring {
            connection_point,
            other,
            other_connection_point,
            spring_constant,
            rest_length,
        }
    }
}

impl ForceGenerator for Spring {
    fn update_force(&self, body: &mut RigidBody, bodies: &BodySet, _duration: f64) {
        let Some(other) = bodies.get(self.other) else {
            trace!("Spring: other end {} not available", self.other);
            return;
        };
        let local_end = body.point_in_world_space(self.connection_point);
        let other_end = other.point_in_world_space(self.other_connection_point);

        let Some(force) = spring_force(
            local_end - other_end,
            self.spring_constant,
            self.rest_length,
            false,
        ) else {
            trace!("Spring: degenerate direction, skipped");
            return;
        };
        body.add_force_at_point(force, local_end);
    }

    fn name(&self) -> &str {
        "Spring"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gravity_scales_with_mass() {
        let mut body = RigidBody::with_mass(DVec2::ZERO, 10.0, 1.0);
        Gravity::new(DVec2::new(0.0, -9.81)).update_force(&mut body, &BodySet::new(), 0.1);
        assert!((body.accumulated_force().y + 98.1).abs() < 1e-9);
    }

    #[test]
    fn test_gravity_ignores_immovable() {
        let mut body = RigidBody::new(DVec2::ZERO);
        Gravity::new(DVec2::new(0.0, -9.81)).update_force(&mut body, &BodySet::new(), 0.1);
        assert_eq!(body.accumulated_force(), DVec2::ZERO);
    }

    #[test]
    fn test_buoyancy_dry_partial_and_submerged() {
        let buoyancy = Buoyancy::new(DVec2::ZERO, 0.5, 2.0, 0.0, 1000.0);
        let bodies = BodySet::new();

        let mut dry = RigidBody::with_mass(DVec2::new(0.0, 0.6), 1.0, 1.0);
        buoyancy.update_force(&mut dry, &bodies, 0.1);
        assert_eq!(dry.accumulated_force(), DVec2::ZERO);

        let mut half = RigidBody::with_mass(DVec2::ZERO, 1.0, 1.0);
        buoyancy.update_force(&mut half, &bodies, 0.1);
        assert!((half.accumulated_force().y - 1000.0).abs() < 1e-9);

        let mut sunk = RigidBody::with_mass(DVec2::new(0.0, -3.0), 1.0, 1.0);
        buoyancy.update_force(&mut sunk, &bodies, 0.1);
        assert!((sunk.accumulated_force().y - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn test_buoyancy_off_centre_makes_torque() {
        let buoyancy = Buoyancy::new(DVec2::new(1.0, 0.0), 0.5, 1.0, 10.0, 1000.0);
        let mut body = RigidBody::with_mass(DVec2::ZERO, 1.0, 1.0);
        buoyancy.update_force(&mut body, &BodySet::new(), 0.1);
        assert!((body.accumulated_torque() - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_drag_opposes_velocity() {
        let mut body =
            RigidBody::with_mass(DVec2::ZERO, 1.0, 1.0).with_velocity(DVec2::new(0.0, 2.0));
        Drag::new(1.0, 0.5).update_force(&mut body, &BodySet::new(), 0.1);
        assert!((body.accumulated_force() - DVec2::new(0.0, -4.0)).length() < 1e-12);

        let mut still = RigidBody::with_mass(DVec2::ZERO, 1.0, 1.0);
        Drag::new(1.0, 0.5).update_force(&mut still, &BodySet::new(), 0.1);
        assert_eq!(still.accumulated_force(), DVec2::ZERO);
    }

    #[test]
    fn test_spring_between_bodies() {
        let mut bodies = BodySet::new();
        let anchor = bodies.insert(RigidBody::new(DVec2::ZERO));
        let mut body = RigidBody::with_mass(DVec2::new(3.0, 0.0), 1.0, 1.0);

        // Attached one unit above the centre, stretched 1 beyond rest
        let spring = Spring::new(DVec2::new(0.0, 1.0), anchor, DVec2::new(3.0, 0.0), 2.0, 0.0);
        spring.update_force(&mut body, &bodies, 0.1);
        assert!((body.accumulated_force() - DVec2::new(0.0, -2.0)).length() < 1e-12);
        assert!(body.accumulated_torque().abs() < 1e-12);

        let at_rest = Spring::new(DVec2::ZERO, anchor, DVec2::ZERO, 5.0, 3.0);
        body.clear_accumulators();
        at_rest.update_force(&mut body, &bodies, 0.1);
        assert!(body.accumulated_force().length() < 1e-12);
    }

    #[test]
    fn test_spring_missing_other() {
        let mut bodies = BodySet::new();
        let gone = bodies.insert(RigidBody::new(DVec2::ZERO));
        bodies.remove(gone);
        let mut body = RigidBody::with_mass(DVec2::new(3.0, 0.0), 1.0, 1.0);
        Spring::new(DVec2::ZERO, gone, DVec2::ZERO, 2.0, 0.0).update_force(&mut body, &bodies, 0.1);
        assert_eq!(body.accumulated_force(), DVec2::ZERO);
    }
}
