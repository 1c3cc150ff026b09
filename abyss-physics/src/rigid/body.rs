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
//! Oriented planar rigid body
//!
//! A [`RigidBody`] moves in the plane and turns about a single axis, so its
//! orientation is one angle. Planar inertia is a scalar, so the body stores `inverse_inertia`
//! alongside `inverse_mass`; zero in either means the body does not respond
//! to the matching kind of load.
//!
//! # Integration
//!
//! The integrator is semi-implicit Euler:
//!
//! ```text
//! v' = (v + F*inverse_mass*dt) * damping^dt
//! w' = (w + T*inverse_inertia*dt) * angular_damping^dt
//! p' = p + v'*dt
//! θ' = wrap(θ + w'*dt)
//! ```
//!
//! after which the rotation matrix is refreshed and the accumulators cleared.
//!
//! # Derived data
//!
//! The rotation matrix is derived from the orientation angle. Every
//! constructor and orientation setter refreshes it, so it is never stale when
//! a force generator reads it.

use crate::math;
use glam::{DMat2, DVec2};

/// A 2D rigid body with linear and angular state
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody {
    /// World-space position of the centre of mass
    pub position: DVec2,
    /// Linear velocity
    pub velocity: DVec2,
    /// Angular velocity in radians per second, counter-clockwise positive
    pub rotation: f64,
    damping: f64,
    angular_damping: f64,
    orientation: f64,
    inverse_mass: f64,
    inverse_inertia: f64,
    force_accum: DVec2,
    torque_accum: f64,
    rotation_matrix: DMat2,
}

impl RigidBody {
    /// Create an immovable body at `position`, facing +X
    pub fn new(position: DVec2) -> Self {
        RigidBody {
            position,
            velocity: DVec2::ZERO,
            rotation: 0.0,
            damping: 1.0,
            angular_damping: 1.0,
            orientation: 0.0,
            inverse_mass: 0.0,
            inverse_inertia: 0.0,
            force_accum: DVec2::ZERO,
            torque_accum: 0.0,
            rotation_matrix: DMat2::IDENTITY,
        }
    }

    /// Create a body with the given mass and moment of inertia
    ///
    /// # Panics
    ///
    /// Panics if mass or inertia is non-positive, NaN, or infinite
    pub fn with_mass(position: DVec2, mass: f64, inertia: f64) -> Self {
        let mut body = RigidBody::new(position);
        body.set_mass(mass);
        body.set_inertia_tensor(inertia);
        body
    }

    /// Builder-style orientation setter
    pub fn with_orientation(mut self, angle: f64) -> Self {
        self.set_orientation(angle);
        self
    }

    /// Builder-style velocity setter
    pub fn with_velocity(mut self, velocity: DVec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// Builder-style angular velocity setter
    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    /// Builder-style damping setter for linear and angular motion
    ///
    /// # Panics
    ///
    /// Panics if either factor is outside `(0, 1]`
    pub fn with_damping(mut self, damping: f64, angular_damping: f64) -> Self {
        self.set_damping(damping, angular_damping);
        self
    }

    /// Set the linear and angular damping factors
    ///
    /// # Panics
    ///
    /// Panics if either factor is outside `(0, 1]`
    pub fn set_damping(&mut self, damping: f64, angular_damping: f64) {
        assert!(damping > 0.0 && damping <= 1.0, "Damping must be in (0, 1]");
        assert!(
            angular_damping > 0.0 && angular_damping <= 1.0,
            "Damping must be in (0, 1]"
        );
        self.damping = damping;
        self.angular_damping = angular_damping;
    }

    /// Fraction of linear velocity retained per second
    pub fn damping(&self) -> f64 {
        self.damping
    }

    /// Fraction of angular velocity retained per second
    pub fn angular_damping(&self) -> f64 {
        self.angular_damping
    }

    /// Orientation angle in `[0, 2π)`
    pub fn orientation(&self) -> f64 {
        self.orientation
    }

    /// Unit heading vector (local +X in world space)
    pub fn orientation_vector(&self) -> DVec2 {
        self.rotation_matrix.x_axis
    }

    /// Set the orientation angle; derived data is refreshed immediately
    pub fn set_orientation(&mut self, angle: f64) {
        self.orientation = math::wrap_angle(angle);
        self.calculate_derived_data();
    }

    /// Rotation matrix derived from the orientation
    pub fn rotation_matrix(&self) -> &DMat2 {
        &self.rotation_matrix
    }

    /// Recompute the rotation matrix from the orientation angle
    pub fn calculate_derived_data(&mut self) {
        self.rotation_matrix = math::rotation_matrix(self.orientation);
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

    /// Set the moment of inertia about the centre of mass
    ///
    /// # Panics
    ///
    /// Panics if inertia is non-positive, NaN, or infinite
    pub fn set_inertia_tensor(&mut self, inertia: f64) {
        assert!(
            inertia > 0.0 && inertia.is_finite(),
            "Inertia must be positive and finite"
        );
        self.inverse_inertia = 1.0 / inertia;
    }

    /// Make the body immovable
    pub fn set_infinite_mass(&mut self) {
        self.inverse_mass = 0.0;
        self.inverse_inertia = 0.0;
    }

    /// Reciprocal of the mass; zero for immovable bodies
    pub fn inverse_mass(&self) -> f64 {
        self.inverse_mass
    }

    /// Reciprocal of the moment of inertia
    pub fn inverse_inertia(&self) -> f64 {
        self.inverse_inertia
    }

    /// Mass in kilograms; infinite for immovable bodies
    pub fn mass(&self) -> f64 {
        if self.inverse_mass == 0.0 {
            f64::INFINITY
        } else {
            1.0 / self.inverse_mass
        }
    }

    /// Moment of inertia; infinite when rotation is locked
    pub fn inertia(&self) -> f64 {
        if self.inverse_inertia == 0.0 {
            f64::INFINITY
        } else {
            1.0 / self.inverse_inertia
        }
    }

    /// Whether the body responds to forces
    pub fn has_finite_mass(&self) -> bool {
        self.inverse_mass != 0.0
    }

    /// Force accumulated since the last clear
    pub fn accumulated_force(&self) -> DVec2 {
        self.force_accum
    }

    /// Torque accumulated since the last clear
    pub fn accumulated_torque(&self) -> f64 {
        self.torque_accum
    }

    /// Add a force through the centre of mass
    pub fn add_force(&mut self, force: DVec2) {
        self.force_accum += force;
    }

    /// Add a torque
    pub fn add_torque(&mut self, torque: f64) {
        self.torque_accum += torque;
    }

    /// Add a force acting at a world-space point
    ///
    /// The torque contribution is the signed cross product of the lever arm
    /// and the force.
    pub fn add_force_at_point(&mut self, force: DVec2, world_point: DVec2) {
        let arm = world_point - self.position;
        self.force_accum += force;
        self.torque_accum += arm.perp_dot(force);
    }

    /// Add a force acting at a body-local point
    pub fn add_force_at_body_point(&mut self, force: DVec2, local_point: DVec2) {
        let world_point = self.point_in_world_space(local_point);
        self.add_force_at_point(force, world_point);
    }

    /// Zero the force and torque accumulators
    pub fn clear_accumulators(&mut self) {
        self.force_accum = DVec2::ZERO;
        self.torque_accum = 0.0;
    }

    pub(crate) fn reset_accumulators(&mut self, force: DVec2, torque: f64) {
        self.force_accum = force;
        self.torque_accum = torque;
    }

    /// Transform a body-local point into world space
    pub fn point_in_world_space(&self, local: DVec2) -> DVec2 {
        math::local_to_world(local, self.position, &self.rotation_matrix)
    }

    /// Transform a world-space point into body-local space
    pub fn point_in_local_space(&self, world: DVec2) -> DVec2 {
        math::world_to_local(world, self.position, &self.rotation_matrix)
    }

    /// Rotate a body-local direction into world space
    pub fn direction_in_world_space(&self, local: DVec2) -> DVec2 {
        self.rotation_matrix * local
    }

    /// Velocity of a world-space point rigidly attached to the body
    pub fn velocity_at_point(&self, world_point: DVec2) -> DVec2 {
        let arm = world_point - self.position;
        self.velocity + arm.perp() * self.rotation
    }

    /// Translational plus rotational kinetic energy
    pub fn kinetic_energy(&self) -> f64 {
        let linear = if self.inverse_mass > 0.0 {
            0.5 * self.velocity.length_squared() / self.inverse_mass
        } else {
            0.0
        };
        let angular = if self.inverse_inertia > 0.0 {
            0.5 * self.rotation * self.rotation / self.inverse_inertia
        } else {
            0.0
        };
        linear + angular
    }

    /// Advance the body by `duration` seconds
    ///
    /// # Panics
    ///
    /// Panics if duration is non-positive, NaN, or infinite
    pub fn integrate(&mut self, duration: f64) {
        assert!(
            duration > 0.0 && duration.is_finite(),
            "Timestep must be positive and finite"
        );

        let linear_acceleration = self.force_accum * self.inverse_mass;
        let angular_acceleration = self.torque_accum * self.inverse_inertia;

        self.velocity += linear_acceleration * duration;
        self.rotation += angular_acceleration * duration;

        self.velocity *= self.damping.powf(duration);
        self.rotation *= self.angular_damping.powf(duration);

        self.position += self.velocity * duration;
        self.orientation = math::wrap_angle(self.orientation + self.rotation * duration);

        self.calculate_derived_data();
        self.clear_accumulators();
    }
}
