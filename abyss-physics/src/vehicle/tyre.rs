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
//! Linear tyre model
//!
//! Each [`TyreForce`] is attached at a body-local point and pointed along
//! its steer angle. Per step it looks at the velocity of the contact patch
//! and applies, at the attachment point:
//!
//! - a cornering force along the tyre's lateral axis, proportional to the
//!   slip angle between the tyre heading and the patch velocity
//! - rolling resistance, proportional to the rolling speed
//! - drive force from the throttle and brake force opposing rolling
//!
//! plus a self-aligning torque proportional to the slip angle.

use crate::math;
use crate::rigid::{BodySet, ForceGenerator, RigidBody};
use glam::DVec2;
use std::any::Any;
use tracing::trace;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Below this patch speed the slip angle is not meaningful
const MIN_SLIP_SPEED: f64 = 0.1;

/// Rolling speed below which brakes only hold rather than push back
const BRAKE_HOLD_SPEED: f64 = 0.05;

/// Tyre grip and resistance coefficients
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TyreConfig {
    /// Lateral force per radian of slip, in N/rad
    pub cornering_force_coefficient: f64,
    /// Self-aligning torque per radian of slip, in N·m/rad
    pub self_aligning_torque_coefficient: f64,
    /// Rolling resistance per unit rolling speed, in N·s/m
    pub rolling_friction_coefficient: f64,
}

impl TyreConfig {
    /// Road tyres on tarmac
    pub const NORMAL: TyreConfig = TyreConfig {
        cornering_force_coefficient: 8000.0,
        self_aligning_torque_coefficient: 150.0,
        rolling_friction_coefficient: 30.0,
    };

    /// Road tyres off the track
    pub const OFFROAD: TyreConfig = TyreConfig {
        cornering_force_coefficient: 3000.0,
        self_aligning_torque_coefficient: 60.0,
        rolling_friction_coefficient: 400.0,
    };

    /// Check that every coefficient is finite and non-negative
    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("cornering_force_coefficient", self.cornering_force_coefficient),
            ("self_aligning_torque_coefficient", self.self_aligning_torque_coefficient),
            ("rolling_friction_coefficient", self.rolling_friction_coefficient),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(format!(
                    "Invalid tyre {}: {}. Must be finite and non-negative.",
                    name, value
                ));
            }
        }
        Ok(())
    }
}

impl Default for TyreConfig {
    fn default() -> Self {
        TyreConfig::NORMAL
    }
}

/// One tyre acting on a car body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TyreForce {
    /// Contact patch in body-local coordinates
    pub attach_position: DVec2,
    /// Steer angle relative to the body heading, radians
    pub angle: f64,
    /// Throttle in `[0, 1]`
    pub throttle: f64,
    /// Brake in `[0, 1]`
    pub brake: f64,
    /// Drive force at full throttle, N
    pub max_drive_force: f64,
    /// Brake force at full brake, N
    pub max_brake_force: f64,
    /// Grip coefficients for the current surface
    pub config: TyreConfig,
}

impl TyreForce {
    /// Create an undriven, unbraked tyre at `attach_position`
    pub fn new(attach_position: DVec2, config: TyreConfig) -> Self {
        TyreForce {
            attach_position,
            angle: 0.0,
            throttle: 0.0,
            brake: 0.0,
            max_drive_force: 0.0,
            max_brake_force: 0.0,
            config,
        }
    }

    /// Builder-style drive and brake limits
    pub fn with_limits(mut self, max_drive_force: f64, max_brake_force: f64) -> Self {
        self.max_drive_force = max_drive_force;
        self.max_brake_force = max_brake_force;
        self
    }

    /// Slip angle of a patch moving at `velocity` for a tyre facing `forward`
    ///
    /// Positive when the patch slides toward the tyre's left. Returns `None`
    /// when the patch is too slow for the angle to mean anything or when the
    /// inputs produce a non-finite angle.
    pub fn slip_angle(forward: DVec2, velocity: DVec2) -> Option<f64> {
        if velocity.length() < MIN_SLIP_SPEED {
            return None;
        }
        let lateral = forward.perp();
        // Rolling backwards slips the same way as rolling forwards
        let slip = velocity.dot(lateral).atan2(velocity.dot(forward).abs());
        slip.is_finite().then_some(slip)
    }

    fn forces(&self, body: &RigidBody) -> Option<(DVec2, DVec2, f64)> {
        let patch = body.point_in_world_space(self.attach_position);
        let forward = body.direction_in_world_space(math::heading(self.angle));
        if !forward.is_finite() {
            return None;
        }
        let lateral = forward.perp();
        let velocity = body.velocity_at_point(patch);
        let rolling_speed = velocity.dot(forward);

        let mut force = forward * (self.throttle * self.max_drive_force);
        force -= forward * (rolling_speed * self.config.rolling_friction_coefficient);

        if rolling_speed.abs() > BRAKE_HOLD_SPEED {
            force -= forward * (rolling_speed.signum() * self.brake * self.max_brake_force);
        }

        let mut torque = 0.0;
        if let Some(slip) = Self::slip_angle(forward, velocity) {
            force -= lateral * (slip * self.config.cornering_force_coefficient);
            torque -= slip * self.config.self_aligning_torque_coefficient;
        }

        (force.is_finite() && torque.is_finite()).then_some((patch, force, torque))
    }
}

impl ForceGenerator for TyreForce {
    fn update_force(&self, body: &mut RigidBody, _bodies: &BodySet, _duration: f64) {
        if !body.has_finite_mass() {
            return;
        }
        let Some((patch, force, torque)) = self.forces(body) else {
            trace!("TyreForce: non-finite tyre state, skipped");
            return;
        };
        body.add_force_at_point(force, patch);
        body.add_torque(torque);
    }

    fn name(&self) -> &str {
        "TyreForce"
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
    use std::f64::consts::FRAC_PI_4;

    fn car_body() -> RigidBody {
        RigidBody::with_mass(DVec2::ZERO, 1000.0, 1500.0)
    }

    #[test]
    fn test_presets_validate() {
        assert!(TyreConfig::NORMAL.validate().is_ok());
        assert!(TyreConfig::OFFROAD.validate().is_ok());
        let bad = TyreConfig {
            rolling_friction_coefficient: -1.0,
            ..TyreConfig::NORMAL
        };
        assert!(bad.validate().unwrap_err().contains("rolling_friction_coefficient"));
    }

    #[test]
    fn test_slip_angle() {
        let slip = TyreForce::slip_angle(DVec2::X, DVec2::new(1.0, 1.0)).unwrap();
        assert!((slip - FRAC_PI_4).abs() < 1e-12);
        let reversing = TyreForce::slip_angle(DVec2::X, DVec2::new(-1.0, 1.0)).unwrap();
        assert!((reversing - FRAC_PI_4).abs() < 1e-12);
        assert!(TyreForce::slip_angle(DVec2::X, DVec2::ZERO).is_none());
        assert!(TyreForce::slip_angle(DVec2::X, DVec2::new(f64::NAN, 1.0)).is_none());
    }

    #[test]
    fn test_throttle_drives_forward() {
        let mut body = car_body();
        let mut tyre = TyreForce::new(DVec2::new(-1.5, 0.0), TyreConfig::NORMAL)
            .with_limits(2000.0, 3000.0);
        tyre.throttle = 0.5;
        tyre.update_force(&mut body, &BodySet::new(), 0.01);
        assert!((body.accumulated_force() - DVec2::new(1000.0, 0.0)).length() < 1e-9);
        assert!(body.accumulated_torque().abs() < 1e-9);
    }

    #[test]
    fn test_sideways_slide_is_resisted() {
        let mut body = car_body().with_velocity(DVec2::new(10.0, 1.0));
        let tyre = TyreForce::new(DVec2::ZERO, TyreConfig::NORMAL);
        tyre.update_force(&mut body, &BodySet::new(), 0.01);
        assert!(body.accumulated_force().y < 0.0);
        assert!(body.accumulated_torque() < 0.0);
    }

    #[test]
    fn test_brake_opposes_rolling() {
        let mut body = car_body().with_velocity(DVec2::new(-5.0, 0.0));
        let mut tyre = TyreForce::new(DVec2::ZERO, TyreConfig::NORMAL).with_limits(0.0, 3000.0);
        tyre.config.rolling_friction_coefficient = 0.0;
        tyre.brake = 1.0;
        tyre.update_force(&mut body, &BodySet::new(), 0.01);
        assert!((body.accumulated_force().x - 3000.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_steer_is_skipped() {
        let mut body = car_body().with_velocity(DVec2::new(10.0, 0.0));
        let mut tyre = TyreForce::new(DVec2::ZERO, TyreConfig::NORMAL).with_limits(2000.0, 0.0);
        tyre.throttle = 1.0;
        tyre.angle = f64::NAN;
        tyre.update_force(&mut body, &BodySet::new(), 0.01);
        assert_eq!(body.accumulated_force(), DVec2::ZERO);
        assert_eq!(body.accumulated_torque(), 0.0);
    }

    #[test]
    fn test_overflowing_force_is_skipped() {
        let mut body = car_body().with_velocity(DVec2::new(10.0, 0.0));
        let mut tyre = TyreForce::new(DVec2::ZERO, TyreConfig::NORMAL);
        tyre.config.rolling_friction_coefficient = f64::MAX;
        tyre.update_force(&mut body, &BodySet::new(), 0.01);
        assert_eq!(body.accumulated_force(), DVec2::ZERO);
        assert_eq!(body.accumulated_torque(), 0.0);
    }
}
