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
//! A four-tyre car assembled from core pieces
//!
//! A [`Car`] is one rigid body in a [`World`] plus five force generators
//! registered against it: four [`TyreForce`]s and an aerodynamic [`Drag`].
//! The front tyres steer, the rear tyres drive and every tyre brakes. Body
//! local +X is forward and +Y is left.
//!
//! The car does not own its body or generators; they live in the world. Call
//! [`Car::remove_from`] to take them out again.

use crate::rigid::{BodyHandle, Drag, GeneratorHandle, RigidBody};
use crate::vehicle::{TyreConfig, TyreForce};
use crate::World;
use glam::DVec2;
use tracing::{debug, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Ground the car is driving on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Surface {
    /// On the track
    #[default]
    Tarmac,
    /// Off the track
    Offroad,
}

impl Surface {
    /// Tyre coefficients for this surface
    pub fn tyre_config(&self) -> TyreConfig {
        match self {
            Surface::Tarmac => TyreConfig::NORMAL,
            Surface::Offroad => TyreConfig::OFFROAD,
        }
    }
}

/// Car dimensions and drivetrain limits
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CarConfig {
    /// Track width, m
    pub width: f64,
    /// Overall length, m
    pub length: f64,
    /// Mass, kg
    pub mass: f64,
    /// Moment of inertia about the centre of mass, kg·m²
    pub inertia: f64,
    /// Total drive force at full throttle, shared by the rear tyres
    pub max_drive_force: f64,
    /// Total brake force at full brake, shared by all tyres
    pub max_brake_force: f64,
    /// Front wheel angle at full steering lock, radians
    pub max_steer_angle: f64,
    /// Linear aerodynamic drag coefficient
    pub drag_k1: f64,
    /// Quadratic aerodynamic drag coefficient
    pub drag_k2: f64,
}

impl Default for CarConfig {
    fn default() -> Self {
        let width = 1.7;
        let length = 4.2;
        let mass = 1000.0;
        CarConfig {
            width,
            length,
            mass,
            inertia: mass * (width * width + length * length) / 12.0,
            max_drive_force: 6000.0,
            max_brake_force: 12000.0,
            max_steer_angle: 0.6,
            drag_k1: 0.0,
            drag_k2: 0.4,
        }
    }
}

impl CarConfig {
    /// Check that the configuration describes a drivable car
    pub fn validate(&self) -> Result<(), String> {
        let positive = [
            ("width", self.width),
            ("length", self.length),
            ("mass", self.mass),
            ("inertia", self.inertia),
        ];
        for (name, value) in positive {
            if !(value > 0.0 && value.is_finite()) {
                return Err(format!(
                    "Invalid car {}: {}. Must be positive and finite.",
                    name, value
                ));
            }
        }

        let non_negative = [
            ("max_drive_force", self.max_drive_force),
            ("max_brake_force", self.max_brake_force),
            ("max_steer_angle", self.max_steer_angle),
            ("drag_k1", self.drag_k1),
            ("drag_k2", self.drag_k2),
        ];
        for (name, value) in non_negative {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(format!(
                    "Invalid car {}: {}. Must be finite and non-negative.",
                    name, value
                ));
            }
        }

        if self.max_steer_angle >= std::f64::consts::FRAC_PI_2 {
            return Err(format!(
                "Invalid car max_steer_angle: {}. Must be below a quarter turn.",
                self.max_steer_angle
            ));
        }
        Ok(())
    }

    /// Body-local tyre positions: front left, front right, rear left, rear right
    pub fn tyre_positions(&self) -> [DVec2; 4] {
        let x = self.length * 0.35;
        let y = self.width * 0.5;
        [
            DVec2::new(x, y),
            DVec2::new(x, -y),
            DVec2::new(-x, y),
            DVec2::new(-x, -y),
        ]
    }
}

const FRONT: [usize; 2] = [0, 1];
const REAR: [usize; 2] = [2, 3];

/// A car living in a [`World`]
#[derive(Debug)]
pub struct Car {
    config: CarConfig,
    body: BodyHandle,
    tyres: [GeneratorHandle; 4],
    drag: GeneratorHandle,
    throttle: f64,
    brake: f64,
    steering: f64,
    surface: Surface,
}

impl Car {
    /// Build a car at `position` facing `orientation` and add it to `world`
    pub fn new(
        world: &mut World,
        config: CarConfig,
        position: DVec2,
        orientation: f64,
    ) -> Result<Self, String> {
        config.validate()?;

        let body = world.add_body(
            RigidBody::with_mass(position, config.mass, config.inertia)
                .with_orientation(orientation),
        );

        let surface = Surface::Tarmac;
        let registry = world.force_registry_mut();
        let tyres = config.tyre_positions().map(|attach| {
            let tyre = TyreForce::new(attach, surface.tyre_config())
                .with_limits(0.0, config.max_brake_force / 4.0);
            registry.insert_generator(tyre)
        });
        for &i in &REAR {
            if let Some(tyre) = registry.generator_as_mut::<TyreForce>(tyres[i]) {
                tyre.max_drive_force = config.max_drive_force / 2.0;
            }
        }
        let drag = registry.insert_generator(Drag::new(config.drag_k1, config.drag_k2));

        for tyre in tyres {
            registry.add(body, tyre);
        }
        registry.add(body, drag);

        debug!("Car created as {}", body);
        Ok(Car {
            config,
            body,
            tyres,
            drag,
            throttle: 0.0,
            brake: 0.0,
            steering: 0.0,
            surface,
        })
    }

    /// The car's configuration
    pub fn config(&self) -> &CarConfig {
        &self.config
    }

    /// Handle of the car body
    pub fn body(&self) -> BodyHandle {
        self.body
    }

    /// Handles of the tyre generators: front left, front right, rear left, rear right
    pub fn tyres(&self) -> [GeneratorHandle; 4] {
        self.tyres
    }

    /// Current throttle
    pub fn throttle(&self) -> f64 {
        self.throttle
    }

    /// Current brake
    pub fn brake(&self) -> f64 {
        self.brake
    }

    /// Current steering
    pub fn steering(&self) -> f64 {
        self.steering
    }

    /// Current surface
    pub fn surface(&self) -> Surface {
        self.surface
    }

    fn update_tyres(
        &self,
        world: &mut World,
        indices: &[usize],
        mut apply: impl FnMut(&mut TyreForce),
    ) {
        for &i in indices {
            match world.force_registry_mut().generator_as_mut::<TyreForce>(self.tyres[i]) {
                Some(tyre) => apply(tyre),
                None => warn!("Tyre {} of {} is no longer in the world", self.tyres[i], self.body),
            }
        }
    }

    /// Set the throttle
    ///
    /// # Panics
    ///
    /// Panics if value is outside `[0, 1]`
    pub fn set_throttle(&mut self, world: &mut World, value: f64) {
        assert!((0.0..=1.0).contains(&value), "Throttle must be in [0, 1]");
        self.throttle = value;
        self.update_tyres(world, &REAR, |tyre| tyre.throttle = value);
    }

    /// Set the brake
    ///
    /// # Panics
    ///
    /// Panics if value is outside `[0, 1]`
    pub fn set_brake(&mut self, world: &mut World, value: f64) {
        assert!((0.0..=1.0).contains(&value), "Brake must be in [0, 1]");
        self.brake = value;
        self.update_tyres(world, &[0, 1, 2, 3], |tyre| tyre.brake = value);
    }

    /// Set the steering; positive turns left
    ///
    /// # Panics
    ///
    /// Panics if value is outside `[-1, 1]`
    pub fn set_steering(&mut self, world: &mut World, value: f64) {
        assert!((-1.0..=1.0).contains(&value), "Steering must be in [-1, 1]");
        self.steering = value;
        let angle = value * self.config.max_steer_angle;
        self.update_tyres(world, &FRONT, |tyre| tyre.angle = angle);
    }

    /// Switch every tyre to the grip of `surface`
    pub fn set_surface(&mut self, world: &mut World, surface: Surface) {
        if surface == self.surface {
            return;
        }
        debug!("{} now on {:?}", self.body, surface);
        self.surface = surface;
        let config = surface.tyre_config();
        self.update_tyres(world, &[0, 1, 2, 3], |tyre| tyre.config = config);
    }

    /// Position of the centre of mass
    pub fn position(&self, world: &World) -> Option<DVec2> {
        world.body(self.body).map(|b| b.position)
    }

    /// Orientation angle in `[0, 2π)`
    pub fn orientation(&self, world: &World) -> Option<f64> {
        world.body(self.body).map(|b| b.orientation())
    }

    /// Signed speed along the car's heading; negative when reversing
    pub fn speed(&self, world: &World) -> Option<f64> {
        world
            .body(self.body)
            .map(|b| b.velocity.dot(b.orientation_vector()))
    }

    /// Deregister every generator and remove the body from `world`
    pub fn remove_from(self, world: &mut World) -> Option<RigidBody> {
        let registry = world.force_registry_mut();
        for tyre in self.tyres {
            registry.remove_generator(tyre);
        }
        registry.remove_generator(self.drag);
        world.remove_body(self.body)
    }
}
