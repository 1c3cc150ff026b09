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
//! # Abyss Physics
//!
//! A fixed-timestep 2D physics core for arcade vehicle dynamics.
//!
//! ## Features
//!
//! - **Particles**: point masses with drag, spring and bungee force generators
//! - **Contacts**: impulse-based resolution with cable and rod constraints
//! - **Rigid Bodies**: planar bodies with torque-aware force generators
//! - **Force Registries**: ordered `(target, generator)` bindings applied once per step
//! - **Handles**: generational handles instead of shared pointers; removed
//!   bodies are never dereferenced
//! - **Parallelization**: optional Rayon integration for the integrate phase
//!
//! ## Example
//!
//! ```rust
//! use abyss_physics::rigid::{Gravity, RigidBody};
//! use abyss_physics::World;
//! use glam::DVec2;
//!
//! let mut world = World::new();
//! let body = world.add_body(RigidBody::with_mass(DVec2::ZERO, 1000.0, 1000.0));
//!
//! let gravity = world
//!     .force_registry_mut()
//!     .insert_generator(Gravity::new(DVec2::new(0.0, -9.81)));
//! world.force_registry_mut().add(body, gravity);
//!
//! for _ in 0..60 {
//!     world.step(1.0 / 60.0);
//! }
//! assert!(world.body(body).unwrap().position.y < 0.0);
//! ```

#![warn(missing_docs)]

mod arena;

/// Simulation configuration
pub mod config;

/// Planar rotation helpers
pub mod math;

/// Point-mass physics and contact resolution
pub mod particle;

/// Rigid bodies and their force generators
pub mod rigid;

/// Arcade vehicle layer
pub mod vehicle;

/// Rigid-body simulation driver
pub mod world;

pub use arena::Index;
pub use config::{ParticleWorldConfig, WorldConfig};
pub use particle::{Particle, ParticleHandle, ParticleSet, ParticleWorld};
pub use rigid::{BodyHandle, BodySet, ForceGenerator, ForceRegistry, GeneratorHandle, RigidBody};
pub use world::World;
