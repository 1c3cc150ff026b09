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
//! End-to-end rigid-body scenarios driven through the World

use abyss_physics::rigid::{BodySet, Buoyancy, Drag, ForceGenerator, Gravity, RigidBody, Spring};
use abyss_physics::World;
use glam::DVec2;
use std::any::Any;

/// Constant push through the centre of mass
struct Thrust(DVec2);

impl ForceGenerator for Thrust {
    fn update_force(&self, body: &mut RigidBody, _bodies: &BodySet, _duration: f64) {
        body.add_force(self.0);
    }

    fn name(&self) -> &str {
        "Thrust"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[test]
fn test_constant_force_for_one_second() {
    let mut world = World::new();
    let body = world.add_body(RigidBody::with_mass(DVec2::ZERO, 1000.0, 1000.0));
    let thrust = world
        .force_registry_mut()
        .insert_generator(Thrust(DVec2::new(1000.0, 0.0)));
    world.force_registry_mut().add(body, thrust);

    for _ in 0..10 {
        world.start_frame();
        world.run_physics(0.1);
    }

    let b = world.body(body).unwrap();
    assert!((b.velocity - DVec2::new(1.0, 0.0)).length() < 1e-9);
    // Semi-implicit Euler moves with the updated velocity: sum of 0.1*k*0.1
    assert!((b.position - DVec2::new(0.55, 0.0)).length() < 1e-9);
    // Within one step's worth of the analytic ½at²
    assert!((b.position.x - 0.5).abs() < 0.06);
    assert_eq!(b.rotation, 0.0);
}

#[test]
fn test_buoyancy_above_surface_contributes_nothing() {
    let mut world = World::new();
    let body = world.add_body(RigidBody::with_mass(DVec2::new(0.0, 5.0), 10.0, 1.0));
    let buoyancy = world
        .force_registry_mut()
        .insert_generator(Buoyancy::new(DVec2::ZERO, 1.0, 0.1, 2.0, 1000.0));
    world.force_registry_mut().add(body, buoyancy);

    world.step(0.01);
    let b = world.body(body).unwrap();
    assert_eq!(b.velocity, DVec2::ZERO);
    assert_eq!(b.position, DVec2::new(0.0, 5.0));
}

#[test]
fn test_floating_body_settles_at_equilibrium() {
    let mut world = World::new();
    let body = world.add_body(
        RigidBody::with_mass(DVec2::new(0.0, 3.0), 50.0, 10.0)
            .with_damping(0.5, 0.5),
    );
    let registry = world.force_registry_mut();
    let gravity = registry.insert_generator(Gravity::new(DVec2::new(0.0, -10.0)));
    // Full submersion gives twice the weight, so the body floats half in
    let buoyancy = registry.insert_generator(Buoyancy::new(DVec2::ZERO, 0.5, 1.0, 0.0, 1000.0));
    registry.add(body, gravity);
    registry.add(body, buoyancy);

    for _ in 0..3000 {
        world.step(0.01);
    }

    let b = world.body(body).unwrap();
    // Buoyant force equals weight at the surface line
    assert!(b.position.y.abs() < 1e-3);
    assert!(b.velocity.length() < 1e-3);
}

#[test]
fn test_off_centre_force_spins_body() {
    let mut world = World::new();
    let body = world.add_body(RigidBody::with_mass(DVec2::ZERO, 1.0, 2.0));

    world.start_frame();
    world
        .body_mut(body)
        .unwrap()
        .add_force_at_body_point(DVec2::new(0.0, 4.0), DVec2::new(1.0, 0.0));
    world.run_physics(0.5);

    let b = world.body(body).unwrap();
    // Torque 4, inertia 2: w = 2*0.5 = 1, θ = w*dt = 0.5
    assert!((b.rotation - 1.0).abs() < 1e-12);
    assert!((b.orientation() - 0.5).abs() < 1e-12);
    let heading = b.orientation_vector();
    assert!((heading - DVec2::new(0.5f64.cos(), 0.5f64.sin())).length() < 1e-12);
}

#[test]
fn test_spring_between_bodies_conserves_momentum() {
    let mut world = World::new();
    let a = world.add_body(RigidBody::with_mass(DVec2::new(-2.0, 0.0), 2.0, 1.0));
    let b = world.add_body(RigidBody::with_mass(DVec2::new(2.0, 1.0), 1.0, 1.0));

    let registry = world.force_registry_mut();
    let a_to_b = registry.insert_generator(Spring::new(DVec2::ZERO, b, DVec2::ZERO, 30.0, 2.0));
    let b_to_a = registry.insert_generator(Spring::new(DVec2::ZERO, a, DVec2::ZERO, 30.0, 2.0));
    registry.add(a, a_to_b);
    registry.add(b, b_to_a);

    // Less than half an oscillation period
    for _ in 0..300 {
        world.step(0.001);
    }

    let momentum: DVec2 = world
        .bodies()
        .iter()
        .map(|(_, body)| body.velocity * body.mass())
        .sum();
    assert!(momentum.length() < 1e-9);

    // Started stretched, so the bodies have moved toward each other
    let separation = (world.body(a).unwrap().position - world.body(b).unwrap().position).length();
    assert!(separation < 17.0f64.sqrt());
}

#[test]
fn test_drag_reaches_terminal_velocity() {
    let mut world = World::new();
    let body = world.add_body(RigidBody::with_mass(DVec2::ZERO, 1.0, 1.0));
    let registry = world.force_registry_mut();
    let gravity = registry.insert_generator(Gravity::new(DVec2::new(0.0, -10.0)));
    let drag = registry.insert_generator(Drag::new(0.0, 0.1));
    registry.add(body, gravity);
    registry.add(body, drag);

    for _ in 0..2000 {
        world.step(0.01);
    }

    // k2 * v² = m * g
    let v = world.body(body).unwrap().velocity;
    assert!((v.y + 10.0).abs() < 1e-3);
}

#[test]
fn test_removed_body_stops_receiving_forces() {
    let mut world = World::new();
    let kept = world.add_body(RigidBody::with_mass(DVec2::ZERO, 1.0, 1.0));
    let removed = world.add_body(RigidBody::with_mass(DVec2::ZERO, 1.0, 1.0));
    let gravity = world
        .force_registry_mut()
        .insert_generator(Gravity::new(DVec2::new(0.0, -1.0)));
    world.force_registry_mut().add(kept, gravity);
    world.force_registry_mut().add(removed, gravity);

    world.remove_body(removed);
    assert_eq!(world.force_registry().registration_count(), 1);
    world.step(1.0);

    assert!(world.body(removed).is_none());
    assert!((world.body(kept).unwrap().velocity.y + 1.0).abs() < 1e-12);
}
