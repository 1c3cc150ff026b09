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
//! Skid Pad Example
//!
//! Drives a car in circles on tarmac, then runs it off onto grass and
//! finally brakes to a stop. It showcases:
//!
//! - Building a vehicle from a rigid body and tyre force generators
//! - Retuning registered generators between frames
//! - Surface switching between tyre presets
//!
//! # Running
//!
//! ```bash
//! cargo run --example skid_pad
//!
//! # Steer harder
//! cargo run --example skid_pad -- --steering 0.8
//! ```

use abyss_physics::vehicle::{Car, CarConfig, Surface};
use abyss_physics::World;
use glam::DVec2;

const TIMESTEP: f64 = 1.0 / 60.0;

fn report(label: &str, time: f64, car: &Car, world: &World) {
    let position = car.position(world).unwrap_or(DVec2::ZERO);
    let orientation = car.orientation(world).unwrap_or(0.0);
    let speed = car.speed(world).unwrap_or(0.0);
    println!(
        "{:<8} t={:5.2} s  pos=({:7.2}, {:7.2}) m  heading={:5.1}°  speed={:5.2} m/s  {:?}",
        label,
        time,
        position.x,
        position.y,
        orientation.to_degrees(),
        speed,
        car.surface()
    );
}

fn run(world: &mut World, car: &Car, label: &str, time: &mut f64, seconds: f64) {
    let steps = (seconds / TIMESTEP).round() as usize;
    for step in 0..steps {
        world.step(TIMESTEP);
        *time += TIMESTEP;
        if step % 60 == 0 {
            report(label, *time, car, world);
        }
    }
}

fn main() {
    println!("==========================================================");
    println!("                 Skid Pad Simulation");
    println!("==========================================================");
    println!();

    let mut steering = 0.5;
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;
    while i < args.len() {
        if args[i] == "--steering" {
            match args.get(i + 1).and_then(|v| v.parse::<f64>().ok()) {
                Some(value) if (-1.0..=1.0).contains(&value) => steering = value,
                _ => eprintln!(
                    "Warning: --steering expects a value in [-1, 1], using {}",
                    steering
                ),
            }
            i += 1;
        }
        i += 1;
    }

    if let Err(e) = World::validate_timestep(TIMESTEP) {
        eprintln!("{}", e);
    }

    let mut world = World::new();
    let config = CarConfig::default();
    let mut car = match Car::new(&mut world, config, DVec2::ZERO, 0.0) {
        Ok(car) => car,
        Err(e) => {
            eprintln!("Error: {}", e);
            return;
        }
    };

    println!("Car Configuration:");
    println!("  Mass: {:.0} kg", config.mass);
    println!("  Inertia: {:.0} kg·m²", config.inertia);
    println!("  Steering: {:.2}", steering);
    println!();

    let mut time = 0.0;

    car.set_throttle(&mut world, 0.6);
    run(&mut world, &car, "launch", &mut time, 3.0);

    car.set_steering(&mut world, steering);
    car.set_throttle(&mut world, 0.3);
    run(&mut world, &car, "circle", &mut time, 8.0);

    car.set_surface(&mut world, Surface::Offroad);
    run(&mut world, &car, "grass", &mut time, 4.0);

    car.set_throttle(&mut world, 0.0);
    car.set_steering(&mut world, 0.0);
    car.set_brake(&mut world, 1.0);
    run(&mut world, &car, "brake", &mut time, 3.0);

    report("final", time, &car, &world);

    if let Some(body) = car.remove_from(&mut world) {
        println!();
        println!("Removed car; kinetic energy at removal {:.1} J", body.kinetic_energy());
    }
}
