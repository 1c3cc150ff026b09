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
//! Rope Bridge Example
//!
//! A row of deck particles hangs between two fixed posts. Neighbouring deck
//! particles are joined by rods, each deck particle hangs from an overhead
//! cable, and a heavy load walks across the deck. It showcases:
//!
//! - Rods and cables generating contacts every frame
//! - Springs softening the deck
//! - The resolver's iteration count per frame
//!
//! # Running
//!
//! ```bash
//! cargo run --example bridge
//! ```

use abyss_physics::particle::{Particle, ParticleCable, ParticleHandle, ParticleRod, ParticleSpring};
use abyss_physics::{ParticleWorld, ParticleWorldConfig};
use glam::DVec2;

const SEGMENTS: usize = 10;
const SPACING: f64 = 1.0;
const CABLE_HEIGHT: f64 = 3.0;
const TIMESTEP: f64 = 1.0 / 120.0;
const GRAVITY: DVec2 = DVec2::new(0.0, -9.81);

fn build_bridge(world: &mut ParticleWorld) -> Vec<ParticleHandle> {
    let mut deck = Vec::with_capacity(SEGMENTS + 1);
    for i in 0..=SEGMENTS {
        let position = DVec2::new(i as f64 * SPACING, 0.0);
        let particle = if i == 0 || i == SEGMENTS {
            Particle::new(position)
        } else {
            Particle::with_mass(position, 20.0)
                .with_acceleration(GRAVITY)
                .with_damping(0.8)
        };
        deck.push(world.add_particle(particle));
    }

    for pair in deck.windows(2) {
        world.add_contact_generator(ParticleRod::new(pair[0], pair[1], SPACING));

        let spring = world
            .force_registry_mut()
            .insert_generator(ParticleSpring::new(pair[1], 500.0, SPACING));
        world.force_registry_mut().add(pair[0], spring);
    }

    for (i, &plank) in deck.iter().enumerate().skip(1).take(SEGMENTS - 1) {
        let hook = world.add_particle(Particle::new(DVec2::new(i as f64 * SPACING, CABLE_HEIGHT)));
        world.add_contact_generator(ParticleCable::new(hook, plank, CABLE_HEIGHT + 0.2, 0.1));
    }

    deck
}

fn main() {
    println!("==========================================================");
    println!("              Rope Bridge Simulation");
    println!("==========================================================");
    println!();

    let config = ParticleWorldConfig::new(64);
    let mut world = ParticleWorld::with_config(config);
    let deck = build_bridge(&mut world);

    println!("Simulation Configuration:");
    println!("  Segments: {}", SEGMENTS);
    println!("  Contact generators: {}", world.contact_generator_count());
    println!("  Timestep: {:.4} s", TIMESTEP);
    println!();

    let mut load_at: usize = 1;
    let steps_per_plank = 60;

    for frame in 0..(SEGMENTS - 1) * steps_per_plank {
        if frame % steps_per_plank == 0 {
            let previous = deck[load_at.saturating_sub(1).max(1)];
            if let Some(p) = world.particle_mut(previous) {
                p.set_mass(20.0);
            }
            if let Some(p) = world.particle_mut(deck[load_at]) {
                p.set_mass(200.0);
            }

            let sag = world
                .particles()
                .iter()
                .filter_map(|(handle, p)| deck.contains(&handle).then_some(p.position.y))
                .fold(0.0f64, f64::min);
            println!(
                "t={:5.2} s  load on {:2}  lowest {:6.3} m  contacts {:2}  iterations {:2}",
                frame as f64 * TIMESTEP,
                load_at,
                sag,
                world.contacts().len(),
                world.resolver().iterations_used()
            );
            load_at = (load_at + 1).min(SEGMENTS - 1);
        }
        world.step(TIMESTEP);
    }

    println!();
    println!("Final deck:");
    for (i, &handle) in deck.iter().enumerate() {
        if let Some(p) = world.particle(handle) {
            println!("  Plank {:2}: pos=({:6.3}, {:6.3}) m", i, p.position.x, p.position.y);
        }
    }
}
