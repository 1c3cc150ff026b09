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
//! Planar rotation helpers
//!
//! Vector algebra comes from `glam` (`DVec2`, `DMat2`). This module only adds
//! the few conversions the rigid-body code needs between body-local and world
//! coordinates. Angles are in radians, counter-clockwise positive.

use glam::{DMat2, DVec2};
use std::f64::consts::TAU;

/// Build the counter-clockwise rotation matrix for `angle`
pub fn rotation_matrix(angle: f64) -> DMat2 {
    DMat2::from_angle(angle)
}

/// Unit heading vector for `angle`
pub fn heading(angle: f64) -> DVec2 {
    DVec2::from_angle(angle)
}

/// Wrap an angle into `[0, 2π)`
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Transform a body-local point into world space
pub fn local_to_world(local: DVec2, position: DVec2, rotation: &DMat2) -> DVec2 {
    position + *rotation * local
}

/// Transform a world-space point into body-local space
///
/// Exact inverse of [`local_to_world`]; rotation matrices are orthonormal so
/// the transpose is the inverse.
pub fn world_to_local(world: DVec2, position: DVec2, rotation: &DMat2) -> DVec2 {
    rotation.transpose() * (world - position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_rotation_is_counter_clockwise() {
        let r = rotation_matrix(FRAC_PI_2);
        let v = r * DVec2::X;
        assert!((v - DVec2::Y).length() < 1e-12);
    }

    #[test]
    fn test_heading_matches_rotation() {
        let angle = 0.7;
        let h = heading(angle);
        let r = rotation_matrix(angle) * DVec2::X;
        assert!((h - r).length() < 1e-12);
        assert!((h.length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_wrap_angle() {
        assert!((wrap_angle(3.0 * PI) - PI).abs() < 1e-12);
        assert!((wrap_angle(-FRAC_PI_2) - 3.0 * FRAC_PI_2).abs() < 1e-12);
        assert_eq!(wrap_angle(0.0), 0.0);
        let w = wrap_angle(-1e-300);
        assert!((0.0..TAU).contains(&w));
    }

    #[test]
    fn test_local_world_round_trip() {
        let r = rotation_matrix(1.2);
        let pos = DVec2::new(3.0, -4.0);
        let local = DVec2::new(0.5, 2.0);
        let world = local_to_world(local, pos, &r);
        let back = world_to_local(world, pos, &r);
        assert!((back - local).length() < 1e-12);
    }
}
