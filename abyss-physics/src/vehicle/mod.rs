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
//! Arcade vehicle layer built on the rigid-body core
//!
//! Everything here uses only the public core API: a car is a body plus
//! force generators registered in a [`World`](crate::World). Rendering,
//! input and track geometry are left to the game.

pub mod car;
pub mod tyre;

pub use car::{Car, CarConfig, Surface};
pub use tyre::{TyreConfig, TyreForce};
