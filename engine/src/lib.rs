/*
 * Stride
 * Copyright (c) 2026  The Stride Developers
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <http://www.gnu.org/licenses/>.
 *
 */

#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate log;

pub mod assembly;
pub mod calendar;
pub mod cell;
pub mod cluster;
pub mod config;
pub mod custom_types;
pub mod error;
pub mod health;
pub mod logging;
pub mod person;
pub mod population;
pub mod rng;
pub mod simulator;

pub use error::{Result, StrideError};
