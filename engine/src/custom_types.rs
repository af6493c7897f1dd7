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

/// Index into the population array; doubles as a person's stable id.
pub type PersonId = usize;

/// Zero-based day offset since the calendar's start date.
pub type Day = u32;

/// An id assigned to a context (household, district, day cluster); 0 is the
/// "not a member" sentinel everywhere it appears.
pub type ContextId = u32;

/// Count of persons, days, households, etc.
pub type Count = u32;

/// A probability in `[0, 1]`.
pub type Percentage = f64;

/// A five-year age bucket index used to index contact-rate vectors.
pub type AgeBucket = u32;

pub const AGE_BUCKET_WIDTH: u32 = 5;

pub fn age_bucket(age: f64) -> AgeBucket {
    (age.max(0.0) as u32) / AGE_BUCKET_WIDTH
}
