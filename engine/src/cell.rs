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

//! A `Sync` cell over the population array that lets disjoint workers take
//! `&mut` references to different elements at once, without locks.
//!
//! Cluster membership is an arbitrary subset of the population, not a
//! contiguous range, so `[T]::split_at_mut` cannot carve out each worker's
//! slice. [`PersonCell`] is the same technique as `VecCell` in the Ixa
//! framework (an `UnsafeCell`-backed container asserted `Sync` by a
//! documented external invariant), generalized to per-element `&mut`
//! access instead of whole-vec replacement.

use std::cell::UnsafeCell;

use crate::person::Person;

pub struct PersonCell(UnsafeCell<Person>);

// SAFETY: concurrent callers only ever dereference distinct indices within
// one cluster-kind batch. The cluster assembler (component G) guarantees
// that, for a fixed cluster kind, a person belongs to at most one cluster of
// that kind, and the driver serializes batches across kinds (never runs two
// kinds' batches concurrently). Under those two invariants no two workers
// ever hold a `&mut Person` to the same index at the same time, so `Sync`
// is sound despite the interior mutability.
unsafe impl Sync for PersonCell {}

pub struct PopulationCell {
    cells: Vec<PersonCell>,
}

impl PopulationCell {
    pub fn new(persons: Vec<Person>) -> PopulationCell {
        PopulationCell { cells: persons.into_iter().map(|p| PersonCell(UnsafeCell::new(p))).collect() }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Read-only access; safe because `&self` never aliases a live `&mut`
    /// obtained through [`PopulationCell::get_mut`] (callers must not hold
    /// both at once for the same index, upheld the same way as the `Sync`
    /// invariant above).
    pub fn get(&self, id: usize) -> &Person {
        unsafe { &*self.cells[id].0.get() }
    }

    /// Mutable access to one person. See the module-level safety invariant:
    /// sound only when the caller is the unique batch worker for `id`'s
    /// cluster this kind, this day.
    #[allow(clippy::mut_from_ref)]
    pub fn get_mut(&self, id: usize) -> &mut Person {
        unsafe { &mut *self.cells[id].0.get() }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Person> {
        (0..self.len()).map(move |i| self.get(i))
    }

    pub fn into_vec(self) -> Vec<Person> {
        self.cells.into_iter().map(|c| c.0.into_inner()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::{DiseaseThresholds, Health};
    use crate::person::Person;
    use rayon::prelude::*;

    fn make_population(n: usize) -> PopulationCell {
        let persons = (0..n)
            .map(|i| Person::new(i, 30.0, 'M', 1, 1, 1, 1, Health::new(DiseaseThresholds::from_raw(2, 4, 3, 3))))
            .collect();
        PopulationCell::new(persons)
    }

    #[test]
    fn disjoint_parallel_mutation_is_observed() {
        let population = make_population(1000);
        (0..population.len()).into_par_iter().for_each(|i| {
            population.get_mut(i).age = i as f64;
        });
        for i in 0..population.len() {
            assert_eq!(population.get(i).age, i as f64);
        }
    }
}
