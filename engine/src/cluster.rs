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

//! Cluster (component E): membership list, contact matrix lookup and the
//! data-parallel update kernel that is the hot path of this crate.

use std::collections::HashMap;

use crate::cell::PopulationCell;
use crate::config::{ContactMatrixConfig, LogLevel};
use crate::custom_types::{age_bucket, AgeBucket, ContextId, Day, PersonId};
use crate::rng::RandomWrapper;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DayClusterKind {
    School,
    Work,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ClusterKind {
    Household,
    HomeDistrict,
    DayCluster(DayClusterKind),
    DayDistrict,
}

impl ClusterKind {
    pub fn label(&self) -> &'static str {
        match self {
            ClusterKind::Household => "household",
            ClusterKind::HomeDistrict => "home_district",
            ClusterKind::DayCluster(DayClusterKind::School) => "school",
            ClusterKind::DayCluster(DayClusterKind::Work) => "work",
            ClusterKind::DayDistrict => "day_district",
        }
    }
}

/// Per-age-bucket expected contacts, symmetric by construction: a lookup of
/// `(a, b)` returns the same value as `(b, a)`.
#[derive(Clone, Debug, Default)]
pub struct ContactMatrix {
    table: HashMap<(AgeBucket, AgeBucket), f64>,
}

impl ContactMatrix {
    pub fn from_config(cfg: &ContactMatrixConfig) -> ContactMatrix {
        let mut table = HashMap::new();
        for entry in cfg {
            for contact in &entry.contacts {
                let key = Self::key(entry.age_bucket, contact.target_age_bucket);
                table.insert(key, contact.rate);
            }
        }
        ContactMatrix { table }
    }

    fn key(a: AgeBucket, b: AgeBucket) -> (AgeBucket, AgeBucket) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    pub fn rate(&self, a: AgeBucket, b: AgeBucket) -> f64 {
        *self.table.get(&Self::key(a, b)).unwrap_or(&0.0)
    }

    /// Divides every entry by the average cluster size for this kind,
    /// turning mean-contacts-per-day into a per-pair contact probability
    /// (§4.8). A zero or negative divisor is a configuration/runtime
    /// anomaly upstream (component H guards it before calling this).
    pub fn scaled_by(&self, divisor: f64) -> ContactMatrix {
        ContactMatrix { table: self.table.iter().map(|(k, v)| (*k, v / divisor)).collect() }
    }
}

pub struct Cluster {
    pub id: ContextId,
    pub kind: ClusterKind,
    members: Vec<PersonId>,
    size: usize,
}

impl Cluster {
    pub fn new(id: ContextId, kind: ClusterKind) -> Cluster {
        Cluster { id, kind, members: Vec::new(), size: 0 }
    }

    pub fn push_member(&mut self, person_id: PersonId) {
        self.members.push(person_id);
    }

    /// Sets the cached size at the end of assembly (§3 invariant).
    pub fn finalize(&mut self) {
        self.size = self.members.len();
    }

    pub fn members(&self) -> &[PersonId] {
        &self.members
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// May only move a school cluster to work, never back (§3, §4.7).
    pub fn promote_to_work(&mut self) {
        if let ClusterKind::DayCluster(DayClusterKind::School) = self.kind {
            self.kind = ClusterKind::DayCluster(DayClusterKind::Work);
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum KernelEvent {
    Contact { day: Day, cluster_id: ContextId, i: PersonId, j: PersonId },
    Transmission { day: Day, cluster_id: ContextId, cluster_kind: ClusterKind, infector_id: PersonId, victim_id: PersonId },
}

/// The per-cluster, per-day update: samples contacts among present members
/// and applies the Bernoulli transmission test (§4.5). `events` collects the
/// log-worthy events for this one cluster; the caller decides whether/how to
/// flush them per the configured [`LogLevel`].
#[allow(clippy::too_many_arguments)]
pub fn update_cluster(
    cluster: &Cluster,
    population: &PopulationCell,
    rate_matrix: &ContactMatrix,
    beta: f64,
    day: Day,
    index_case_mode: bool,
    log_level: LogLevel,
    rng: &mut RandomWrapper,
    events: &mut Vec<KernelEvent>,
) {
    let present: Vec<PersonId> =
        cluster.members().iter().copied().filter(|&id| population.get(id).presence.for_kind(cluster.kind)).collect();

    for i in 0..present.len() {
        for j in (i + 1)..present.len() {
            let a = present[i];
            let b = present[j];

            let bucket_a = age_bucket(population.get(a).age);
            let bucket_b = age_bucket(population.get(b).age);
            let p_contact = rate_matrix.rate(bucket_a, bucket_b);

            if !rng.bernoulli(p_contact) {
                continue;
            }
            if log_level == LogLevel::Contacts {
                events.push(KernelEvent::Contact { day, cluster_id: cluster.id, i: a, j: b });
            }

            let a_infectious = population.get(a).health.is_infectious();
            let b_infectious = population.get(b).health.is_infectious();
            let (infector, victim) = match (a_infectious, b_infectious) {
                (true, false) if population.get(b).health.is_susceptible() => (a, b),
                (false, true) if population.get(a).health.is_susceptible() => (b, a),
                _ => continue, // both infectious, both susceptible, or neither eligible
            };

            if !rng.bernoulli(beta) {
                continue;
            }
            if index_case_mode && !population.get(infector).health.is_index_case_lineage() {
                continue;
            }

            if index_case_mode {
                population.get_mut(victim).health.start_infection_from_index_case();
            } else {
                population.get_mut(victim).health.start_infection();
            }

            if log_level != LogLevel::None {
                events.push(KernelEvent::Transmission {
                    day,
                    cluster_id: cluster.id,
                    cluster_kind: cluster.kind,
                    infector_id: infector,
                    victim_id: victim,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::{DiseaseThresholds, Health};
    use crate::person::Person;

    fn population_of(ages: &[f64]) -> PopulationCell {
        let persons = ages
            .iter()
            .enumerate()
            .map(|(i, &age)| Person::new(i, age, 'M', 1, 1, 1, 1, Health::new(DiseaseThresholds::from_raw(2, 4, 3, 3))))
            .collect();
        PopulationCell::new(persons)
    }

    #[test]
    fn full_beta_and_contact_rate_infects_deterministically() {
        let population = population_of(&[30.0, 30.0]);
        population.get_mut(0).health.start_infection();
        population.get_mut(0).health.update(); // day 1
        population.get_mut(0).health.update(); // day 2: reaches Infectious

        let mut cluster = Cluster::new(1, ClusterKind::Household);
        cluster.push_member(0);
        cluster.push_member(1);
        cluster.finalize();

        let mut matrix = ContactMatrix::default();
        matrix.table.insert((6, 6), 1.0);

        let mut rng = RandomWrapper::new(1, 1, 0);
        let mut events = Vec::new();
        update_cluster(&cluster, &population, &matrix, 1.0, 1, false, LogLevel::Transmissions, &mut rng, &mut events);

        assert!(population.get(1).health.is_susceptible() == false || population.get(1).health.days_since_infection() == 0);
        assert_eq!(population.get(1).health.state, crate::health::DiseaseState::Exposed);
    }

    #[test]
    fn both_susceptible_never_transmits() {
        let population = population_of(&[30.0, 30.0]);
        let mut cluster = Cluster::new(1, ClusterKind::Household);
        cluster.push_member(0);
        cluster.push_member(1);
        cluster.finalize();

        let mut matrix = ContactMatrix::default();
        matrix.table.insert((6, 6), 1.0);

        let mut rng = RandomWrapper::new(1, 1, 0);
        let mut events = Vec::new();
        update_cluster(&cluster, &population, &matrix, 1.0, 1, false, LogLevel::None, &mut rng, &mut events);

        assert!(population.get(0).health.is_susceptible());
        assert!(population.get(1).health.is_susceptible());
    }

    #[test]
    fn index_case_mode_suppresses_secondary_seeding() {
        let population = population_of(&[30.0, 30.0, 30.0]);
        population.get_mut(0).health.start_infection(); // not index-case lineage
        population.get_mut(0).health.update();
        population.get_mut(0).health.update();

        let mut cluster = Cluster::new(1, ClusterKind::Household);
        cluster.push_member(0);
        cluster.push_member(1);
        cluster.finalize();

        let mut matrix = ContactMatrix::default();
        matrix.table.insert((6, 6), 1.0);

        let mut rng = RandomWrapper::new(1, 1, 0);
        let mut events = Vec::new();
        update_cluster(&cluster, &population, &matrix, 1.0, 1, true, LogLevel::None, &mut rng, &mut events);

        assert!(population.get(1).health.is_susceptible());
    }
}
