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

//! Cluster assembler (component G): turns a flat population into the four
//! per-kind cluster arrays the kernel (E) iterates over.

use crate::cluster::{Cluster, ClusterKind, DayClusterKind};
use crate::custom_types::ContextId;
use crate::person::Person;

/// The four cluster arrays produced by assembly, in the fixed order the
/// driver (H) iterates them each day (§5).
pub struct AssembledClusters {
    pub household: Vec<Cluster>,
    pub day_cluster: Vec<Cluster>,
    pub home_district: Vec<Cluster>,
    pub day_district: Vec<Cluster>,
}

/// A person older than this at assembly time flips their day cluster from
/// the tentative `school` kind to `work`, final (§4.7).
const WORK_PROMOTION_AGE: f64 = 24.0;

fn max_id(persons: &[Person], accessor: impl Fn(&Person) -> ContextId) -> ContextId {
    persons.iter().map(accessor).max().unwrap_or(0)
}

fn bucket(persons: &mut [Person], kind: ClusterKind, accessor: impl Fn(&Person) -> ContextId) -> Vec<Cluster> {
    let max_id = max_id(persons, &accessor);
    let mut clusters: Vec<Cluster> = (1..=max_id).map(|id| Cluster::new(id, kind)).collect();

    for person in persons.iter() {
        let id = accessor(person);
        if id == 0 {
            continue;
        }
        clusters[(id - 1) as usize].push_member(person.id);
        if kind == ClusterKind::DayCluster(DayClusterKind::School) && person.age > WORK_PROMOTION_AGE {
            clusters[(id - 1) as usize].promote_to_work();
        }
    }

    for cluster in &mut clusters {
        cluster.finalize();
    }
    clusters
}

/// Buckets persons into the id-major cluster arrays (sentinel id 0 means
/// "not a member" and is never materialized as a cluster), promotes
/// day-clusters containing an over-24 member from school to work, then
/// writes the finalized household size back onto every member (§4.7).
pub fn assemble(persons: &mut [Person]) -> AssembledClusters {
    let household = bucket(persons, ClusterKind::Household, |p| p.household_id);
    let day_cluster = bucket(persons, ClusterKind::DayCluster(DayClusterKind::School), |p| p.day_cluster_id);
    let home_district = bucket(persons, ClusterKind::HomeDistrict, |p| p.home_district_id);
    let day_district = bucket(persons, ClusterKind::DayDistrict, |p| p.day_district_id);

    for cluster in &household {
        let size = cluster.size() as u32;
        for &member in cluster.members() {
            persons[member].household_size = size;
        }
    }

    AssembledClusters { household, day_cluster, home_district, day_district }
}

/// Mean member count across non-sentinel clusters of one kind (Open
/// Question (a): empty higher-id clusters created by a sparse id space are
/// included in the average, matching the source behavior).
pub fn average_size(clusters: &[Cluster]) -> f64 {
    if clusters.is_empty() {
        return 0.0;
    }
    let total: usize = clusters.iter().map(Cluster::size).sum();
    total as f64 / clusters.len() as f64
}
