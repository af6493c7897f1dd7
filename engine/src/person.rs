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

//! Person record (component D): identity, demographics, cluster memberships,
//! per-day presence flags and embedded [`Health`].

use crate::calendar::Calendar;
use crate::cluster::ClusterKind;
use crate::custom_types::{ContextId, PersonId};
use crate::health::Health;

/// Presence in a context is recomputed every day from the calendar; these
/// bools gate whether the person participates in that context's cluster
/// batch today (§4.4).
#[derive(Copy, Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Presence {
    pub in_household: bool,
    pub in_home_district: bool,
    pub in_day_cluster: bool,
    pub in_day_district: bool,
}

impl Presence {
    pub fn for_kind(&self, kind: ClusterKind) -> bool {
        match kind {
            ClusterKind::Household => self.in_household,
            ClusterKind::HomeDistrict => self.in_home_district,
            ClusterKind::DayCluster(_) => self.in_day_cluster,
            ClusterKind::DayDistrict => self.in_day_district,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub age: f64,
    pub gender: char,
    pub household_id: ContextId,
    pub home_district_id: ContextId,
    pub day_cluster_id: ContextId,
    pub day_district_id: ContextId,
    pub presence: Presence,
    pub household_size: u32,
    pub survey_participant: bool,
    pub health: Health,
}

impl Person {
    pub fn new(
        id: PersonId,
        age: f64,
        gender: char,
        household_id: ContextId,
        home_district_id: ContextId,
        day_cluster_id: ContextId,
        day_district_id: ContextId,
        health: Health,
    ) -> Person {
        Person {
            id,
            age,
            gender,
            household_id,
            home_district_id,
            day_cluster_id,
            day_district_id,
            presence: Presence {
                in_household: true,
                in_home_district: true,
                in_day_cluster: true,
                in_day_district: true,
            },
            household_size: 0,
            survey_participant: false,
            health,
        }
    }

    pub fn context_id(&self, kind: ClusterKind) -> ContextId {
        match kind {
            ClusterKind::Household => self.household_id,
            ClusterKind::HomeDistrict => self.home_district_id,
            ClusterKind::DayCluster(_) => self.day_cluster_id,
            ClusterKind::DayDistrict => self.day_district_id,
        }
    }

    /// `day_cluster_id` is shared by school and work (§3: a single id that
    /// "resolves to school or workplace"), so having a nonzero id is the
    /// only check either context needs.
    pub fn has_school_id(&self) -> bool {
        self.day_cluster_id != 0
    }

    /// Recomputes the four presence flags from the calendar (§4.4). The
    /// day-cluster flag additionally depends on whether the final (possibly
    /// promoted) kind of the assigned day cluster is school or work, passed
    /// in because that classification is only known after assembly (§4.7).
    pub fn update_presence(&mut self, calendar: &Calendar, day_cluster_is_school: bool, is_school_holiday: bool) {
        let weekday_no_holiday = !calendar.is_weekend() && !calendar.is_holiday();

        self.presence.in_household = true;
        self.presence.in_home_district = calendar.is_weekend() || calendar.is_holiday();
        self.presence.in_day_cluster = weekday_no_holiday
            && self.has_school_id()
            && (!day_cluster_is_school || !is_school_holiday);
        self.presence.in_day_district = !calendar.is_weekend();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::Calendar;
    use crate::health::{DiseaseThresholds, Health};

    fn person_with_day_cluster() -> Person {
        Person::new(0, 30.0, 'M', 1, 1, 1, 1, Health::new(DiseaseThresholds::from_raw(2, 4, 3, 3)))
    }

    #[test]
    fn household_presence_is_always_true() {
        let mut p = person_with_day_cluster();
        let calendar = Calendar::new(2024, 1, 1, vec![], vec![]);
        p.update_presence(&calendar, true, false);
        assert!(p.presence.in_household);
    }

    #[test]
    fn day_cluster_absent_on_school_holiday() {
        let mut p = person_with_day_cluster();
        // 2024-01-01 is a Monday.
        let calendar = Calendar::new(2024, 1, 1, vec![], vec![(2024, 1, 1)]);
        p.update_presence(&calendar, true, true);
        assert!(!p.presence.in_day_cluster);
    }

    #[test]
    fn no_school_id_means_no_day_cluster_presence() {
        let mut p = person_with_day_cluster();
        p.day_cluster_id = 0;
        let calendar = Calendar::new(2024, 1, 1, vec![], vec![]);
        p.update_presence(&calendar, true, false);
        assert!(!p.presence.in_day_cluster);
    }
}
