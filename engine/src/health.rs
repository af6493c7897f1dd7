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

//! Per-person disease progression (component C).

use crate::custom_types::Day;
use crate::rng::RandomWrapper;

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum DiseaseState {
    Susceptible,
    Exposed,
    Infectious,
    InfectiousAndSymptomatic,
    Symptomatic,
    Recovered,
    Immune,
}

/// Per-person thresholds, sampled once at creation from the disease's
/// `time.*` histograms. Must satisfy
/// `start_infectiousness <= start_symptomatic
///      <= start_infectiousness + time_infectious
///      <= start_symptomatic + time_symptomatic`.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiseaseThresholds {
    pub start_infectiousness: Day,
    pub start_symptomatic: Day,
    pub time_infectious: Day,
    pub time_symptomatic: Day,
}

impl DiseaseThresholds {
    /// Builds thresholds from four raw draws, adjusting upward only as
    /// needed to satisfy the ordering invariant (never down, so the sampled
    /// distributions are respected as closely as the constraint allows).
    pub fn from_raw(start_infectiousness: Day, start_symptomatic: Day, time_infectious: Day, time_symptomatic: Day) -> Self {
        let start_infectiousness = start_infectiousness;
        let start_symptomatic = start_symptomatic.max(start_infectiousness);
        let symptomatic_onset = start_infectiousness + time_infectious;
        let time_infectious = time_infectious.max(start_symptomatic.saturating_sub(start_infectiousness));
        let symptomatic_onset = symptomatic_onset.max(start_infectiousness + time_infectious);
        let time_symptomatic = time_symptomatic.max(symptomatic_onset.saturating_sub(start_symptomatic));

        DiseaseThresholds { start_infectiousness, start_symptomatic, time_infectious, time_symptomatic }
    }

    fn symptomatic_onset_day(&self) -> Day {
        self.start_infectiousness + self.time_infectious
    }

    fn recovery_day(&self) -> Day {
        self.start_symptomatic + self.time_symptomatic
    }
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Health {
    pub state: DiseaseState,
    days_since_infection: Day,
    thresholds: DiseaseThresholds,
    /// Set when this person is the originally-seeded index case, or is a
    /// descendant of one, under index-case tracking mode (see §4.5).
    index_case_lineage: bool,
}

impl Health {
    pub fn new(thresholds: DiseaseThresholds) -> Health {
        Health { state: DiseaseState::Susceptible, days_since_infection: 0, thresholds, index_case_lineage: false }
    }

    pub fn is_susceptible(&self) -> bool {
        matches!(self.state, DiseaseState::Susceptible)
    }

    pub fn is_infectious(&self) -> bool {
        matches!(self.state, DiseaseState::Infectious | DiseaseState::InfectiousAndSymptomatic)
    }

    pub fn is_symptomatic(&self) -> bool {
        matches!(self.state, DiseaseState::InfectiousAndSymptomatic | DiseaseState::Symptomatic)
    }

    pub fn is_recovered(&self) -> bool {
        matches!(self.state, DiseaseState::Recovered | DiseaseState::Immune)
    }

    pub fn is_index_case_lineage(&self) -> bool {
        self.index_case_lineage
    }

    pub fn days_since_infection(&self) -> Day {
        self.days_since_infection
    }

    /// Legal only from `Susceptible`; a no-op otherwise, because two
    /// concurrent contact samplings within a single cluster-batch may both
    /// target the same newly-Exposed victim.
    pub fn start_infection(&mut self) {
        if self.is_susceptible() {
            self.state = DiseaseState::Exposed;
            self.days_since_infection = 0;
        }
    }

    /// Same no-op-on-non-Susceptible contract as [`Health::start_infection`],
    /// but additionally marks the victim as part of the index case's
    /// lineage, so transmissions downstream of this one are still counted
    /// when index-case tracking is enabled.
    pub fn start_infection_from_index_case(&mut self) {
        if self.is_susceptible() {
            self.state = DiseaseState::Exposed;
            self.days_since_infection = 0;
            self.index_case_lineage = true;
        }
    }

    /// Marks this person as the originally seeded index case.
    pub fn seed_as_index_case(&mut self) {
        self.state = DiseaseState::Exposed;
        self.days_since_infection = 0;
        self.index_case_lineage = true;
    }

    pub fn seed_recovered(&mut self) {
        self.state = DiseaseState::Recovered;
    }

    pub fn seed_immune(&mut self) {
        self.state = DiseaseState::Immune;
    }

    /// Advances one day. Post-Exposed persons increment their infection-day
    /// counter, then cascade through as many threshold transitions as the
    /// new day count satisfies (handles thresholds that coincide on the
    /// same day without getting stuck for a tick).
    pub fn update(&mut self) {
        if matches!(self.state, DiseaseState::Susceptible | DiseaseState::Recovered | DiseaseState::Immune) {
            return;
        }
        self.days_since_infection += 1;
        loop {
            let advanced = match self.state {
                DiseaseState::Exposed if self.days_since_infection >= self.thresholds.start_infectiousness => {
                    self.state = DiseaseState::Infectious;
                    true
                }
                DiseaseState::Infectious if self.days_since_infection >= self.thresholds.start_symptomatic => {
                    self.state = DiseaseState::InfectiousAndSymptomatic;
                    true
                }
                DiseaseState::Infectious | DiseaseState::InfectiousAndSymptomatic
                    if self.days_since_infection >= self.thresholds.symptomatic_onset_day() =>
                {
                    self.state = DiseaseState::Symptomatic;
                    true
                }
                DiseaseState::Symptomatic if self.days_since_infection >= self.thresholds.recovery_day() => {
                    self.state = DiseaseState::Recovered;
                    true
                }
                _ => false,
            };
            if !advanced {
                break;
            }
        }
    }
}

/// Draws a single set of per-person thresholds from the disease's weighted
/// histograms (`disease.time.*` in the config, see component I).
pub fn sample_thresholds(rng: &mut RandomWrapper, histograms: &crate::config::DiseaseTimeCharts) -> DiseaseThresholds {
    DiseaseThresholds::from_raw(
        rng.weighted(&histograms.start_infectiousness) as Day,
        rng.weighted(&histograms.start_symptomatic) as Day,
        rng.weighted(&histograms.time_infectious) as Day,
        rng.weighted(&histograms.time_symptomatic) as Day,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds(si: Day, ss: Day, ti: Day, ts: Day) -> DiseaseThresholds {
        DiseaseThresholds::from_raw(si, ss, ti, ts)
    }

    #[test]
    fn new_person_is_susceptible() {
        let health = Health::new(thresholds(2, 4, 3, 3));
        assert!(health.is_susceptible());
        assert_eq!(health.days_since_infection(), 0);
    }

    #[test]
    fn reinfecting_non_susceptible_is_a_noop() {
        let mut health = Health::new(thresholds(2, 4, 3, 3));
        health.start_infection();
        assert_eq!(health.state, DiseaseState::Exposed);
        health.start_infection();
        assert_eq!(health.state, DiseaseState::Exposed);
        assert_eq!(health.days_since_infection(), 0);
    }

    #[test]
    fn full_trajectory_is_monotonic() {
        let t = thresholds(2, 4, 3, 3);
        let mut health = Health::new(t);
        health.start_infection();
        let mut seen = vec![health.state];
        for _day in 1..20 {
            health.update();
            if seen.last() != Some(&health.state) {
                seen.push(health.state);
            }
            if health.is_recovered() {
                break;
            }
        }
        assert_eq!(
            seen,
            vec![
                DiseaseState::Exposed,
                DiseaseState::Infectious,
                DiseaseState::InfectiousAndSymptomatic,
                DiseaseState::Symptomatic,
                DiseaseState::Recovered,
            ]
        );
    }

    #[test]
    fn coincident_thresholds_cascade_same_day() {
        // start_infectiousness == start_symptomatic == symptomatic_onset == recovery_day
        let t = thresholds(1, 1, 0, 0);
        let mut health = Health::new(t);
        health.start_infection();
        health.update();
        assert_eq!(health.state, DiseaseState::Recovered);
    }

    #[test]
    fn recovered_never_regresses() {
        let mut health = Health::new(thresholds(1, 1, 1, 1));
        health.seed_recovered();
        for _day in 0..10 {
            health.update();
        }
        assert_eq!(health.state, DiseaseState::Recovered);
    }
}
