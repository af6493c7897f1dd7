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

//! Day-advancing scheduler (component H): owns Population, Clusters,
//! Calendar and the per-thread RNG streams, and composes one simulated day.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use rayon::ThreadPool;

use crate::assembly::{self, AssembledClusters};
use crate::calendar::Calendar;
use crate::cell::PopulationCell;
use crate::cluster::{self, Cluster, ClusterKind, ContactMatrix, DayClusterKind, KernelEvent};
use crate::config::Config;
use crate::custom_types::Day;
use crate::error::{Result, StrideError};
use crate::health::DiseaseState;
use crate::logging::Logger;
use crate::person::Person;
use crate::population;
use crate::rng::{RandomWrapper, RngPool};

/// Delegated persistence hook consulted when the checkpoint interval elapses
/// (§5). HDF5 persistence itself is out of scope; the core only offers the
/// seam.
pub trait CheckpointSink: Send + Sync {
    fn persist(&self, day: Day, population: &[Person]) -> Result<()>;
}

/// Default sink: does nothing. Used when no external collaborator is wired.
pub struct NoopCheckpointSink;

impl CheckpointSink for NoopCheckpointSink {
    fn persist(&self, _day: Day, _population: &[Person]) -> Result<()> {
        Ok(())
    }
}

struct RateMatrices {
    household: ContactMatrix,
    school: ContactMatrix,
    work: ContactMatrix,
    home_district: ContactMatrix,
    day_district: ContactMatrix,
}

/// Per-day aggregate counters exposed between days (§4.8).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DayReport {
    pub day: Day,
    pub population_size: usize,
    pub infected_count: usize,
}

pub struct Simulator {
    population: PopulationCell,
    clusters: AssembledClusters,
    rates: RateMatrices,
    beta: f64,
    calendar: Calendar,
    index_case_mode: bool,
    log_level: crate::config::LogLevel,
    logger: Logger,
    pool: ThreadPool,
    rng_pool: RngPool,
    interrupt: Arc<AtomicBool>,
    checkpoint_interval: Arc<AtomicU64>,
    checkpoint_sink: Box<dyn CheckpointSink>,
}

fn scaled_matrix(cfg: &crate::config::ContactMatrixConfig, average_size: f64) -> Result<ContactMatrix> {
    if average_size <= 0.0 {
        return Err(StrideError::NumericAnomaly { message: "average cluster size must be positive to derive a contact rate".into() });
    }
    Ok(ContactMatrix::from_config(cfg).scaled_by(average_size))
}

impl Simulator {
    /// Builds the full initial state: population (F), cluster assembly (G),
    /// rate-matrix calibration, and the worker pool (§4.8, §5).
    pub fn from_config(config: &Config) -> Result<Simulator> {
        let mut init_rng = RandomWrapper::new(config.run.rng_seed, 1, 0);
        let mut persons = population::generate_population(&mut init_rng, &config.population, &config.disease.time)?;

        let seed_count = (config.run.initial_seed_count as usize).min(persons.len());
        for (i, person) in persons.iter_mut().enumerate().take(seed_count) {
            if i == 0 {
                person.health.seed_as_index_case();
            } else {
                person.health.start_infection_from_index_case();
            }
        }

        let clusters = assembly::assemble(&mut persons);

        // The school/work split only changes which rate table a day-cluster
        // batch consults (§4.5, scenario 6); the divisor is the average
        // size of the single "day cluster" kind, school and work pooled
        // together, matching the per-kind (not per-sub-kind) averaging
        // component H describes (§4.8, Open Question (a)).
        let day_cluster_avg = assembly::average_size(&clusters.day_cluster);
        let rates = RateMatrices {
            household: scaled_matrix(&config.matrices.household, assembly::average_size(&clusters.household))?,
            school: scaled_matrix(&config.matrices.school, day_cluster_avg)?,
            work: scaled_matrix(&config.matrices.work, day_cluster_avg)?,
            home_district: scaled_matrix(&config.matrices.home_district, assembly::average_size(&clusters.home_district))?,
            day_district: scaled_matrix(&config.matrices.day_district, assembly::average_size(&clusters.day_district))?,
        };

        let beta = config.disease.transmission.beta(config.run.r0)?;
        let num_threads = config.run.num_threads.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads as usize)
            .build()
            .map_err(|e| StrideError::AssemblyInconsistency { message: format!("failed to build worker pool: {}", e) })?;
        let rng_pool = RngPool::new(RandomWrapper::for_pool(config.run.rng_seed, num_threads));

        let calendar = Calendar::new(
            config.calendar.start_year,
            config.calendar.start_month,
            config.calendar.start_day,
            config.calendar.holidays.clone(),
            config.calendar.school_holidays.clone(),
        );

        let csv_sink = match &config.logging.output_csv_prefix {
            Some(prefix) => {
                let file = std::fs::File::create(format!("{}.csv", prefix))?;
                Some(crate::logging::CsvSink::new(file)?)
            }
            None => None,
        };
        let logger = Logger::new(config.run.log_level, csv_sink);

        Ok(Simulator {
            population: PopulationCell::new(persons),
            clusters,
            rates,
            beta,
            calendar,
            index_case_mode: config.run.index_case_mode,
            log_level: config.run.log_level,
            logger,
            pool,
            rng_pool,
            interrupt: Arc::new(AtomicBool::new(false)),
            checkpoint_interval: Arc::new(AtomicU64::new(0)),
            checkpoint_sink: Box::new(NoopCheckpointSink),
        })
    }

    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        self.interrupt.clone()
    }

    pub fn checkpoint_interval_handle(&self) -> Arc<AtomicU64> {
        self.checkpoint_interval.clone()
    }

    pub fn set_checkpoint_sink(&mut self, sink: Box<dyn CheckpointSink>) {
        self.checkpoint_sink = sink;
    }

    fn rate_matrix_for(&self, kind: ClusterKind) -> &ContactMatrix {
        match kind {
            ClusterKind::Household => &self.rates.household,
            ClusterKind::HomeDistrict => &self.rates.home_district,
            ClusterKind::DayCluster(DayClusterKind::School) => &self.rates.school,
            ClusterKind::DayCluster(DayClusterKind::Work) => &self.rates.work,
            ClusterKind::DayDistrict => &self.rates.day_district,
        }
    }

    fn update_batch(&self, clusters: &[Cluster], day: Day) -> Vec<KernelEvent> {
        let beta = self.beta;
        let index_case_mode = self.index_case_mode;
        let log_level = self.log_level;
        let population = &self.population;
        let rng_pool = &self.rng_pool;

        self.pool.install(|| {
            clusters
                .par_iter()
                .flat_map_iter(|cluster| {
                    let worker = rayon::current_thread_index().unwrap_or(0);
                    let rng = rng_pool.get(worker);
                    let matrix = self.rate_matrix_for(cluster.kind);
                    let mut events = Vec::new();
                    cluster::update_cluster(cluster, population, matrix, beta, day, index_case_mode, log_level, rng, &mut events);
                    events.into_iter()
                })
                .collect()
        })
    }

    /// Runs one simulated day: the four cluster-kind batches in their fixed
    /// serialization order, then presence + health updates, then the
    /// calendar advance (§4.8, §5).
    pub fn step(&mut self) -> Result<DayReport> {
        let day = self.calendar.day_index();

        let mut events = self.update_batch(&self.clusters.household, day);
        events.extend(self.update_batch(&self.clusters.day_cluster, day));
        events.extend(self.update_batch(&self.clusters.home_district, day));
        events.extend(self.update_batch(&self.clusters.day_district, day));

        self.logger.record_day(&events)?;

        for person_id in 0..self.population.len() {
            let day_cluster_is_school = {
                let id = self.population.get(person_id).day_cluster_id;
                id != 0 && self.clusters.day_cluster[(id - 1) as usize].kind == ClusterKind::DayCluster(DayClusterKind::School)
            };
            let is_school_holiday = self.calendar.is_school_holiday();
            let person = self.population.get_mut(person_id);
            person.update_presence(&self.calendar, day_cluster_is_school, is_school_holiday);
            person.health.update();
        }

        self.calendar.advance();

        if self.checkpoint_interval.load(Ordering::Relaxed) > 0 && u64::from(day) % self.checkpoint_interval.load(Ordering::Relaxed) == 0 {
            self.checkpoint_sink.persist(day, self.population_snapshot().as_slice())?;
        }

        Ok(DayReport { day, population_size: self.population.len(), infected_count: self.infected_count() })
    }

    /// Runs `num_days` days, or fewer if the cooperative-interrupt flag is
    /// set between days (consulted only at day boundaries, §5).
    pub fn run(&mut self, num_days: u32) -> Result<Vec<DayReport>> {
        let mut reports = Vec::with_capacity(num_days as usize);
        for _ in 0..num_days {
            if self.interrupt.load(Ordering::Relaxed) {
                break;
            }
            reports.push(self.step()?);
        }
        Ok(reports)
    }

    /// Count of persons who have ever left `Susceptible` (an "ever infected"
    /// counter, including `Recovered`/`Immune`). Scenario 1 (spec.md §8)
    /// requires this to stay constant at `r0 = 0` for the full run, which
    /// only holds if recovering doesn't drop someone out of the count.
    pub fn infected_count(&self) -> usize {
        self.population.iter().filter(|p| !matches!(p.health.state, DiseaseState::Susceptible)).count()
    }

    fn population_snapshot(&self) -> Vec<Person> {
        self.population.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CalendarConfig, ContactEntry, AgeBucketEntry, Disease, DiseaseTimeCharts, LogLevel, Matrices, PopulationConfig, Range, RunConfig, Transmission};

    fn flat_matrix(rate: f64) -> crate::config::ContactMatrixConfig {
        (0..20).map(|b| AgeBucketEntry { age_bucket: b, contacts: (0..20).map(|t| ContactEntry { target_age_bucket: t, rate }).collect() }).collect()
    }

    fn tiny_config(population_size: u32, r0: f64, seed: u64, num_days: u32) -> Config {
        Config {
            run: RunConfig {
                r0,
                rng_seed: seed,
                log_level: LogLevel::None,
                disease_config_file: "unused.json".into(),
                age_contact_matrix_file: "contact_matrix.xml".into(),
                num_days,
                num_threads: 1,
                initial_seed_count: 1,
                index_case_mode: false,
            },
            disease: Disease {
                transmission: Transmission { b0: 0.0, b1: 1.0 },
                time: DiseaseTimeCharts {
                    start_infectiousness: vec![(2, 1.0)],
                    start_symptomatic: vec![(4, 1.0)],
                    time_infectious: vec![(3, 1.0)],
                    time_symptomatic: vec![(3, 1.0)],
                },
            },
            matrices: Matrices {
                household: flat_matrix(1.0),
                home_district: flat_matrix(0.1),
                work: flat_matrix(0.1),
                school: flat_matrix(0.1),
                day_district: flat_matrix(0.1),
            },
            population: PopulationConfig {
                population_size,
                household_size_distribution: vec![(2, 1.0)],
                child_maximum_age: 17,
                child_age_gap: Range { min: 0, max: 10 },
                child_parent_minimum_gap: 15,
                parent_age_range: Range { min: 20, max: 70 },
                parent_parent_gap: Range { min: 0, max: 20 },
                live_alone_minimum_age: 18,
                age_max: 90,
                kindergarten_age: 3,
                primary_age: 6,
                secondary_age: 12,
                graduation_age: 18,
                higher_education_age: 18,
                p_higher_education: 0.0,
                work_age_range: Range { min: 18, max: 65 },
                p_employed: 0.0,
                mean_school_size: 200,
                mean_work_size: 50,
                mean_community_size: 500,
                p_immune: 0.0,
            },
            calendar: CalendarConfig { start_year: 2024, start_month: 1, start_day: 1, holidays: vec![], school_holidays: vec![] },
            logging: Default::default(),
        }
    }

    #[test]
    fn zero_r0_keeps_infected_count_constant() {
        let config = tiny_config(100, 0.0, 1, 10);
        let mut sim = Simulator::from_config(&config).unwrap();
        let initial = sim.infected_count();
        let reports = sim.run(10).unwrap();
        assert!(reports.iter().all(|r| r.infected_count == initial));
    }

    #[test]
    fn cooperative_interrupt_stops_before_num_days() {
        let config = tiny_config(20, 0.0, 2, 30);
        let mut sim = Simulator::from_config(&config).unwrap();
        let flag = sim.interrupt_flag();
        flag.store(true, Ordering::Relaxed);
        let reports = sim.run(30).unwrap();
        assert!(reports.is_empty());
    }
}
