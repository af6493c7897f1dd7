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

//! Typed access to disease/contact/run parameters (component I).
//!
//! The original collaborator reads an XML tree; that parsing step is out of
//! scope here (§1), so the concrete surface is a single JSON document with
//! the same key structure named in spec §6. Unknown or missing required
//! keys are rejected at load time via [`StrideError::Config`], never at use.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::custom_types::AgeBucket;
use crate::error::{Result, StrideError};

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum LogLevel {
    None,
    Transmissions,
    Contacts,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunConfig {
    pub r0: f64,
    pub rng_seed: u64,
    pub log_level: LogLevel,
    pub disease_config_file: String,
    #[serde(default = "default_contact_matrix_file")]
    pub age_contact_matrix_file: String,
    pub num_days: u32,
    #[serde(default = "default_num_threads")]
    pub num_threads: u32,
    /// Not part of the external interface named in spec §6, but initial
    /// conditions have to come from somewhere: this many persons (by
    /// generation order) are seeded as infected at construction time.
    #[serde(default)]
    pub initial_seed_count: u32,
    /// When set, the kernel suppresses all secondary seeding outside the
    /// lineage of the initially-seeded index case(s) (§4.5).
    #[serde(default)]
    pub index_case_mode: bool,
}

fn default_contact_matrix_file() -> String {
    "contact_matrix.xml".to_string()
}

fn default_num_threads() -> u32 {
    4
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct Transmission {
    pub b0: f64,
    pub b1: f64,
}

impl Transmission {
    /// Linear calibration of the transmission rate from the requested R0
    /// (§4.5): `beta = (r0 - b0) / b1`.
    pub fn beta(&self, r0: f64) -> Result<f64> {
        if self.b1 == 0.0 {
            return Err(StrideError::NumericAnomaly { message: "disease.transmission.b1 must be nonzero".into() });
        }
        let beta = (r0 - self.b0) / self.b1;
        if !beta.is_finite() || beta < 0.0 {
            return Err(StrideError::NumericAnomaly { message: format!("calibrated beta {} is not a valid probability", beta) });
        }
        Ok(beta)
    }
}

/// A weighted histogram: `(value, weight)` pairs sampled per person at
/// generation time.
pub type Histogram = Vec<(u32, f64)>;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiseaseTimeCharts {
    pub start_infectiousness: Histogram,
    pub start_symptomatic: Histogram,
    pub time_infectious: Histogram,
    pub time_symptomatic: Histogram,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Disease {
    pub transmission: Transmission,
    pub time: DiseaseTimeCharts,
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct ContactEntry {
    pub target_age_bucket: AgeBucket,
    pub rate: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgeBucketEntry {
    pub age_bucket: AgeBucket,
    pub contacts: Vec<ContactEntry>,
}

pub type ContactMatrixConfig = Vec<AgeBucketEntry>;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Matrices {
    pub household: ContactMatrixConfig,
    pub home_district: ContactMatrixConfig,
    pub work: ContactMatrixConfig,
    pub school: ContactMatrixConfig,
    pub day_district: ContactMatrixConfig,
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct Range {
    pub min: u32,
    pub max: u32,
}

/// Parameters for the population generator (component F). Not part of the
/// external interface named in spec §6, but required for F to be
/// configurable rather than hard-coded; see SPEC_FULL.md §4.9/4.6.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PopulationConfig {
    pub population_size: u32,
    /// `(household size, weight)` pairs.
    pub household_size_distribution: Histogram,
    pub child_maximum_age: u32,
    pub child_age_gap: Range,
    pub child_parent_minimum_gap: u32,
    pub parent_age_range: Range,
    pub parent_parent_gap: Range,
    pub live_alone_minimum_age: u32,
    pub age_max: u32,
    pub kindergarten_age: u32,
    pub primary_age: u32,
    pub secondary_age: u32,
    pub graduation_age: u32,
    pub higher_education_age: u32,
    pub p_higher_education: f64,
    pub work_age_range: Range,
    pub p_employed: f64,
    pub mean_school_size: u32,
    pub mean_work_size: u32,
    pub mean_community_size: u32,
    /// Fraction of generated persons seeded directly into `Immune` (e.g.
    /// pre-existing vaccination/prior exposure in the source population)
    /// rather than `Susceptible`. Defaults to 0, i.e. nobody starts immune.
    #[serde(default)]
    pub p_immune: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CalendarConfig {
    pub start_year: i32,
    pub start_month: u32,
    pub start_day: u32,
    #[serde(default)]
    pub holidays: Vec<(i32, u32, u32)>,
    #[serde(default)]
    pub school_holidays: Vec<(i32, u32, u32)>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    pub output_csv_prefix: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub run: RunConfig,
    pub disease: Disease,
    pub matrices: Matrices,
    pub population: PopulationConfig,
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn check_histogram(file: &str, key: &str, histogram: &Histogram) -> Result<()> {
    let total: f64 = histogram.iter().map(|(_, w)| w).sum();
    if histogram.is_empty() || total <= 0.0 {
        return Err(StrideError::Config { file: file.to_string(), message: format!("{} must have at least one entry with positive weight", key) });
    }
    Ok(())
}

impl Config {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Config> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| StrideError::Config { file: path.display().to_string(), message: e.to_string() })?;
        let reader = BufReader::new(file);
        let config: Config =
            serde_json::from_reader(reader).map_err(|e| StrideError::Config { file: path.display().to_string(), message: e.to_string() })?;
        config.validate(&path.display().to_string())?;
        Ok(config)
    }

    /// Rejects weighted histograms with no positive total weight at load
    /// time, so [`crate::rng::RandomWrapper::weighted`] can assume every
    /// histogram it is handed is already well-formed (§7: configuration
    /// errors are fatal at startup, never a panic deep in generation).
    fn validate(&self, file: &str) -> Result<()> {
        check_histogram(file, "disease.time.start_infectiousness", &self.disease.time.start_infectiousness)?;
        check_histogram(file, "disease.time.start_symptomatic", &self.disease.time.start_symptomatic)?;
        check_histogram(file, "disease.time.time_infectious", &self.disease.time.time_infectious)?;
        check_histogram(file, "disease.time.time_symptomatic", &self.disease.time.time_symptomatic)?;
        check_histogram(file, "population.household_size_distribution", &self.population.household_size_distribution)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beta_calibration_matches_linear_formula() {
        let t = Transmission { b0: 1.0, b1: 2.0 };
        assert_eq!(t.beta(5.0).unwrap(), 2.0);
    }

    #[test]
    fn beta_rejects_non_finite_result() {
        let t = Transmission { b0: 0.0, b1: 0.0 };
        assert!(t.beta(5.0).is_err());
    }

    #[test]
    fn beta_rejects_negative_result() {
        let t = Transmission { b0: 10.0, b1: 1.0 };
        assert!(t.beta(1.0).is_err());
    }

    #[test]
    fn missing_config_file_is_a_config_error() {
        let result = Config::read("/nonexistent/path/stride.json");
        assert!(matches!(result, Err(StrideError::Config { .. })));
    }

    #[test]
    fn all_zero_weight_histogram_is_rejected() {
        let result = check_histogram("disease.json", "disease.time.start_infectiousness", &vec![(1, 0.0), (2, 0.0)]);
        assert!(matches!(result, Err(StrideError::Config { .. })));
    }

    #[test]
    fn empty_histogram_is_rejected() {
        let result = check_histogram("disease.json", "disease.time.start_infectiousness", &Vec::new());
        assert!(result.is_err());
    }
}
