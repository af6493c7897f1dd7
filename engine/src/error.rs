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

use thiserror::Error;

/// Top-level error type for the simulation core. Every fatal condition named
/// in the error-handling design (configuration, demographic infeasibility,
/// assembly inconsistency, runtime numeric anomaly, log I/O) has its own
/// variant so callers can match on category without parsing strings.
#[derive(Error, Debug)]
pub enum StrideError {
    #[error("configuration error in {file}: {message}")]
    Config { file: String, message: String },

    #[error("demographic sampling infeasible: {message}")]
    DemographicInfeasible { message: String },

    #[error("cluster assembly inconsistency: {message}")]
    AssemblyInconsistency { message: String },

    #[error("numeric anomaly: {message}")]
    NumericAnomaly { message: String },

    #[error("log output error (non-fatal): {0}")]
    LogIo(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV log output error (non-fatal): {0}")]
    CsvIo(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, StrideError>;
