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

//! Output log (component J, §6): emits kernel events via the `log` facade
//! and, optionally, mirrors them to a per-run CSV file.
//!
//! The core never picks a logging backend itself — the `app` crate wires
//! `env_logger` at startup, same split as the teacher's `engine` /
//! `engine-app`. The CSV mirror is an ambient extra for external
//! collaborators that want structured event capture without scraping logs.

use std::io::Write;

use crate::cluster::KernelEvent;
use crate::config::LogLevel;
use crate::error::Result;

/// Sink for one run's worth of [`KernelEvent`]s, flushed once per day.
pub trait EventSink {
    fn record(&mut self, events: &[KernelEvent]) -> Result<()>;
    fn flush_day(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Emits events through the `log` facade at the granularity named in §6:
/// `day cluster_id cluster_kind infector_id victim_id` for transmissions,
/// `day cluster_id i j` for contacts.
#[derive(Default)]
pub struct FacadeSink;

impl EventSink for FacadeSink {
    fn record(&mut self, events: &[KernelEvent]) -> Result<()> {
        for event in events {
            match event {
                KernelEvent::Transmission { day, cluster_id, cluster_kind, infector_id, victim_id } => {
                    debug!("{} {} {} {} {}", day, cluster_id, cluster_kind.label(), infector_id, victim_id);
                }
                KernelEvent::Contact { day, cluster_id, i, j } => {
                    trace!("{} {} {} {}", day, cluster_id, i, j);
                }
            }
        }
        Ok(())
    }
}

/// Mirrors the same events to a CSV file, one row per event, flushed at the
/// end of each day.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvSink<W> {
    pub fn new(inner: W) -> Result<CsvSink<W>> {
        let mut writer = csv::Writer::from_writer(inner);
        writer.write_record(["day", "cluster_id", "cluster_kind", "kind", "a", "b"])?;
        Ok(CsvSink { writer })
    }
}

impl<W: Write> EventSink for CsvSink<W> {
    fn record(&mut self, events: &[KernelEvent]) -> Result<()> {
        for event in events {
            match event {
                KernelEvent::Transmission { day, cluster_id, cluster_kind, infector_id, victim_id } => {
                    self.writer.write_record(&[
                        day.to_string(),
                        cluster_id.to_string(),
                        cluster_kind.label().to_string(),
                        "transmission".to_string(),
                        infector_id.to_string(),
                        victim_id.to_string(),
                    ])?;
                }
                KernelEvent::Contact { day, cluster_id, i, j } => {
                    self.writer.write_record(&[
                        day.to_string(),
                        cluster_id.to_string(),
                        "".to_string(),
                        "contact".to_string(),
                        i.to_string(),
                        j.to_string(),
                    ])?;
                }
            }
        }
        Ok(())
    }

    fn flush_day(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Dispatches to zero, one or both sinks depending on `log_level` and
/// whether a CSV mirror was configured (§4.9 `logging.output_csv_prefix`).
pub struct Logger {
    log_level: LogLevel,
    csv: Option<CsvSink<std::fs::File>>,
}

impl Logger {
    pub fn new(log_level: LogLevel, csv: Option<CsvSink<std::fs::File>>) -> Logger {
        Logger { log_level, csv }
    }

    pub fn record_day(&mut self, events: &[KernelEvent]) -> Result<()> {
        if self.log_level == LogLevel::None {
            return Ok(());
        }
        let mut facade = FacadeSink;
        facade.record(events)?;
        if let Some(csv) = &mut self.csv {
            csv.record(events)?;
            csv.flush_day()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ClusterKind;

    #[test]
    fn csv_sink_writes_one_row_per_event() {
        let buffer: Vec<u8> = Vec::new();
        let mut sink = CsvSink::new(buffer).unwrap();
        sink.record(&[KernelEvent::Transmission {
            day: 3,
            cluster_id: 7,
            cluster_kind: ClusterKind::Household,
            infector_id: 1,
            victim_id: 2,
        }])
        .unwrap();
        sink.flush_day().unwrap();

        let written = sink.writer.into_inner().unwrap();
        let text = String::from_utf8(written).unwrap();
        assert!(text.contains("household"));
        assert!(text.contains("transmission"));
    }

    #[test]
    fn log_level_none_suppresses_all_recording() {
        let mut logger = Logger::new(LogLevel::None, None);
        let events = vec![KernelEvent::Contact { day: 1, cluster_id: 1, i: 0, j: 1 }];
        assert!(logger.record_day(&events).is_ok());
    }
}
