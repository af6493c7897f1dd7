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

use std::process::ExitCode;

use clap::Parser;
use log::info;

use stride_engine::config::Config;
use stride_engine::simulator::Simulator;

#[derive(Parser)]
#[command(author, version, about = "Agent-based epidemic micro-simulator")]
struct Args {
    #[arg(short, long, value_name = "FILE", help = "Path to the run's JSON configuration file")]
    config: String,

    #[arg(short, long, help = "Override run.num_threads")]
    threads: Option<u32>,

    #[arg(short, long, help = "Override run.rng_seed")]
    seed: Option<u64>,

    #[arg(short, long, help = "Override run.num_days")]
    days: Option<u32>,
}

fn run(args: Args) -> stride_engine::Result<()> {
    let mut config = Config::read(&args.config)?;
    if let Some(threads) = args.threads {
        config.run.num_threads = threads;
    }
    if let Some(seed) = args.seed {
        config.run.rng_seed = seed;
    }
    if let Some(days) = args.days {
        config.run.num_days = days;
    }

    let mut simulator = Simulator::from_config(&config)?;
    let reports = simulator.run(config.run.num_days)?;

    for report in reports {
        info!("day {} population {} infected {}", report.day, report.population_size, report.infected_count);
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("stride: {}", err);
            ExitCode::FAILURE
        }
    }
}
