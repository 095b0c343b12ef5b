// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Command-line interface definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "mesogif",
    version,
    about = "Build looping GIFs from the archived SPC mesoanalysis images"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch an hour range for one parameter and write an animated GIF.
    Generate(GenerateArgs),
    /// List the available parameters by section.
    Parameters,
    /// Remove stale staged frames once.
    Clean(CleanArgs),
    /// Keep removing stale staged frames on an interval.
    Janitor(JanitorArgs),
    /// Print the location of the configuration file.
    ConfigPath,
}

#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Archive date (YYYY-MM-DD). Defaults to today (UTC).
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// First hour, UTC.
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=23))]
    pub start_hour: u8,

    /// Last hour, UTC (inclusive).
    #[arg(long, default_value_t = 12, value_parser = clap::value_parser!(u8).range(0..=23))]
    pub end_hour: u8,

    /// Parameter label (e.g. "MSL Pressure/Wind") or code (e.g. pmsl).
    #[arg(long, short)]
    pub parameter: String,

    /// Directory for the finished GIF.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Directory for staged frames.
    #[arg(long)]
    pub staging_dir: Option<PathBuf>,

    /// Archive root URL.
    #[arg(long)]
    pub archive_base: Option<String>,
}

#[derive(Parser, Debug)]
pub struct CleanArgs {
    /// Remove staged frames older than this many seconds.
    #[arg(long)]
    pub max_age_secs: Option<u64>,

    /// Directory for staged frames.
    #[arg(long)]
    pub staging_dir: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct JanitorArgs {
    /// Seconds between sweeps.
    #[arg(long)]
    pub interval_secs: Option<u64>,

    /// Remove staged frames older than this many seconds.
    #[arg(long)]
    pub max_age_secs: Option<u64>,

    /// Directory for staged frames.
    #[arg(long)]
    pub staging_dir: Option<PathBuf>,
}
