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

mod cli;
mod config;

use std::error::Error;
use std::fmt::Write as _;
use std::time::{Duration, SystemTime};

use chrono::{NaiveDate, Utc};
use clap::Parser;
use log::{info, warn};
use meso_archive::{
    evict_stale, Catalog, FrameFetcher, HttpSource, Janitor, Pipeline, PipelineError, RunRequest,
    SelectionError, StagingDir,
};

use cli::{CleanArgs, Cli, Command, GenerateArgs, JanitorArgs};
use config::AppConfig;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli, AppConfig::load) {
        eprintln!("error: {e}");

        let mut cause = e.source();
        while let Some(inner) = cause {
            eprintln!("  caused by: {inner}");
            cause = inner.source();
        }

        std::process::exit(1);
    }
}

/// Dispatch a parsed command. The configuration is only loaded by commands
/// that read it.
fn run<L>(cli: Cli, load_config: L) -> Result<(), Box<dyn Error>>
where
    L: FnOnce() -> Result<AppConfig, confy::ConfyError>,
{
    match cli.command {
        Command::Generate(args) => generate(&args, &load_config()?),
        Command::Parameters => {
            print!("{}", format_parameters(&Catalog::builtin()));
            Ok(())
        }
        Command::Clean(args) => {
            clean(&args, &load_config()?);
            Ok(())
        }
        Command::Janitor(args) => {
            janitor(&args, &load_config()?);
            Ok(())
        }
        Command::ConfigPath => {
            println!("{}", AppConfig::get_config_path()?.display());
            Ok(())
        }
    }
}

/// Turn command-line arguments into a run request.
///
/// Fails before any network access when the parameter does not resolve.
fn build_request(
    args: &GenerateArgs,
    catalog: &Catalog,
    today: NaiveDate,
) -> Result<RunRequest, SelectionError> {
    let param = catalog.resolve_selection(&args.parameter)?;
    info!("Selected {} ({})", param.label, param.code);

    Ok(RunRequest::new(
        args.date.unwrap_or(today),
        args.start_hour,
        args.end_hour,
        &param.code,
    ))
}

fn generate(args: &GenerateArgs, config: &AppConfig) -> Result<(), Box<dyn Error>> {
    let catalog = Catalog::builtin();
    let request = build_request(args, &catalog, Utc::now().date_naive())?;

    if request.start_hour > request.end_hour {
        warn!(
            "Start hour {} is after end hour {}; nothing will be fetched",
            request.start_hour, request.end_hour
        );
    }

    let archive_base = args
        .archive_base
        .clone()
        .unwrap_or_else(|| config.archive_base_url.clone());
    let staging = StagingDir::new(args.staging_dir.clone().unwrap_or_else(|| config.staging_dir()));
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| config.output_dir.clone());

    let source = HttpSource::new(&config.user_agent)?;
    let pipeline = Pipeline::new(FrameFetcher::new(source, archive_base), staging, output_dir);

    let report = match pipeline.run(&request) {
        Ok(report) => report,
        Err(e @ PipelineError::EmptyResult { .. }) => {
            warn!("{}", e);
            return Err("No GIF could be generated. Please check your inputs.".into());
        }
        Err(e) => return Err(e.into()),
    };

    println!("GIF generated successfully!");
    println!("  file:    {}", report.artifact.path.display());
    println!("  type:    {}", report.artifact.media_type());
    println!("  frames:  {}", report.artifact.frame_count);
    if report.is_partial() {
        let skipped: Vec<String> = report.skipped.iter().map(|h| format!("{h:02}z")).collect();
        println!("  skipped: {}", skipped.join(", "));
    }

    Ok(())
}

fn clean(args: &CleanArgs, config: &AppConfig) {
    let dir = args.staging_dir.clone().unwrap_or_else(|| config.staging_dir());
    let max_age = args
        .max_age_secs
        .map_or_else(|| config.stale_after(), Duration::from_secs);

    let removed = evict_stale(&dir, max_age, SystemTime::now());
    println!("Removed {removed} stale file(s) from {}", dir.display());
}

fn janitor(args: &JanitorArgs, config: &AppConfig) {
    let dir = args.staging_dir.clone().unwrap_or_else(|| config.staging_dir());
    let max_age = args
        .max_age_secs
        .map_or_else(|| config.stale_after(), Duration::from_secs);
    let interval = args
        .interval_secs
        .map_or_else(|| config.janitor_interval(), Duration::from_secs);

    // Runs until the process is interrupted
    Janitor::spawn(dir, max_age, interval).wait();
}

/// Catalog listing, one header per non-empty section.
fn format_parameters(catalog: &Catalog) -> String {
    let mut out = String::new();
    for section in catalog.sections().iter().filter(|s| !s.entries.is_empty()) {
        let _ = writeln!(out, "{}", section.header());
        for entry in &section.entries {
            let _ = writeln!(out, "  {:<6} {}", entry.code, entry.label);
        }
    }
    out
}
