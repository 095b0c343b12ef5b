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

//! End-to-end run: collect an hour range, then assemble the animation.
//!
//! A run is fully described by a [`RunRequest`]. The fetch source, staging
//! directory and output directory are handed in by the caller, so nothing
//! here depends on process-wide state.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use log::info;
use thiserror::Error;

use crate::assemble::{assemble, AssembleError, MEDIA_TYPE};
use crate::collect::collect;
use crate::fetch::{FrameFetcher, FrameSource};
use crate::staging::{StagingDir, StagingError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no frames could be fetched for the {requested} requested hour(s)")]
    EmptyResult { requested: usize },

    #[error(transparent)]
    Staging(#[from] StagingError),

    #[error(transparent)]
    Assemble(#[from] AssembleError),

    #[error("failed to create output directory {}: {source}", path.display())]
    OutputDir { path: PathBuf, source: io::Error },
}

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub date: NaiveDate,
    pub start_hour: u8,
    pub end_hour: u8,
    pub code: String,
}

impl RunRequest {
    pub fn new(date: NaiveDate, start_hour: u8, end_hour: u8, code: impl Into<String>) -> Self {
        Self {
            date,
            start_hour,
            end_hour,
            code: code.into(),
        }
    }

    /// Artifact name, e.g. `20240501_0z-2z_pmsl.gif`
    #[must_use]
    pub fn output_file_name(&self) -> String {
        format!(
            "{}_{}z-{}z_{}.gif",
            self.date.format("%Y%m%d"),
            self.start_hour,
            self.end_hour,
            self.code
        )
    }

    /// Number of hours in the range (zero when reversed)
    #[must_use]
    pub fn hour_count(&self) -> usize {
        if self.start_hour > self.end_hour {
            0
        } else {
            usize::from(self.end_hour - self.start_hour) + 1
        }
    }
}

/// The animated GIF produced by a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationArtifact {
    pub path: PathBuf,
    pub frame_count: usize,
    /// Hour of each frame, ascending
    pub hours: Vec<u8>,
}

impl AnimationArtifact {
    #[must_use]
    pub fn media_type(&self) -> &'static str {
        MEDIA_TYPE
    }

    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

/// Artifact plus the hours that had to be left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub artifact: AnimationArtifact,
    pub skipped: Vec<u8>,
}

impl RunReport {
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.skipped.is_empty()
    }
}

/// Collector + assembler wired to one source and one pair of directories.
#[derive(Debug)]
pub struct Pipeline<S> {
    fetcher: FrameFetcher<S>,
    staging: StagingDir,
    output_dir: PathBuf,
}

impl<S: FrameSource> Pipeline<S> {
    pub fn new(fetcher: FrameFetcher<S>, staging: StagingDir, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            staging,
            output_dir: output_dir.into(),
        }
    }

    #[must_use]
    pub fn staging(&self) -> &StagingDir {
        &self.staging
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Run one generation to completion.
    pub fn run(&self, request: &RunRequest) -> Result<RunReport, PipelineError> {
        info!(
            "Generating GIF for {} from {}:00 to {}:00 UTC on {}",
            request.code,
            request.start_hour,
            request.end_hour,
            request.date.format("%Y%m%d")
        );

        let collection = collect(
            &self.fetcher,
            &self.staging,
            request.date,
            request.start_hour,
            request.end_hour,
            &request.code,
        )?;

        if collection.is_empty() {
            return Err(PipelineError::EmptyResult {
                requested: request.hour_count(),
            });
        }

        fs::create_dir_all(&self.output_dir).map_err(|source| PipelineError::OutputDir {
            path: self.output_dir.clone(),
            source,
        })?;

        let output = self.output_dir.join(request.output_file_name());
        let paths: Vec<&Path> = collection.paths().collect();
        let Some(path) = assemble(&paths, &output)? else {
            return Err(PipelineError::EmptyResult {
                requested: request.hour_count(),
            });
        };

        Ok(RunReport {
            artifact: AnimationArtifact {
                path,
                frame_count: collection.len(),
                hours: collection.hours(),
            },
            skipped: collection.skipped,
        })
    }
}
