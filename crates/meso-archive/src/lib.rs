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

//! Mesoanalysis archive client and GIF builder.
//!
//! This library fetches hourly still images from the SPC mesoanalysis archive
//! and stitches them into a looping animated GIF. It is split into layers that
//! can be used on their own or together:
//!
//! - **Catalog**: parameter labels, sections and archive codes
//! - **Fetch**: URL construction, one blocking GET per frame, transparency
//!   flattening onto white
//! - **Collect / staging**: walking an hour range and writing frames to a
//!   staging directory, skipping hours that fail
//! - **Assemble**: encoding staged frames as an infinitely looping GIF
//! - **Pipeline**: collect + assemble for one [`RunRequest`]
//!
//! # Quick Start
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use meso_archive::{
//!     Catalog, FrameFetcher, HttpSource, Pipeline, RunRequest, StagingDir,
//!     DEFAULT_ARCHIVE_BASE,
//! };
//!
//! let catalog = Catalog::builtin();
//! let param = catalog.resolve_selection("MSL Pressure/Wind").unwrap();
//!
//! let source = HttpSource::new("mesogif").unwrap();
//! let pipeline = Pipeline::new(
//!     FrameFetcher::new(source, DEFAULT_ARCHIVE_BASE),
//!     StagingDir::new("images"),
//!     ".",
//! );
//!
//! let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
//! let report = pipeline.run(&RunRequest::new(date, 0, 12, &param.code)).unwrap();
//! println!("{} frames -> {}", report.artifact.frame_count, report.artifact.path.display());
//! ```
//!
//! # Catalog Lookups
//!
//! ```
//! use meso_archive::Catalog;
//!
//! let catalog = Catalog::builtin();
//! assert_eq!(catalog.by_label("0-6km Shear Vector").unwrap().code, "shr6");
//! assert!(catalog.resolve_selection("--- Wind Shear ---").is_err());
//! ```

pub mod assemble;
pub mod catalog;
pub mod collect;
pub mod fetch;
pub mod pipeline;
pub mod staging;

#[cfg(test)]
mod test_support;

pub use assemble::{assemble, AssembleError, FRAME_DELAY_MS, MEDIA_TYPE};
pub use catalog::{Catalog, ParameterEntry, Section, SelectionError};
pub use collect::{collect, Collection};
pub use fetch::{
    FetchRequest, Frame, FrameError, FrameFetcher, FrameSource, HttpSource, SourceError,
    DEFAULT_ARCHIVE_BASE, MAX_HOUR,
};
pub use pipeline::{AnimationArtifact, Pipeline, PipelineError, RunReport, RunRequest};
pub use staging::{evict_stale, Janitor, StagedFrame, StagingDir, StagingError};
