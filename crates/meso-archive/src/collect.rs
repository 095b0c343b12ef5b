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

//! Hour-range frame collection.

use std::path::Path;

use chrono::NaiveDate;
use log::{info, warn};

use crate::fetch::{FetchRequest, FrameFetcher, FrameSource, MAX_HOUR};
use crate::staging::{StagedFrame, StagingDir, StagingError};

/// Result of walking an hour range.
///
/// `frames` is in ascending hour order. Hours that could not be fetched,
/// decoded or staged are listed in `skipped`; they never leave a gap marker in
/// `frames`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collection {
    pub frames: Vec<StagedFrame>,
    pub skipped: Vec<u8>,
}

impl Collection {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.frames.iter().map(|f| f.path.as_path())
    }

    #[must_use]
    pub fn hours(&self) -> Vec<u8> {
        self.frames.iter().map(|f| f.hour).collect()
    }
}

/// Fetch and stage every hour in `start_hour..=end_hour`.
///
/// A reversed range yields an empty collection. Only a staging directory that
/// cannot be created is an error; per-hour failures are skipped.
pub fn collect<S: FrameSource>(
    fetcher: &FrameFetcher<S>,
    staging: &StagingDir,
    date: NaiveDate,
    start_hour: u8,
    end_hour: u8,
    code: &str,
) -> Result<Collection, StagingError> {
    staging.ensure()?;

    let mut collection = Collection::default();
    for hour in start_hour..=end_hour.min(MAX_HOUR) {
        let request = FetchRequest::new(date, hour, code);

        // The fetcher already logged why
        let Ok(frame) = fetcher.fetch(&request) else {
            collection.skipped.push(hour);
            continue;
        };

        match staging.persist(&frame) {
            Ok(staged) => collection.frames.push(staged),
            Err(e) => {
                warn!("{}", e);
                collection.skipped.push(hour);
            }
        }
    }

    info!(
        "Collected {} frame(s) for {} on {} ({} skipped)",
        collection.len(),
        code,
        date,
        collection.skipped.len()
    );

    Ok(collection)
}
