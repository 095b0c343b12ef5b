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

//! On-disk staging of fetched frames.
//!
//! Frames are written as single-image GIFs named `{HH}_{code}.gif` and read
//! back by the assembler within the same run. Nothing in a generation run
//! deletes them; stale files are removed out-of-band by [`evict_stale`] or a
//! background [`Janitor`].

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime};

use image::codecs::gif::GifEncoder;
use image::ExtendedColorType;
use log::{debug, info, warn};
use thiserror::Error;

use crate::fetch::Frame;

/// NeuQuant sampling factor for staged frames (1 = best, 30 = fastest)
const STAGING_QUANTIZE_SPEED: i32 = 10;

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("failed to create staging directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to write frame {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to encode frame {}: {source}", path.display())]
    Encode { path: PathBuf, source: image::ImageError },
}

/// A frame that has been written to the staging directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFrame {
    pub hour: u8,
    pub path: PathBuf,
}

/// Directory holding staged frames.
#[derive(Debug, Clone)]
pub struct StagingDir {
    root: PathBuf,
}

impl StagingDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the directory if it does not exist yet
    pub fn ensure(&self) -> Result<(), StagingError> {
        fs::create_dir_all(&self.root).map_err(|source| StagingError::CreateDir {
            path: self.root.clone(),
            source,
        })
    }

    /// Write a frame to `{HH}_{code}.gif`, replacing any previous file.
    pub fn persist(&self, frame: &Frame) -> Result<StagedFrame, StagingError> {
        let path = self.root.join(frame.request.file_name());

        let file = File::create(&path).map_err(|source| StagingError::Write {
            path: path.clone(),
            source,
        })?;

        let mut encoder = GifEncoder::new_with_speed(file, STAGING_QUANTIZE_SPEED);
        let encoded = encoder.encode(
            frame.image.as_raw(),
            frame.image.width(),
            frame.image.height(),
            ExtendedColorType::Rgb8,
        );
        drop(encoder);

        if let Err(source) = encoded {
            // Never leave a truncated frame behind
            let _ = fs::remove_file(&path);
            return Err(StagingError::Encode { path, source });
        }

        debug!("Staged frame {:02}:00 at {}", frame.hour(), path.display());

        Ok(StagedFrame {
            hour: frame.hour(),
            path,
        })
    }
}

/// Remove regular files in `dir` last modified more than `max_age` before `now`.
///
/// Returns how many files were removed. A missing directory removes nothing.
pub fn evict_stale(dir: &Path, max_age: Duration, now: SystemTime) -> usize {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        let Ok(modified) = metadata.modified() else {
            continue;
        };
        let Ok(age) = now.duration_since(modified) else {
            continue;
        };

        if age > max_age {
            match fs::remove_file(entry.path()) {
                Ok(()) => {
                    debug!("Removed stale staged frame {}", entry.path().display());
                    removed += 1;
                }
                Err(e) => warn!("Failed to remove {}: {}", entry.path().display(), e),
            }
        }
    }

    if removed > 0 {
        info!("Evicted {} stale file(s) from {}", removed, dir.display());
    }
    removed
}

/// Background thread that periodically evicts stale staged frames.
///
/// The thread stops when [`Janitor::shutdown`] is called or the handle is
/// dropped.
#[derive(Debug)]
pub struct Janitor {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Janitor {
    #[must_use]
    pub fn spawn(dir: PathBuf, max_age: Duration, interval: Duration) -> Self {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            info!(
                "Staging janitor watching {} (max age {:?}, every {:?})",
                dir.display(),
                max_age,
                interval
            );
            loop {
                evict_stale(&dir, max_age, SystemTime::now());
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            debug!("Staging janitor stopped");
        });

        Self {
            stop: Some(stop_tx),
            handle: Some(handle),
        }
    }

    /// Stop the background thread and wait for it to exit
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    /// Block until the thread exits on its own (it only does so once stopped)
    pub fn wait(mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Staging janitor thread panicked");
            }
        }
    }

    fn stop_and_join(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Staging janitor thread panicked");
            }
        }
    }
}

impl Drop for Janitor {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchRequest;
    use chrono::NaiveDate;
    use image::{Rgb, RgbImage};

    fn frame(hour: u8, code: &str) -> Frame {
        Frame {
            request: FetchRequest::new(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(), hour, code),
            image: RgbImage::from_pixel(8, 6, Rgb([200, 10, 10])),
        }
    }

    fn age_file(path: &Path, age: Duration) {
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(SystemTime::now() - age)
            .unwrap();
    }

    #[test]
    fn test_ensure_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let staging = StagingDir::new(tmp.path().join("images"));
        staging.ensure().unwrap();
        staging.ensure().unwrap();
        assert!(staging.root().is_dir());
    }

    #[test]
    fn test_persist_names_by_hour_and_code() {
        let tmp = tempfile::tempdir().unwrap();
        let staging = StagingDir::new(tmp.path());

        let staged = staging.persist(&frame(5, "pmsl")).unwrap();
        assert_eq!(staged.hour, 5);
        assert_eq!(staged.path, tmp.path().join("05_pmsl.gif"));

        let reloaded = image::open(&staged.path).unwrap();
        assert_eq!((reloaded.width(), reloaded.height()), (8, 6));
    }

    #[test]
    fn test_persist_into_missing_dir_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let staging = StagingDir::new(tmp.path().join("not-created"));
        assert!(matches!(
            staging.persist(&frame(1, "ttd")),
            Err(StagingError::Write { .. })
        ));
    }

    #[test]
    fn test_failed_encode_leaves_no_file() {
        let tmp = tempfile::tempdir().unwrap();
        let staging = StagingDir::new(tmp.path());
        let too_wide = Frame {
            request: FetchRequest::new(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(), 4, "pmsl"),
            image: RgbImage::new(70_000, 1),
        };

        let err = staging.persist(&too_wide).unwrap_err();

        assert!(matches!(err, StagingError::Encode { .. }));
        assert!(!tmp.path().join("04_pmsl.gif").exists());
    }

    #[test]
    fn test_evict_stale_uses_injected_clock() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("00_pmsl.gif"), b"x").unwrap();
        fs::create_dir(tmp.path().join("nested")).unwrap();

        let hour = Duration::from_secs(3600);
        assert_eq!(evict_stale(tmp.path(), hour, SystemTime::now()), 0);
        assert!(tmp.path().join("00_pmsl.gif").exists());

        let later = SystemTime::now() + 2 * hour;
        assert_eq!(evict_stale(tmp.path(), hour, later), 1);
        assert!(!tmp.path().join("00_pmsl.gif").exists());
        assert!(tmp.path().join("nested").is_dir());
    }

    #[test]
    fn test_evict_stale_missing_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("gone");
        assert_eq!(evict_stale(&missing, Duration::ZERO, SystemTime::now()), 0);
    }

    #[test]
    fn test_janitor_removes_old_files() {
        let tmp = tempfile::tempdir().unwrap();
        let old = tmp.path().join("01_ttd.gif");
        let fresh = tmp.path().join("02_ttd.gif");
        fs::write(&old, b"old").unwrap();
        fs::write(&fresh, b"fresh").unwrap();
        age_file(&old, Duration::from_secs(7200));

        let janitor = Janitor::spawn(
            tmp.path().to_path_buf(),
            Duration::from_secs(3600),
            Duration::from_millis(10),
        );

        for _ in 0..200 {
            if !old.exists() {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        janitor.shutdown();

        assert!(!old.exists());
        assert!(fresh.exists());
    }
}
