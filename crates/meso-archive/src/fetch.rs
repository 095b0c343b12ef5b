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

//! Single-frame retrieval from the mesoanalysis archive.
//!
//! A frame is addressed by date, hour and parameter code. The fetcher builds
//! the archive URL, performs one blocking GET through a [`FrameSource`], and
//! flattens any transparency onto a white background so every frame comes
//! back as an opaque RGB image.

use std::time::Duration;

use chrono::NaiveDate;
use image::{DynamicImage, Rgb, RgbImage};
use log::{debug, warn};
use reqwest::StatusCode;
use thiserror::Error;

/// Archive root for the SPC mesoanalysis image archive
pub const DEFAULT_ARCHIVE_BASE: &str = "https://www.spc.noaa.gov/exper/ma_archive/images_s4";

/// Last valid UTC hour
pub const MAX_HOUR: u8 = 23;

/// Failure reported by a [`FrameSource`].
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("request failed: {0}")]
    Transport(String),
}

/// Why a frame is absent. Every variant means "skip this hour".
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame for {hour:02}:00 unavailable: {source}")]
    Unavailable { hour: u8, source: SourceError },

    #[error("frame for {hour:02}:00 could not be decoded: {source}")]
    Decode { hour: u8, source: image::ImageError },
}

impl FrameError {
    #[must_use]
    pub fn hour(&self) -> u8 {
        match self {
            FrameError::Unavailable { hour, .. } | FrameError::Decode { hour, .. } => *hour,
        }
    }
}

/// Anything that can answer a GET with the body of a 200 response.
pub trait FrameSource {
    fn get(&self, url: &str) -> Result<Vec<u8>, SourceError>;
}

impl<S: FrameSource + ?Sized> FrameSource for &S {
    fn get(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        (**self).get(url)
    }
}

/// Blocking HTTP source backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::blocking::Client,
}

impl HttpSource {
    pub fn new(user_agent: &str) -> Result<Self, SourceError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            // Archive responses can be slow; wait as long as the server does
            .timeout(None::<Duration>)
            .build()
            .map_err(|e| SourceError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

impl FrameSource for HttpSource {
    fn get(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        if response.status() != StatusCode::OK {
            return Err(SourceError::Status(response.status().as_u16()));
        }

        let bytes = response
            .bytes()
            .map_err(|e| SourceError::Transport(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Identifies one archived image.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchRequest {
    pub date: NaiveDate,
    pub hour: u8,
    pub code: String,
}

impl FetchRequest {
    pub fn new(date: NaiveDate, hour: u8, code: impl Into<String>) -> Self {
        debug_assert!(hour <= MAX_HOUR, "hour out of range: {hour}");
        Self {
            date,
            hour,
            code: code.into(),
        }
    }

    /// Date in the archive's `YYYYMMDD` directory form
    #[must_use]
    pub fn date_stamp(&self) -> String {
        self.date.format("%Y%m%d").to_string()
    }

    /// Image name within a date directory, e.g. `03_pmsl.gif`
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{:02}_{}.gif", self.hour, self.code)
    }

    #[must_use]
    pub fn url(&self, archive_base: &str) -> String {
        format!(
            "{}/{}/{}",
            archive_base.trim_end_matches('/'),
            self.date_stamp(),
            self.file_name()
        )
    }
}

/// A decoded, fully opaque frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub request: FetchRequest,
    pub image: RgbImage,
}

impl Frame {
    #[must_use]
    pub fn hour(&self) -> u8 {
        self.request.hour
    }
}

/// Fetches frames from an archive through a [`FrameSource`].
#[derive(Debug, Clone)]
pub struct FrameFetcher<S> {
    source: S,
    archive_base: String,
}

impl<S: FrameSource> FrameFetcher<S> {
    pub fn new(source: S, archive_base: impl Into<String>) -> Self {
        Self {
            source,
            archive_base: archive_base.into(),
        }
    }

    #[must_use]
    pub fn archive_base(&self) -> &str {
        &self.archive_base
    }

    /// Fetch and flatten one frame. Never writes to storage.
    pub fn fetch(&self, request: &FetchRequest) -> Result<Frame, FrameError> {
        let hour = request.hour;
        let url = request.url(&self.archive_base);
        debug!("Fetching {}", url);

        let bytes = self.source.get(&url).map_err(|source| {
            match &source {
                SourceError::Status(code) => {
                    warn!("Failed to fetch image for time {:02}:00, status code: {}", hour, code);
                }
                SourceError::Transport(msg) => {
                    warn!("Failed to fetch image for time {:02}:00: {}", hour, msg);
                }
            }
            FrameError::Unavailable { hour, source }
        })?;

        let decoded = image::load_from_memory(&bytes).map_err(|source| {
            warn!("Failed to decode image for time {:02}:00: {}", hour, source);
            FrameError::Decode { hour, source }
        })?;

        Ok(Frame {
            request: request.clone(),
            image: flatten_onto_white(&decoded),
        })
    }
}

/// Composite an image over an opaque white canvas of the same size.
#[must_use]
pub fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        Rgb([over_white(r, a), over_white(g, a), over_white(b, a)])
    })
}

fn over_white(channel: u8, alpha: u8) -> u8 {
    let c = u32::from(channel);
    let a = u32::from(alpha);
    let blended = (c * a + 255 * (255 - a) + 127) / 255;
    // blended <= 255 for all inputs
    u8::try_from(blended).unwrap_or(u8::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{png_bytes, FakeSource};
    use image::{Rgba, RgbaImage};

    fn may_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn test_http_source_builds() {
        assert!(HttpSource::new("mesogif-test").is_ok());
    }

    #[test]
    fn test_request_url() {
        let request = FetchRequest::new(may_first(), 3, "pmsl");
        assert_eq!(
            request.url(DEFAULT_ARCHIVE_BASE),
            "https://www.spc.noaa.gov/exper/ma_archive/images_s4/20240501/03_pmsl.gif"
        );
        assert_eq!(
            request.url("http://localhost:8080/archive/"),
            "http://localhost:8080/archive/20240501/03_pmsl.gif"
        );
    }

    #[test]
    fn test_file_name_pads_hour() {
        assert_eq!(FetchRequest::new(may_first(), 0, "ttd").file_name(), "00_ttd.gif");
        assert_eq!(FetchRequest::new(may_first(), 23, "ttd").file_name(), "23_ttd.gif");
    }

    #[test]
    fn test_over_white() {
        assert_eq!(over_white(0, 0), 255);
        assert_eq!(over_white(10, 255), 10);
        assert_eq!(over_white(255, 128), 255);
        assert_eq!(over_white(0, 128), 127);
    }

    #[test]
    fn test_fetch_flattens_transparency() {
        let mut rgba = RgbaImage::from_pixel(6, 4, Rgba([0, 0, 255, 255]));
        rgba.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        rgba.put_pixel(1, 0, Rgba([255, 0, 0, 128]));

        let source = FakeSource::new().with_body(
            "http://archive/20240501/03_pmsl.gif",
            png_bytes(&DynamicImage::ImageRgba8(rgba)),
        );
        let fetcher = FrameFetcher::new(&source, "http://archive");

        let frame = fetcher
            .fetch(&FetchRequest::new(may_first(), 3, "pmsl"))
            .unwrap();

        assert_eq!(frame.hour(), 3);
        assert_eq!(frame.image.dimensions(), (6, 4));
        assert_eq!(frame.image.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(frame.image.get_pixel(1, 0), &Rgb([255, 127, 127]));
        assert_eq!(frame.image.get_pixel(2, 2), &Rgb([0, 0, 255]));
    }

    #[test]
    fn test_fetch_opaque_image_unchanged() {
        let rgb = RgbImage::from_pixel(3, 5, Rgb([12, 34, 56]));
        let source = FakeSource::new().with_body(
            "http://archive/20240501/07_ttd.gif",
            png_bytes(&DynamicImage::ImageRgb8(rgb.clone())),
        );
        let fetcher = FrameFetcher::new(&source, "http://archive");

        let frame = fetcher.fetch(&FetchRequest::new(may_first(), 7, "ttd")).unwrap();
        assert_eq!(frame.image, rgb);
    }

    #[test]
    fn test_fetch_non_200_is_unavailable() {
        let source = FakeSource::new().with_status("http://archive/20240501/03_pmsl.gif", 404);
        let fetcher = FrameFetcher::new(&source, "http://archive");

        let err = fetcher
            .fetch(&FetchRequest::new(may_first(), 3, "pmsl"))
            .unwrap_err();
        assert!(matches!(
            err,
            FrameError::Unavailable { hour: 3, source: SourceError::Status(404) }
        ));
        assert_eq!(source.requested(), vec!["http://archive/20240501/03_pmsl.gif"]);
    }

    #[test]
    fn test_fetch_undecodable_body() {
        let source = FakeSource::new()
            .with_body("http://archive/20240501/04_pmsl.gif", b"<html>oops</html>".to_vec());
        let fetcher = FrameFetcher::new(&source, "http://archive");

        let err = fetcher
            .fetch(&FetchRequest::new(may_first(), 4, "pmsl"))
            .unwrap_err();
        assert!(matches!(err, FrameError::Decode { hour: 4, .. }));
        assert_eq!(err.hour(), 4);
    }

    #[test]
    fn test_unknown_url_is_not_found() {
        let source = FakeSource::new();
        let fetcher = FrameFetcher::new(&source, "http://archive");
        let err = fetcher
            .fetch(&FetchRequest::new(may_first(), 1, "zzzz"))
            .unwrap_err();
        assert!(matches!(err, FrameError::Unavailable { source: SourceError::Status(404), .. }));
    }
}
