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

//! Animated GIF assembly.
//!
//! Every staged frame is decoded before the output file is created, so a bad
//! frame never leaves a half-written animation behind.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use image::RgbImage;
use log::{debug, info};
use thiserror::Error;

/// Display time of each frame
pub const FRAME_DELAY_MS: u16 = 500;

/// Media type of the assembled artifact
pub const MEDIA_TYPE: &str = "image/gif";

/// NeuQuant sampling factor used when building frame palettes
const QUANTIZE_SPEED: i32 = 10;

#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("failed to decode frame {}: {source}", path.display())]
    Decode { path: PathBuf, source: image::ImageError },

    #[error("frame of {width}x{height} exceeds GIF limits")]
    TooLarge { width: u32, height: u32 },

    #[error("failed to write {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("GIF encoding failed: {0}")]
    Encode(#[from] gif::EncodingError),
}

/// Encode `frames` (in the given order) into a looping GIF at `output`.
///
/// Returns `Ok(None)` without touching the filesystem when there is nothing to
/// assemble. An existing file at `output` is overwritten.
pub fn assemble<P: AsRef<Path>>(frames: &[P], output: &Path) -> Result<Option<PathBuf>, AssembleError> {
    if frames.is_empty() {
        debug!("No frames to assemble for {}", output.display());
        return Ok(None);
    }

    let images = frames
        .iter()
        .map(|p| load_frame(p.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    if let Err(e) = write_animation(&images, output) {
        let _ = fs::remove_file(output);
        return Err(e);
    }

    info!("Wrote {} frame(s) to {}", images.len(), output.display());
    Ok(Some(output.to_path_buf()))
}

fn load_frame(path: &Path) -> Result<RgbImage, AssembleError> {
    image::open(path)
        .map(|img| img.to_rgb8())
        .map_err(|source| AssembleError::Decode {
            path: path.to_path_buf(),
            source,
        })
}

fn gif_dimensions(width: u32, height: u32) -> Result<(u16, u16), AssembleError> {
    match (u16::try_from(width), u16::try_from(height)) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(AssembleError::TooLarge { width, height }),
    }
}

fn write_animation(images: &[RgbImage], output: &Path) -> Result<(), AssembleError> {
    let io_err = |source: io::Error| AssembleError::Io {
        path: output.to_path_buf(),
        source,
    };

    // Logical screen fits the largest frame
    let width = images.iter().map(RgbImage::width).max().unwrap_or(0);
    let height = images.iter().map(RgbImage::height).max().unwrap_or(0);
    let (screen_w, screen_h) = gif_dimensions(width, height)?;

    let file = File::create(output).map_err(io_err)?;
    let mut encoder = gif::Encoder::new(BufWriter::new(file), screen_w, screen_h, &[])?;
    encoder.set_repeat(gif::Repeat::Infinite)?;

    for image in images {
        let (w, h) = gif_dimensions(image.width(), image.height())?;
        let mut frame = gif::Frame::from_rgb_speed(w, h, image.as_raw(), QUANTIZE_SPEED);
        frame.delay = FRAME_DELAY_MS / 10;
        frame.dispose = gif::DisposalMethod::Background;
        encoder.write_frame(&frame)?;
    }

    let mut writer = encoder.into_inner().map_err(io_err)?;
    writer.flush().map_err(io_err)
}
