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

//! Shared helpers for unit tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::File;
use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use crate::fetch::{FrameSource, SourceError};

/// In-memory archive. URLs without a registered response answer 404.
#[derive(Debug, Default)]
pub struct FakeSource {
    responses: HashMap<String, Result<Vec<u8>, u16>>,
    requested: RefCell<Vec<String>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, url: &str, body: Vec<u8>) -> Self {
        self.responses.insert(url.to_owned(), Ok(body));
        self
    }

    pub fn with_status(mut self, url: &str, status: u16) -> Self {
        self.responses.insert(url.to_owned(), Err(status));
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.borrow().clone()
    }
}

impl FrameSource for FakeSource {
    fn get(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        self.requested.borrow_mut().push(url.to_owned());
        match self.responses.get(url) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(status)) => Err(SourceError::Status(*status)),
            None => Err(SourceError::Status(404)),
        }
    }
}

pub fn png_bytes(image: &DynamicImage) -> Vec<u8> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

/// PNG body of a solid-colour frame
pub fn solid_png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    png_bytes(&DynamicImage::ImageRgb8(RgbImage::from_pixel(
        width,
        height,
        Rgb(color),
    )))
}

/// Summary of a decoded GIF: whether it carries an infinite NETSCAPE2.0 loop
/// block, plus per-frame (delay in centiseconds, disposal, first pixel RGBA).
#[derive(Debug)]
pub struct GifSummary {
    pub loops_forever: bool,
    pub frames: Vec<(u16, gif::DisposalMethod, [u8; 4])>,
}

pub fn read_gif(path: &Path) -> GifSummary {
    let raw = std::fs::read(path).unwrap();
    let loops_forever = raw
        .windows(15)
        .any(|w| &w[..11] == b"NETSCAPE2.0" && w[11..] == [3, 1, 0, 0]);

    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::RGBA);
    let mut decoder = options.read_info(File::open(path).unwrap()).unwrap();

    let mut frames = Vec::new();
    while let Some(frame) = decoder.read_next_frame().unwrap() {
        let first = [
            frame.buffer[0],
            frame.buffer[1],
            frame.buffer[2],
            frame.buffer[3],
        ];
        frames.push((frame.delay, frame.dispose, first));
    }

    GifSummary {
        loops_forever,
        frames,
    }
}

pub fn close_to(actual: [u8; 4], expected: [u8; 3]) -> bool {
    actual
        .iter()
        .zip(expected.iter())
        .all(|(a, e)| a.abs_diff(*e) <= 2)
}
