/*
    VidCon
    Register-programmable video controller emulator

    Copyright 2022-2025 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    screenshot.rs

    Write a rendered frame out as a PNG.

*/

use std::path::Path;

use anyhow::Context;
use vidcon_core::devices::vidcon::{
    draw::{FRAME_H, FRAME_W},
    palette::Rgb12,
};

/// Expand a frame of 12-bit samples to RGBA8.
pub fn frame_to_rgba(frame: &[Rgb12]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(frame.len() * 4);
    for color in frame {
        let [r, g, b] = color.to_rgb888();
        buf.extend_from_slice(&[r, g, b, 0xFF]);
    }
    buf
}

pub fn save_screenshot(path: &Path, frame: &[Rgb12]) -> anyhow::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("Couldn't create {}", dir.display()))?;
    }
    image::save_buffer(
        path,
        &frame_to_rgba(frame),
        FRAME_W as u32,
        FRAME_H as u32,
        image::ColorType::Rgba8,
    )
    .with_context(|| format!("Error writing screenshot: {}", path.display()))?;
    log::info!("Saved screenshot: {}", path.display());
    Ok(())
}
