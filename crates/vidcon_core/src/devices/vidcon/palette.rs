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

    devices::vidcon::palette.rs

    12-bit color values, the fixed 16-entry color table and the 256-entry palette
    used by the 8bpp graphics mode.

*/

use serde::Deserialize;
use strum_macros::{Display, EnumString};

/// A 12-bit RGB triple, one nibble per channel.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Rgb12 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb12 {
    pub const BLACK: Rgb12 = Rgb12::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb12 {
            r: r & 0x0F,
            g: g & 0x0F,
            b: b & 0x0F,
        }
    }

    pub fn from_u16(rgb: u16) -> Self {
        Rgb12::new((rgb >> 8) as u8, (rgb >> 4) as u8, rgb as u8)
    }

    pub fn to_u16(self) -> u16 {
        (self.r as u16) << 8 | (self.g as u16) << 4 | self.b as u16
    }

    /// Expand each nibble to a full byte, for frontends producing 24-bit images.
    pub fn to_rgb888(self) -> [u8; 3] {
        [self.r * 0x11, self.g * 0x11, self.b * 0x11]
    }
}

/// Output DAC width. The base board carries 2 bits per channel, the extended board 4.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Display, EnumString)]
pub enum ColorDepth {
    Base,
    #[default]
    Extended,
}

impl ColorDepth {
    #[inline]
    pub fn reduce(&self, color: Rgb12) -> Rgb12 {
        match self {
            ColorDepth::Extended => color,
            // Keep the top two bits and replicate them so full scale stays full scale.
            ColorDepth::Base => {
                let two = |c: u8| (c & 0x0C) | (c >> 2);
                Rgb12::new(two(color.r), two(color.g), two(color.b))
            }
        }
    }
}

pub const DEFAULT_COLORS: [Rgb12; 16] = [
    Rgb12::new(0x0, 0x0, 0x0), // Black
    Rgb12::new(0x0, 0x0, 0xA), // Blue
    Rgb12::new(0x0, 0xA, 0x0), // Green
    Rgb12::new(0x0, 0xA, 0xA), // Cyan
    Rgb12::new(0xA, 0x0, 0x0), // Red
    Rgb12::new(0xA, 0x0, 0xA), // Magenta
    Rgb12::new(0xA, 0x5, 0x0), // Brown
    Rgb12::new(0xA, 0xA, 0xA), // Light gray
    Rgb12::new(0x5, 0x5, 0x5), // Dark gray
    Rgb12::new(0x5, 0x5, 0xF), // Bright blue
    Rgb12::new(0x5, 0xF, 0x5), // Bright green
    Rgb12::new(0x5, 0xF, 0xF), // Bright cyan
    Rgb12::new(0xF, 0x5, 0x5), // Bright red
    Rgb12::new(0xF, 0x5, 0xF), // Bright magenta
    Rgb12::new(0xF, 0xF, 0x5), // Yellow
    Rgb12::new(0xF, 0xF, 0xF), // White
];

/// Fixed colors of the 2bpp mode, as indices into [`DEFAULT_COLORS`].
pub const MODE_2BPP_COLORS: [u8; 4] = [0, 11, 13, 15];

pub const PALETTE_SIZE: usize = 256;

pub struct Palette {
    entries: [Rgb12; PALETTE_SIZE],
}

impl Default for Palette {
    fn default() -> Self {
        let mut entries = [Rgb12::BLACK; PALETTE_SIZE];
        for (i, entry) in entries.iter_mut().enumerate() {
            *entry = match i {
                0..=15 => DEFAULT_COLORS[i],
                _ => {
                    // RGB 3-3-2, scaled to nibbles
                    let r = ((i >> 5) & 0x07) as u8;
                    let g = ((i >> 2) & 0x07) as u8;
                    let b = (i & 0x03) as u8;
                    Rgb12::new(r * 15 / 7, g * 15 / 7, b * 5)
                }
            }
        }
        Self { entries }
    }
}

impl Palette {
    pub fn new() -> Self {
        Self::default()
    }

    /// Display-side lookup. Combinational: no clock involved.
    #[inline]
    pub fn lookup(&self, index: u8) -> Rgb12 {
        self.entries[index as usize]
    }

    pub fn set(&mut self, index: u8, color: Rgb12) {
        self.entries[index as usize] = color;
    }

    pub fn reset(&mut self) {
        *self = Palette::default();
    }
}
