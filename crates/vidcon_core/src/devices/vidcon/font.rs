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

    devices::vidcon::font.rs

    Character generator ROM: 256 glyphs of 8x16 pixels, loaded once at startup.

*/

use std::path::Path;

use thiserror::Error;

pub const GLYPH_COUNT: usize = 256;
pub const GLYPH_W: usize = 8;
pub const GLYPH_H: usize = 16;
pub const FONT_SIZE: usize = GLYPH_COUNT * GLYPH_H;

const BUILTIN_FONT: &[u8] = include_bytes!("../../../assets/font_8x16.bin");

#[derive(Error, Debug)]
pub enum FontError {
    #[error("Font image must be 4096 bytes, got {0}")]
    BadSize(usize),
    #[error("Couldn't read font file: {0}")]
    Io(#[from] std::io::Error),
}

/// One byte per glyph row, most significant bit leftmost.
#[derive(Clone)]
pub struct FontRom {
    data: Box<[u8]>,
}

impl Default for FontRom {
    fn default() -> Self {
        FontRom::builtin()
    }
}

impl FontRom {
    pub fn builtin() -> Self {
        Self {
            data: BUILTIN_FONT.into(),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FontError> {
        if bytes.len() != FONT_SIZE {
            return Err(FontError::BadSize(bytes.len()));
        }
        Ok(Self { data: bytes.into() })
    }

    pub fn load(path: &Path) -> Result<Self, FontError> {
        let bytes = std::fs::read(path)?;
        let rom = FontRom::from_bytes(&bytes)?;
        log::debug!("Loaded font from {}", path.display());
        Ok(rom)
    }

    #[inline]
    pub fn row(&self, code: u8, row: u8) -> u8 {
        self.data[code as usize * GLYPH_H + (row as usize & (GLYPH_H - 1))]
    }
}
