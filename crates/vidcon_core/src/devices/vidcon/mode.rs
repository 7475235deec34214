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

    devices::vidcon::mode.rs

    Mode selection. Decodes the Mode/Config register into the display mode and page
    configuration, and selects which of the two mode controllers and renderers is live.

*/

use strum_macros::{Display, EnumIter};

use super::registers::ModeRegister;

pub const SCREEN_W: u32 = 640;
pub const SCREEN_H: u32 = 480;

/// The bitmap store holds the largest single page (mode 4) or two pages of the 1bpp/4bpp modes.
pub const BITMAP_STORE_SIZE: usize = 76_800;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Display)]
pub enum ControllerSelect {
    Text,
    Graphics,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Display, EnumIter)]
pub enum GraphicsMode {
    #[strum(to_string = "640x480 1bpp")]
    Hires1bpp,
    #[strum(to_string = "320x240 2bpp")]
    Med2bpp,
    #[strum(to_string = "320x240 4bpp")]
    Med4bpp,
    #[strum(to_string = "320x240 8bpp")]
    Med8bpp,
}

impl GraphicsMode {
    pub fn from_mode_bits(bits: u8) -> Option<GraphicsMode> {
        match bits & 0x07 {
            1 => Some(GraphicsMode::Hires1bpp),
            2 => Some(GraphicsMode::Med2bpp),
            3 => Some(GraphicsMode::Med4bpp),
            4 => Some(GraphicsMode::Med8bpp),
            _ => None,
        }
    }

    pub fn mode_bits(&self) -> u8 {
        match self {
            GraphicsMode::Hires1bpp => 1,
            GraphicsMode::Med2bpp => 2,
            GraphicsMode::Med4bpp => 3,
            GraphicsMode::Med8bpp => 4,
        }
    }

    #[inline]
    pub fn width(&self) -> u16 {
        match self {
            GraphicsMode::Hires1bpp => 640,
            _ => 320,
        }
    }

    #[inline]
    pub fn height(&self) -> u16 {
        match self {
            GraphicsMode::Hires1bpp => 480,
            _ => 240,
        }
    }

    #[inline]
    pub fn bpp(&self) -> u8 {
        match self {
            GraphicsMode::Hires1bpp => 1,
            GraphicsMode::Med2bpp => 2,
            GraphicsMode::Med4bpp => 4,
            GraphicsMode::Med8bpp => 8,
        }
    }

    #[inline]
    pub fn pixels_per_unit(&self) -> u8 {
        8 / self.bpp()
    }

    /// Mask of a single pixel's value, before shifting into position.
    #[inline]
    pub fn value_mask(&self) -> u8 {
        ((1u16 << self.bpp()) - 1) as u8
    }

    /// Storage units in one page.
    pub fn page_size(&self) -> usize {
        self.width() as usize * self.height() as usize / self.pixels_per_unit() as usize
    }

    pub fn pages(&self) -> usize {
        match self {
            GraphicsMode::Med8bpp => 1,
            _ => 2,
        }
    }

    pub fn page_offset(&self, page: bool) -> usize {
        if page && self.pages() > 1 {
            self.page_size()
        }
        else {
            0
        }
    }

    /// log2 of the screen pixels covered by one logical pixel along each axis.
    pub fn scale_shift(&self) -> u32 {
        match self {
            GraphicsMode::Hires1bpp => 0,
            _ => 1,
        }
    }

    #[inline]
    pub fn in_bounds(&self, x: u16, y: u16) -> bool {
        x < self.width() && y < self.height()
    }

    /// Resolve a pixel to its storage unit and the bit offset of its field. Pixel 0 of a unit
    /// occupies the most significant bits.
    #[inline]
    pub fn locate(&self, x: u16, y: u16, page_offset: usize) -> PixelAddress {
        let ppu = self.pixels_per_unit() as usize;
        let index = y as usize * self.width() as usize + x as usize;
        let slot = x as usize % ppu;
        PixelAddress {
            unit:  page_offset + index / ppu,
            shift: ((ppu - 1 - slot) * self.bpp() as usize) as u8,
        }
    }

    /// Replace exactly the target pixel's field within `unit`.
    #[inline]
    pub fn insert(&self, unit: u8, shift: u8, value: u8) -> u8 {
        let mask = self.value_mask() << shift;
        (unit & !mask) | ((value & self.value_mask()) << shift)
    }

    #[inline]
    pub fn extract(&self, unit: u8, shift: u8) -> u8 {
        (unit >> shift) & self.value_mask()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PixelAddress {
    pub unit:  usize,
    pub shift: u8,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DisplayMode {
    Text,
    Graphics(GraphicsMode),
}

/// Decoded Mode/Config register. Reserved mode values 5-7 decode as text mode.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ModeConfig {
    pub display: DisplayMode,
    pub active_page: bool,
    pub working_page: bool,
    pub cursor_enable: bool,
    pub cursor_blink: bool,
}

impl Default for ModeConfig {
    fn default() -> Self {
        ModeConfig::from(0)
    }
}

impl From<u8> for ModeConfig {
    fn from(byte: u8) -> Self {
        let reg = ModeRegister::from_bytes([byte]);
        let display = match GraphicsMode::from_mode_bits(reg.mode()) {
            Some(mode) => DisplayMode::Graphics(mode),
            None => DisplayMode::Text,
        };
        ModeConfig {
            display,
            active_page: reg.active_page(),
            working_page: reg.working_page(),
            cursor_enable: reg.cursor_enable(),
            cursor_blink: reg.cursor_blink(),
        }
    }
}

impl ModeConfig {
    /// The controller (and renderer) the current mode routes to.
    pub fn select(&self) -> ControllerSelect {
        match self.display {
            DisplayMode::Text => ControllerSelect::Text,
            DisplayMode::Graphics(_) => ControllerSelect::Graphics,
        }
    }

    pub fn graphics_mode(&self) -> Option<GraphicsMode> {
        match self.display {
            DisplayMode::Graphics(mode) => Some(mode),
            DisplayMode::Text => None,
        }
    }

    /// Page offset that controller writes land in.
    pub fn working_offset(&self) -> usize {
        self.graphics_mode()
            .map(|m| m.page_offset(self.working_page))
            .unwrap_or(0)
    }

    /// Page offset the renderer displays.
    pub fn display_offset(&self) -> usize {
        self.graphics_mode()
            .map(|m| m.page_offset(self.active_page))
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn every_layout_fits_the_store() {
        for mode in GraphicsMode::iter() {
            assert_eq!(mode.width() as u32 * (1 << mode.scale_shift()), SCREEN_W);
            assert_eq!(mode.height() as u32 * (1 << mode.scale_shift()), SCREEN_H);
            assert!(mode.page_size() * mode.pages() <= BITMAP_STORE_SIZE, "{}", mode);
            assert_eq!(GraphicsMode::from_mode_bits(mode.mode_bits()), Some(mode));
        }
        assert_eq!(GraphicsMode::Med8bpp.page_size(), 76_800);
    }

    #[test]
    fn packing_is_msb_first() {
        let mode = GraphicsMode::Med2bpp;
        let a = mode.locate(0, 0, 0);
        let b = mode.locate(3, 0, 0);
        let c = mode.locate(4, 0, 0);
        assert_eq!(a, PixelAddress { unit: 0, shift: 6 });
        assert_eq!(b, PixelAddress { unit: 0, shift: 0 });
        assert_eq!(c, PixelAddress { unit: 1, shift: 6 });

        let mut unit = 0;
        unit = mode.insert(unit, a.shift, 3);
        unit = mode.insert(unit, 4, 2);
        assert_eq!(unit, 0b1110_0000);
        unit = mode.insert(unit, b.shift, 1);
        assert_eq!(unit, 0b1110_0001);
        assert_eq!(mode.extract(unit, 4), 2);
    }

    #[test]
    fn insert_preserves_neighbouring_bits() {
        let mode = GraphicsMode::Hires1bpp;
        assert_eq!(mode.insert(0b1010_1010, 6, 0), 0b1010_1010);
        assert_eq!(mode.insert(0b1010_1010, 6, 1), 0b1110_1010);
        assert_eq!(mode.insert(0xFF, 0, 0), 0xFE);
        let mode = GraphicsMode::Med4bpp;
        assert_eq!(mode.insert(0xAB, 0, 0x1F), 0xAF);
    }

    #[test]
    fn page_offsets() {
        let cfg = ModeConfig::from(0b0001_0001);
        assert_eq!(cfg.graphics_mode(), Some(GraphicsMode::Hires1bpp));
        assert_eq!(cfg.working_offset(), 38_400);
        assert_eq!(cfg.display_offset(), 0);

        // Single page mode ignores the page bits
        let cfg = ModeConfig::from(0b0001_1100);
        assert_eq!(cfg.working_offset(), 0);
        assert_eq!(cfg.display_offset(), 0);
    }

    #[test]
    fn reserved_modes_select_text() {
        for bits in [0u8, 5, 6, 7] {
            assert_eq!(ModeConfig::from(bits).select(), ControllerSelect::Text);
        }
        assert_eq!(ModeConfig::from(2).select(), ControllerSelect::Graphics);
    }
}
