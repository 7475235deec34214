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

    devices::vidcon::draw.rs

    Text and graphics renderers, and the double-buffered frame they draw into.

*/

//! Both renderers read the shared store exclusively through port B, so they are free to run on
//! every render clock regardless of what the active controller is doing on port A.
//!
//! The text renderer works a character ahead of the beam: the cell is presented to port B eight
//! clocks early, captured and run through the font ROM, then latched for display when the beam
//! crosses into the cell. The graphics renderer fetches one clock ahead and resolves color through
//! the palette combinationally.

use super::{
    font::{FontRom, GLYPH_H, GLYPH_W},
    memory::MemoryArbiter,
    mode::{GraphicsMode, ModeConfig},
    palette::{Palette, Rgb12, DEFAULT_COLORS, MODE_2BPP_COLORS},
    registers::CharAttribute,
    text_controller::{split_cell, CursorState},
    timing::{BeamPosition, H_VISIBLE, V_VISIBLE},
};

pub const FRAME_W: usize = H_VISIBLE as usize;
pub const FRAME_H: usize = V_VISIBLE as usize;

pub const TEXT_LOOKAHEAD: u16 = GLYPH_W as u16;
pub const GFX_LOOKAHEAD: u16 = 1;

// Half periods in frames. At 60Hz, 20 frames gives 1.5Hz and 8 frames 3.75Hz.
pub const CHAR_BLINK_FRAMES: u64 = 20;
pub const CURSOR_BLINK_FRAMES: u64 = 8;

#[inline]
fn blink_phase(frame: u64, half_period: u64) -> bool {
    (frame / half_period) % 2 == 0
}

/// Front and back frame buffers. The back buffer is drawn into during the visible interval and
/// the two are exchanged at the start of vertical blank.
pub struct FrameBuffers {
    buf: [Vec<Rgb12>; 2],
    back_buf: usize,
    front_buf: usize,
    frames: u64,
}

impl Default for FrameBuffers {
    fn default() -> Self {
        Self {
            buf: [vec![Rgb12::BLACK; FRAME_W * FRAME_H], vec![Rgb12::BLACK; FRAME_W * FRAME_H]],
            back_buf: 1,
            front_buf: 0,
            frames: 0,
        }
    }
}

impl FrameBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn put(&mut self, x: u16, y: u16, color: Rgb12) {
        self.buf[self.back_buf][y as usize * FRAME_W + x as usize] = color;
    }

    pub fn swap(&mut self) {
        std::mem::swap(&mut self.back_buf, &mut self.front_buf);
        self.frames += 1;
    }

    /// The last completed frame, row-major, 640x480.
    pub fn front(&self) -> &[Rgb12] {
        &self.buf[self.front_buf]
    }

    /// Number of completed frames.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn reset(&mut self) {
        *self = FrameBuffers::default();
    }
}

/// Glyph row and attribute for one character cell, ready for display.
#[derive(Copy, Clone, Debug, Default)]
struct CellLatch {
    glyph_row: u8,
    attr: u8,
}

#[derive(Default)]
pub struct TextRenderer {
    fetch_row: u8,
    font_code: u8,
    fetched: CellLatch,
    next: CellLatch,
    cur: CellLatch,
}

impl TextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = TextRenderer::default();
    }

    /// One render clock. Returns the color of the sample at `beam`.
    pub fn tick(
        &mut self,
        beam: &BeamPosition,
        arb: &mut MemoryArbiter,
        font: &FontRom,
        cursor: CursorState,
        config: &ModeConfig,
    ) -> Rgb12 {
        self.fetch(beam, arb, font, cursor);

        if !beam.visible {
            return Rgb12::BLACK;
        }
        if beam.x as usize % GLYPH_W == 0 {
            self.cur = self.next;
        }

        let attr = CharAttribute::from(self.cur.attr);
        let fg = DEFAULT_COLORS[attr.fg() as usize];
        let bg = DEFAULT_COLORS[attr.bg() as usize];

        let row = (beam.y as usize / GLYPH_H) as u8;
        let col = (beam.x as usize / GLYPH_W) as u8;
        if config.cursor_enable
            && row == cursor.row
            && col == cursor.col
            && (!config.cursor_blink || blink_phase(beam.frame, CURSOR_BLINK_FRAMES))
        {
            return fg;
        }

        let bit = self.cur.glyph_row & (0x80 >> (beam.x as usize % GLYPH_W)) != 0;
        if bit && (!attr.blink() || blink_phase(beam.frame, CHAR_BLINK_FRAMES)) {
            fg
        }
        else {
            bg
        }
    }

    fn fetch(&mut self, beam: &BeamPosition, arb: &mut MemoryArbiter, font: &FontRom, cursor: CursorState) {
        let (ax, ay) = beam.ahead(TEXT_LOOKAHEAD);
        if ax >= H_VISIBLE || ay >= V_VISIBLE {
            return;
        }
        match ax as usize % GLYPH_W {
            0 => {
                let row = (ay as usize / GLYPH_H) as u8;
                let col = (ax as usize / GLYPH_W) as u8;
                self.fetch_row = (ay as usize % GLYPH_H) as u8;
                arb.render_text(cursor.cell_addr(row, col));
            }
            1 => {
                // Cell arrives from port B; its code addresses the font ROM.
                let (code, attr) = split_cell(arb.render_text_q());
                self.font_code = code;
                self.fetched.attr = attr;
            }
            // Font ROM output is registered, one clock after its address.
            2 => self.fetched.glyph_row = font.row(self.font_code, self.fetch_row),
            3 => self.next = self.fetched,
            _ => {}
        }
    }
}

#[derive(Default)]
pub struct GraphicsRenderer {
    pending_shift: u8,
}

impl GraphicsRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = GraphicsRenderer::default();
    }

    /// One render clock. Returns the color of the sample at `beam`.
    pub fn tick(
        &mut self,
        beam: &BeamPosition,
        arb: &mut MemoryArbiter,
        mode: GraphicsMode,
        display_offset: usize,
        palette: &Palette,
    ) -> Rgb12 {
        // The unit presented last clock is the one under the beam now.
        let value = mode.extract(arb.render_bitmap_q(), self.pending_shift);

        let (ax, ay) = beam.ahead(GFX_LOOKAHEAD);
        if ax < H_VISIBLE && ay < V_VISIBLE {
            let shift = mode.scale_shift();
            let addr = mode.locate(ax >> shift, ay >> shift, display_offset);
            arb.render_bitmap(addr.unit);
            self.pending_shift = addr.shift;
        }

        if !beam.visible {
            return Rgb12::BLACK;
        }
        resolve_color(mode, value, palette)
    }
}

/// Map a raw pixel value to a color for the given mode.
#[inline]
pub fn resolve_color(mode: GraphicsMode, value: u8, palette: &Palette) -> Rgb12 {
    match mode {
        GraphicsMode::Hires1bpp => DEFAULT_COLORS[if value & 1 != 0 { 15 } else { 0 }],
        GraphicsMode::Med2bpp => DEFAULT_COLORS[MODE_2BPP_COLORS[(value & 0x03) as usize] as usize],
        GraphicsMode::Med4bpp => DEFAULT_COLORS[(value & 0x0F) as usize],
        GraphicsMode::Med8bpp => palette.lookup(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::vidcon::{
        memory::PortOwner,
        text_controller::make_cell,
        timing::{VideoTiming, TICKS_PER_FRAME},
    };

    fn store_text(arb: &mut MemoryArbiter, addr: usize, cell: u16) {
        arb.acquire(PortOwner::Text).unwrap();
        arb.text_write(PortOwner::Text, addr, cell).unwrap();
        arb.clock();
        arb.release(PortOwner::Text);
    }

    fn store_bitmap(arb: &mut MemoryArbiter, addr: usize, unit: u8) {
        arb.acquire(PortOwner::Graphics).unwrap();
        arb.bitmap_write(PortOwner::Graphics, addr, unit).unwrap();
        arb.clock();
        arb.release(PortOwner::Graphics);
    }

    /// Render two frames and return the second, so the pipeline is primed from the first.
    fn render(mut tick: impl FnMut(&BeamPosition, &mut MemoryArbiter) -> Rgb12, arb: &mut MemoryArbiter) -> Vec<Rgb12> {
        let mut timing = VideoTiming::new();
        let mut frame = FrameBuffers::new();
        for _ in 0..TICKS_PER_FRAME * 2 {
            let beam = timing.tick();
            let color = tick(&beam, arb);
            arb.clock();
            if beam.visible {
                frame.put(beam.x, beam.y, color);
            }
            if beam.vblank_start {
                frame.swap();
            }
        }
        frame.front().to_vec()
    }

    #[test]
    fn text_glyph_pixels_land_in_their_cell() {
        let mut arb = MemoryArbiter::new();
        let font = FontRom::builtin();
        let cursor = CursorState::default();
        // 'A' at row 0 col 1, white on blue
        store_text(&mut arb, 1, make_cell(0x1F, b'A'));

        let mut renderer = TextRenderer::new();
        let config = ModeConfig::default();
        let frame = render(|beam, arb| renderer.tick(beam, arb, &font, cursor, &config), &mut arb);

        let white = DEFAULT_COLORS[15];
        let blue = DEFAULT_COLORS[1];
        for (i, px) in (8..16).enumerate() {
            let expected = if font.row(b'A', 7) & (0x80 >> i) != 0 { white } else { blue };
            assert_eq!(frame[7 * FRAME_W + px], expected, "x={}", px);
        }
        // Neighbouring empty cells: code 0 with attribute 0
        assert_eq!(frame[7 * FRAME_W + 7], Rgb12::BLACK);
        assert_eq!(frame[7 * FRAME_W + 16], Rgb12::BLACK);
    }

    #[test]
    fn glyph_row_arrives_one_clock_after_the_cell() {
        let mut arb = MemoryArbiter::new();
        let font = FontRom::builtin();
        let cursor = CursorState::default();
        let config = ModeConfig::default();
        store_text(&mut arb, 0, make_cell(0x0F, 0xDB));
        let mut renderer = TextRenderer::new();

        // Eight clocks ahead of (792, 6) is glyph row 7 of cell (0, 0).
        let tick_at = |renderer: &mut TextRenderer, arb: &mut MemoryArbiter, x: u16| {
            let beam = BeamPosition {
                x,
                y: 6,
                ..Default::default()
            };
            renderer.tick(&beam, arb, &font, cursor, &config);
            arb.clock();
        };

        tick_at(&mut renderer, &mut arb, 792);
        tick_at(&mut renderer, &mut arb, 793);
        assert_eq!(renderer.fetched.attr, 0x0F);
        assert_eq!(renderer.fetched.glyph_row, 0);

        tick_at(&mut renderer, &mut arb, 794);
        assert_eq!(renderer.fetched.glyph_row, font.row(0xDB, 7));
        assert_eq!(renderer.next.glyph_row, 0);

        tick_at(&mut renderer, &mut arb, 795);
        assert_eq!(renderer.next.glyph_row, 0xFF);
        assert_eq!(renderer.next.attr, 0x0F);
    }

    #[test]
    fn text_follows_scroll_offset() {
        let mut arb = MemoryArbiter::new();
        let font = FontRom::builtin();
        let cursor = CursorState {
            scroll_offset: 30,
            ..Default::default()
        };
        // Physical row 30 is visible row 0 with this offset.
        store_text(&mut arb, cursor.cell_addr(0, 0), make_cell(0x70, b' '));

        let mut renderer = TextRenderer::new();
        let config = ModeConfig::default();
        let frame = render(|beam, arb| renderer.tick(beam, arb, &font, cursor, &config), &mut arb);
        assert_eq!(frame[0], DEFAULT_COLORS[7]);
        assert_eq!(frame[8], Rgb12::BLACK);
    }

    #[test]
    fn cursor_overlay_draws_solid_block() {
        let mut arb = MemoryArbiter::new();
        let font = FontRom::builtin();
        let cursor = CursorState {
            row: 2,
            col: 3,
            scroll_offset: 0,
        };
        store_text(&mut arb, cursor.cell_addr(2, 3), make_cell(0x0E, b' '));

        let mut renderer = TextRenderer::new();
        // Text mode, cursor enabled, not blinking
        let config = ModeConfig::from(0b0010_0000);
        let frame = render(|beam, arb| renderer.tick(beam, arb, &font, cursor, &config), &mut arb);
        for y in 32..48 {
            for x in 24..32 {
                assert_eq!(frame[y * FRAME_W + x], DEFAULT_COLORS[14]);
            }
        }
        assert_eq!(frame[32 * FRAME_W + 32], Rgb12::BLACK);
    }

    #[test]
    fn blink_phases_differ() {
        assert!(blink_phase(0, CHAR_BLINK_FRAMES));
        assert!(!blink_phase(20, CHAR_BLINK_FRAMES));
        assert!(!blink_phase(8, CURSOR_BLINK_FRAMES));
        assert!(blink_phase(16, CURSOR_BLINK_FRAMES));
    }

    #[test]
    fn graphics_pixels_resolve_per_mode() {
        let mut arb = MemoryArbiter::new();
        let palette = Palette::default();

        // 1bpp: leftmost pixel of unit 0 set
        store_bitmap(&mut arb, 0, 0x80);
        let mut renderer = GraphicsRenderer::new();
        let frame = render(
            |beam, arb| renderer.tick(beam, arb, GraphicsMode::Hires1bpp, 0, &palette),
            &mut arb,
        );
        assert_eq!(frame[0], DEFAULT_COLORS[15]);
        assert_eq!(frame[1], Rgb12::BLACK);

        // 2bpp: logical pixel 1 = 0b10 (bright magenta), doubled on screen
        store_bitmap(&mut arb, 0, 0b0010_0000);
        let mut renderer = GraphicsRenderer::new();
        let frame = render(
            |beam, arb| renderer.tick(beam, arb, GraphicsMode::Med2bpp, 0, &palette),
            &mut arb,
        );
        assert_eq!(frame[0], Rgb12::BLACK);
        assert_eq!(frame[2], DEFAULT_COLORS[13]);
        assert_eq!(frame[3], DEFAULT_COLORS[13]);
        assert_eq!(frame[FRAME_W + 3], DEFAULT_COLORS[13]);
        assert_eq!(frame[2 * FRAME_W + 3], Rgb12::BLACK);
    }

    #[test]
    fn graphics_displays_active_page() {
        let mut arb = MemoryArbiter::new();
        let palette = Palette::default();
        let mode = GraphicsMode::Med4bpp;
        store_bitmap(&mut arb, mode.page_size(), 0x90);

        let mut renderer = GraphicsRenderer::new();
        let frame = render(|beam, arb| renderer.tick(beam, arb, mode, 0, &palette), &mut arb);
        assert_eq!(frame[0], Rgb12::BLACK);

        let mut renderer = GraphicsRenderer::new();
        let frame = render(
            |beam, arb| renderer.tick(beam, arb, mode, mode.page_offset(true), &palette),
            &mut arb,
        );
        assert_eq!(frame[0], DEFAULT_COLORS[9]);
        assert_eq!(frame[2], Rgb12::BLACK);
    }

    #[test]
    fn eight_bit_mode_uses_palette() {
        let mut palette = Palette::default();
        palette.set(0xC3, Rgb12::new(1, 2, 3));
        assert_eq!(resolve_color(GraphicsMode::Med8bpp, 0xC3, &palette), Rgb12::new(1, 2, 3));
        assert_eq!(resolve_color(GraphicsMode::Med4bpp, 0xC3, &palette), DEFAULT_COLORS[3]);
    }
}
