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

    devices::vidcon::graphics_controller.rs

    Graphics mode controller. Executes pixel, clear and palette instructions against
    the bit-packed bitmap store.

*/

//! Pixels narrower than a storage unit are updated with a three clock read-modify-write:
//! the unit is read on port A, the target field is masked out and the new value merged in,
//! and the unit is written back. Port A stays claimed across all three clocks so the
//! renderer, which only ever reads port B, sees either the old unit or the new one.

use super::{
    instruction::{Completion, Instruction, InstructionError, Opcode},
    memory::{ArbiterError, MemoryArbiter, PortOwner},
    mode::{GraphicsMode, PixelAddress},
    palette::{Palette, Rgb12},
};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PixelCursor {
    pub x: u16,
    pub y: u16,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum GfxState {
    Idle,
    WritePixel { value: u8 },
    WriteAndPosition { cursor: PixelCursor, value: u8 },
    RmwModify { addr: PixelAddress, value: u8 },
    RmwWrite { unit_addr: usize, unit: u8 },
    SetPosition(PixelCursor),
    ClearScreen { index: usize, fill: u8 },
    ReadPresent(PixelCursor),
    ReadWait { shift: u8 },
    ReadExtract { shift: u8 },
    SetPalette { index: u8, color: Rgb12 },
    GetPalette { index: u8 },
    Fail(InstructionError),
}

#[derive(Default, Debug, Clone)]
pub struct GraphicsControllerStats {
    pub direct_writes: u64,
    pub rmw_writes: u64,
    pub reads: u64,
    pub clears: u64,
}

pub struct GraphicsController {
    state: GfxState,
    cursor: PixelCursor,
    mode: GraphicsMode,
    page_offset: usize,
    palette: Palette,
    stats: GraphicsControllerStats,
}

impl Default for GraphicsController {
    fn default() -> Self {
        Self {
            state: GfxState::Idle,
            cursor: PixelCursor::default(),
            mode: GraphicsMode::Hires1bpp,
            page_offset: 0,
            palette: Palette::default(),
            stats: GraphicsControllerStats::default(),
        }
    }
}

impl GraphicsController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = GraphicsController::default();
    }

    pub fn cursor(&self) -> PixelCursor {
        self.cursor
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn is_idle(&self) -> bool {
        self.state == GfxState::Idle
    }

    pub fn stats(&self) -> &GraphicsControllerStats {
        &self.stats
    }

    /// Latch a new instruction along with the mode and working page it was issued under.
    pub fn begin(&mut self, instr: &Instruction) {
        if !self.is_idle() {
            log::error!("Graphics controller given {} while busy; ignored", instr.opcode);
            return;
        }
        let Some(mode) = instr.config.graphics_mode()
        else {
            self.state = GfxState::Fail(InstructionError::NotSelected(instr.opcode));
            return;
        };
        self.mode = mode;
        self.page_offset = instr.config.working_offset();

        let position = || PixelCursor {
            x: instr.op_u16(0),
            y: instr.op_u16(2),
        };

        self.state = match instr.opcode {
            Opcode::WritePixel => GfxState::WritePixel { value: instr.op(0) },
            Opcode::SetPixelPosition => GfxState::SetPosition(position()),
            Opcode::WriteAndPosition => GfxState::WriteAndPosition {
                cursor: position(),
                value:  instr.op(4),
            },
            Opcode::ClearScreen => GfxState::ClearScreen {
                index: 0,
                fill:  instr.op(0),
            },
            Opcode::ReadPixel => GfxState::ReadPresent(position()),
            Opcode::SetPaletteEntry | Opcode::GetPaletteEntry if mode != GraphicsMode::Med8bpp => {
                GfxState::Fail(InstructionError::PaletteMode)
            }
            Opcode::SetPaletteEntry => GfxState::SetPalette {
                index: instr.op(0),
                color: Rgb12::new(instr.op(1) >> 4, instr.op(1), instr.op(2)),
            },
            Opcode::GetPaletteEntry => GfxState::GetPalette { index: instr.op(0) },
            other => GfxState::Fail(InstructionError::NotSelected(other)),
        };
        log::trace!("Graphics controller ({}): Idle -> {:?}", mode, self.state);
    }

    /// One render clock. Returns the completion when the instruction finishes.
    pub fn clock(&mut self, arb: &mut MemoryArbiter) -> Option<Completion> {
        let result = match self.state {
            GfxState::Idle => return None,
            GfxState::WritePixel { value } => self.step_write_pixel(arb, value),
            GfxState::WriteAndPosition { cursor, value } => {
                // Position is taken unconditionally; the write below does the bounds check.
                self.cursor = cursor;
                self.step_write_pixel(arb, value)
            }
            GfxState::RmwModify { addr, value } => {
                let unit = self.mode.insert(arb.bitmap_q(), addr.shift, value);
                self.state = GfxState::RmwWrite {
                    unit_addr: addr.unit,
                    unit,
                };
                Ok(None)
            }
            GfxState::RmwWrite { unit_addr, unit } => arb.bitmap_write(PortOwner::Graphics, unit_addr, unit).map(|_| {
                self.stats.rmw_writes += 1;
                self.advance();
                Some(Completion::ok())
            }),
            GfxState::SetPosition(cursor) => {
                self.cursor = cursor;
                Ok(Some(Completion::ok()))
            }
            GfxState::ClearScreen { index, fill } => self.step_clear(arb, index, fill),
            GfxState::ReadPresent(at) => self.step_read_present(arb, at),
            GfxState::ReadWait { shift } => {
                self.state = GfxState::ReadExtract { shift };
                Ok(None)
            }
            GfxState::ReadExtract { shift } => {
                self.stats.reads += 1;
                let value = self.mode.extract(arb.bitmap_q(), shift);
                Ok(Some(Completion::with_results([value, 0])))
            }
            GfxState::SetPalette { index, color } => {
                self.palette.set(index, color);
                Ok(Some(Completion::ok()))
            }
            GfxState::GetPalette { index } => {
                let color = self.palette.lookup(index);
                Ok(Some(Completion::with_results([color.r << 4 | color.g, color.b])))
            }
            GfxState::Fail(err) => Ok(Some(Completion::failed(err))),
        };

        let completion = match result {
            Ok(None) => return None,
            Ok(Some(completion)) => completion,
            Err(err) => {
                log::error!("Graphics controller lost the memory port: {}", err);
                Completion::failed(InstructionError::Port)
            }
        };
        arb.release(PortOwner::Graphics);
        self.state = GfxState::Idle;
        log::trace!("Graphics controller: -> Idle");
        Some(completion)
    }

    fn bounds_error(&self, at: PixelCursor) -> InstructionError {
        InstructionError::Bounds {
            x: at.x,
            y: at.y,
            w: self.mode.width(),
            h: self.mode.height(),
        }
    }

    /// Move one pixel right, wrapping to the next row and finally back to the origin.
    fn advance(&mut self) {
        self.cursor.x += 1;
        if self.cursor.x >= self.mode.width() {
            self.cursor.x = 0;
            self.cursor.y += 1;
            if self.cursor.y >= self.mode.height() {
                self.cursor.y = 0;
            }
        }
    }

    fn step_write_pixel(&mut self, arb: &mut MemoryArbiter, value: u8) -> Result<Option<Completion>, ArbiterError> {
        if !self.mode.in_bounds(self.cursor.x, self.cursor.y) {
            return Ok(Some(Completion::failed(self.bounds_error(self.cursor))));
        }
        let addr = self.mode.locate(self.cursor.x, self.cursor.y, self.page_offset);
        arb.acquire(PortOwner::Graphics)?;

        if self.mode.pixels_per_unit() == 1 {
            arb.bitmap_write(PortOwner::Graphics, addr.unit, value)?;
            self.stats.direct_writes += 1;
            self.advance();
            return Ok(Some(Completion::ok()));
        }

        // RMW read: the unit arrives on the next clock
        arb.bitmap_read(PortOwner::Graphics, addr.unit)?;
        self.state = GfxState::RmwModify { addr, value };
        Ok(None)
    }

    fn step_clear(&mut self, arb: &mut MemoryArbiter, index: usize, fill: u8) -> Result<Option<Completion>, ArbiterError> {
        arb.acquire(PortOwner::Graphics)?;
        arb.bitmap_write(PortOwner::Graphics, self.page_offset + index, fill)?;

        if index + 1 < self.mode.page_size() {
            self.state = GfxState::ClearScreen { index: index + 1, fill };
            return Ok(None);
        }
        self.stats.clears += 1;
        self.cursor = PixelCursor::default();
        Ok(Some(Completion::ok()))
    }

    fn step_read_present(
        &mut self,
        arb: &mut MemoryArbiter,
        at: PixelCursor,
    ) -> Result<Option<Completion>, ArbiterError> {
        if !self.mode.in_bounds(at.x, at.y) {
            return Ok(Some(Completion::failed(self.bounds_error(at))));
        }
        let addr = self.mode.locate(at.x, at.y, self.page_offset);
        arb.acquire(PortOwner::Graphics)?;
        arb.bitmap_read(PortOwner::Graphics, addr.unit)?;
        self.state = GfxState::ReadWait { shift: addr.shift };
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::vidcon::{mode::ModeConfig, registers::OPERAND_COUNT};
    use strum::IntoEnumIterator;

    fn instr(mode_byte: u8, opcode: Opcode, ops: &[u8]) -> Instruction {
        let mut operands = [0; OPERAND_COUNT];
        operands[..ops.len()].copy_from_slice(ops);
        Instruction {
            opcode,
            operands,
            config: ModeConfig::from(mode_byte),
        }
    }

    fn xy(x: u16, y: u16) -> [u8; 4] {
        let [xh, xl] = x.to_be_bytes();
        let [yh, yl] = y.to_be_bytes();
        [xh, xl, yh, yl]
    }

    fn run(
        ctl: &mut GraphicsController,
        arb: &mut MemoryArbiter,
        mode_byte: u8,
        opcode: Opcode,
        ops: &[u8],
    ) -> (Completion, usize) {
        ctl.begin(&instr(mode_byte, opcode, ops));
        let mut clocks = 0;
        loop {
            clocks += 1;
            let done = ctl.clock(arb);
            arb.clock();
            if let Some(done) = done {
                return (done, clocks);
            }
            assert!(clocks < 100_000, "controller hung");
        }
    }

    #[test]
    fn write_then_read_every_mode() {
        for mode in GraphicsMode::iter() {
            let mb = mode.mode_bits();
            let mut ctl = GraphicsController::new();
            let mut arb = MemoryArbiter::new();
            let points = [(0, 0), (1, 0), (mode.width() - 1, mode.height() - 1), (117, 93)];
            for (i, &(x, y)) in points.iter().enumerate() {
                let value = 0xA5u8.rotate_left(i as u32);
                run(&mut ctl, &mut arb, mb, Opcode::SetPixelPosition, &xy(x, y));
                let (done, _) = run(&mut ctl, &mut arb, mb, Opcode::WritePixel, &[value]);
                assert!(!done.error, "{} write at ({},{})", mode, x, y);
                let (done, clocks) = run(&mut ctl, &mut arb, mb, Opcode::ReadPixel, &xy(x, y));
                assert_eq!(clocks, 3);
                assert_eq!(done.results, Some([value & mode.value_mask(), 0]), "{} ({},{})", mode, x, y);
            }
        }
    }

    #[test]
    fn two_bit_packing_sequence() {
        let mut ctl = GraphicsController::new();
        let mut arb = MemoryArbiter::new();
        run(&mut ctl, &mut arb, 2, Opcode::WritePixel, &[3]);
        run(&mut ctl, &mut arb, 2, Opcode::WritePixel, &[2]);
        assert_eq!(arb.peek_bitmap(0), 0b1110_0000);
        run(&mut ctl, &mut arb, 2, Opcode::SetPixelPosition, &xy(3, 0));
        run(&mut ctl, &mut arb, 2, Opcode::WritePixel, &[1]);
        assert_eq!(arb.peek_bitmap(0), 0b1110_0001);
    }

    #[test]
    fn rmw_takes_three_clocks_and_direct_write_one() {
        let mut ctl = GraphicsController::new();
        let mut arb = MemoryArbiter::new();
        let (_, clocks) = run(&mut ctl, &mut arb, 3, Opcode::WritePixel, &[0xF]);
        assert_eq!(clocks, 3);
        let (_, clocks) = run(&mut ctl, &mut arb, 4, Opcode::WritePixel, &[0x42]);
        assert_eq!(clocks, 1);
        assert_eq!(ctl.stats().rmw_writes, 1);
        assert_eq!(ctl.stats().direct_writes, 1);
    }

    #[test]
    fn rmw_holds_port_a_until_written() {
        let mut ctl = GraphicsController::new();
        let mut arb = MemoryArbiter::new();
        ctl.begin(&instr(1, Opcode::WritePixel, &[1]));
        for _ in 0..2 {
            assert!(ctl.clock(&mut arb).is_none());
            assert_eq!(arb.holder(), Some(PortOwner::Graphics));
            arb.clock();
        }
        assert!(ctl.clock(&mut arb).is_some());
        assert_eq!(arb.holder(), None);
        arb.clock();
        assert_eq!(arb.peek_bitmap(0), 0x80);
    }

    #[test]
    fn sub_byte_write_preserves_other_fields() {
        let mut ctl = GraphicsController::new();
        let mut arb = MemoryArbiter::new();
        run(&mut ctl, &mut arb, 1, Opcode::ClearScreen, &[0b1010_1010]);
        run(&mut ctl, &mut arb, 1, Opcode::SetPixelPosition, &xy(1, 0));
        run(&mut ctl, &mut arb, 1, Opcode::WritePixel, &[1]);
        run(&mut ctl, &mut arb, 1, Opcode::WritePixel, &[1]);
        assert_eq!(arb.peek_bitmap(0), 0b1110_1010);
        assert_eq!(arb.peek_bitmap(1), 0b1010_1010);
    }

    #[test]
    fn position_is_not_checked_until_write() {
        for mode in GraphicsMode::iter() {
            let mb = mode.mode_bits();
            let mut ctl = GraphicsController::new();
            let mut arb = MemoryArbiter::new();

            let (done, _) = run(&mut ctl, &mut arb, mb, Opcode::SetPixelPosition, &xy(mode.width() - 1, mode.height() - 1));
            assert!(!done.error);
            let (done, _) = run(&mut ctl, &mut arb, mb, Opcode::WritePixel, &[1]);
            assert!(!done.error);
            // Wrapped back to the origin
            assert_eq!(ctl.cursor(), PixelCursor::default());

            let (done, _) = run(&mut ctl, &mut arb, mb, Opcode::SetPixelPosition, &xy(mode.width(), mode.height()));
            assert!(!done.error, "{}", mode);
            let before = arb.bitmap().to_vec();
            let (done, _) = run(&mut ctl, &mut arb, mb, Opcode::WritePixel, &[1]);
            assert!(done.error);
            assert_eq!(arb.bitmap(), &before[..]);

            let (done, _) = run(&mut ctl, &mut arb, mb, Opcode::ReadPixel, &xy(0, mode.height()));
            assert!(done.error);
            assert_eq!(done.results, None);
        }
    }

    #[test]
    fn write_and_position_sets_then_advances() {
        let mut ctl = GraphicsController::new();
        let mut arb = MemoryArbiter::new();
        let mut ops = xy(319, 10).to_vec();
        ops.push(0x77);
        let (done, _) = run(&mut ctl, &mut arb, 4, Opcode::WriteAndPosition, &ops);
        assert!(!done.error);
        assert_eq!(arb.peek_bitmap(10 * 320 + 319), 0x77);
        assert_eq!(ctl.cursor(), PixelCursor { x: 0, y: 11 });

        let mut ops = xy(320, 0).to_vec();
        ops.push(0x77);
        let (done, _) = run(&mut ctl, &mut arb, 4, Opcode::WriteAndPosition, &ops);
        assert!(done.error);
        assert_eq!(ctl.cursor(), PixelCursor { x: 320, y: 0 });
    }

    #[test]
    fn clear_screen_fills_working_page_only() {
        let mut ctl = GraphicsController::new();
        let mut arb = MemoryArbiter::new();
        run(&mut ctl, &mut arb, 2, Opcode::SetPixelPosition, &xy(5, 5));
        // Mode 2 with the working page bit set
        let (_, clocks) = run(&mut ctl, &mut arb, 0b0001_0010, Opcode::ClearScreen, &[0x5A]);
        let page = GraphicsMode::Med2bpp.page_size();
        assert_eq!(clocks, page);
        assert_eq!(ctl.cursor(), PixelCursor::default());
        assert_eq!(arb.peek_bitmap(page - 1), 0);
        assert_eq!(arb.peek_bitmap(page), 0x5A);
        assert_eq!(arb.peek_bitmap(2 * page - 1), 0x5A);
        assert_eq!(arb.peek_bitmap(2 * page), 0);
    }

    #[test]
    fn largest_clear_takes_one_clock_per_unit() {
        let mut ctl = GraphicsController::new();
        let mut arb = MemoryArbiter::new();
        let (_, clocks) = run(&mut ctl, &mut arb, 4, Opcode::ClearScreen, &[0x01]);
        assert_eq!(clocks, 76_800);
        assert!(arb.bitmap().iter().all(|&b| b == 0x01));
    }

    #[test]
    fn palette_entries() {
        let mut ctl = GraphicsController::new();
        let mut arb = MemoryArbiter::new();
        let (done, _) = run(&mut ctl, &mut arb, 4, Opcode::SetPaletteEntry, &[0x80, 0x3C, 0x09]);
        assert!(!done.error);
        assert_eq!(ctl.palette().lookup(0x80), Rgb12::new(0x3, 0xC, 0x9));
        let (done, _) = run(&mut ctl, &mut arb, 4, Opcode::GetPaletteEntry, &[0x80]);
        assert_eq!(done.results, Some([0x3C, 0x09]));

        let (done, _) = run(&mut ctl, &mut arb, 3, Opcode::SetPaletteEntry, &[0x80, 0xFF, 0x0F]);
        assert!(done.error);
        assert_eq!(ctl.palette().lookup(0x80), Rgb12::new(0x3, 0xC, 0x9));
    }
}
