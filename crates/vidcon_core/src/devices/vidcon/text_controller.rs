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

    devices::vidcon::text_controller.rs

    Text mode controller. Executes text instructions against an 80x31 ring buffer
    of 16-bit character cells, of which 30 rows are visible at any time. Scrolling
    moves the ring's origin instead of copying rows.

*/

use super::{
    instruction::{Completion, Instruction, InstructionError, Opcode},
    memory::{ArbiterError, MemoryArbiter, PortOwner},
};

pub const TEXT_COLS: usize = 80;
pub const TEXT_ROWS: usize = 30;
pub const TEXT_PHYS_ROWS: usize = TEXT_ROWS + 1;

pub const DEFAULT_ATTR: u8 = 0x07;
const SPACE: u8 = 0x20;
const TAB_WIDTH: u8 = 8;

pub const CTRL_BACKSPACE: u8 = 0x08;
pub const CTRL_TAB: u8 = 0x09;
pub const CTRL_LINE_FEED: u8 = 0x0A;
pub const CTRL_CARRIAGE_RETURN: u8 = 0x0D;
pub const CTRL_DELETE: u8 = 0x7F;

#[inline]
pub fn make_cell(attr: u8, code: u8) -> u16 {
    (attr as u16) << 8 | code as u16
}

/// Split a cell into (code, attribute).
#[inline]
pub fn split_cell(cell: u16) -> (u8, u8) {
    (cell as u8, (cell >> 8) as u8)
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CursorState {
    pub row: u8,
    pub col: u8,
    pub scroll_offset: u8,
}

impl CursorState {
    /// Store address of a visible cell, resolved through the scroll offset.
    #[inline]
    pub fn cell_addr(&self, row: u8, col: u8) -> usize {
        ((row as usize + self.scroll_offset as usize) % TEXT_PHYS_ROWS) * TEXT_COLS + col as usize
    }
}

/// What to do once a scroll has finished clearing the exposed row.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Resume {
    Write(u16),
    Done,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum TextState {
    Idle,
    Write { cell: u16 },
    ScrollClear { col: u8, resume: Resume },
    SetPosition { row: u8, col: u8 },
    Clear { index: usize, attr: u8 },
    ReadPresent { row: u8, col: u8 },
    ReadWait,
    ReadCapture,
    ControlCode(u8),
    Fail(InstructionError),
}

pub struct TextController {
    state: TextState,
    cursor: CursorState,
    default_attr: u8,
    pending_wrap: bool,
    scrolls: u64,
}

impl Default for TextController {
    fn default() -> Self {
        Self {
            state: TextState::Idle,
            cursor: CursorState::default(),
            default_attr: DEFAULT_ATTR,
            pending_wrap: false,
            scrolls: 0,
        }
    }
}

impl TextController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = TextController::default();
    }

    pub fn cursor(&self) -> CursorState {
        self.cursor
    }

    pub fn default_attr(&self) -> u8 {
        self.default_attr
    }

    pub fn is_idle(&self) -> bool {
        self.state == TextState::Idle
    }

    /// Number of scrolls performed since reset.
    pub fn scrolls(&self) -> u64 {
        self.scrolls
    }

    /// Latch a new instruction. Only valid while idle.
    pub fn begin(&mut self, instr: &Instruction) {
        if !self.is_idle() {
            log::error!("Text controller given {} while busy; ignored", instr.opcode);
            return;
        }
        self.state = match instr.opcode {
            Opcode::Write => {
                let attr = match instr.op(0) {
                    0 => self.default_attr,
                    attr => attr,
                };
                TextState::Write {
                    cell: make_cell(attr, instr.op(1)),
                }
            }
            Opcode::SetPosition => TextState::SetPosition {
                row: instr.op(0),
                col: instr.op(1),
            },
            Opcode::Clear => TextState::Clear {
                index: 0,
                attr:  instr.op(0),
            },
            Opcode::ReadAt => TextState::ReadPresent {
                row: instr.op(0),
                col: instr.op(1),
            },
            Opcode::ControlCode => TextState::ControlCode(instr.op(0)),
            other => TextState::Fail(InstructionError::NotSelected(other)),
        };
        log::trace!("Text controller: Idle -> {:?}", self.state);
    }

    /// One render clock. Returns the completion when the instruction finishes.
    pub fn clock(&mut self, arb: &mut MemoryArbiter) -> Option<Completion> {
        let result = match self.state {
            TextState::Idle => return None,
            TextState::Write { cell } => self.step_write(arb, cell),
            TextState::ScrollClear { col, resume } => self.step_scroll_clear(arb, col, resume),
            TextState::SetPosition { row, col } => Ok(Some(self.set_position(row, col))),
            TextState::Clear { index, attr } => self.step_clear(arb, index, attr),
            TextState::ReadPresent { row, col } => self.step_read_present(arb, row, col),
            TextState::ReadWait => {
                self.state = TextState::ReadCapture;
                Ok(None)
            }
            TextState::ReadCapture => {
                let (code, attr) = split_cell(arb.text_q());
                Ok(Some(Completion::with_results([code, attr])))
            }
            TextState::ControlCode(code) => self.step_control_code(arb, code),
            TextState::Fail(err) => Ok(Some(Completion::failed(err))),
        };

        let completion = match result {
            Ok(None) => return None,
            Ok(Some(completion)) => completion,
            Err(err) => {
                log::error!("Text controller lost the memory port: {}", err);
                Completion::failed(InstructionError::Port)
            }
        };
        arb.release(PortOwner::Text);
        self.state = TextState::Idle;
        log::trace!("Text controller: -> Idle");
        Some(completion)
    }

    fn store(&mut self, arb: &mut MemoryArbiter, addr: usize, cell: u16) -> Result<(), ArbiterError> {
        arb.acquire(PortOwner::Text)?;
        arb.text_write(PortOwner::Text, addr, cell)
    }

    fn begin_scroll(&mut self, resume: Resume) {
        self.cursor.scroll_offset = (self.cursor.scroll_offset + 1) % TEXT_PHYS_ROWS as u8;
        self.scrolls += 1;
        log::debug!("Text scroll, origin now physical row {}", self.cursor.scroll_offset);
        self.state = TextState::ScrollClear { col: 0, resume };
    }

    /// Move to the start of the next line, scrolling on the last visible row. Returns false if
    /// a scroll was started and the caller must wait for it.
    fn newline(&mut self, resume: Resume) -> bool {
        self.pending_wrap = false;
        self.cursor.col = 0;
        if (self.cursor.row as usize) < TEXT_ROWS - 1 {
            self.cursor.row += 1;
            true
        }
        else {
            self.begin_scroll(resume);
            false
        }
    }

    fn step_write(&mut self, arb: &mut MemoryArbiter, cell: u16) -> Result<Option<Completion>, ArbiterError> {
        if self.pending_wrap && !self.newline(Resume::Write(cell)) {
            return Ok(None);
        }
        let addr = self.cursor.cell_addr(self.cursor.row, self.cursor.col);
        self.store(arb, addr, cell)?;

        if (self.cursor.col as usize) < TEXT_COLS - 1 {
            self.cursor.col += 1;
        }
        else {
            self.pending_wrap = true;
        }
        Ok(Some(Completion::ok()))
    }

    fn step_scroll_clear(
        &mut self,
        arb: &mut MemoryArbiter,
        col: u8,
        resume: Resume,
    ) -> Result<Option<Completion>, ArbiterError> {
        let addr = self.cursor.cell_addr(TEXT_ROWS as u8 - 1, col);
        self.store(arb, addr, make_cell(self.default_attr, 0))?;

        if (col as usize) < TEXT_COLS - 1 {
            self.state = TextState::ScrollClear { col: col + 1, resume };
            return Ok(None);
        }
        match resume {
            Resume::Write(cell) => {
                self.state = TextState::Write { cell };
                Ok(None)
            }
            Resume::Done => Ok(Some(Completion::ok())),
        }
    }

    fn set_position(&mut self, row: u8, col: u8) -> Completion {
        if (row as usize) < TEXT_ROWS && (col as usize) < TEXT_COLS {
            self.cursor.row = row;
            self.cursor.col = col;
            self.pending_wrap = false;
            Completion::ok()
        }
        else {
            Completion::failed(InstructionError::Bounds {
                x: col as u16,
                y: row as u16,
                w: TEXT_COLS as u16,
                h: TEXT_ROWS as u16,
            })
        }
    }

    fn step_clear(
        &mut self,
        arb: &mut MemoryArbiter,
        index: usize,
        attr: u8,
    ) -> Result<Option<Completion>, ArbiterError> {
        self.store(arb, index, make_cell(attr, 0))?;

        if index + 1 < TEXT_COLS * TEXT_PHYS_ROWS {
            self.state = TextState::Clear { index: index + 1, attr };
            return Ok(None);
        }
        self.cursor = CursorState::default();
        self.pending_wrap = false;
        self.default_attr = attr;
        Ok(Some(Completion::ok()))
    }

    fn step_read_present(
        &mut self,
        arb: &mut MemoryArbiter,
        row: u8,
        col: u8,
    ) -> Result<Option<Completion>, ArbiterError> {
        if row as usize >= TEXT_ROWS || col as usize >= TEXT_COLS {
            return Ok(Some(Completion::failed(InstructionError::Bounds {
                x: col as u16,
                y: row as u16,
                w: TEXT_COLS as u16,
                h: TEXT_ROWS as u16,
            })));
        }
        arb.acquire(PortOwner::Text)?;
        arb.text_read(PortOwner::Text, self.cursor.cell_addr(row, col))?;
        self.state = TextState::ReadWait;
        Ok(None)
    }

    fn step_control_code(&mut self, arb: &mut MemoryArbiter, code: u8) -> Result<Option<Completion>, ArbiterError> {
        let blank = make_cell(self.default_attr, SPACE);
        match code {
            CTRL_BACKSPACE => {
                // Never wraps back to the previous row
                self.pending_wrap = false;
                self.cursor.col = self.cursor.col.saturating_sub(1);
                let addr = self.cursor.cell_addr(self.cursor.row, self.cursor.col);
                self.store(arb, addr, blank)?;
            }
            CTRL_TAB => {
                self.pending_wrap = false;
                let next = (self.cursor.col / TAB_WIDTH + 1) * TAB_WIDTH;
                self.cursor.col = next.min(TEXT_COLS as u8 - 1);
            }
            CTRL_LINE_FEED => {
                if !self.newline(Resume::Done) {
                    return Ok(None);
                }
            }
            CTRL_CARRIAGE_RETURN => {
                self.pending_wrap = false;
                self.cursor.col = 0;
            }
            CTRL_DELETE => {
                let addr = self.cursor.cell_addr(self.cursor.row, self.cursor.col);
                self.store(arb, addr, blank)?;
            }
            _ => return Ok(Some(Completion::failed(InstructionError::ControlCode(code)))),
        }
        Ok(Some(Completion::ok()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::vidcon::{mode::ModeConfig, registers::OPERAND_COUNT};

    fn instr(opcode: Opcode, ops: &[u8]) -> Instruction {
        let mut operands = [0; OPERAND_COUNT];
        operands[..ops.len()].copy_from_slice(ops);
        Instruction {
            opcode,
            operands,
            config: ModeConfig::default(),
        }
    }

    /// Run an instruction to completion, returning the completion and the clocks it took.
    fn run(ctl: &mut TextController, arb: &mut MemoryArbiter, opcode: Opcode, ops: &[u8]) -> (Completion, usize) {
        ctl.begin(&instr(opcode, ops));
        let mut clocks = 0;
        loop {
            clocks += 1;
            let done = ctl.clock(arb);
            arb.clock();
            if let Some(done) = done {
                return (done, clocks);
            }
            assert!(clocks < 10_000, "controller hung");
        }
    }

    fn visible(ctl: &TextController, arb: &MemoryArbiter, row: u8, col: u8) -> (u8, u8) {
        split_cell(arb.peek_text(ctl.cursor().cell_addr(row, col)))
    }

    #[test]
    fn write_then_read_back() {
        let mut ctl = TextController::new();
        let mut arb = MemoryArbiter::new();
        run(&mut ctl, &mut arb, Opcode::SetPosition, &[12, 40]);
        let (done, clocks) = run(&mut ctl, &mut arb, Opcode::Write, &[0x1E, b'Q']);
        assert_eq!(done, Completion::ok());
        assert_eq!(clocks, 1);
        assert_eq!(ctl.cursor().col, 41);

        let (done, clocks) = run(&mut ctl, &mut arb, Opcode::ReadAt, &[12, 40]);
        assert_eq!(done.results, Some([b'Q', 0x1E]));
        assert_eq!(clocks, 3);
        assert_eq!(arb.holder(), None);
    }

    #[test]
    fn zero_attribute_uses_default() {
        let mut ctl = TextController::new();
        let mut arb = MemoryArbiter::new();
        run(&mut ctl, &mut arb, Opcode::Write, &[0x00, b'x']);
        assert_eq!(visible(&ctl, &arb, 0, 0), (b'x', DEFAULT_ATTR));
    }

    #[test]
    fn set_position_checks_bounds_eagerly() {
        let mut ctl = TextController::new();
        let mut arb = MemoryArbiter::new();
        run(&mut ctl, &mut arb, Opcode::SetPosition, &[29, 79]);
        let (done, _) = run(&mut ctl, &mut arb, Opcode::SetPosition, &[30, 0]);
        assert!(done.error);
        let (done, _) = run(&mut ctl, &mut arb, Opcode::SetPosition, &[0, 80]);
        assert!(done.error);
        assert_eq!((ctl.cursor().row, ctl.cursor().col), (29, 79));
    }

    #[test]
    fn read_out_of_range_fails() {
        let mut ctl = TextController::new();
        let mut arb = MemoryArbiter::new();
        let (done, clocks) = run(&mut ctl, &mut arb, Opcode::ReadAt, &[30, 0]);
        assert!(done.error);
        assert_eq!(done.results, None);
        assert_eq!(clocks, 1);
    }

    #[test]
    fn clear_fills_every_cell_and_adopts_attribute() {
        let mut ctl = TextController::new();
        let mut arb = MemoryArbiter::new();
        run(&mut ctl, &mut arb, Opcode::SetPosition, &[5, 5]);
        let (_, clocks) = run(&mut ctl, &mut arb, Opcode::Clear, &[0x1F]);
        assert_eq!(clocks, TEXT_COLS * TEXT_PHYS_ROWS);
        assert_eq!(ctl.cursor(), CursorState::default());
        assert_eq!(ctl.default_attr(), 0x1F);
        for addr in 0..TEXT_COLS * TEXT_PHYS_ROWS {
            assert_eq!(arb.peek_text(addr), 0x1F00);
        }
    }

    // The 81st character both triggers the scroll and occupies column 0 of the exposed row,
    // so the new row is blank from column 1 onward.
    #[test]
    fn last_row_fills_without_scroll_and_next_write_scrolls_once() {
        let mut ctl = TextController::new();
        let mut arb = MemoryArbiter::new();
        run(&mut ctl, &mut arb, Opcode::Clear, &[0x07]);
        run(&mut ctl, &mut arb, Opcode::SetPosition, &[29, 0]);
        for col in 0..80u8 {
            run(&mut ctl, &mut arb, Opcode::Write, &[0x0F, b'0' + col % 10]);
        }
        assert_eq!(ctl.scrolls(), 0);
        assert_eq!(ctl.cursor().scroll_offset, 0);
        assert_eq!(visible(&ctl, &arb, 29, 79), (b'9', 0x0F));

        // One clock to start the scroll, 80 to clear the exposed row, one to store
        let (_, clocks) = run(&mut ctl, &mut arb, Opcode::Write, &[0x0F, b'!']);
        assert_eq!(clocks, 82);
        assert_eq!(ctl.scrolls(), 1);
        assert_eq!(ctl.cursor().scroll_offset, 1);
        assert_eq!((ctl.cursor().row, ctl.cursor().col), (29, 1));
        // The old last row moved up one, the exposed row is blank apart from the new character
        assert_eq!(visible(&ctl, &arb, 28, 0), (b'0', 0x0F));
        assert_eq!(visible(&ctl, &arb, 29, 0), (b'!', 0x0F));
        for col in 1..80 {
            assert_eq!(visible(&ctl, &arb, 29, col), (0, 0x07));
        }
    }

    #[test]
    fn scroll_offset_wraps_around_the_ring() {
        let mut ctl = TextController::new();
        let mut arb = MemoryArbiter::new();
        run(&mut ctl, &mut arb, Opcode::SetPosition, &[29, 0]);
        for _ in 0..TEXT_PHYS_ROWS {
            run(&mut ctl, &mut arb, Opcode::ControlCode, &[CTRL_LINE_FEED]);
        }
        assert_eq!(ctl.cursor().scroll_offset, 0);
        assert_eq!(ctl.scrolls(), TEXT_PHYS_ROWS as u64);
    }

    #[test]
    fn control_codes() {
        let mut ctl = TextController::new();
        let mut arb = MemoryArbiter::new();

        // Backspace at column 0 stays put and blanks the cell
        run(&mut ctl, &mut arb, Opcode::Write, &[0x0F, b'a']);
        run(&mut ctl, &mut arb, Opcode::SetPosition, &[1, 0]);
        run(&mut ctl, &mut arb, Opcode::ControlCode, &[CTRL_BACKSPACE]);
        assert_eq!((ctl.cursor().row, ctl.cursor().col), (1, 0));
        assert_eq!(visible(&ctl, &arb, 1, 0), (b' ', DEFAULT_ATTR));
        assert_eq!(visible(&ctl, &arb, 0, 0), (b'a', 0x0F));

        // Backspace mid-row moves left then blanks
        run(&mut ctl, &mut arb, Opcode::Write, &[0x0F, b'b']);
        run(&mut ctl, &mut arb, Opcode::ControlCode, &[CTRL_BACKSPACE]);
        assert_eq!(ctl.cursor().col, 0);
        assert_eq!(visible(&ctl, &arb, 1, 0), (b' ', DEFAULT_ATTR));

        // Tab stops every 8 columns, clamped to the last column
        run(&mut ctl, &mut arb, Opcode::ControlCode, &[CTRL_TAB]);
        assert_eq!(ctl.cursor().col, 8);
        run(&mut ctl, &mut arb, Opcode::SetPosition, &[1, 75]);
        run(&mut ctl, &mut arb, Opcode::ControlCode, &[CTRL_TAB]);
        assert_eq!(ctl.cursor().col, 79);

        // Carriage return and line feed
        run(&mut ctl, &mut arb, Opcode::ControlCode, &[CTRL_CARRIAGE_RETURN]);
        assert_eq!((ctl.cursor().row, ctl.cursor().col), (1, 0));
        run(&mut ctl, &mut arb, Opcode::SetPosition, &[1, 9]);
        run(&mut ctl, &mut arb, Opcode::ControlCode, &[CTRL_LINE_FEED]);
        assert_eq!((ctl.cursor().row, ctl.cursor().col), (2, 0));

        // Delete blanks in place
        run(&mut ctl, &mut arb, Opcode::SetPosition, &[0, 0]);
        run(&mut ctl, &mut arb, Opcode::ControlCode, &[CTRL_DELETE]);
        assert_eq!(visible(&ctl, &arb, 0, 0), (b' ', DEFAULT_ATTR));
        assert_eq!(ctl.cursor().col, 0);

        let (done, _) = run(&mut ctl, &mut arb, Opcode::ControlCode, &[0x1B]);
        assert!(done.error);
    }

    #[test]
    fn line_feed_on_last_row_scrolls() {
        let mut ctl = TextController::new();
        let mut arb = MemoryArbiter::new();
        run(&mut ctl, &mut arb, Opcode::SetPosition, &[29, 4]);
        run(&mut ctl, &mut arb, Opcode::Write, &[0x0E, b'z']);
        let (_, clocks) = run(&mut ctl, &mut arb, Opcode::ControlCode, &[CTRL_LINE_FEED]);
        assert_eq!(clocks, 81);
        assert_eq!((ctl.cursor().row, ctl.cursor().col), (29, 0));
        assert_eq!(visible(&ctl, &arb, 28, 4), (b'z', 0x0E));
    }

    #[test]
    fn graphics_opcode_fails_without_touching_memory() {
        let mut ctl = TextController::new();
        let mut arb = MemoryArbiter::new();
        let (done, _) = run(&mut ctl, &mut arb, Opcode::WritePixel, &[1]);
        assert!(done.error);
        assert_eq!(arb.stats().a_writes, 0);
    }
}
