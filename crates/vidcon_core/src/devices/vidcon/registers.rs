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

    devices::vidcon::registers.rs

    The sixteen byte command register file and its bitfield views.

*/

use modular_bitfield::{bitfield, prelude::*};

pub const REGISTER_COUNT: usize = 16;
pub const OPERAND_COUNT: usize = 11;

pub const REG_MODE: usize = 0;
pub const REG_OPCODE: usize = 1;
pub const REG_OPERAND0: usize = 2;
pub const REG_OPERAND_LAST: usize = REG_OPERAND0 + OPERAND_COUNT - 1;
pub const REG_RESULT0: usize = 13;
pub const REG_RESULT1: usize = 14;
pub const REG_STATUS: usize = 15;

pub const REGISTER_NAMES: [&str; REGISTER_COUNT] = [
    "Mode/Config",
    "Opcode",
    "Operand 0",
    "Operand 1",
    "Operand 2",
    "Operand 3",
    "Operand 4",
    "Operand 5",
    "Operand 6",
    "Operand 7",
    "Operand 8",
    "Operand 9",
    "Operand 10",
    "Result 0",
    "Result 1",
    "Status",
];

#[bitfield]
#[derive(Copy, Clone)]
pub struct ModeRegister {
    pub mode: B3,
    pub active_page: bool,
    pub working_page: bool,
    pub cursor_enable: bool,
    pub cursor_blink: bool,
    #[skip]
    unused: B1,
}

#[bitfield]
#[derive(Copy, Clone)]
pub struct StatusRegister {
    pub busy: bool,
    pub error: bool,
    #[skip]
    unused: B5,
    pub ready: bool,
}

impl Default for StatusRegister {
    fn default() -> Self {
        StatusRegister::new().with_ready(true)
    }
}

/// Text attribute byte: foreground index, background index and blink flag.
#[bitfield]
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct CharAttribute {
    pub fg: B4,
    pub bg: B3,
    pub blink: bool,
}

impl From<u8> for CharAttribute {
    fn from(byte: u8) -> Self {
        CharAttribute::from_bytes([byte])
    }
}

/// Backing store for slots 0-14. The status register is composed on read by the dispatcher.
#[derive(Clone, Debug, Default)]
pub struct RegisterFile {
    regs: [u8; REGISTER_COUNT],
}

impl RegisterFile {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn read(&self, slot: usize) -> u8 {
        self.regs[slot & 0x0F]
    }

    #[inline]
    pub fn write(&mut self, slot: usize, byte: u8) {
        self.regs[slot & 0x0F] = byte;
    }

    /// Snapshot of slots 2-12.
    pub fn operands(&self) -> [u8; OPERAND_COUNT] {
        let mut ops = [0; OPERAND_COUNT];
        ops.copy_from_slice(&self.regs[REG_OPERAND0..=REG_OPERAND_LAST]);
        ops
    }

    pub fn set_results(&mut self, results: [u8; 2]) {
        self.regs[REG_RESULT0] = results[0];
        self.regs[REG_RESULT1] = results[1];
    }

    pub fn is_host_writable(slot: usize) -> bool {
        slot <= REG_OPERAND_LAST
    }

    pub fn reset(&mut self) {
        self.regs = [0; REGISTER_COUNT];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_register_bit_layout() {
        let mode = ModeRegister::from_bytes([0b0111_1011]);
        assert_eq!(mode.mode(), 3);
        assert!(mode.active_page());
        assert!(mode.working_page());
        assert!(mode.cursor_enable());
        assert!(mode.cursor_blink());
    }

    #[test]
    fn status_register_bit_layout() {
        let status = StatusRegister::default();
        assert_eq!(status.into_bytes()[0], 0x80);
        let status = status.with_busy(true).with_error(true).with_ready(false);
        assert_eq!(status.into_bytes()[0], 0x03);
    }

    #[test]
    fn attribute_split() {
        let attr = CharAttribute::from(0x9E);
        assert_eq!(attr.fg(), 0x0E);
        assert_eq!(attr.bg(), 0x01);
        assert!(attr.blink());
    }

    #[test]
    fn operand_snapshot_covers_slots_2_to_12() {
        let mut regs = RegisterFile::new();
        for slot in 0..REGISTER_COUNT {
            regs.write(slot, slot as u8);
        }
        assert_eq!(regs.operands(), [2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
        assert!(RegisterFile::is_host_writable(12));
        assert!(!RegisterFile::is_host_writable(REG_RESULT0));
        assert!(!RegisterFile::is_host_writable(REG_STATUS));
    }
}
