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

    devices::vidcon::instruction.rs

    Opcode table, captured instructions and the completion record returned by a
    mode controller.

*/

use strum_macros::Display;
use thiserror::Error;

use super::{
    mode::{ControllerSelect, ModeConfig},
    registers::{OPERAND_COUNT, REG_OPERAND0},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Display)]
pub enum Opcode {
    Write,
    SetPosition,
    Clear,
    ReadAt,
    ControlCode,
    WritePixel,
    SetPixelPosition,
    WriteAndPosition,
    ClearScreen,
    ReadPixel,
    SetPaletteEntry,
    GetPaletteEntry,
}

impl Opcode {
    pub fn decode(byte: u8) -> Option<Opcode> {
        match byte {
            0x00 => Some(Opcode::Write),
            0x01 => Some(Opcode::SetPosition),
            0x02 => Some(Opcode::Clear),
            0x03 => Some(Opcode::ReadAt),
            0x04 => Some(Opcode::ControlCode),
            0x10 => Some(Opcode::WritePixel),
            0x11 => Some(Opcode::SetPixelPosition),
            0x12 => Some(Opcode::WriteAndPosition),
            0x13 => Some(Opcode::ClearScreen),
            0x14 => Some(Opcode::ReadPixel),
            0x20 => Some(Opcode::SetPaletteEntry),
            0x21 => Some(Opcode::GetPaletteEntry),
            _ => None,
        }
    }

    pub fn byte(&self) -> u8 {
        match self {
            Opcode::Write => 0x00,
            Opcode::SetPosition => 0x01,
            Opcode::Clear => 0x02,
            Opcode::ReadAt => 0x03,
            Opcode::ControlCode => 0x04,
            Opcode::WritePixel => 0x10,
            Opcode::SetPixelPosition => 0x11,
            Opcode::WriteAndPosition => 0x12,
            Opcode::ClearScreen => 0x13,
            Opcode::ReadPixel => 0x14,
            Opcode::SetPaletteEntry => 0x20,
            Opcode::GetPaletteEntry => 0x21,
        }
    }

    /// Number of operand bytes the instruction consumes. The last one is the trigger.
    pub fn operand_count(&self) -> usize {
        match self {
            Opcode::Write | Opcode::SetPosition | Opcode::ReadAt => 2,
            Opcode::Clear | Opcode::ControlCode => 1,
            Opcode::WritePixel | Opcode::ClearScreen | Opcode::GetPaletteEntry => 1,
            Opcode::SetPixelPosition | Opcode::ReadPixel => 4,
            Opcode::WriteAndPosition => 5,
            Opcode::SetPaletteEntry => 3,
        }
    }

    /// Register slot whose write captures the operands and requests execution.
    pub fn trigger_slot(&self) -> usize {
        REG_OPERAND0 + self.operand_count() - 1
    }

    /// Controller that executes the opcode, by numeric range.
    pub fn target(&self) -> ControllerSelect {
        if self.byte() < 0x10 {
            ControllerSelect::Text
        }
        else {
            ControllerSelect::Graphics
        }
    }
}

/// Trigger slot for any opcode register value. Unrecognized opcodes trigger on operand 0 so
/// that the write can be flagged as an error.
pub fn trigger_slot_for(opcode: u8) -> usize {
    Opcode::decode(opcode)
        .map(|op| op.trigger_slot())
        .unwrap_or(REG_OPERAND0)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub opcode:   Opcode,
    pub operands: [u8; OPERAND_COUNT],
    pub config:   ModeConfig,
}

impl Instruction {
    #[inline]
    pub fn op(&self, n: usize) -> u8 {
        self.operands[n]
    }

    /// Big-endian 16-bit operand pair starting at operand `n`.
    #[inline]
    pub fn op_u16(&self, n: usize) -> u16 {
        u16::from_be_bytes([self.operands[n], self.operands[n + 1]])
    }
}

/// Reported by a controller when it returns to Idle.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Completion {
    pub error:   bool,
    pub results: Option<[u8; 2]>,
}

impl Completion {
    pub fn ok() -> Self {
        Completion::default()
    }

    pub fn with_results(results: [u8; 2]) -> Self {
        Completion {
            error:   false,
            results: Some(results),
        }
    }

    pub fn failed(err: InstructionError) -> Self {
        log::warn!("Instruction failed: {}", err);
        Completion {
            error:   true,
            results: None,
        }
    }
}

/// Every kind below surfaces to the host identically, as the Error status bit.
#[derive(Error, Copy, Clone, Debug, PartialEq, Eq)]
pub enum InstructionError {
    #[error("Trigger written while busy; instruction dropped")]
    Protocol,
    #[error("Unrecognized opcode {0:02X}")]
    Opcode(u8),
    #[error("{0} not available in the current mode")]
    NotSelected(Opcode),
    #[error("Position ({x},{y}) outside {w}x{h}")]
    Bounds { x: u16, y: u16, w: u16, h: u16 },
    #[error("Unrecognized control code {0:02X}")]
    ControlCode(u8),
    #[error("Palette access outside 8bpp mode")]
    PaletteMode,
    #[error("Memory port unavailable")]
    Port,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_table() {
        let table = [
            (0x00, 3),
            (0x01, 3),
            (0x02, 2),
            (0x03, 3),
            (0x04, 2),
            (0x10, 2),
            (0x11, 5),
            (0x12, 6),
            (0x13, 2),
            (0x14, 5),
            (0x20, 4),
            (0x21, 2),
        ];
        for (byte, slot) in table {
            let op = Opcode::decode(byte).unwrap();
            assert_eq!(op.byte(), byte);
            assert_eq!(op.trigger_slot(), slot, "{}", op);
        }
        assert_eq!(trigger_slot_for(0x7E), REG_OPERAND0);
    }

    #[test]
    fn opcode_ranges_route_to_controllers() {
        assert_eq!(Opcode::ReadAt.target(), ControllerSelect::Text);
        assert_eq!(Opcode::ClearScreen.target(), ControllerSelect::Graphics);
        assert_eq!(Opcode::GetPaletteEntry.target(), ControllerSelect::Graphics);
    }

    #[test]
    fn big_endian_operand_pairs() {
        let mut operands = [0; OPERAND_COUNT];
        operands[0] = 0x01;
        operands[1] = 0x3F;
        let instr = Instruction {
            opcode: Opcode::SetPixelPosition,
            operands,
            config: ModeConfig::default(),
        };
        assert_eq!(instr.op_u16(0), 319);
    }
}
