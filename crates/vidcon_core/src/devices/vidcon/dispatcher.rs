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

    devices::vidcon::dispatcher.rs

    Command dispatcher. Owns the register file and status bits in the control domain,
    detects trigger writes and hands captured instructions to the render domain.

*/

use crate::channel::DomainLink;

use super::{
    instruction::{trigger_slot_for, Completion, Instruction, InstructionError, Opcode},
    mode::ModeConfig,
    registers::*,
};

#[derive(Default, Debug, Clone)]
pub struct DispatcherStats {
    pub dispatched: u64,
    pub dropped: u64,
    pub rejected: u64,
    pub completed: u64,
    pub failed: u64,
}

pub struct Dispatcher {
    regs: RegisterFile,
    status: StatusRegister,
    start_request: bool,
    start_line: bool,
    link: DomainLink<Instruction, Completion>,
    stats: DispatcherStats,
}

impl Dispatcher {
    pub fn new(link: DomainLink<Instruction, Completion>) -> Self {
        Self {
            regs: RegisterFile::new(),
            status: StatusRegister::default(),
            start_request: false,
            start_line: false,
            link,
            stats: DispatcherStats::default(),
        }
    }

    pub fn reset(&mut self) {
        self.regs.reset();
        self.status = StatusRegister::default();
        self.start_request = false;
        self.start_line = false;
        self.link.drain();
        self.stats = DispatcherStats::default();
    }

    /// Host read. Reading the status register clears Error.
    pub fn cpu_read(&mut self, slot: usize) -> u8 {
        match slot {
            REG_STATUS => {
                let byte = self.status.into_bytes()[0];
                self.status.set_error(false);
                byte
            }
            _ => self.regs.read(slot),
        }
    }

    /// Read a register without side effects.
    pub fn peek(&self, slot: usize) -> u8 {
        match slot {
            REG_STATUS => self.status.into_bytes()[0],
            _ => self.regs.read(slot),
        }
    }

    pub fn status(&self) -> StatusRegister {
        self.status
    }

    pub fn mode_config(&self) -> ModeConfig {
        ModeConfig::from(self.regs.read(REG_MODE))
    }

    /// Host write. The register updates immediately; if the slot is the current opcode's
    /// trigger, the operands are captured from the updated file and an instruction is requested.
    pub fn cpu_write(&mut self, slot: usize, byte: u8) {
        if !RegisterFile::is_host_writable(slot) {
            log::trace!("Ignoring write of {:02X} to read-only register {}", byte, slot);
            return;
        }
        self.regs.write(slot, byte);

        if slot < REG_OPERAND0 {
            return;
        }
        let opcode = self.regs.read(REG_OPCODE);
        if slot != trigger_slot_for(opcode) {
            return;
        }

        if let Err(err) = self.trigger(opcode) {
            log::warn!("Dispatch of opcode {:02X} rejected: {}", opcode, err);
            match err {
                InstructionError::Protocol => self.stats.dropped += 1,
                _ => self.stats.rejected += 1,
            }
            self.status.set_error(true);
        }
    }

    fn trigger(&mut self, opcode_byte: u8) -> Result<(), InstructionError> {
        if self.status.busy() {
            return Err(InstructionError::Protocol);
        }
        let opcode = Opcode::decode(opcode_byte).ok_or(InstructionError::Opcode(opcode_byte))?;
        let config = self.mode_config();
        if opcode.target() != config.select() {
            return Err(InstructionError::NotSelected(opcode));
        }

        let instr = Instruction {
            opcode,
            operands: self.regs.operands(),
            config,
        };
        // Busy guards the slot, so a full link means the render side never answered.
        self.link.try_send(instr).map_err(|_| InstructionError::Protocol)?;

        log::debug!("Dispatching {} {:02X?}", opcode, &instr.operands[..opcode.operand_count()]);
        self.stats.dispatched += 1;
        self.status.set_busy(true);
        self.status.set_ready(false);
        self.start_request = true;
        Ok(())
    }

    /// Control clock edge. The start line carries a pending request for exactly one control
    /// period, and completions posted by the render domain are folded into the status bits.
    pub fn control_tick(&mut self) {
        self.start_line = self.start_request;
        self.start_request = false;

        while let Ok(completion) = self.link.try_recv() {
            self.stats.completed += 1;
            if completion.error {
                self.stats.failed += 1;
                self.status.set_error(true);
            }
            if let Some(results) = completion.results {
                self.regs.set_results(results);
            }
            self.status.set_busy(false);
            self.status.set_ready(true);
        }
    }

    #[inline]
    pub fn start_line(&self) -> bool {
        self.start_line
    }

    pub fn stats(&self) -> &DispatcherStats {
        &self.stats
    }
}
