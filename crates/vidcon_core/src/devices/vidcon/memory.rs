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

    devices::vidcon::memory.rs

    Dual-port video store and the arbiter for its write-capable port.

    Port A (read/write) belongs to whichever mode controller holds the grant. Port B is
    read-only and serves the renderer on every clock. Both ports have one clock of read
    latency: an address presented during a clock is readable on the next one.

*/

use strum_macros::Display;
use thiserror::Error;

use super::{
    mode::BITMAP_STORE_SIZE,
    text_controller::{TEXT_COLS, TEXT_PHYS_ROWS},
};

pub const TEXT_STORE_SIZE: usize = TEXT_COLS * TEXT_PHYS_ROWS;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PortOp<T> {
    Read(usize),
    Write(usize, T),
}

pub struct DualPortRam<T> {
    cells: Vec<T>,
    port_a: Option<PortOp<T>>,
    q_a: T,
    port_b: Option<usize>,
    q_b: T,
}

impl<T: Copy + Default> DualPortRam<T> {
    pub fn new(size: usize) -> Self {
        Self {
            cells: vec![T::default(); size],
            port_a: None,
            q_a: T::default(),
            port_b: None,
            q_b: T::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn present_a(&mut self, op: PortOp<T>) {
        self.port_a = Some(op);
    }

    #[inline]
    pub fn present_b(&mut self, addr: usize) {
        self.port_b = Some(addr);
    }

    #[inline]
    pub fn q_a(&self) -> T {
        self.q_a
    }

    #[inline]
    pub fn q_b(&self) -> T {
        self.q_b
    }

    /// Clock edge. Port B samples before port A's write lands, so a same-address collision
    /// returns the old value.
    pub fn clock(&mut self) {
        if let Some(addr) = self.port_b.take() {
            self.q_b = self.cells.get(addr).copied().unwrap_or_default();
        }
        match self.port_a.take() {
            Some(PortOp::Read(addr)) => {
                self.q_a = self.cells.get(addr).copied().unwrap_or_default();
            }
            Some(PortOp::Write(addr, value)) => match self.cells.get_mut(addr) {
                Some(cell) => *cell = value,
                None => log::warn!("Port A write past end of store: {:05X}", addr),
            },
            None => {}
        }
    }

    /// Direct access for debug views; bypasses both ports.
    pub fn peek(&self, addr: usize) -> T {
        self.cells.get(addr).copied().unwrap_or_default()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.cells
    }

    pub fn reset(&mut self) {
        self.cells.fill(T::default());
        self.port_a = None;
        self.port_b = None;
        self.q_a = T::default();
        self.q_b = T::default();
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Display)]
pub enum PortOwner {
    Text,
    Graphics,
}

#[derive(Error, Copy, Clone, Debug, PartialEq, Eq)]
pub enum ArbiterError {
    #[error("{requested_by} requested port A while it is held by {held_by}")]
    Held { held_by: PortOwner, requested_by: PortOwner },
    #[error("{0} used port A without holding the grant")]
    NotGranted(PortOwner),
}

#[derive(Default, Debug, Clone)]
pub struct ArbiterStats {
    pub a_reads: u64,
    pub a_writes: u64,
    pub b_reads: u64,
    pub conflicts: u64,
}

pub struct MemoryArbiter {
    text: DualPortRam<u16>,
    bitmap: DualPortRam<u8>,
    grant: Option<PortOwner>,
    stats: ArbiterStats,
}

impl Default for MemoryArbiter {
    fn default() -> Self {
        Self {
            text: DualPortRam::new(TEXT_STORE_SIZE),
            bitmap: DualPortRam::new(BITMAP_STORE_SIZE),
            grant: None,
            stats: ArbiterStats::default(),
        }
    }
}

impl MemoryArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim port A. Re-claiming a grant already held is allowed.
    pub fn acquire(&mut self, who: PortOwner) -> Result<(), ArbiterError> {
        match self.grant {
            Some(held_by) if held_by != who => {
                self.stats.conflicts += 1;
                Err(ArbiterError::Held {
                    held_by,
                    requested_by: who,
                })
            }
            _ => {
                self.grant = Some(who);
                Ok(())
            }
        }
    }

    pub fn release(&mut self, who: PortOwner) {
        if self.grant == Some(who) {
            self.grant = None;
        }
    }

    pub fn holder(&self) -> Option<PortOwner> {
        self.grant
    }

    fn check(&mut self, who: PortOwner) -> Result<(), ArbiterError> {
        if self.grant == Some(who) {
            Ok(())
        }
        else {
            self.stats.conflicts += 1;
            Err(ArbiterError::NotGranted(who))
        }
    }

    pub fn text_read(&mut self, who: PortOwner, addr: usize) -> Result<(), ArbiterError> {
        self.check(who)?;
        self.stats.a_reads += 1;
        self.text.present_a(PortOp::Read(addr));
        Ok(())
    }

    pub fn text_write(&mut self, who: PortOwner, addr: usize, cell: u16) -> Result<(), ArbiterError> {
        self.check(who)?;
        self.stats.a_writes += 1;
        self.text.present_a(PortOp::Write(addr, cell));
        Ok(())
    }

    pub fn text_q(&self) -> u16 {
        self.text.q_a()
    }

    pub fn bitmap_read(&mut self, who: PortOwner, addr: usize) -> Result<(), ArbiterError> {
        self.check(who)?;
        self.stats.a_reads += 1;
        self.bitmap.present_a(PortOp::Read(addr));
        Ok(())
    }

    pub fn bitmap_write(&mut self, who: PortOwner, addr: usize, unit: u8) -> Result<(), ArbiterError> {
        self.check(who)?;
        self.stats.a_writes += 1;
        self.bitmap.present_a(PortOp::Write(addr, unit));
        Ok(())
    }

    pub fn bitmap_q(&self) -> u8 {
        self.bitmap.q_a()
    }

    /// Renderer prefetch on the read-only port.
    #[inline]
    pub fn render_text(&mut self, addr: usize) {
        self.stats.b_reads += 1;
        self.text.present_b(addr);
    }

    #[inline]
    pub fn render_text_q(&self) -> u16 {
        self.text.q_b()
    }

    #[inline]
    pub fn render_bitmap(&mut self, addr: usize) {
        self.stats.b_reads += 1;
        self.bitmap.present_b(addr);
    }

    #[inline]
    pub fn render_bitmap_q(&self) -> u8 {
        self.bitmap.q_b()
    }

    pub fn clock(&mut self) {
        self.text.clock();
        self.bitmap.clock();
    }

    pub fn peek_text(&self, addr: usize) -> u16 {
        self.text.peek(addr)
    }

    pub fn peek_bitmap(&self, addr: usize) -> u8 {
        self.bitmap.peek(addr)
    }

    pub fn bitmap(&self) -> &[u8] {
        self.bitmap.as_slice()
    }

    pub fn stats(&self) -> &ArbiterStats {
        &self.stats
    }

    pub fn reset(&mut self) {
        self.text.reset();
        self.bitmap.reset();
        self.grant = None;
        self.stats = ArbiterStats::default();
    }
}
