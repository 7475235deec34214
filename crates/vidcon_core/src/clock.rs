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

    clock.rs

    Two-domain clock scheduler.

    The control domain (host bus) and render domain (pixel clock) run at unrelated
    rates. The scheduler is driven one render tick at a time and reports when a
    control clock edge falls due, using an integer fractional accumulator so that
    no drift builds up over long runs.

*/

use crate::VidconError;

pub const DEFAULT_CONTROL_HZ: u64 = 1_000_000;
pub const DEFAULT_RENDER_HZ: u64 = 25_175_000;

#[derive(Clone, Debug)]
pub struct ClockScheduler {
    control_hz: u64,
    render_hz: u64,
    accum: u64,
    render_ticks: u64,
    control_ticks: u64,
}

impl Default for ClockScheduler {
    fn default() -> Self {
        Self {
            control_hz: DEFAULT_CONTROL_HZ,
            render_hz: DEFAULT_RENDER_HZ,
            accum: 0,
            render_ticks: 0,
            control_ticks: 0,
        }
    }
}

impl ClockScheduler {
    /// The render domain must be the faster of the two: the start pulse synchronizer needs
    /// at least two render edges per control period to see every pulse.
    pub fn new(control_hz: u64, render_hz: u64) -> Result<Self, VidconError> {
        if control_hz == 0 || render_hz < control_hz.saturating_mul(2) {
            return Err(VidconError::ClockConfig { control_hz, render_hz });
        }
        Ok(Self {
            control_hz,
            render_hz,
            ..Default::default()
        })
    }

    /// Advance by one render tick. Returns true if a control clock edge occurs before it.
    #[inline]
    pub fn advance(&mut self) -> bool {
        self.render_ticks += 1;
        self.accum += self.control_hz;
        if self.accum >= self.render_hz {
            self.accum -= self.render_hz;
            self.control_ticks += 1;
            true
        }
        else {
            false
        }
    }

    pub fn render_ticks(&self) -> u64 {
        self.render_ticks
    }

    pub fn control_ticks(&self) -> u64 {
        self.control_ticks
    }

    /// Approximate number of render ticks per control tick.
    pub fn ratio(&self) -> f64 {
        self.render_hz as f64 / self.control_hz as f64
    }

    pub fn reset(&mut self) {
        self.accum = 0;
        self.render_ticks = 0;
        self.control_ticks = 0;
    }
}
