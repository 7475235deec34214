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

    devices::vidcon::timing.rs

    Free-running 640x480@60Hz timing generator. Produces the beam position and sync
    signals that both renderers consume.

*/

pub const H_VISIBLE: u16 = 640;
pub const H_FRONT_PORCH: u16 = 16;
pub const H_SYNC: u16 = 96;
pub const H_BACK_PORCH: u16 = 48;
pub const H_TOTAL: u16 = H_VISIBLE + H_FRONT_PORCH + H_SYNC + H_BACK_PORCH;

pub const V_VISIBLE: u16 = 480;
pub const V_FRONT_PORCH: u16 = 10;
pub const V_SYNC: u16 = 2;
pub const V_BACK_PORCH: u16 = 33;
pub const V_TOTAL: u16 = V_VISIBLE + V_FRONT_PORCH + V_SYNC + V_BACK_PORCH;

pub const TICKS_PER_FRAME: u64 = H_TOTAL as u64 * V_TOTAL as u64;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BeamPosition {
    pub x: u16,
    pub y: u16,
    pub visible: bool,
    pub hsync: bool,
    pub vsync: bool,
    /// First tick of the vertical blanking interval.
    pub vblank_start: bool,
    pub frame: u64,
}

impl BeamPosition {
    /// The position `ahead` ticks after this one, wrapping into the following line (and frame).
    pub fn ahead(&self, ahead: u16) -> (u16, u16) {
        let x = self.x + ahead;
        if x >= H_TOTAL {
            (x - H_TOTAL, (self.y + 1) % V_TOTAL)
        }
        else {
            (x, self.y)
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct VideoTiming {
    x: u16,
    y: u16,
    frame: u64,
}

impl VideoTiming {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report the current position, then advance the counters by one pixel clock.
    #[inline]
    pub fn tick(&mut self) -> BeamPosition {
        let beam = BeamPosition {
            x: self.x,
            y: self.y,
            visible: self.x < H_VISIBLE && self.y < V_VISIBLE,
            hsync: (H_VISIBLE + H_FRONT_PORCH..H_VISIBLE + H_FRONT_PORCH + H_SYNC).contains(&self.x),
            vsync: (V_VISIBLE + V_FRONT_PORCH..V_VISIBLE + V_FRONT_PORCH + V_SYNC).contains(&self.y),
            vblank_start: self.x == 0 && self.y == V_VISIBLE,
            frame: self.frame,
        };

        self.x += 1;
        if self.x == H_TOTAL {
            self.x = 0;
            self.y += 1;
            if self.y == V_TOTAL {
                self.y = 0;
                self.frame += 1;
            }
        }
        beam
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn reset(&mut self) {
        *self = VideoTiming::default();
    }
}
