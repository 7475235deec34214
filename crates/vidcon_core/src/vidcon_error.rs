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

    vidcon_error.rs

    Errors surfaced to frontends by the core.

*/

use thiserror::Error;

use crate::devices::vidcon::font::FontError;

#[derive(Error, Debug)]
pub enum VidconError {
    #[error("Invalid clock configuration: control {control_hz} Hz, render {render_hz} Hz")]
    ClockConfig { control_hz: u64, render_hz: u64 },
    #[error("Timed out after {0} control cycles waiting for Ready")]
    Timeout(u64),
    #[error("I/O base {0:04X} leaves no room for the register file")]
    IoBase(u16),
    #[error("Port {0:04X} is not decoded by this device")]
    UnmappedPort(u16),
    #[error(transparent)]
    Font(#[from] FontError),
}
