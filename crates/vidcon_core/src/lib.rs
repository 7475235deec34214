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

    lib.rs

    Core emulation library for the VidCon video controller.

*/

//! `vidcon_core` models a register-programmable video controller. A slow control domain
//! (the host bus) issues fixed-format instructions through sixteen byte registers while a
//! much faster render domain executes them against a shared video store and continuously
//! produces one color sample per pixel clock.
//!
//! The crate has no I/O of its own. Frontends drive a [`devices::vidcon::VidconCard`]
//! through the [`bus::IoDevice`] interface and collect the frames it renders.

pub mod bus;
pub mod channel;
pub mod clock;
pub mod devices;
pub mod vidcon_error;

pub use vidcon_error::VidconError;
