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

    devices::vidcon::mod.rs

    Implementation of the VidCon register-programmable video controller.

*/

//! The card is split along its two clock domains.
//!
//! The control domain is the [`Dispatcher`]: it owns the register file and status bits and is
//! clocked at the host bus rate. The render domain runs at the pixel clock and owns everything
//! else: the start pulse synchronizer, both mode controllers, the shared store and the renderers.
//! The only things crossing between the two are the start line (through the synchronizer) and a
//! single-slot link carrying the captured instruction one way and its completion the other.

pub mod dispatcher;
pub mod draw;
pub mod font;
pub mod graphics_controller;
pub mod instruction;
pub mod io;
pub mod memory;
pub mod mode;
pub mod palette;
pub mod registers;
pub mod synchronizer;
pub mod text_controller;
pub mod timing;

use std::path::PathBuf;

use crate::{
    channel::DomainLink,
    clock::{ClockScheduler, DEFAULT_CONTROL_HZ, DEFAULT_RENDER_HZ},
    VidconError,
};

use dispatcher::{Dispatcher, DispatcherStats};
use draw::{FrameBuffers, GraphicsRenderer, TextRenderer};
use font::FontRom;
use graphics_controller::{GraphicsController, PixelCursor};
use instruction::{Completion, Instruction};
use memory::{ArbiterStats, MemoryArbiter};
use mode::{ControllerSelect, DisplayMode, ModeConfig};
use palette::{ColorDepth, Palette, Rgb12};
use registers::{ModeRegister, StatusRegister, REGISTER_COUNT, REG_MODE, REG_OPCODE, REG_OPERAND0};
use synchronizer::PulseSynchronizer;
use text_controller::{split_cell, CursorState, TextController};
use timing::VideoTiming;

pub const DEFAULT_IO_BASE: u16 = 0x300;
/// Highest base at which the whole register file still fits in the port space.
pub const MAX_IO_BASE: u16 = u16::MAX - (REGISTER_COUNT as u16 - 1);

#[derive(Clone, Debug)]
pub struct VidconParams {
    pub io_base: u16,
    pub control_hz: u64,
    pub render_hz: u64,
    pub color_depth: ColorDepth,
    /// Font image to load in place of the built-in font.
    pub font_path: Option<PathBuf>,
    /// Cursor enable bit set in the Mode/Config register at reset.
    pub cursor: bool,
}

impl Default for VidconParams {
    fn default() -> Self {
        Self {
            io_base: DEFAULT_IO_BASE,
            control_hz: DEFAULT_CONTROL_HZ,
            render_hz: DEFAULT_RENDER_HZ,
            color_depth: ColorDepth::default(),
            font_path: None,
            cursor: false,
        }
    }
}

/// The two mode controllers resident in the render domain.
#[derive(Default)]
pub struct ModeControllers {
    text: TextController,
    graphics: GraphicsController,
    executing: Option<ControllerSelect>,
}

/// A borrow of whichever controller an instruction was routed to. The other controller is not
/// reachable through it, so it cannot be clocked or touch the store.
pub enum ActiveController<'a> {
    Text(&'a mut TextController),
    Graphics(&'a mut GraphicsController),
}

impl ActiveController<'_> {
    fn begin(self, instr: &Instruction) {
        match self {
            ActiveController::Text(ctl) => ctl.begin(instr),
            ActiveController::Graphics(ctl) => ctl.begin(instr),
        }
    }

    fn clock(self, arb: &mut MemoryArbiter) -> Option<Completion> {
        match self {
            ActiveController::Text(ctl) => ctl.clock(arb),
            ActiveController::Graphics(ctl) => ctl.clock(arb),
        }
    }
}

impl ModeControllers {
    fn select(&mut self, sel: ControllerSelect) -> ActiveController<'_> {
        match sel {
            ControllerSelect::Text => ActiveController::Text(&mut self.text),
            ControllerSelect::Graphics => ActiveController::Graphics(&mut self.graphics),
        }
    }

    pub fn executing(&self) -> Option<ControllerSelect> {
        self.executing
    }

    fn reset(&mut self) {
        self.text.reset();
        self.graphics.reset();
        self.executing = None;
    }
}

struct RenderDomain {
    link: DomainLink<Completion, Instruction>,
    sync: PulseSynchronizer,
    controllers: ModeControllers,
    arb: MemoryArbiter,
    font: FontRom,
    timing: VideoTiming,
    text_renderer: TextRenderer,
    gfx_renderer: GraphicsRenderer,
    frame: FrameBuffers,
    color_depth: ColorDepth,
}

impl RenderDomain {
    /// One pixel clock.
    fn tick(&mut self, start_line: bool, config: &ModeConfig) {
        if self.sync.clock(start_line) {
            self.start();
        }

        if let Some(sel) = self.controllers.executing {
            if let Some(done) = self.controllers.select(sel).clock(&mut self.arb) {
                self.controllers.executing = None;
                if self.link.try_send(done).is_err() {
                    log::error!("Completion link full; completion lost");
                }
            }
        }

        let beam = self.timing.tick();
        let color = match config.display {
            DisplayMode::Text => self.text_renderer.tick(
                &beam,
                &mut self.arb,
                &self.font,
                self.controllers.text.cursor(),
                config,
            ),
            DisplayMode::Graphics(mode) => self.gfx_renderer.tick(
                &beam,
                &mut self.arb,
                mode,
                config.display_offset(),
                self.controllers.graphics.palette(),
            ),
        };
        self.arb.clock();

        if beam.visible {
            self.frame.put(beam.x, beam.y, self.color_depth.reduce(color));
        }
        if beam.vblank_start {
            self.frame.swap();
        }
    }

    /// Synchronized start pulse: take the captured instruction and route it by opcode range.
    fn start(&mut self) {
        let instr = match self.link.try_recv() {
            Ok(instr) => instr,
            Err(_) => {
                log::error!("Start pulse with no instruction waiting");
                return;
            }
        };
        if let Some(sel) = self.controllers.executing {
            log::error!("Start pulse while {:?} controller is executing; {} dropped", sel, instr.opcode);
            return;
        }
        let sel = instr.opcode.target();
        self.controllers.select(sel).begin(&instr);
        self.controllers.executing = Some(sel);
    }

    fn reset(&mut self) {
        self.link.drain();
        self.sync.reset();
        self.controllers.reset();
        self.arb.reset();
        self.timing.reset();
        self.text_renderer.reset();
        self.gfx_renderer.reset();
        self.frame.reset();
    }
}

pub struct VidconCard {
    io_base: u16,
    initial_mode: u8,
    scheduler: ClockScheduler,
    dispatcher: Dispatcher,
    render: RenderDomain,
}

impl VidconCard {
    pub fn new(params: VidconParams) -> Result<Self, VidconError> {
        if params.io_base > MAX_IO_BASE {
            return Err(VidconError::IoBase(params.io_base));
        }
        let scheduler = ClockScheduler::new(params.control_hz, params.render_hz)?;
        let font = match &params.font_path {
            Some(path) => {
                log::debug!("Loading font from {}", path.display());
                FontRom::load(path)?
            }
            None => FontRom::builtin(),
        };

        let (control_link, render_link) = DomainLink::new_pair();
        let initial_mode = ModeRegister::new().with_cursor_enable(params.cursor).into_bytes()[0];

        let mut card = Self {
            io_base: params.io_base,
            initial_mode,
            scheduler,
            dispatcher: Dispatcher::new(control_link),
            render: RenderDomain {
                link: render_link,
                sync: PulseSynchronizer::new(),
                controllers: ModeControllers::default(),
                arb: MemoryArbiter::new(),
                font,
                timing: VideoTiming::new(),
                text_renderer: TextRenderer::new(),
                gfx_renderer: GraphicsRenderer::new(),
                frame: FrameBuffers::new(),
                color_depth: params.color_depth,
            },
        };
        card.dispatcher.cpu_write(REG_MODE, initial_mode);
        log::debug!(
            "VidCon card at {:04X}, {:.3} render ticks per control tick, {} color",
            card.io_base,
            card.scheduler.ratio(),
            params.color_depth
        );
        Ok(card)
    }

    pub fn reset(&mut self) {
        self.scheduler.reset();
        self.dispatcher.reset();
        self.render.reset();
        self.dispatcher.cpu_write(REG_MODE, self.initial_mode);
    }

    pub fn io_base(&self) -> u16 {
        self.io_base
    }

    /// Advance by one render clock, clocking the control domain first if its edge falls due.
    /// Returns true if a control edge occurred.
    pub fn tick(&mut self) -> bool {
        let control_edge = self.scheduler.advance();
        if control_edge {
            self.dispatcher.control_tick();
        }
        let config = self.dispatcher.mode_config();
        self.render.tick(self.dispatcher.start_line(), &config);
        control_edge
    }

    pub fn run_control_cycles(&mut self, cycles: u64) {
        let mut done = 0;
        while done < cycles {
            if self.tick() {
                done += 1;
            }
        }
    }

    pub fn run_frames(&mut self, frames: u64) {
        let target = self.render.frame.frames() + frames;
        while self.render.frame.frames() < target {
            self.tick();
        }
    }

    /// Run until the status register reports Ready with Busy clear. Polls without the
    /// clear-on-read side effect, so a pending Error is left for the host to see.
    /// Returns the number of control cycles spent.
    pub fn wait_ready(&mut self, limit: u64) -> Result<u64, VidconError> {
        let mut cycles = 0;
        loop {
            let status = self.peek_status();
            if status.ready() && !status.busy() {
                return Ok(cycles);
            }
            if cycles >= limit {
                return Err(VidconError::Timeout(limit));
            }
            self.run_control_cycles(1);
            cycles += 1;
        }
    }

    /// Issue a whole instruction the way a host would: opcode, then each operand in slot order
    /// so the trigger is written last, then wait for completion.
    pub fn execute(&mut self, opcode: u8, operands: &[u8], limit: u64) -> Result<u64, VidconError> {
        self.dispatcher.cpu_write(REG_OPCODE, opcode);
        for (i, &byte) in operands.iter().enumerate() {
            self.dispatcher.cpu_write(REG_OPERAND0 + i, byte);
        }
        self.wait_ready(limit)
    }

    pub fn peek_register(&self, slot: usize) -> u8 {
        self.dispatcher.peek(slot)
    }

    pub fn peek_status(&self) -> StatusRegister {
        self.dispatcher.status()
    }

    pub fn mode_config(&self) -> ModeConfig {
        self.dispatcher.mode_config()
    }

    /// (code, attribute) of a visible text cell, resolved through the scroll offset.
    pub fn text_cell(&self, row: u8, col: u8) -> (u8, u8) {
        let cursor = self.render.controllers.text.cursor();
        split_cell(self.render.arb.peek_text(cursor.cell_addr(row, col)))
    }

    pub fn bitmap_unit(&self, addr: usize) -> u8 {
        self.render.arb.peek_bitmap(addr)
    }

    pub fn cursor(&self) -> CursorState {
        self.render.controllers.text.cursor()
    }

    pub fn pixel_cursor(&self) -> PixelCursor {
        self.render.controllers.graphics.cursor()
    }

    pub fn palette(&self) -> &Palette {
        self.render.controllers.graphics.palette()
    }

    /// The last completed frame, 640x480, row-major.
    pub fn frame(&self) -> &[Rgb12] {
        self.render.frame.front()
    }

    pub fn frames(&self) -> u64 {
        self.render.frame.frames()
    }

    pub fn executing(&self) -> Option<ControllerSelect> {
        self.render.controllers.executing()
    }

    pub fn dispatcher_stats(&self) -> &DispatcherStats {
        self.dispatcher.stats()
    }

    pub fn arbiter_stats(&self) -> &ArbiterStats {
        self.render.arb.stats()
    }

    pub fn text_scrolls(&self) -> u64 {
        self.render.controllers.text.scrolls()
    }

    pub fn control_ticks(&self) -> u64 {
        self.scheduler.control_ticks()
    }

    pub fn render_ticks(&self) -> u64 {
        self.scheduler.render_ticks()
    }
}
