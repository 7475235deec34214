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

    VidCon headless front-end main library component.

*/

//! Loads the configuration, builds a card, plays the configured host script against it, renders
//! the requested number of frames and optionally saves the last one.

#![forbid(unsafe_code)]

pub mod screenshot;
pub mod script;

use std::time::Instant;

use anyhow::Context;
use vidcon_config::{ConfigFileParams, DEFAULT_CONFIG_FILE};
use vidcon_core::devices::vidcon::VidconCard;

use crate::{
    screenshot::save_screenshot,
    script::{parse_script, ScriptRunner},
};

fn init_logger(config: &ConfigFileParams) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.emulator.log_level.as_str()))
        .init();
}

pub fn run_headless(config: &ConfigFileParams) -> anyhow::Result<()> {
    let mut card = VidconCard::new(config.card_params()).context("Failed to create card")?;

    if let Some(path) = &config.headless.script {
        let source = std::fs::read_to_string(path).with_context(|| format!("Couldn't read script {}", path.display()))?;
        let script = parse_script(&source).with_context(|| format!("In script {}", path.display()))?;

        let start = Instant::now();
        let summary = ScriptRunner::new(&mut card)
            .run(&script)
            .with_context(|| format!("Running script {}", path.display()))?;
        log::info!(
            "Script complete: {} instructions, {} errors, {} control cycles in {:.2?}",
            summary.instructions,
            summary.errors,
            card.control_ticks(),
            start.elapsed()
        );
    }
    else {
        log::warn!("No script given; rendering the reset state");
    }

    let start = Instant::now();
    card.run_frames(config.headless.frames);
    log::info!("Rendered {} frames in {:.2?}", config.headless.frames, start.elapsed());

    let stats = card.dispatcher_stats();
    log::debug!(
        "Dispatcher: {} dispatched, {} completed, {} failed, {} dropped, {} rejected",
        stats.dispatched,
        stats.completed,
        stats.failed,
        stats.dropped,
        stats.rejected
    );
    let arb = card.arbiter_stats();
    log::debug!(
        "Store: {} port A reads, {} port A writes, {} port B reads, {} conflicts",
        arb.a_reads,
        arb.a_writes,
        arb.b_reads,
        arb.conflicts
    );

    if let Some(path) = &config.headless.screenshot {
        save_screenshot(path, card.frame())?;
    }
    Ok(())
}

pub fn run() -> anyhow::Result<()> {
    let config = vidcon_config::read_config_file(DEFAULT_CONFIG_FILE).context(
        "Couldn't load configuration. Create vidcon.toml in the working directory or pass --config_file",
    )?;
    init_logger(&config);
    log::info!("Configuration loaded");
    log::debug!("{:?}", config);

    run_headless(&config)
}
