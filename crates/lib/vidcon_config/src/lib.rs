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

    Configuration file and command line handling for VidCon frontends.

*/

//! The `vidcon_config` crate parses VidCon's configuration file and overlays command line
//! arguments on top of it. Command line arguments always take priority over the file.
//!
//! Features:
//! - `use_bpaf`: Enable BPAF support for command line argument parsing.

#[cfg(feature = "use_bpaf")]
mod bpaf_config;

use std::path::{Path, PathBuf};

#[cfg(feature = "use_bpaf")]
pub use bpaf_config::{cli_args, CmdLineArgs};

use anyhow::Context;
use cfg_if::cfg_if;
use serde_derive::Deserialize;
use vidcon_core::{
    clock::{DEFAULT_CONTROL_HZ, DEFAULT_RENDER_HZ},
    devices::vidcon::{palette::ColorDepth, VidconParams, DEFAULT_IO_BASE},
};

pub const DEFAULT_CONFIG_FILE: &str = "vidcon.toml";

fn _default_log_level() -> String {
    "info".to_string()
}
const fn _default_control_hz() -> u64 {
    DEFAULT_CONTROL_HZ
}
const fn _default_render_hz() -> u64 {
    DEFAULT_RENDER_HZ
}
const fn _default_io_base() -> u16 {
    DEFAULT_IO_BASE
}
const fn _default_frames() -> u64 {
    2
}

/// Command line arguments when bpaf is disabled; nothing to overlay.
#[cfg(not(feature = "use_bpaf"))]
#[derive(Debug, Default)]
pub struct CmdLineArgs {
    pub config_file: Option<PathBuf>,
    pub script: Option<PathBuf>,
    pub frames: Option<u64>,
    pub screenshot: Option<PathBuf>,
    pub color_depth: Option<ColorDepth>,
    pub font: Option<PathBuf>,
    pub log_level: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Emulator {
    #[serde(default = "_default_log_level")]
    pub log_level: String,
}

impl Default for Emulator {
    fn default() -> Self {
        Self {
            log_level: _default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Clocks {
    #[serde(default = "_default_control_hz")]
    pub control_hz: u64,
    #[serde(default = "_default_render_hz")]
    pub render_hz: u64,
}

impl Default for Clocks {
    fn default() -> Self {
        Self {
            control_hz: DEFAULT_CONTROL_HZ,
            render_hz: DEFAULT_RENDER_HZ,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Video {
    #[serde(default = "_default_io_base")]
    pub io_base: u16,
    #[serde(default)]
    pub color_depth: ColorDepth,
    pub font: Option<PathBuf>,
    #[serde(default)]
    pub cursor: bool,
}

impl Default for Video {
    fn default() -> Self {
        Self {
            io_base: DEFAULT_IO_BASE,
            color_depth: ColorDepth::default(),
            font: None,
            cursor: false,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Headless {
    pub script: Option<PathBuf>,
    #[serde(default = "_default_frames")]
    pub frames: u64,
    pub screenshot: Option<PathBuf>,
}

impl Default for Headless {
    fn default() -> Self {
        Self {
            script: None,
            frames: _default_frames(),
            screenshot: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfigFileParams {
    #[serde(default)]
    pub emulator: Emulator,
    #[serde(default)]
    pub clocks: Clocks,
    #[serde(default)]
    pub video: Video,
    #[serde(default)]
    pub headless: Headless,
}

impl ConfigFileParams {
    pub fn overlay(&mut self, shell_args: CmdLineArgs) {
        if let Some(script) = shell_args.script {
            self.headless.script = Some(script);
        }
        if let Some(frames) = shell_args.frames {
            self.headless.frames = frames;
        }
        if let Some(screenshot) = shell_args.screenshot {
            self.headless.screenshot = Some(screenshot);
        }
        if let Some(color_depth) = shell_args.color_depth {
            self.video.color_depth = color_depth;
        }
        if let Some(font) = shell_args.font {
            self.video.font = Some(font);
        }
        if let Some(log_level) = shell_args.log_level {
            self.emulator.log_level = log_level;
        }
    }

    /// Card construction parameters from the `[clocks]` and `[video]` sections.
    pub fn card_params(&self) -> VidconParams {
        VidconParams {
            io_base: self.video.io_base,
            control_hz: self.clocks.control_hz,
            render_hz: self.clocks.render_hz,
            color_depth: self.video.color_depth,
            font_path: self.video.font.clone(),
            cursor: self.video.cursor,
        }
    }
}

pub fn read_config(toml_string: impl AsRef<str>, shell_args: CmdLineArgs) -> Result<ConfigFileParams, anyhow::Error> {
    let mut toml_args: ConfigFileParams = toml::from_str(toml_string.as_ref())?;

    // Command line arguments override config file arguments
    toml_args.overlay(shell_args);
    Ok(toml_args)
}

fn shell_args() -> CmdLineArgs {
    cfg_if! {
        if #[cfg(feature = "use_bpaf")] {
            log::debug!("Reading command line arguments...");
            cli_args().run()
        } else {
            log::debug!("Argument reading disabled...");
            CmdLineArgs::default()
        }
    }
}

/// Read the TOML configuration from a file path, parse and overlay command line arguments.
/// The path may be overridden by the `config_file` argument.
pub fn read_config_file<P>(default_path: P) -> Result<ConfigFileParams, anyhow::Error>
where
    P: AsRef<Path>,
{
    let shell_args = shell_args();

    let path = shell_args
        .config_file
        .clone()
        .unwrap_or_else(|| default_path.as_ref().to_path_buf());
    let toml_string =
        std::fs::read_to_string(&path).with_context(|| format!("Couldn't read config file {}", path.display()))?;

    read_config(toml_string, shell_args).with_context(|| format!("Couldn't parse config file {}", path.display()))
}

/// Read the TOML configuration from a string, parse and overlay command line arguments.
pub fn read_config_string(toml_string: impl AsRef<str>) -> Result<ConfigFileParams, anyhow::Error> {
    read_config(toml_string, shell_args())
}
