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

    script.rs

    Host command scripts: a line based list of register accesses and helpers
    that a headless run plays against the card.

*/

//! ```text
//! # comment
//! mode 0
//! write 1 0x02        # opcode Clear
//! write 2 0x07        # attr, triggers
//! wait
//! text 0x1F "Hello\n"
//! read 15
//! cycles 1000
//! ```

use anyhow::{anyhow, bail, Context};
use vidcon_core::{
    bus::IoDevice,
    devices::vidcon::{
        registers::{REGISTER_COUNT, REG_MODE, REG_OPCODE, REG_OPERAND0},
        text_controller::CTRL_LINE_FEED,
        VidconCard,
    },
};

const OP_WRITE: u8 = 0x00;
const OP_CONTROL_CODE: u8 = 0x04;

/// Control cycles a `wait` may spend before the script fails. Enough for the largest clear.
pub const DEFAULT_WAIT_LIMIT: u64 = 100_000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptCommand {
    Write { slot: usize, value: u8 },
    Read { slot: usize },
    Wait,
    Cycles(u64),
    Text { attr: u8, text: String },
    Mode(u8),
}

#[derive(Clone, Debug, Default)]
pub struct Script {
    /// Commands with their 1-based source line.
    pub commands: Vec<(usize, ScriptCommand)>,
}

#[derive(Clone, Debug, Default)]
pub struct ScriptSummary {
    pub instructions: u64,
    pub errors: u64,
    pub reads: Vec<(usize, u8)>,
}

fn parse_number(token: &str) -> anyhow::Result<u64> {
    let parsed = match token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => token.parse::<u64>(),
    };
    parsed.map_err(|e| anyhow!("bad number '{}': {}", token, e))
}

fn parse_byte(token: &str) -> anyhow::Result<u8> {
    let n = parse_number(token)?;
    u8::try_from(n).map_err(|_| anyhow!("{} does not fit in a byte", token))
}

fn parse_slot(token: &str) -> anyhow::Result<usize> {
    let n = parse_number(token)? as usize;
    if n >= REGISTER_COUNT {
        bail!("register {} out of range 0-{}", n, REGISTER_COUNT - 1);
    }
    Ok(n)
}

/// Parse a double quoted string with `\n`, `\t`, `\\` and `\"` escapes.
fn parse_quoted(rest: &str) -> anyhow::Result<String> {
    let inner = rest
        .trim()
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or_else(|| anyhow!("expected a double quoted string"))?;

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some(other) => bail!("unknown escape \\{}", other),
            None => bail!("dangling escape at end of string"),
        }
    }
    Ok(out)
}

fn parse_line(line: &str) -> anyhow::Result<Option<ScriptCommand>> {
    let line = line.trim();
    // Strings may contain '#', so only strip comments outside of the text command.
    let (keyword, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    if keyword.is_empty() || keyword.starts_with('#') {
        return Ok(None);
    }

    if keyword == "text" {
        let rest = rest.trim_start();
        let (attr, string) = rest
            .split_once(char::is_whitespace)
            .ok_or_else(|| anyhow!("usage: text <attr> \"<string>\""))?;
        return Ok(Some(ScriptCommand::Text {
            attr: parse_byte(attr)?,
            text: parse_quoted(string)?,
        }));
    }

    let rest = rest.split('#').next().unwrap_or("");
    let args: Vec<&str> = rest.split_whitespace().collect();
    let command = match (keyword, args.as_slice()) {
        ("write", [slot, value]) => ScriptCommand::Write {
            slot:  parse_slot(slot)?,
            value: parse_byte(value)?,
        },
        ("read", [slot]) => ScriptCommand::Read { slot: parse_slot(slot)? },
        ("wait", []) => ScriptCommand::Wait,
        ("cycles", [n]) => ScriptCommand::Cycles(parse_number(n)?),
        ("mode", [mode]) => ScriptCommand::Mode(parse_byte(mode)?),
        ("write" | "read" | "wait" | "cycles" | "mode", _) => {
            bail!("wrong number of arguments to '{}'", keyword)
        }
        _ => bail!("unknown command '{}'", keyword),
    };
    Ok(Some(command))
}

pub fn parse_script(source: &str) -> anyhow::Result<Script> {
    let mut script = Script::default();
    for (i, line) in source.lines().enumerate() {
        if let Some(command) = parse_line(line).with_context(|| format!("line {}", i + 1))? {
            script.commands.push((i + 1, command));
        }
    }
    Ok(script)
}

/// Plays a script against a card through its host ports.
pub struct ScriptRunner<'a> {
    card: &'a mut VidconCard,
    wait_limit: u64,
    /// Error bit as last observed. Error is sticky until a status read, so only a rising
    /// edge is a new failure.
    error_seen: bool,
    summary: ScriptSummary,
}

impl<'a> ScriptRunner<'a> {
    pub fn new(card: &'a mut VidconCard) -> Self {
        Self {
            card,
            wait_limit: DEFAULT_WAIT_LIMIT,
            error_seen: false,
            summary: ScriptSummary::default(),
        }
    }

    pub fn with_wait_limit(mut self, limit: u64) -> Self {
        self.wait_limit = limit;
        self
    }

    fn port(&self, slot: usize) -> u16 {
        self.card.io_base() + slot as u16
    }

    fn write(&mut self, slot: usize, value: u8) {
        let port = self.port(slot);
        self.card.write_u8(port, value);
    }

    fn wait(&mut self) -> anyhow::Result<()> {
        self.card.wait_ready(self.wait_limit)?;
        let error = self.card.peek_status().error();
        if error && !self.error_seen {
            self.summary.errors += 1;
            log::warn!("Card reports Error");
        }
        self.error_seen = error;
        Ok(())
    }

    fn issue(&mut self, opcode: u8, operands: &[u8]) -> anyhow::Result<()> {
        self.write(REG_OPCODE, opcode);
        for (i, &byte) in operands.iter().enumerate() {
            self.write(REG_OPERAND0 + i, byte);
        }
        self.summary.instructions += 1;
        self.wait()
    }

    fn step(&mut self, command: &ScriptCommand) -> anyhow::Result<()> {
        match command {
            ScriptCommand::Write { slot, value } => self.write(*slot, *value),
            ScriptCommand::Read { slot } => {
                let port = self.port(*slot);
                let value = self.card.read_u8(port);
                self.error_seen = self.card.peek_status().error();
                log::info!("Register {} = {:02X}", slot, value);
                self.summary.reads.push((*slot, value));
            }
            ScriptCommand::Wait => self.wait()?,
            ScriptCommand::Cycles(n) => self.card.run_control_cycles(*n),
            ScriptCommand::Text { attr, text } => {
                for c in text.chars() {
                    match c {
                        '\n' => self.issue(OP_CONTROL_CODE, &[CTRL_LINE_FEED])?,
                        c => {
                            let code = u8::try_from(u32::from(c)).map_err(|_| anyhow!("'{}' is not a single byte", c))?;
                            self.issue(OP_WRITE, &[*attr, code])?;
                        }
                    }
                }
            }
            ScriptCommand::Mode(mode) => self.write(REG_MODE, *mode),
        }
        Ok(())
    }

    pub fn run(mut self, script: &Script) -> anyhow::Result<ScriptSummary> {
        for (line, command) in &script.commands {
            log::debug!("line {}: {:?}", line, command);
            self.step(command).with_context(|| format!("line {}", line))?;
        }
        Ok(self.summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidcon_core::devices::vidcon::{registers::REG_STATUS, VidconParams};

    #[test]
    fn parses_commands() {
        let script = parse_script(
            "# header\n\
             mode 0x03\n\
             write 1 0x10   # WritePixel\n\
             write 2 7\n\
             \n\
             wait\n\
             cycles 100\n\
             read 15\n\
             text 0x1F \"Hi # there\\n\"\n",
        )
        .unwrap();
        let commands: Vec<ScriptCommand> = script.commands.iter().map(|(_, c)| c.clone()).collect();
        assert_eq!(
            commands,
            vec![
                ScriptCommand::Mode(3),
                ScriptCommand::Write { slot: 1, value: 0x10 },
                ScriptCommand::Write { slot: 2, value: 7 },
                ScriptCommand::Wait,
                ScriptCommand::Cycles(100),
                ScriptCommand::Read { slot: 15 },
                ScriptCommand::Text {
                    attr: 0x1F,
                    text: "Hi # there\n".to_string()
                },
            ]
        );
        assert_eq!(script.commands[0].0, 2);
    }

    #[test]
    fn errors_carry_line_numbers() {
        let err = parse_script("wait\nwrite 16 0\n").unwrap_err();
        assert_eq!(err.to_string(), "line 2");
        assert!(format!("{:#}", err).contains("out of range"));

        assert!(parse_script("write 1 0x100").is_err());
        assert!(parse_script("frobnicate").is_err());
        assert!(parse_script("text 7 unquoted").is_err());
        assert!(parse_script("wait 3").is_err());
    }

    #[test]
    fn text_command_writes_cells() {
        let mut card = VidconCard::new(VidconParams::default()).unwrap();
        let script = parse_script("text 0x1F \"ab\\nc\"\nread 15").unwrap();
        let summary = ScriptRunner::new(&mut card).run(&script).unwrap();

        assert_eq!(summary.instructions, 4);
        assert_eq!(summary.errors, 0);
        assert_eq!(card.text_cell(0, 0), (b'a', 0x1F));
        assert_eq!(card.text_cell(0, 1), (b'b', 0x1F));
        assert_eq!(card.text_cell(1, 0), (b'c', 0x1F));
        assert_eq!(summary.reads, vec![(REG_STATUS, 0x80)]);
    }

    #[test]
    fn errors_are_counted_not_fatal() {
        let mut card = VidconCard::new(VidconParams::default()).unwrap();
        // WritePixel in text mode
        let script = parse_script("write 1 0x10\nwrite 2 1\nwait\nread 15\nread 15").unwrap();
        let summary = ScriptRunner::new(&mut card).run(&script).unwrap();
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.reads, vec![(REG_STATUS, 0x82), (REG_STATUS, 0x80)]);
    }

    #[test]
    fn sticky_error_is_counted_once() {
        let mut card = VidconCard::new(VidconParams::default()).unwrap();
        // One WritePixel in text mode, then three good writes
        let script = parse_script("write 1 0x10\nwrite 2 1\nwait\ntext 0x1F \"abc\"").unwrap();
        let summary = ScriptRunner::new(&mut card).run(&script).unwrap();
        assert_eq!(summary.instructions, 3);
        assert_eq!(summary.errors, 1);
    }

    #[test]
    fn error_after_status_read_is_counted_again() {
        let mut card = VidconCard::new(VidconParams::default()).unwrap();
        let script = parse_script(
            "write 1 0x10\nwrite 2 1\nwait\n\
             read 15\n\
             text 0x1F \"a\"\n\
             write 1 0x10\nwrite 2 1\nwait",
        )
        .unwrap();
        let summary = ScriptRunner::new(&mut card).run(&script).unwrap();
        assert_eq!(summary.errors, 2);
        assert_eq!(summary.reads, vec![(REG_STATUS, 0x82)]);
    }

    #[test]
    fn io_base_at_top_of_port_space() {
        assert!(VidconCard::new(VidconParams {
            io_base: 0xFFF8,
            ..Default::default()
        })
        .is_err());

        let mut card = VidconCard::new(VidconParams {
            io_base: 0xFFF0,
            ..Default::default()
        })
        .unwrap();
        let script = parse_script("read 15").unwrap();
        let summary = ScriptRunner::new(&mut card).run(&script).unwrap();
        assert_eq!(summary.reads, vec![(REG_STATUS, 0x80)]);
    }

    #[test]
    fn wait_times_out() {
        let mut card = VidconCard::new(VidconParams::default()).unwrap();
        let script = parse_script("write 1 0x02\nwrite 2 0x07\nwait").unwrap();
        let err = ScriptRunner::new(&mut card).with_wait_limit(5).run(&script).unwrap_err();
        assert_eq!(err.to_string(), "line 3");
    }
}
