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

    devices::vidcon::io.rs

    Implementation of the IoDevice interface trait for the VidCon card.

*/

use crate::{bus::IoDevice, VidconError};

use super::{
    registers::{REGISTER_COUNT, REGISTER_NAMES},
    VidconCard,
};

impl VidconCard {
    /// Resolve a host port to a register slot.
    pub fn port_to_slot(&self, port: u16) -> Result<usize, VidconError> {
        port.checked_sub(self.io_base())
            .map(usize::from)
            .filter(|&slot| slot < REGISTER_COUNT)
            .ok_or(VidconError::UnmappedPort(port))
    }
}

impl IoDevice for VidconCard {
    fn read_u8(&mut self, port: u16) -> u8 {
        match self.port_to_slot(port) {
            Ok(slot) => self.dispatcher.cpu_read(slot),
            Err(err) => {
                log::warn!("VidCon: {}", err);
                0xFF
            }
        }
    }

    fn write_u8(&mut self, port: u16, data: u8) {
        match self.port_to_slot(port) {
            Ok(slot) => self.dispatcher.cpu_write(slot, data),
            Err(err) => log::warn!("VidCon: {}", err),
        }
    }

    fn port_list(&self) -> Vec<(String, u16)> {
        REGISTER_NAMES
            .iter()
            .enumerate()
            .map(|(slot, name)| (format!("VidCon {}", name), self.io_base() + slot as u16))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::vidcon::{
        registers::{REG_MODE, REG_RESULT0, REG_STATUS},
        VidconParams, DEFAULT_IO_BASE,
    };

    #[test]
    fn ports_map_to_slots() {
        let mut card = VidconCard::new(VidconParams::default()).unwrap();
        assert_eq!(card.port_to_slot(DEFAULT_IO_BASE + 15).unwrap(), REG_STATUS);
        assert!(matches!(
            card.port_to_slot(DEFAULT_IO_BASE + 16),
            Err(VidconError::UnmappedPort(_))
        ));
        assert!(card.port_to_slot(DEFAULT_IO_BASE - 1).is_err());

        card.write_u8(DEFAULT_IO_BASE + REG_MODE as u16, 0x03);
        assert_eq!(card.read_u8(DEFAULT_IO_BASE + REG_MODE as u16), 0x03);
        assert_eq!(card.read_u8(DEFAULT_IO_BASE + 16), 0xFF);
    }

    #[test]
    fn result_registers_ignore_host_writes() {
        let mut card = VidconCard::new(VidconParams::default()).unwrap();
        card.write_u8(DEFAULT_IO_BASE + REG_RESULT0 as u16, 0x55);
        assert_eq!(card.read_u8(DEFAULT_IO_BASE + REG_RESULT0 as u16), 0);
    }

    #[test]
    fn port_list_covers_register_file() {
        let card = VidconCard::new(VidconParams {
            io_base: 0x3E0,
            ..Default::default()
        })
        .unwrap();
        let ports = card.port_list();
        assert_eq!(ports.len(), REGISTER_COUNT);
        assert_eq!(ports[0].1, 0x3E0);
        assert_eq!(ports[15].1, 0x3EF);
    }
}
