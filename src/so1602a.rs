use std::{thread, time::Duration};

use anyhow::Context;
use rppal::i2c::I2c;

use crate::{
    capability::{CharacterDisplay, Row},
    config::I2cDeviceConfig,
    error::Fault,
};

pub const SO1602A_ADDR: u16 = 0x3c;

pub const COLUMNS: usize = 16;

pub const CONTROL_COMMAND: u8 = 0x00;
pub const CONTROL_DATA: u8 = 0x40;

pub const CLEAR_DISPLAY: u8 = 0x01;
pub const DISPLAY_ON: u8 = 0x0c;
pub const SET_DDRAM_FIRST_LINE: u8 = 0x80;
pub const SET_DDRAM_SECOND_LINE: u8 = 0xa0;

const CLEAR_DISPLAY_WAIT: Duration = Duration::from_millis(2);

#[derive(Debug)]
pub struct SO1602A {
    i2c: I2c,
}

impl SO1602A {
    pub fn new(config: &I2cDeviceConfig) -> Result<SO1602A, anyhow::Error> {
        let mut i2c = I2c::with_bus(config.i2c_bus).context("Failed to initialize I2C")?;
        i2c.set_slave_address(config.address)
            .context("Failed to set SO1602A address")?;

        Ok(SO1602A { i2c })
    }

    fn send_command(&mut self, command: u8) -> Result<(), anyhow::Error> {
        self.i2c
            .smbus_write_byte(CONTROL_COMMAND, command)
            .with_context(|| format!("Failed to send command {command:#04x}"))
    }

    fn send_data(&mut self, data: &[u8]) -> Result<(), anyhow::Error> {
        for &byte in data {
            self.i2c
                .smbus_write_byte(CONTROL_DATA, byte)
                .context("Failed to send data")?;
        }
        Ok(())
    }
}

impl CharacterDisplay for SO1602A {
    fn setup(&mut self) -> Result<(), Fault> {
        self.send_command(DISPLAY_ON).map_err(Fault::display)
    }

    fn clear(&mut self) -> Result<(), Fault> {
        self.send_command(CLEAR_DISPLAY).map_err(Fault::display)?;
        thread::sleep(CLEAR_DISPLAY_WAIT);
        Ok(())
    }

    fn write_line(&mut self, row: Row, text: &str) -> Result<(), Fault> {
        self.send_command(line_address(row))
            .and_then(|()| self.send_data(&encode(text)))
            .map_err(Fault::display)
    }
}

pub fn line_address(row: Row) -> u8 {
    match row {
        Row::First => SET_DDRAM_FIRST_LINE,
        Row::Second => SET_DDRAM_SECOND_LINE,
    }
}

// Non-printable and non-ASCII characters become `?`.
pub fn encode(text: &str) -> Vec<u8> {
    text.chars()
        .take(COLUMNS)
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() {
                c as u8
            } else {
                b'?'
            }
        })
        .collect()
}
