use anyhow::{Context as _, bail};
use bme280::i2c::BME280;
use rppal::{hal::Delay, i2c::I2c};

use crate::{capability::Sensor, config::I2cDeviceConfig, error::Fault, reading::Reading};

pub const BME280_PRIMARY_ADDR: u16 = 0x76;
pub const BME280_SECONDARY_ADDR: u16 = 0x77;

#[derive(Debug)]
pub struct Bme280Sensor {
    delay: Delay,
    bme280: BME280<I2c>,
}

impl Bme280Sensor {
    pub fn new(config: &I2cDeviceConfig) -> Result<Self, anyhow::Error> {
        let i2c = I2c::with_bus(config.i2c_bus).context("Failed to initialize I2C")?;
        let bme280 = match config.address {
            BME280_PRIMARY_ADDR => BME280::new_primary(i2c),
            BME280_SECONDARY_ADDR => BME280::new_secondary(i2c),
            other => bail!("Unsupported BME280 address {other:#04x}"),
        };

        Ok(Self {
            delay: Delay,
            bme280,
        })
    }
}

impl Sensor for Bme280Sensor {
    fn setup(&mut self) -> Result<(), Fault> {
        self.bme280
            .init(&mut self.delay)
            .context("Failed to initialize BME280")
            .map_err(Fault::hardware)
    }

    fn measure(&mut self) -> Result<Reading, Fault> {
        let m = self
            .bme280
            .measure(&mut self.delay)
            .context("Failed to read BME280 measurements")
            .map_err(Fault::hardware)?;

        Ok(Reading {
            temperature: f64::from(m.temperature),
            humidity: f64::from(m.humidity),
            pressure: pascal_to_hectopascal(m.pressure),
        })
    }
}

fn pascal_to_hectopascal(pa: f32) -> f64 {
    f64::from(pa) / 100.0
}
