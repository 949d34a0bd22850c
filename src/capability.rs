//! Interfaces to the hardware and services the agent drives.
//!
//! Each task owns exactly one capability. All methods are blocking; the
//! tasks call them off the async scheduler.

use crate::{error::Fault, reading::Reading};

pub trait Sensor: Send {
    fn setup(&mut self) -> Result<(), Fault>;

    fn measure(&mut self) -> Result<Reading, Fault>;
}

/// Row of a two-line character display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Row {
    First,
    Second,
}

pub trait CharacterDisplay: Send {
    fn setup(&mut self) -> Result<(), Fault>;

    fn clear(&mut self) -> Result<(), Fault>;

    fn write_line(&mut self, row: Row, text: &str) -> Result<(), Fault>;
}

pub trait TelemetrySink: Send {
    fn setup(&mut self) -> Result<(), Fault> {
        Ok(())
    }

    fn publish(&mut self, series: &str, fields: &[(&str, f64)]) -> Result<(), Fault>;
}
