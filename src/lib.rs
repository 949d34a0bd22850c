//! Environment monitor: samples a BME280, shows the latest reading on a
//! character display and forwards it to a time-series database.

pub mod acquisition;
pub mod cancel;
pub mod capability;
pub mod config;
pub mod db;
pub mod error;
pub mod influxdb;
pub mod orchestrator;
pub mod periodic;
pub mod presentation;
pub mod publication;
pub mod reading;
pub mod sensor;
pub mod so1602a;
pub mod store;

#[cfg(test)]
mod testing;
