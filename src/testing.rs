//! In-memory capabilities for tests.

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use crate::{
    capability::{CharacterDisplay, Row, Sensor, TelemetrySink},
    error::Fault,
    reading::Reading,
};

#[derive(Debug, Clone, Default)]
pub struct SensorCalls {
    setups: Arc<AtomicUsize>,
    measures: Arc<AtomicUsize>,
}

impl SensorCalls {
    pub fn setups(&self) -> usize {
        self.setups.load(Ordering::SeqCst)
    }

    pub fn measures(&self) -> usize {
        self.measures.load(Ordering::SeqCst)
    }
}

/// Plays back `script`, `Err(())` meaning a bus fault. Once the script is
/// exhausted every measurement `n` yields `Reading::new(n, n, n)`.
pub struct ScriptedSensor {
    script: VecDeque<Result<Reading, ()>>,
    fail_setup: bool,
    calls: SensorCalls,
}

impl ScriptedSensor {
    pub fn new(script: Vec<Result<Reading, ()>>) -> (Self, SensorCalls) {
        let calls = SensorCalls::default();
        let sensor = Self {
            script: script.into(),
            fail_setup: false,
            calls: calls.clone(),
        };
        (sensor, calls)
    }

    pub fn failing_setup() -> (Self, SensorCalls) {
        let (mut sensor, calls) = Self::new(Vec::new());
        sensor.fail_setup = true;
        (sensor, calls)
    }
}

impl Sensor for ScriptedSensor {
    fn setup(&mut self) -> Result<(), Fault> {
        self.calls.setups.fetch_add(1, Ordering::SeqCst);
        if self.fail_setup {
            return Err(Fault::HardwareFault("no ack from sensor".to_string()));
        }
        Ok(())
    }

    fn measure(&mut self) -> Result<Reading, Fault> {
        let n = self.calls.measures.fetch_add(1, Ordering::SeqCst) + 1;
        match self.script.pop_front() {
            Some(Ok(reading)) => Ok(reading),
            Some(Err(())) => Err(Fault::HardwareFault("bus error".to_string())),
            None => {
                let v = n as f64;
                Ok(Reading::new(v, v, v))
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DisplayLog {
    lines: Arc<Mutex<Vec<(Row, String)>>>,
    clears: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
}

impl DisplayLog {
    pub fn lines(&self) -> Vec<(Row, String)> {
        self.lines.lock().unwrap().clone()
    }

    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), Fault> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Fault::DisplayFault("display disconnected".to_string()));
        }
        Ok(())
    }
}

pub struct RecordingDisplay {
    log: DisplayLog,
}

impl RecordingDisplay {
    pub fn new() -> (Self, DisplayLog) {
        let log = DisplayLog::default();
        (Self { log: log.clone() }, log)
    }
}

impl CharacterDisplay for RecordingDisplay {
    fn setup(&mut self) -> Result<(), Fault> {
        self.log.check()
    }

    fn clear(&mut self) -> Result<(), Fault> {
        self.log.check()?;
        self.log.clears.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn write_line(&mut self, row: Row, text: &str) -> Result<(), Fault> {
        self.log.check()?;
        self.log.lines.lock().unwrap().push((row, text.to_string()));
        Ok(())
    }
}

type Point = (String, Vec<(String, f64)>);

#[derive(Debug, Clone, Default)]
pub struct SinkLog {
    published: Arc<Mutex<Vec<Point>>>,
    fail_next: Arc<AtomicUsize>,
    attempts: Arc<AtomicUsize>,
}

impl SinkLog {
    pub fn published(&self) -> Vec<Point> {
        self.published.lock().unwrap().clone()
    }

    /// Makes the next `n` publish calls fail.
    pub fn fail_next(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

pub struct RecordingSink {
    log: SinkLog,
}

impl RecordingSink {
    pub fn new() -> (Self, SinkLog) {
        let log = SinkLog::default();
        (Self { log: log.clone() }, log)
    }
}

impl TelemetrySink for RecordingSink {
    fn publish(&mut self, series: &str, fields: &[(&str, f64)]) -> Result<(), Fault> {
        self.log.attempts.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .log
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(Fault::SinkUnavailable("connection refused".to_string()));
        }

        let fields = fields.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        self.log
            .published
            .lock()
            .unwrap()
            .push((series.to_string(), fields));
        Ok(())
    }
}
