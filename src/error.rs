use thiserror::Error;

/// Failures raised by the sensor, display and telemetry sink.
#[derive(Debug, Error)]
pub enum Fault {
    #[error("sensor hardware fault: {0}")]
    HardwareFault(String),

    #[error("display fault: {0}")]
    DisplayFault(String),

    #[error("telemetry sink unavailable: {0}")]
    SinkUnavailable(String),
}

impl Fault {
    pub fn hardware(e: anyhow::Error) -> Self {
        Self::HardwareFault(format!("{e:#}"))
    }

    pub fn display(e: anyhow::Error) -> Self {
        Self::DisplayFault(format!("{e:#}"))
    }

    pub fn sink(e: anyhow::Error) -> Self {
        Self::SinkUnavailable(format!("{e:#}"))
    }
}
