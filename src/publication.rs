use std::time::Duration;

use backon::ConstantBuilder;

use crate::{
    cancel::CancellationSignal,
    capability::TelemetrySink,
    error::Fault,
    periodic::{run_periodic, setup_with_retry},
    store::SharedReadingStore,
};

/// Forwards the latest reading to the telemetry sink.
///
/// Delivery is at most once per tick: a failed publish is not retried and
/// the next tick sends whatever is current then.
pub struct Publication {
    sink: Box<dyn TelemetrySink>,
    store: SharedReadingStore,
    series: String,
}

impl Publication {
    pub fn new(sink: Box<dyn TelemetrySink>, store: SharedReadingStore, series: String) -> Self {
        Self {
            sink,
            store,
            series,
        }
    }

    /// Returns `Ok(false)` when there is nothing to publish yet.
    pub fn tick(&mut self) -> Result<bool, Fault> {
        let Some(reading) = self.store.snapshot() else {
            return Ok(false);
        };
        self.sink.publish(&self.series, &reading.fields())?;
        Ok(true)
    }

    pub async fn run(
        mut self,
        period: Duration,
        cancel: CancellationSignal,
        retry: ConstantBuilder,
    ) -> Result<(), Fault> {
        match setup_with_retry("Telemetry sink setup failed", retry, &cancel, || {
            self.sink.setup()
        }) {
            Ok(()) => log::info!("Publishing '{}' every {period:?}", self.series),
            Err(e) => log::warn!("Continuing without a confirmed telemetry sink setup: {e}"),
        }

        run_periodic(period, &cancel, || {
            match self.tick() {
                Ok(true) => log::debug!("Published '{}'", self.series),
                Ok(false) => log::debug!("No reading yet, nothing to publish"),
                Err(e) => log::warn!("Dropping this publication: {e}"),
            }
            Ok(())
        })
        .await?;

        log::info!("Publication task stopped");
        Ok(())
    }
}
