use std::time::Duration;

use backon::ConstantBuilder;

use crate::{
    cancel::CancellationSignal,
    capability::Sensor,
    error::Fault,
    periodic::{run_periodic, setup_with_retry},
    reading::Reading,
    store::SharedReadingStore,
};

/// Samples the sensor and replaces the shared reading on every tick.
pub struct Acquisition {
    sensor: Box<dyn Sensor>,
    store: SharedReadingStore,
}

impl Acquisition {
    pub fn new(sensor: Box<dyn Sensor>, store: SharedReadingStore) -> Self {
        Self { sensor, store }
    }

    pub fn tick(&mut self) -> Result<Reading, Fault> {
        let reading = self.sensor.measure()?;
        self.store.update(reading);
        Ok(reading)
    }

    pub async fn run(
        mut self,
        period: Duration,
        cancel: CancellationSignal,
        retry: ConstantBuilder,
    ) -> Result<(), Fault> {
        let result = self.run_inner(period, &cancel, retry).await;
        match &result {
            Ok(()) => log::info!("Acquisition task stopped"),
            Err(e) => log::error!("Acquisition task terminated, readings will go stale: {e}"),
        }
        result
    }

    async fn run_inner(
        &mut self,
        period: Duration,
        cancel: &CancellationSignal,
        retry: ConstantBuilder,
    ) -> Result<(), Fault> {
        setup_with_retry("Sensor setup failed", retry, cancel, || self.sensor.setup())?;
        log::info!("Sensor initialized, sampling every {period:?}");

        run_periodic(period, cancel, || {
            let reading = self.tick()?;
            log::debug!("{reading:?}");
            Ok(())
        })
        .await
    }
}
