use std::time::Duration;

use backon::{BlockingRetryable, ConstantBuilder};
use tokio::time::MissedTickBehavior;

use crate::{cancel::CancellationSignal, error::Fault};

// `tick` runs in `block_in_place` so blocking device I/O never stalls the
// other tasks. Cancellation is checked before each tick and before sleeping.
pub async fn run_periodic<F>(
    period: Duration,
    cancel: &CancellationSignal,
    mut tick: F,
) -> Result<(), Fault>
where
    F: FnMut() -> Result<(), Fault>,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            _ = ticker.tick() => {}
        }

        if cancel.is_cancelled() {
            return Ok(());
        }

        tokio::task::block_in_place(&mut tick)?;

        if cancel.is_cancelled() {
            return Ok(());
        }
    }
}

/// Runs a capability's one-time setup with a constant backoff. Retrying
/// stops as soon as `cancel` is set.
pub fn setup_with_retry<F>(
    name: &str,
    retry: ConstantBuilder,
    cancel: &CancellationSignal,
    setup: F,
) -> Result<(), Fault>
where
    F: FnMut() -> Result<(), Fault>,
{
    tokio::task::block_in_place(|| {
        setup
            .retry(retry)
            .when(|_| !cancel.is_cancelled())
            .notify(|e, dur| {
                log::error!("{name}: {e}");
                log::info!("Retrying in {:?}", dur);
            })
            .call()
    })
}
