use std::time::Duration;

use backon::ConstantBuilder;
use chrono::{DateTime, Local, TimeZone};

use crate::{
    cancel::CancellationSignal,
    capability::{CharacterDisplay, Row},
    error::Fault,
    periodic::{run_periodic, setup_with_retry},
    reading::Reading,
    store::SharedReadingStore,
};

pub const LINE_WIDTH: usize = 16;

pub const DATE_TIME_FORMAT: &str = "%Y/%m/%d %H:%M";

pub const NO_DATA: &str = " --.-C --.-% ---";

pub fn comfort_index(temperature: f64, humidity: f64) -> f64 {
    0.81 * temperature + 0.01 * humidity * (0.99 * temperature - 14.3) + 46.3
}

// Field widths cover the BME280 range (-40.0..85.0 °C, 0..100 %RH), which
// keeps the comfort index within -40..185.
pub fn render<Tz>(now: &DateTime<Tz>, reading: Option<&Reading>) -> [String; 2]
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let first = now.format(DATE_TIME_FORMAT).to_string();
    let second = match reading {
        Some(r) => format!(
            "{:>5.1}C{:>5.1}%{:>4.0}",
            r.temperature,
            r.humidity,
            comfort_index(r.temperature, r.humidity)
        ),
        None => NO_DATA.to_string(),
    };
    [pad(first), pad(second)]
}

// Blanks whatever a longer previous line left behind.
fn pad(mut line: String) -> String {
    let len = line.chars().count();
    line.extend(std::iter::repeat_n(' ', LINE_WIDTH.saturating_sub(len)));
    line
}

pub struct Presentation {
    display: Box<dyn CharacterDisplay>,
    store: SharedReadingStore,
}

impl Presentation {
    pub fn new(display: Box<dyn CharacterDisplay>, store: SharedReadingStore) -> Self {
        Self { display, store }
    }

    pub fn tick(&mut self, now: DateTime<Local>) -> Result<(), Fault> {
        let snapshot = self.store.snapshot();
        let [first, second] = render(&now, snapshot.as_ref());
        self.display.write_line(Row::First, &first)?;
        self.display.write_line(Row::Second, &second)?;
        Ok(())
    }

    pub async fn run(
        mut self,
        period: Duration,
        cancel: CancellationSignal,
        retry: ConstantBuilder,
    ) -> Result<(), Fault> {
        let setup = setup_with_retry("Display setup failed", retry, &cancel, || {
            self.display.setup()?;
            self.display.clear()
        });
        match setup {
            Ok(()) => log::info!("Display initialized, refreshing every {period:?}"),
            Err(e) => log::warn!("Continuing without a confirmed display setup: {e}"),
        }

        run_periodic(period, &cancel, || {
            if let Err(e) = self.tick(Local::now()) {
                log::warn!("Skipping display refresh: {e}");
            }
            Ok(())
        })
        .await?;

        log::info!("Presentation task stopped");
        Ok(())
    }
}
