use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use home_env_monitor::{
    capability::TelemetrySink,
    config::{Config, DEFAULT_CONFIG_FILE, SinkKind},
    db::DB,
    influxdb::InfluxWriter,
    orchestrator::{self, AppContext, Schedule},
    sensor::Bme280Sensor,
    so1602a::SO1602A,
};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();

    let config = Config::load(&args.config).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    TermLogger::init(
        config.log_level_filter()?,
        ConfigBuilder::new()
            .set_time_format_rfc3339()
            .set_time_offset_to_local()
            .map_err(|_| anyhow::anyhow!("Failed to set time offset to local"))?
            .build(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .context("Failed to initialize logger")?;

    if let Err(e) = run(config).await {
        log::error!("{e:#}");
        return Err(e);
    }

    Ok(())
}

pub async fn run(config: Config) -> Result<(), anyhow::Error> {
    let sensor = Bme280Sensor::new(&config.sensor).context("Failed to initialize BME280")?;
    let display = SO1602A::new(&config.display).context("Failed to initialize SO1602A")?;
    let sink: Box<dyn TelemetrySink> = match config.sink.kind {
        SinkKind::InfluxDb => Box::new(InfluxWriter::new(&config.influxdb)),
        SinkKind::Sqlite => {
            Box::new(DB::new(&config.sqlite.path).context("Failed to initialize database")?)
        }
    };

    let ctx = AppContext::new(
        Schedule::from(&config),
        Box::new(sensor),
        Box::new(display),
        sink,
    );

    orchestrator::run(ctx, orchestrator::interrupted()).await?;
    log::info!("Exiting...");

    Ok(())
}
