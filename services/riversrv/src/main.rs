use anyhow::{anyhow, Result};
use clap::Parser;
use common::shutdown::wait_for_shutdown;
use serial_link::{SerialHandler, SerialPortDevice};
use tracing::info;

use riversrv::{Args, RiverConfig, RiverView};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.list_ports {
        for port in SerialPortDevice::available_ports()? {
            println!("{port}");
        }
        return Ok(());
    }

    let mut config = RiverConfig::load(&args.config)?;
    args.apply_overrides(&mut config);
    config.validate()?;

    common::logging::init_with_config(&args.log_config(&config))
        .map_err(|e| anyhow!("Failed to init logging: {}", e))?;

    if args.validate {
        info!("Configuration valid: {}", args.config.display());
        return Ok(());
    }

    let device = SerialPortDevice::new(config.serial.read_timeout());
    let handler = SerialHandler::new(device, config.channel_config()?, RiverView::new())
        .with_retry_interval(config.serial.retry_interval());

    riversrv::run(handler, &config, async {
        let signal = wait_for_shutdown().await;
        info!("{} received, shutting down", signal);
    })
    .await?;

    Ok(())
}
