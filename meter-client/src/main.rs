use anyhow::{Context, Result, bail};
use log::info;
use meter_client::{ReadoutConfig, ReadoutLoop, ReportSink, StopReason, logging, shutdown};
use meter_transport::{SerialTransport, TransportLayer};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => ReadoutConfig::load(&path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => ReadoutConfig::default(),
    };

    logging::init(&config.log)?;
    config.validate().context("Invalid configuration")?;
    let key = config.cipher_key()?;

    let mut transport = SerialTransport::new(config.serial_settings()?);
    transport
        .open()
        .await
        .with_context(|| format!("Failed to open {}", config.serial.port))?;
    info!(
        "Listening on {} at {} baud",
        config.serial.port, config.serial.baud_rate
    );

    let token = CancellationToken::new();
    shutdown::spawn_signal_listener(token.clone(), config.shutdown_immediately);

    let mut readout = ReadoutLoop::new(transport, config.frame_layout(), &key);
    match readout.run(&token, &mut ReportSink::stdout()).await {
        StopReason::Shutdown => Ok(()),
        StopReason::BreakerTripped => bail!("Stopped after repeated errors"),
    }
}
