//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::{AppConfig, DistanceSink};
use dispatcher::SinkKind;
use ingestion::{SensorLoop, SerialTransport};
use tracing::{error, info, warn};

use crate::cli::RunArgs;
use crate::settings;

/// Execute the `run` command
pub async fn run_bridge(args: &RunArgs, verbose: bool) -> Result<()> {
    let config = settings::resolve(args, verbose).context("Failed to resolve configuration")?;

    info!(
        device = %config.sensor.device,
        protocol = ?config.output.protocol,
        target = %config.output.target(),
        thingsboard = config.thingsboard.is_some(),
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    let transport = SerialTransport::open(&config.sensor.device, config.sensor.baud_rate)
        .with_context(|| format!("Failed to open serial device {}", config.sensor.device))?;

    let mut sensor: SensorLoop<SerialTransport, SinkKind> =
        SensorLoop::new(transport, &config.sensor);
    for sink in dispatcher::create_sinks(&config)
        .await
        .context("Failed to create sinks")?
    {
        sensor.add_sink(sink);
    }

    if config.verbose {
        info!("{}", sensor.describe());
        for sink in sensor.sinks() {
            info!(sink = %sink.name(), "{}", sink.describe());
        }
    }

    let stop = sensor.stop_handle();
    let signal_task = tokio::spawn(async move {
        shutdown_signal().await;
        warn!("Received shutdown signal, stopping sensor loop...");
        stop.stop();
    });

    let open_result = sensor.open();
    if open_result.is_ok() {
        sensor.start().await;
    }
    signal_task.abort();

    // Release the device and drain sinks even after a failed open
    let close_result = sensor.close();
    sensor.shutdown_sinks().await;

    println!("{}", sensor.summary());
    for sink in sensor.sinks() {
        if let Some(snapshot) = sink.metrics() {
            println!("{}: {}", sink.name(), snapshot);
        }
    }

    open_result.context("Failed to open serial device")?;
    close_result.context("Failed to close serial device")?;

    info!("tfluna finished");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &AppConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Sensor:");
    println!("  Device: {} @ {} baud", config.sensor.device, config.sensor.baud_rate);
    println!("  Interval: {}s", config.sensor.interval_secs);
    println!("  Epsilon: {} cm", config.sensor.epsilon);
    println!("  Max distance: {} cm", config.sensor.max_distance);
    println!("  Normalize: {}", config.sensor.normalize);
    if let Some(id) = config.sensor.device_id {
        println!("  Device id: {}", id);
    }

    println!("\nOutput:");
    println!("  Protocol: {:?}", config.output.protocol);
    println!("  Target: {}", config.output.target());
    println!("  Message: {}", config.output.message());

    if let Some(ref tb) = config.thingsboard {
        println!("\nThingsBoard:");
        println!("  URL: {}", tb.url);
        println!("  Message: {}", tb.message);
        if tb.pooled {
            println!("  Workers: {} (queue {})", tb.workers, tb.queue_capacity);
        } else {
            println!("  Inline posts");
        }
    }

    println!();
}
