use anyhow::Result;
use clap::Parser;
use exitnode::Pool;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "exitnode")]
#[command(version = "0.1.0")]
#[command(about = "Websocket-relayed HTTP exit client", long_about = None)]
struct Cli {
    /// Relay control-channel URL
    #[arg(short, long, default_value = "ws://localhost:8080/websocket")]
    relay: String,

    /// Number of relay connections to hold open
    #[arg(short, long, default_value_t = 200)]
    workers: usize,

    /// Outbound HTTP request timeout in seconds
    #[arg(long, default_value_t = 60)]
    request_timeout: u64,

    /// Seconds a channel may stay silent before the worker reconnects
    /// (0 = wait forever)
    #[arg(long, default_value_t = 0)]
    idle_timeout: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .init();
    }

    let pool = Pool {
        relay_url: cli.relay,
        worker_count: cli.workers,
        request_timeout: Duration::from_secs(cli.request_timeout),
        idle_timeout: match cli.idle_timeout {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        },
    };

    info!(
        "starting {} workers against {}",
        pool.worker_count, pool.relay_url
    );
    let handles = pool.start()?;

    tokio::signal::ctrl_c().await?;
    info!("shutting down...");
    for handle in handles {
        handle.abort();
    }

    Ok(())
}
