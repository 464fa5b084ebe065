//! ALB-compatible Lambda proxy.
//!
//! ```text
//!  Client ──▶ listener (TCP/TLS) ──▶ route ──▶ header_up ──▶ forwarding headers
//!                                                                │
//!                                                                ▼
//!  Client ◀── response writer ◀── decoder ◀── Lambda Invoke ◀── event encoder
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use alb_lambda_proxy::config::load_config;
use alb_lambda_proxy::net::tls::load_tls_config;
use alb_lambda_proxy::observability::{logging, metrics};
use alb_lambda_proxy::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "alb-lambda-proxy")]
#[command(about = "Serve HTTP by invoking Lambda functions with load balancer events", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "alb-lambda-proxy.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(&args.config)?;

    logging::init(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "alb-lambda-proxy starting");

    tracing::info!(
        config = %args.config.display(),
        bind_address = %config.listener.bind_address,
        tls = config.listener.tls.is_some(),
        functions = config.functions.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    let tls = config.listener.tls.clone();
    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(config).await?;

    match tls {
        Some(tls) => {
            let addr: SocketAddr = bind_address.parse()?;
            let rustls = load_tls_config(&tls).await?;
            server.run_tls(addr, rustls, shutdown.subscribe()).await?;
        }
        None => {
            let listener = TcpListener::bind(&bind_address).await?;
            server.run(listener, shutdown.subscribe()).await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
