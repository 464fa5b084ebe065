use std::path::PathBuf;

use clap::{Parser, Subcommand};

use alb_lambda_proxy::config::load_config;
use alb_lambda_proxy::http::response::write_response;
use alb_lambda_proxy::http::rules::HeaderRules;
use alb_lambda_proxy::InvocationResponse;

#[derive(Parser)]
#[command(name = "lambda-proxy-cli")]
#[command(about = "Offline diagnostics for alb-lambda-proxy", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file and list its routes
    Check {
        config: PathBuf,
    },
    /// Show the HTTP response a saved invocation payload turns into
    Decode {
        payload: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { config } => {
            let config = load_config(&config)?;
            println!("configuration OK ({} functions)", config.functions.len());
            for function in &config.functions {
                println!(
                    "  {} host={} prefix={} priority={}",
                    function.name,
                    function.host.as_deref().unwrap_or("*"),
                    function.path_prefix,
                    function.priority,
                );
            }
        }
        Commands::Decode { payload } => {
            let raw = std::fs::read(&payload)?;
            let decoded = InvocationResponse::decode_payload(&raw)?;
            if decoded.is_fallback() {
                eprintln!("warning: payload is not a JSON object, using fallback response");
            }
            let response = write_response(decoded.into_response(), &HeaderRules::default())?;

            println!("HTTP {}", response.status());
            for (name, value) in response.headers() {
                println!("{}: {}", name, String::from_utf8_lossy(value.as_bytes()));
            }
            println!();
            let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
            println!("{}", String::from_utf8_lossy(&body));
        }
    }

    Ok(())
}
