use clap::Parser;
use std::process::ExitCode;
use stress_injector::cli::Cli;
use stress_injector::core::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let token = CancellationToken::new();
    let interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping");
            interrupt.cancel();
        }
    });

    match cli.execute(token).await {
        Ok(outcome) if cli.json => match outcome.to_json() {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize report");
                ExitCode::FAILURE
            }
        },
        Ok(outcome) => {
            println!("{outcome}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Stress run failed");
            ExitCode::FAILURE
        }
    }
}
