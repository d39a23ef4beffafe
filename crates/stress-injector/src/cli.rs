//! Command line surface.

use clap::{Args, Parser, Subcommand};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use stress_injector_core::{
    CancellationToken, ConsoleProgress, PlatformProbe, SharedProgress, StressError,
};
use stress_injector_cpu::{logical_cores, CpuStress};
use stress_injector_memory::{suggested_gigabytes, MemoryStress};
use stress_injector_url::{HttpMethod, UrlStress, DEFAULT_RATE};

/// Seconds of CPU stress suggested per logical core.
pub const SECONDS_PER_CORE: u64 = 5;

/// Synthetic CPU, memory and URL stress.
#[derive(Debug, Parser)]
#[command(name = "stress-injector", version, about)]
pub struct Cli {
    /// Print the report as JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable the live progress line.
    #[arg(long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Engine to run.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Saturate every logical core and rank cores by peak utilization.
    #[command(after_help = cpu_help())]
    Cpu(CpuArgs),
    /// Allocate random-filled memory and report peak resident memory.
    #[command(after_help = memory_help())]
    Memory(MemoryArgs),
    /// Flood a URL with concurrent requests.
    Url(UrlArgs),
}

/// Arguments for `cpu`.
#[derive(Debug, Args)]
pub struct CpuArgs {
    /// Seconds to keep every core busy.
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    pub seconds: u64,

    /// Sampler poll interval in milliseconds.
    #[arg(long, default_value_t = 1000)]
    pub interval_ms: u64,
}

/// Arguments for `memory`.
#[derive(Debug, Args)]
pub struct MemoryArgs {
    /// Gigabytes to allocate.
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    pub gigabytes: u64,
}

/// Arguments for `url`.
#[derive(Debug, Args)]
pub struct UrlArgs {
    /// Target URL.
    pub url: String,

    /// Request method: GET, PUT, POST or DELETE.
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Number of calls.
    #[arg(short, long, default_value_t = DEFAULT_RATE)]
    pub rate: usize,

    /// Per-call timeout in seconds (not applied to the sample call).
    #[arg(long)]
    pub timeout: Option<f64>,

    /// Admission failures tolerated before scheduling stops.
    #[arg(long, default_value_t = 5)]
    pub retry_limit: usize,

    /// Seconds to wait between admission retries.
    #[arg(long, default_value_t = 1.0)]
    pub backoff: f64,

    /// Worker pool capacity; defaults to the rate.
    #[arg(long)]
    pub max_concurrency: Option<usize>,

    /// Extra header as `Name: value`. Repeatable.
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Request body.
    #[arg(short = 'd', long)]
    pub body: Option<String>,
}

fn cpu_help() -> String {
    format!(
        "Suggested: {} seconds ({} per logical core)",
        logical_cores() as u64 * SECONDS_PER_CORE,
        SECONDS_PER_CORE
    )
}

fn memory_help() -> String {
    format!(
        "Suggested: {} GB (twice the physical memory)",
        suggested_gigabytes()
    )
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected 'Name: value', got '{raw}'"))?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}

fn seconds(field: &'static str, value: f64) -> Result<Duration, StressError> {
    Duration::try_from_secs_f64(value)
        .map_err(|e| StressError::invalid_input(field, e.to_string()))
}

/// A finished report, renderable as text or JSON.
pub enum Outcome {
    /// CPU run.
    Cpu(stress_injector_cpu::CpuReport),
    /// Memory run.
    Memory(stress_injector_memory::MemoryReport),
    /// URL run.
    Url(stress_injector_url::UrlReport),
}

impl Outcome {
    /// Serializes the report.
    pub fn to_json(&self) -> serde_json::Result<String> {
        match self {
            Outcome::Cpu(report) => serde_json::to_string_pretty(report),
            Outcome::Memory(report) => serde_json::to_string_pretty(report),
            Outcome::Url(report) => serde_json::to_string_pretty(report),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Cpu(report) => write!(f, "{report}"),
            Outcome::Memory(report) => write!(f, "{report}"),
            Outcome::Url(report) => write!(f, "{report}"),
        }
    }
}

impl Cli {
    fn progress(&self) -> SharedProgress {
        if self.quiet {
            stress_injector_core::progress::noop()
        } else {
            Arc::new(ConsoleProgress::new())
        }
    }

    /// Runs the selected engine until it reports or `token` is cancelled.
    ///
    /// Fails before any engine is built when the host is unsupported.
    pub async fn execute(&self, token: CancellationToken) -> Result<Outcome, StressError> {
        let platform = PlatformProbe::detect()?;
        let progress = self.progress();

        match &self.command {
            Command::Cpu(args) => {
                tracing::info!(seconds = args.seconds, cores = logical_cores(), "Stressing CPU");
                let engine = CpuStress::builder()
                    .seconds(args.seconds)
                    .sample_interval(Duration::from_millis(args.interval_ms))
                    .progress(progress)
                    .build()?;
                let report = tokio::task::spawn_blocking(move || engine.run(&token))
                    .await
                    .map_err(|e| StressError::spawn("cpu engine", e))??;
                Ok(Outcome::Cpu(report))
            }
            Command::Memory(args) => {
                tracing::info!(gigabytes = args.gigabytes, "Stressing memory");
                let gigabytes = usize::try_from(args.gigabytes)
                    .map_err(|e| StressError::invalid_input("gigabytes", e.to_string()))?;
                let engine = MemoryStress::builder()
                    .gigabytes(gigabytes)
                    .platform(platform.family())
                    .progress(progress)
                    .build()?;
                let report = tokio::task::spawn_blocking(move || engine.run(&token))
                    .await
                    .map_err(|e| StressError::spawn("memory engine", e))??;
                Ok(Outcome::Memory(report))
            }
            Command::Url(args) => {
                let method: HttpMethod = args.method.parse().map_err(StressError::from)?;
                let mut builder = UrlStress::builder(args.url.clone())
                    .method(method)
                    .rate(args.rate)
                    .retry_limit(args.retry_limit)
                    .backoff(seconds("backoff", args.backoff)?)
                    .progress(progress);
                if let Some(timeout) = args.timeout {
                    builder = builder.timeout(seconds("timeout", timeout)?);
                }
                if let Some(max) = args.max_concurrency {
                    builder = builder.max_concurrency(max);
                }
                for (name, value) in &args.headers {
                    builder = builder.header(name.clone(), value.clone());
                }
                if let Some(body) = &args.body {
                    builder = builder.body(body.clone());
                }
                let engine = builder.build()?;
                let report = engine.run(&token).await?;
                Ok(Outcome::Url(report))
            }
        }
    }
}
