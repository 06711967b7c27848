//! Provider balancer demo driver.
//!
//! Registers a handful of in-process providers, runs the health monitor for
//! a while, fires a burst of requests and prints the resulting slot dump.
//!
//! ```text
//! provider-balancer --providers 4 --requests 20 --strategy round_robin
//! provider-balancer --config balancer.toml --exclude 1
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use provider_balancer::config::loader::load_config;
use provider_balancer::observability::{logging, metrics};
use provider_balancer::{BalancerConfig, LoadBalancer, Provider, StaticProvider, StrategyKind};

#[derive(Parser)]
#[command(name = "provider-balancer")]
#[command(about = "Drive a provider load balancer with in-process providers", long_about = None)]
struct Cli {
    /// TOML config file. Built-in defaults are used when absent.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Strategy override.
    #[arg(short, long)]
    strategy: Option<StrategyKind>,

    /// Number of providers to register.
    #[arg(short, long, default_value_t = 3)]
    providers: usize,

    /// Number of concurrent requests to issue.
    #[arg(short, long, default_value_t = 10)]
    requests: usize,

    /// Exclude the provider at this position before issuing requests.
    #[arg(long)]
    exclude: Option<usize>,

    /// Seconds to let the health monitor run before stopping it.
    #[arg(long, default_value_t = 0)]
    run_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => BalancerConfig::new(StrategyKind::default(), 2, 5),
    };
    if let Some(kind) = cli.strategy {
        config.strategy = kind;
    }

    logging::init(&config.observability.log_level)?;
    tracing::info!("provider-balancer v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let balancer = Arc::new(LoadBalancer::new(config)?);
    let providers: Vec<Arc<StaticProvider>> =
        (0..cli.providers).map(|_| Arc::new(StaticProvider::new())).collect();
    balancer.register(providers.clone())?;

    if let Some(provider) = cli.exclude.and_then(|i| providers.get(i)) {
        balancer.exclude(provider.id());
    }

    balancer.start();

    let mut tasks = Vec::with_capacity(cli.requests);
    for _ in 0..cli.requests {
        let balancer = balancer.clone();
        tasks.push(tokio::spawn(async move { balancer.get().await.to_string() }));
    }
    for (i, task) in tasks.into_iter().enumerate() {
        println!("request {:>3}: {}", i, task.await?);
    }

    if cli.run_secs > 0 {
        tokio::time::sleep(Duration::from_secs(cli.run_secs)).await;
    }

    balancer.stop().await?;
    println!("{}", serde_json::to_string_pretty(&balancer.snapshot())?);

    tracing::info!("Shutdown complete");
    Ok(())
}
