//! # Workflow demo
//!
//! Runs the create, issue and verify workflow against an in-memory registry
//! and prints the resulting artifacts as JSON.
//!
//! Configuration is read from the environment (see [`Config::from_env`]), so
//! `RUST_LOG=idblock_did=debug` shows resolution and verification detail.

use idblock_did::{Config, Endpoint, InMemoryRegistry};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let subscriber =
        FmtSubscriber::builder().with_env_filter(EnvFilter::new(&config.log_filter)).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let endpoint = Endpoint::new(InMemoryRegistry::new(), config);
    let demo = endpoint.demo().await?;
    tracing::info!("credential verified: {}", demo.verification_result);

    println!("{}", serde_json::to_string_pretty(&demo)?);
    Ok(())
}
