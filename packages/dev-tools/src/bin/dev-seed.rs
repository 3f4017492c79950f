//! Development seed loader
//!
//! Loads a JSON seed file into an in-memory SurrealDB graph through `OrgService` and
//! prints every derived view (department headcounts, employees by age,
//! each manager's team) as JSON.
//!
//! # Usage
//!
//! ```bash
//! # Built-in sample org
//! cargo run --bin dev-seed
//!
//! # Your own seed file, with query logging
//! ORGGRAPH_SEED=./org.json RUST_LOG=orggraph_core=debug cargo run --bin dev-seed
//! ```

use orggraph_core::{OrgService, SurrealStore};
use orggraph_dev_tools::{seed, DevConfig, SeedFile};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = DevConfig::from_env();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&config.log_filter)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match &config.seed_path {
        Some(path) => tracing::info!("Loading seed file {}", path.display()),
        None => tracing::info!("No ORGGRAPH_SEED set, using the built-in sample org"),
    }
    let seed_file = SeedFile::load(config.seed_path.as_deref())?;

    let store = Arc::new(SurrealStore::in_memory().await?);
    let service = OrgService::new(store.clone());

    let outcome = seed::apply(&service, &store, &seed_file).await?;
    tracing::info!(
        "Seeded {} employees ({} rejected)",
        outcome.created,
        outcome.rejected.len()
    );
    for reason in &outcome.rejected {
        eprintln!("rejected: {}", reason);
    }

    let report = seed::report(&service).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
