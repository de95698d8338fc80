//! Resolves one identification from the command line.
//!
//! Usage: `resolve_client <number> <Cedula|RNC> [--force-update] [--photo]`

use rust_identity_api::api::validation::validate;
use rust_identity_api::config::Config;
use rust_identity_api::core::engine::WriteBackPolicy;
use rust_identity_api::core::models::ClientQuery;
use rust_identity_api::core::orchestrator::Orchestrator;
use rust_identity_api::integrations::gateway_client::HttpRegistryGateway;
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let positional: Vec<&String> = args.iter().filter(|a| !a.starts_with("--")).collect();

    let (Some(number), Some(type_)) = (positional.first(), positional.get(1)) else {
        anyhow::bail!("usage: resolve_client <number> <Cedula|RNC> [--force-update] [--photo]");
    };

    let ctx = validate(ClientQuery {
        identification_number: Some(number.to_string()),
        identification_type: Some(type_.to_string()),
        force_update: Some(args.iter().any(|a| a == "--force-update")),
        include_binary_photo: Some(args.iter().any(|a| a == "--photo")),
        session_id: None,
    })?;

    let config = Config::from_env()?;
    let orchestrator = Orchestrator::new(
        Arc::new(HttpRegistryGateway::new(&config)?),
        WriteBackPolicy::new(config.write_back_empty_photo_message.clone()),
    );

    let resolved = orchestrator.resolve(&ctx).await?;
    tracing::info!(
        "Resolved from {} via {:?} (write-back: {:?})",
        resolved.source,
        resolved.calls,
        resolved.write_back
    );

    println!("{}", serde_json::to_string_pretty(&resolved.record)?);

    Ok(())
}
