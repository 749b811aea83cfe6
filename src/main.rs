//! Beckn gateway binary.
//!
//! Loads the YAML configuration, assembles the pipeline handler (failing
//! fast on any misconfiguration), and serves it.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use beckn_gateway::capability::{Ed25519SignValidator, Ed25519Signer, InMemoryKeyManager};
use beckn_gateway::config::load_config;
use beckn_gateway::routing::RoutingTable;
use beckn_gateway::{GatewayServer, HandlerBuilder};

#[derive(Parser, Debug)]
#[command(name = "beckn-gateway", about = "Beckn network protocol gateway")]
struct Args {
    /// Path to the gateway configuration file.
    #[arg(long, default_value = "config/gateway.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "beckn_gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = load_config(&args.config)?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        subscriber_id = %config.subscriber_id,
        role = ?config.role,
        steps = ?config.steps,
        "configuration loaded"
    );

    let mut builder = HandlerBuilder::new(config.subscriber_id.clone(), config.role)
        .signing_ttl(Duration::from_secs(config.signing.ttl_secs))
        .max_body_bytes(config.listener.max_body_bytes)
        .signer(Arc::new(Ed25519Signer))
        .sign_validator(Arc::new(Ed25519SignValidator))
        .key_manager(Arc::new(InMemoryKeyManager::new(&config.keys)));

    if let Some(rules_path) = &config.routing.rules_path {
        let table = RoutingTable::load(rules_path.as_ref())?;
        tracing::info!(rules_path = %rules_path, "routing rules loaded");
        builder = builder.router(Arc::new(table));
    }

    // Any unknown step or step without its collaborator fails here, before
    // the listener comes up.
    let handler = Arc::new(builder.build(&config.steps)?);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "listening for connections");

    let server = GatewayServer::new(
        handler,
        Duration::from_secs(config.timeouts.request_secs),
    );
    server.run(listener).await?;

    tracing::info!("shutdown complete");
    Ok(())
}
