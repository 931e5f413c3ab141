// src/main.rs
use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use daisy_chain::{
    logging,
    metrics::MetricsRegistry,
    node::{ChainNode, MemoryStore, Predecessor, Role},
    parent::ParentClient,
    server::{bind_tcp, shutdown_signal, RequestHandler, ServerBuilder},
};

/// One link of a daisy-chained key/value lookup service.
#[derive(Parser, Debug)]
#[command(name = "chain-node", version)]
struct Args {
    /// Dataset this node is seeded with.
    #[arg(value_enum)]
    role: Role,

    /// Port to listen on (127.0.0.1).
    port: u16,

    /// Port of the parent node, or `none` for the root of the chain.
    parent: Predecessor,

    /// Seconds to wait for the parent before answering 504.
    #[arg(long, default_value_t = 5)]
    parent_timeout_secs: u64,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));

    let parent = match args.parent.port() {
        None => {
            info!("Running root at http://{}", addr);
            None
        }
        Some(port) => {
            let parent_addr = SocketAddr::from(([127, 0, 0, 1], port));
            info!(
                "Running child at http://{} with parent at http://{}",
                addr, parent_addr
            );
            let client = ParentClient::new(parent_addr, Duration::from_secs(args.parent_timeout_secs))
                .context("Failed to create parent client")?;
            Some(client)
        }
    };

    let metrics = Arc::new(MetricsRegistry::new()?);
    let store = Arc::new(MemoryStore::new(args.role.as_str()));

    let node = ChainNode::new(args.role, addr, store, parent).with_metrics(metrics);
    node.init();
    let node = Arc::new(node);

    let listener = bind_tcp(addr).await?;
    let server = ServerBuilder::new(addr)
        .with_listener(listener)
        .with_handler(RequestHandler::new(node));

    tokio::select! {
        result = server.serve() => {
            if let Err(e) = &result {
                error!("Server error: {:#}", e);
            }
            result
        }
        _ = shutdown_signal() => {
            info!("Node on {} stopped", addr);
            Ok(())
        }
    }
}
