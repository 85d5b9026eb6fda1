// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

#![doc = include_str!("../README.md")]

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Result;
use clap::Parser;
use log::{debug, info};
use pvo_canister::{
    canister::{Canister, CanisterVariant},
    ledger_client::LedgerClient,
    marketplace::Marketplace,
    metrics,
    registry::{DocumentRegistry, InitPayload},
    server,
};
use pvo_core::config::ReservationConfig;
use pvo_ledger::Principal;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Canister to serve, `registry` or `marketplace`.
    #[arg(long, value_enum, env = "PVO_CANISTER")]
    canister: CanisterVariant,

    /// Port to listen on for JSON-RPC requests.
    /// Defaults to 8080.
    #[arg(long, default_value_t = 8080, env = "PVO_PORT")]
    port: u16,

    /// Principal of this canister, in text form. Payments are expected on its
    /// default account.
    #[arg(long, env = "PVO_CANISTER_ID")]
    canister_id: Principal,

    /// JSON-RPC endpoint of the ledger.
    #[arg(long, env = "PVO_LEDGER_URL")]
    ledger_url: String,

    /// Fee in e8s for registering a document. Required by the registry.
    #[arg(long, env = "PVO_ADD_DOC_FEE")]
    add_doc_fee: Option<u64>,

    /// Fee in e8s for verifying a document. Required by the registry.
    #[arg(long, env = "PVO_VERIFY_DOC_FEE")]
    verify_doc_fee: Option<u64>,

    /// Seconds an order stays pending before it is discarded.
    /// Defaults to 120.
    #[arg(long, default_value_t = 120, env = "PVO_RESERVATION_WINDOW_SECS")]
    reservation_window_secs: u64,

    /// File the canister state is restored from on start and saved to on shutdown.
    #[arg(long, env = "PVO_STATE_FILE")]
    state_file: Option<PathBuf>,

    /// Maximum request body size in bytes.
    /// Defaults to 10MB.
    #[arg(long, default_value_t = 10 * 1024 * 1024, env = "PVO_MAX_REQUEST_BODY_SIZE")]
    max_request_body_size: u32,

    /// Maximum response body size in bytes.
    /// Defaults to 100kB.
    #[arg(long, default_value_t = 100 * 1024, env = "PVO_MAX_RESPONSE_BODY_SIZE")]
    max_response_body_size: u32,

    /// Maximum number of concurrent connections.
    /// Defaults to 32.
    #[arg(long, default_value_t = 32, env = "PVO_MAX_CONNECTIONS")]
    max_connections: u32,

    /// Metrics server port.
    /// Defaults to 5000.
    #[arg(long, default_value_t = 5000, env = "PVO_METRICS_PORT")]
    metrics_port: u16,
}

impl Args {
    fn fees(&self) -> Option<InitPayload> {
        Some(InitPayload {
            add_doc_fee: self.add_doc_fee?,
            verify_doc_fee: self.verify_doc_fee?,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger.
    // Set the log level by setting the RUST_LOG environment variable.
    // jsonrpsee logs through tracing, so tracing_subscriber shows its spans too.
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    debug!("Settings: {:?}", args);

    // Start the metrics server.
    // We just let it gracelessly get killed at the end of main()
    tokio::spawn(metrics::run_server(args.metrics_port));

    let config = ReservationConfig::new(args.canister_id.clone())
        .with_reservation_window(Duration::from_secs(args.reservation_window_secs));
    let ledger = LedgerClient::new(&args.ledger_url)?;
    info!(
        "Canister {} receives payments on account {}",
        args.canister_id,
        config.canister_account()
    );

    let canister = match args.canister {
        CanisterVariant::Registry => {
            Canister::Registry(Arc::new(DocumentRegistry::new(&config, ledger)))
        }
        CanisterVariant::Marketplace => {
            Canister::Marketplace(Arc::new(Marketplace::new(&config, ledger)))
        }
    };
    canister
        .start(args.fees(), args.state_file.as_deref())
        .await?;

    // Start the JSON-RPC server.
    // This await is non-blocking
    let (handle, _) = server::run_server(
        args.port,
        canister.clone(),
        args.max_request_body_size,
        args.max_response_body_size,
        args.max_connections,
    )
    .await?;
    info!("Server started. Listening on port {}.", args.port);

    let _ = handle.await;

    // If we're here, we've received a signal to exit.
    info!("Shutting down...");
    if let Some(path) = &args.state_file {
        canister.save(path).await?;
    }
    Ok(())
}
