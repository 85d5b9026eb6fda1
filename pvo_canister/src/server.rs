// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use anyhow::Result;
use axum::{error_handling::HandleError, routing::post_service, BoxError, Router};
use hyper::StatusCode;
use jsonrpsee::{
    core::async_trait,
    proc_macros::rpc,
    server::{ServerBuilder, ServerConfig, ServerHandle, TowerService},
    Methods,
};
use lazy_static::lazy_static;
use log::info;
use prometheus::{register_int_counter, IntCounter};
use pvo_core::{manager::adapters::LedgerQuery, Error};
use pvo_ledger::Principal;
use pvo_order::{CorrelationId, PaymentOrder};
use tokio::{net::TcpListener, signal, task::JoinHandle};
use tower::layer::util::Identity;

pub use crate::jsonrpsee_helpers::JsonRpcResponse;
use crate::{
    canister::Canister,
    error_codes::JsonRpcWarningCode,
    jsonrpsee_helpers::{error_object, JsonRpcResult, JsonRpcWarning},
    marketplace::{Marketplace, Product, ProductPayload},
    message::Message,
    registry::{AddDocumentPayload, Document, DocumentRegistry, VerifyDocumentPayload},
};

// Register the metrics into the global metrics registry.
lazy_static! {
    static ref ORDERS_RESERVED_COUNTER: IntCounter = register_int_counter!(
        "orders_reserved_count",
        "Number of orders reserved."
    )
    .unwrap();
    static ref ORDERS_COMPLETED_COUNTER: IntCounter = register_int_counter!(
        "orders_completed_count",
        "Number of orders whose payment was verified and whose effect was applied."
    )
    .unwrap();
    static ref COMPLETION_FAILURE_COUNTER: IntCounter = register_int_counter!(
        "order_completion_failure_count",
        "Number of failed order completion requests (for any reason)."
    )
    .unwrap();
    static ref TOTAL_E8S_RECEIVED: IntCounter = register_int_counter!(
        "total_received_e8s",
        "Total amount of verified payments (e8s)."
    )
    .unwrap();
}

/// Generates the `RegistryRpcServer` trait that is used to define the JSON-RPC API
/// of the document registry.
///
/// Note that because of the way the `rpc` macro works, we cannot document the generated
/// trait here. The JSON-RPC API is documented in the `pvo_canister/README.md` file.
/// Do not forget to update the documentation there if you make any changes to the JSON-RPC API.
///
/// Callers identify themselves with the `caller` parameter.
#[rpc(server, namespace = "registry")]
pub trait RegistryRpc {
    #[method(name = "create_add_document_order")]
    async fn create_add_document_order(&self, caller: Principal) -> JsonRpcResult<PaymentOrder>;

    #[method(name = "add_document")]
    async fn add_document(
        &self,
        caller: Principal,
        payload: AddDocumentPayload,
        order_id: String,
        block: u64,
        memo: CorrelationId,
    ) -> JsonRpcResult<Message>;

    #[method(name = "create_verify_document_order")]
    async fn create_verify_document_order(&self, caller: Principal)
        -> JsonRpcResult<PaymentOrder>;

    #[method(name = "verify_document")]
    async fn verify_document(
        &self,
        caller: Principal,
        payload: VerifyDocumentPayload,
        order_id: String,
        block: u64,
        memo: CorrelationId,
    ) -> JsonRpcResult<Message>;

    #[method(name = "get_user_docs")]
    fn get_user_docs(&self, user: Principal) -> JsonRpcResult<Vec<String>>;

    #[method(name = "view_document")]
    fn view_document(&self, user: Principal, document_id: String) -> JsonRpcResult<Document>;

    #[method(name = "delete_document")]
    fn delete_document(&self, caller: Principal, document_id: String) -> JsonRpcResult<Message>;

    #[method(name = "get_canister_address")]
    fn get_canister_address(&self) -> JsonRpcResult<String>;

    #[method(name = "get_address_from_principal")]
    fn get_address_from_principal(&self, principal: Principal) -> JsonRpcResult<String>;

    #[method(name = "get_add_document_fee")]
    fn get_add_document_fee(&self) -> JsonRpcResult<u64>;

    #[method(name = "get_verification_fee")]
    fn get_verification_fee(&self) -> JsonRpcResult<u64>;

    #[method(name = "get_total_docs")]
    fn get_total_docs(&self) -> JsonRpcResult<u64>;

    #[method(name = "get_pending_orders")]
    async fn get_pending_orders(&self) -> JsonRpcResult<Vec<PaymentOrder>>;

    #[method(name = "get_completed_orders")]
    async fn get_completed_orders(&self) -> JsonRpcResult<Vec<PaymentOrder>>;
}

/// Generates the `MarketplaceRpcServer` trait, the JSON-RPC API of the marketplace.
#[rpc(server, namespace = "marketplace")]
pub trait MarketplaceRpc {
    #[method(name = "add_product")]
    fn add_product(&self, caller: Principal, payload: ProductPayload) -> JsonRpcResult<Product>;

    #[method(name = "update_product")]
    fn update_product(
        &self,
        caller: Principal,
        id: u64,
        payload: ProductPayload,
    ) -> JsonRpcResult<Product>;

    #[method(name = "get_products")]
    fn get_products(&self) -> JsonRpcResult<Vec<Product>>;

    #[method(name = "get_product")]
    fn get_product(&self, id: u64) -> JsonRpcResult<Product>;

    #[method(name = "delete_product")]
    fn delete_product(&self, caller: Principal, id: u64) -> JsonRpcResult<Product>;

    #[method(name = "create_order")]
    async fn create_order(&self, caller: Principal, product_id: u64)
        -> JsonRpcResult<PaymentOrder>;

    #[method(name = "complete_purchase")]
    async fn complete_purchase(
        &self,
        caller: Principal,
        product_id: u64,
        order_id: String,
        block: u64,
        memo: CorrelationId,
    ) -> JsonRpcResult<PaymentOrder>;

    #[method(name = "get_pending_orders")]
    async fn get_pending_orders(&self) -> JsonRpcResult<Vec<PaymentOrder>>;

    #[method(name = "get_completed_orders")]
    async fn get_completed_orders(&self) -> JsonRpcResult<Vec<PaymentOrder>>;
}

struct RegistryRpcImpl<L> {
    registry: Arc<DocumentRegistry<L>>,
}

struct MarketplaceRpcImpl<L> {
    marketplace: Arc<Marketplace<L>>,
}

fn respond<T: serde::Serialize>(result: Result<T, Error>) -> JsonRpcResult<T> {
    result
        .map(JsonRpcResponse::ok)
        .map_err(|e| error_object(&e))
}

fn record_reservation(result: Result<PaymentOrder, Error>) -> JsonRpcResult<PaymentOrder> {
    if result.is_ok() {
        ORDERS_RESERVED_COUNTER.inc();
    }
    respond(result)
}

fn record_completion<T: serde::Serialize>(result: Result<T, Error>, amount: u64) -> JsonRpcResult<T> {
    match &result {
        Ok(_) => {
            ORDERS_COMPLETED_COUNTER.inc();
            TOTAL_E8S_RECEIVED.inc_by(amount);
        }
        Err(e) => {
            COMPLETION_FAILURE_COUNTER.inc();
            log::debug!("Order completion failed: {e}");
        }
    }
    respond(result)
}

/// Fees read as `0` until the registry is initialised; say so in a warning.
fn fee_response(fee: u64, initialized: bool) -> JsonRpcResult<u64> {
    if initialized {
        return Ok(JsonRpcResponse::ok(fee));
    }
    Ok(JsonRpcResponse::warn(
        fee,
        vec![JsonRpcWarning::new(
            JsonRpcWarningCode::ConfigNotSet as i32,
            "The canister is not initialised, fees are not set.".to_string(),
            None::<()>,
        )],
    ))
}

#[async_trait]
impl<L> RegistryRpcServer for RegistryRpcImpl<L>
where
    L: LedgerQuery + Send + Sync + 'static,
{
    async fn create_add_document_order(&self, caller: Principal) -> JsonRpcResult<PaymentOrder> {
        record_reservation(self.registry.create_add_document_order(&caller).await)
    }

    async fn add_document(
        &self,
        caller: Principal,
        payload: AddDocumentPayload,
        order_id: String,
        block: u64,
        memo: CorrelationId,
    ) -> JsonRpcResult<Message> {
        let fee = self.registry.get_add_document_fee();
        record_completion(
            self.registry
                .add_document(&caller, payload, order_id, block, memo)
                .await,
            fee,
        )
    }

    async fn create_verify_document_order(
        &self,
        caller: Principal,
    ) -> JsonRpcResult<PaymentOrder> {
        record_reservation(self.registry.create_verify_document_order(&caller).await)
    }

    async fn verify_document(
        &self,
        caller: Principal,
        payload: VerifyDocumentPayload,
        order_id: String,
        block: u64,
        memo: CorrelationId,
    ) -> JsonRpcResult<Message> {
        let fee = self.registry.get_verification_fee();
        record_completion(
            self.registry
                .verify_document(&caller, payload, order_id, block, memo)
                .await,
            fee,
        )
    }

    fn get_user_docs(&self, user: Principal) -> JsonRpcResult<Vec<String>> {
        Ok(JsonRpcResponse::ok(self.registry.get_user_docs(&user)))
    }

    fn view_document(&self, user: Principal, document_id: String) -> JsonRpcResult<Document> {
        respond(self.registry.view_document(&user, &document_id))
    }

    fn delete_document(&self, caller: Principal, document_id: String) -> JsonRpcResult<Message> {
        respond(self.registry.delete_document(&caller, &document_id))
    }

    fn get_canister_address(&self) -> JsonRpcResult<String> {
        Ok(JsonRpcResponse::ok(self.registry.get_canister_address()))
    }

    fn get_address_from_principal(&self, principal: Principal) -> JsonRpcResult<String> {
        Ok(JsonRpcResponse::ok(
            DocumentRegistry::<L>::get_address_from_principal(&principal),
        ))
    }

    fn get_add_document_fee(&self) -> JsonRpcResult<u64> {
        fee_response(
            self.registry.get_add_document_fee(),
            self.registry.is_initialized(),
        )
    }

    fn get_verification_fee(&self) -> JsonRpcResult<u64> {
        fee_response(
            self.registry.get_verification_fee(),
            self.registry.is_initialized(),
        )
    }

    fn get_total_docs(&self) -> JsonRpcResult<u64> {
        Ok(JsonRpcResponse::ok(self.registry.get_total_docs()))
    }

    async fn get_pending_orders(&self) -> JsonRpcResult<Vec<PaymentOrder>> {
        respond(self.registry.get_pending_orders().await)
    }

    async fn get_completed_orders(&self) -> JsonRpcResult<Vec<PaymentOrder>> {
        respond(self.registry.get_completed_orders().await)
    }
}

#[async_trait]
impl<L> MarketplaceRpcServer for MarketplaceRpcImpl<L>
where
    L: LedgerQuery + Send + Sync + 'static,
{
    fn add_product(&self, caller: Principal, payload: ProductPayload) -> JsonRpcResult<Product> {
        respond(self.marketplace.add_product(&caller, payload))
    }

    fn update_product(
        &self,
        caller: Principal,
        id: u64,
        payload: ProductPayload,
    ) -> JsonRpcResult<Product> {
        respond(self.marketplace.update_product(&caller, id, payload))
    }

    fn get_products(&self) -> JsonRpcResult<Vec<Product>> {
        Ok(JsonRpcResponse::ok(self.marketplace.get_products()))
    }

    fn get_product(&self, id: u64) -> JsonRpcResult<Product> {
        respond(self.marketplace.get_product(id))
    }

    fn delete_product(&self, caller: Principal, id: u64) -> JsonRpcResult<Product> {
        respond(self.marketplace.delete_product(&caller, id))
    }

    async fn create_order(
        &self,
        caller: Principal,
        product_id: u64,
    ) -> JsonRpcResult<PaymentOrder> {
        record_reservation(self.marketplace.create_order(&caller, product_id).await)
    }

    async fn complete_purchase(
        &self,
        caller: Principal,
        product_id: u64,
        order_id: String,
        block: u64,
        memo: CorrelationId,
    ) -> JsonRpcResult<PaymentOrder> {
        let result = self
            .marketplace
            .complete_purchase(&caller, product_id, order_id, block, memo)
            .await;
        let amount = result.as_ref().map(|order| order.fee).unwrap_or(0);
        record_completion(result, amount)
    }

    async fn get_pending_orders(&self) -> JsonRpcResult<Vec<PaymentOrder>> {
        respond(self.marketplace.get_pending_orders().await)
    }

    async fn get_completed_orders(&self) -> JsonRpcResult<Vec<PaymentOrder>> {
        respond(self.marketplace.get_completed_orders().await)
    }
}

impl<L> Canister<L>
where
    L: LedgerQuery + Send + Sync + 'static,
{
    fn into_methods(self) -> Methods {
        match self {
            Canister::Registry(registry) => RegistryRpcImpl { registry }.into_rpc().into(),
            Canister::Marketplace(marketplace) => {
                MarketplaceRpcImpl { marketplace }.into_rpc().into()
            }
        }
    }
}

pub async fn run_server<L>(
    port: u16,
    canister: Canister<L>,
    max_request_body_size: u32,
    max_response_body_size: u32,
    max_concurrent_connections: u32,
) -> Result<(JoinHandle<()>, std::net::SocketAddr)>
where
    L: LedgerQuery + Send + Sync + 'static,
{
    let variant = canister.variant();
    let (json_rpc_service, _) = create_json_rpc_service(
        canister,
        max_request_body_size,
        max_response_body_size,
        max_concurrent_connections,
    )?;

    async fn handle_anyhow_error(err: BoxError) -> (StatusCode, String) {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Something went wrong: {err}"),
        )
    }
    let router = Router::new()
        .route_service(
            "/",
            HandleError::new(post_service(json_rpc_service), handle_anyhow_error),
        )
        .layer(tower::limit::ConcurrencyLimitLayer::new(
            max_concurrent_connections as usize,
        ));

    // Create a `TcpListener` using tokio.
    let listener = TcpListener::bind(&format!("0.0.0.0:{port}")).await?;

    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_handler())
            .await
        {
            log::error!("Canister server error: {e}");
        }
    });
    info!("Serving the {variant} canister on {addr}");

    Ok((handle, addr))
}

/// Graceful shutdown handler
async fn shutdown_handler() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Signal received, starting graceful shutdown");
}

fn create_json_rpc_service<L>(
    canister: Canister<L>,
    max_request_body_size: u32,
    max_response_body_size: u32,
    max_concurrent_connections: u32,
) -> Result<(TowerService<Identity, Identity>, ServerHandle)>
where
    L: LedgerQuery + Send + Sync + 'static,
{
    let config = ServerConfig::builder()
        .max_request_body_size(max_request_body_size)
        .max_response_body_size(max_response_body_size)
        .max_connections(max_concurrent_connections)
        .http_only()
        .build();

    let service_builder = ServerBuilder::new().set_config(config).to_service_builder();
    use jsonrpsee::server::stop_channel;
    let (stop_handle, server_handle) = stop_channel();
    let handle = service_builder.build(canister.into_methods(), stop_handle);
    Ok((handle, server_handle))
}
