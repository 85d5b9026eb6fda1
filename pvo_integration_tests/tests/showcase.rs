// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

// These tests run a document registry canister against a mock ledger, both over JSON-RPC.
// Users reserve an order on the canister, pay it on the ledger with the order memo and
// complete it by submitting the block index of their transfer.
use std::{net::SocketAddr, sync::Arc};

use anyhow::Result;
use futures_util::future::join_all;
use jsonrpsee::{
    core::{client::ClientT, ClientError},
    http_client::{HttpClient, HttpClientBuilder},
    rpc_params,
    server::ServerHandle,
};
use pvo_canister::{
    canister::Canister,
    jsonrpsee_helpers::JsonRpcResponse,
    ledger_client::LedgerClient,
    message::Message,
    registry::{AddDocumentPayload, Document, DocumentRegistry, InitPayload, VerifyDocumentPayload},
    server,
};
use pvo_core::{config::ReservationConfig, manager::context::memory::InMemoryLedger};
use pvo_ledger::{AccountIdentifier, Principal};
use pvo_order::PaymentOrder;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rstest::*;
use tokio::task::JoinHandle;

use crate::ledger_mock;

#[fixture]
fn fees() -> InitPayload {
    InitPayload {
        add_doc_fee: 1000,
        verify_doc_fee: 100,
    }
}

#[fixture]
fn canister_id() -> Principal {
    // rrkah-fqaaa-aaaaa-aaaaq-cai
    Principal::from_slice(&[0, 0, 0, 0, 0, 0, 0, 1, 1, 1]).unwrap()
}

// Number of users registering a document at the same time
#[fixture]
fn num_users() -> usize {
    16
}

struct Deployment {
    canister: HttpClient,
    ledger: HttpClient,
    canister_id: Principal,
    canister_handle: JoinHandle<()>,
    ledger_handle: ServerHandle,
}

impl Deployment {
    fn stop(self) -> Result<()> {
        self.canister_handle.abort();
        self.ledger_handle.stop()?;
        Ok(())
    }

    async fn pay(&self, payer: &Principal, order: &PaymentOrder, amount: u64) -> Result<u64> {
        Ok(self
            .ledger
            .request(
                "transfer",
                rpc_params!(payer, &self.canister_id, amount, order.memo.memo()),
            )
            .await?)
    }

    async fn reserve(&self, method: &str, caller: &Principal) -> Result<PaymentOrder> {
        let order: JsonRpcResponse<PaymentOrder> =
            self.canister.request(method, rpc_params!(caller)).await?;
        Ok(order.data)
    }

    async fn add_document(
        &self,
        caller: &Principal,
        payload: &AddDocumentPayload,
        order: &PaymentOrder,
        block: u64,
    ) -> Result<Message, ClientError> {
        let message: JsonRpcResponse<Message> = self
            .canister
            .request(
                "registry_add_document",
                rpc_params!(caller, payload, &order.order_id, block, order.memo),
            )
            .await?;
        Ok(message.data)
    }

    async fn register(&self, caller: &Principal, payload: &AddDocumentPayload) -> Result<Message> {
        let order = self
            .reserve("registry_create_add_document_order", caller)
            .await?;
        let block = self.pay(caller, &order, order.fee).await?;
        Ok(self.add_document(caller, payload, &order, block).await?)
    }
}

async fn deploy(canister_id: Principal, fees: InitPayload) -> Result<Deployment> {
    let (ledger_handle, ledger_addr) = ledger_mock::run_server(0, InMemoryLedger::new()).await?;
    let ledger_url = url(ledger_addr);

    let registry = Arc::new(DocumentRegistry::new(
        &ReservationConfig::new(canister_id.clone()),
        LedgerClient::new(&ledger_url)?,
    ));
    registry.init(fees)?;
    let (canister_handle, canister_addr) = server::run_server(
        0,
        Canister::Registry(registry),
        100 * 1024,
        100 * 1024,
        32,
    )
    .await?;

    Ok(Deployment {
        canister: HttpClientBuilder::default().build(url(canister_addr))?,
        ledger: HttpClientBuilder::default().build(ledger_url)?,
        canister_id,
        canister_handle,
        ledger_handle,
    })
}

fn url(addr: SocketAddr) -> String {
    format!("http://127.0.0.1:{}", addr.port())
}

fn call_error_code(err: ClientError) -> i32 {
    match err {
        ClientError::Call(err) => err.code(),
        other => panic!("unexpected client error: {other}"),
    }
}

#[rstest]
#[tokio::test]
async fn register_and_verify_a_document(
    canister_id: Principal,
    fees: InitPayload,
) -> Result<()> {
    let deployment = deploy(canister_id, fees).await?;
    let alice = Principal::from_slice(&[0xa1, 0x1c, 0xe0])?;
    let payload = AddDocumentPayload {
        name: "contract.pdf".to_string(),
        hash: "9f86d081884c7d659a2feaa0c55ad015".to_string(),
    };

    let order = deployment
        .reserve("registry_create_add_document_order", &alice)
        .await?;
    assert_eq!(order.fee, 1000);

    // A payment without the order memo is not accepted.
    let wrong_memo = PaymentOrder {
        memo: pvo_order::CorrelationId(order.memo.0 ^ 1),
        ..order.clone()
    };
    let block = deployment.pay(&alice, &wrong_memo, 1000).await?;
    let err = deployment
        .add_document(&alice, &payload, &order, block)
        .await
        .unwrap_err();
    assert_eq!(call_error_code(err), -32001);

    let block = deployment.pay(&alice, &order, 1000).await?;
    let message = deployment
        .add_document(&alice, &payload, &order, block)
        .await?;
    assert_eq!(message, Message::Success("doc with id 0 added".to_string()));

    // Replaying the same payment finds no pending order.
    let err = deployment
        .add_document(&alice, &payload, &order, block)
        .await
        .unwrap_err();
    assert_eq!(call_error_code(err), -32001);

    let docs: JsonRpcResponse<Vec<String>> = deployment
        .canister
        .request("registry_get_user_docs", rpc_params!(&alice))
        .await?;
    assert_eq!(docs.data, vec!["0".to_string()]);
    let document: JsonRpcResponse<Document> = deployment
        .canister
        .request("registry_view_document", rpc_params!(&alice, "0"))
        .await?;
    assert_eq!(document.data.name, "contract.pdf");
    assert_eq!(document.data.hash, payload.hash.as_bytes());

    // Anyone can pay to check that a hash is registered.
    let bob = Principal::from_slice(&[0xb0, 0xb0])?;
    let order = deployment
        .reserve("registry_create_verify_document_order", &bob)
        .await?;
    assert_eq!(order.fee, 100);
    let block = deployment.pay(&bob, &order, order.fee).await?;
    let message: JsonRpcResponse<Message> = deployment
        .canister
        .request(
            "registry_verify_document",
            rpc_params!(
                &bob,
                VerifyDocumentPayload {
                    hash: payload.hash.clone()
                },
                &order.order_id,
                block,
                order.memo
            ),
        )
        .await?;
    assert!(matches!(message.data, Message::Exists(text) if text.starts_with("document found with name contract.pdf")));

    let completed: JsonRpcResponse<Vec<PaymentOrder>> = deployment
        .canister
        .request("registry_get_completed_orders", rpc_params!())
        .await?;
    assert_eq!(completed.data.len(), 2);

    deployment.stop()
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_users_register_their_documents(
    canister_id: Principal,
    fees: InitPayload,
    num_users: usize,
) -> Result<()> {
    let deployment = deploy(canister_id, fees).await?;

    let mut rng = StdRng::seed_from_u64(0x5eed);
    let users: Vec<(Principal, AddDocumentPayload)> = (0..num_users)
        .map(|i| {
            let principal = Principal::from_slice(&rng.random::<[u8; 10]>()).unwrap();
            let payload = AddDocumentPayload {
                name: format!("document-{i}"),
                hash: format!("{:032x}", rng.random::<u128>()),
            };
            (principal, payload)
        })
        .collect();

    let results = join_all(
        users
            .iter()
            .map(|(principal, payload)| deployment.register(principal, payload)),
    )
    .await;
    for result in results {
        assert!(matches!(result?, Message::Success(_)));
    }

    let total: JsonRpcResponse<u64> = deployment
        .canister
        .request("registry_get_total_docs", rpc_params!())
        .await?;
    assert_eq!(total.data, num_users as u64);
    let pending: JsonRpcResponse<Vec<PaymentOrder>> = deployment
        .canister
        .request("registry_get_pending_orders", rpc_params!())
        .await?;
    assert!(pending.data.is_empty());

    deployment.stop()
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn one_payment_completes_one_order(canister_id: Principal, fees: InitPayload) -> Result<()> {
    let deployment = deploy(canister_id, fees).await?;
    let carol = Principal::from_slice(&[0xca, 0x50, 0x1])?;
    let payload = AddDocumentPayload {
        name: "will.txt".to_string(),
        hash: "e3b0c44298fc1c149afbf4c8996fb924".to_string(),
    };

    let order = deployment
        .reserve("registry_create_add_document_order", &carol)
        .await?;
    let block = deployment.pay(&carol, &order, order.fee).await?;

    let results = join_all(
        (0..8).map(|_| deployment.add_document(&carol, &payload, &order, block)),
    )
    .await;
    assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);

    let total: JsonRpcResponse<u64> = deployment
        .canister
        .request("registry_get_total_docs", rpc_params!())
        .await?;
    assert_eq!(total.data, 1);

    // The ledger recorded the transfer to the canister account.
    let address: JsonRpcResponse<String> = deployment
        .canister
        .request("registry_get_canister_address", rpc_params!())
        .await?;
    assert_eq!(
        address.data,
        AccountIdentifier::new(&deployment.canister_id, None).to_hex()
    );

    deployment.stop()
}
