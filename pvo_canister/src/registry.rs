// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Document registry
//!
//! A content-addressed registry where adding a document and checking whether
//! a document is registered both cost a fee. Each paid action follows the
//! same two steps: reserve an order (`create_*_order`), pay it on the ledger
//! with the order memo, then submit the payload together with the block
//! index and the memo.
//!
//! A payer keeps only its latest completed order.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        PoisonError, RwLock,
    },
};

use async_trait::async_trait;
use pvo_core::{
    config::{InitCell, ReservationConfig},
    manager::{
        adapters::{Fulfillment, LedgerQuery},
        context::memory::{InMemoryContext, PersistPolicy},
        Manager, PaymentProof,
    },
    Error,
};
use pvo_ledger::{AccountIdentifier, Principal};
use pvo_order::{CorrelationId, OrderError, OrdersSnapshot, PaymentOrder};
use serde::{Deserialize, Serialize};

use crate::message::Message;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub name: String,
    /// UTF-8 bytes of the submitted content hash
    #[serde(with = "hex::serde")]
    pub hash: Vec<u8>,
    /// Unix Epoch timestamp in nanoseconds
    pub created_at: u64,
    pub owner: Principal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitPayload {
    pub add_doc_fee: u64,
    pub verify_doc_fee: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddDocumentPayload {
    pub name: String,
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyDocumentPayload {
    pub hash: String,
}

/// Everything the registry carries across an upgrade. Fees come from the
/// init payload again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryState {
    pub orders: OrdersSnapshot,
    /// Registered documents in id order
    pub documents: Vec<Document>,
    pub next_doc_id: u64,
}

#[derive(Default)]
struct Documents {
    id_to_hash: HashMap<String, Vec<u8>>,
    hash_to_doc: HashMap<Vec<u8>, Document>,
    user_docs: HashMap<Principal, Vec<String>>,
}

impl Documents {
    fn contains_hash(&self, hash: &[u8]) -> bool {
        self.hash_to_doc.contains_key(hash)
    }

    fn insert(&mut self, document: Document) {
        self.id_to_hash
            .insert(document.id.clone(), document.hash.clone());
        self.user_docs
            .entry(document.owner.clone())
            .or_default()
            .push(document.id.clone());
        self.hash_to_doc.insert(document.hash.clone(), document);
    }

    fn owns(&self, user: &Principal, document_id: &str) -> bool {
        self.user_docs
            .get(user)
            .is_some_and(|ids| ids.iter().any(|id| id == document_id))
    }
}

/// Kinds of paid registry orders. An order only pays for its own kind.
const ADD_DOCUMENT: &str = "add_document";
const VERIFY_DOCUMENT: &str = "verify_document";

fn no_access(document_id: &str) -> Error {
    OrderError::NotFound(format!(
        "you do not have access to document with id={document_id}"
    ))
    .into()
}

fn hash_bytes(hash: &str) -> Result<Vec<u8>, OrderError> {
    if hash.is_empty() {
        return Err(OrderError::InvalidPayload(
            "document hash must not be empty".to_string(),
        ));
    }
    Ok(hash.as_bytes().to_vec())
}

struct AddDocument<'a> {
    documents: &'a RwLock<Documents>,
    next_doc_id: &'a AtomicU64,
    created_at: u64,
}

#[async_trait]
impl Fulfillment<AddDocumentPayload> for AddDocument<'_> {
    type Output = Document;

    async fn precheck(
        &self,
        _payer: &Principal,
        payload: &AddDocumentPayload,
    ) -> Result<(), OrderError> {
        let hash = hash_bytes(&payload.hash)?;
        if self
            .documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_hash(&hash)
        {
            return Err(OrderError::Exists(
                "document hash exists on registry".to_string(),
            ));
        }
        Ok(())
    }

    async fn apply(
        &self,
        payer: &Principal,
        payload: AddDocumentPayload,
    ) -> Result<Document, OrderError> {
        let hash = hash_bytes(&payload.hash)?;
        let mut documents = self
            .documents
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if documents.contains_hash(&hash) {
            return Err(OrderError::Exists(
                "document hash exists on registry".to_string(),
            ));
        }
        let document = Document {
            id: self.next_doc_id.fetch_add(1, Ordering::SeqCst).to_string(),
            name: payload.name,
            hash,
            created_at: self.created_at,
            owner: payer.clone(),
        };
        documents.insert(document.clone());
        Ok(document)
    }
}

struct VerifyDocument<'a> {
    documents: &'a RwLock<Documents>,
}

#[async_trait]
impl Fulfillment<VerifyDocumentPayload> for VerifyDocument<'_> {
    type Output = Option<Document>;

    async fn precheck(
        &self,
        _payer: &Principal,
        payload: &VerifyDocumentPayload,
    ) -> Result<(), OrderError> {
        hash_bytes(&payload.hash).map(|_| ())
    }

    async fn apply(
        &self,
        _payer: &Principal,
        payload: VerifyDocumentPayload,
    ) -> Result<Option<Document>, OrderError> {
        Ok(self
            .documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .hash_to_doc
            .get(payload.hash.as_bytes())
            .cloned())
    }
}

pub struct DocumentRegistry<L> {
    manager: Manager<InMemoryContext, L>,
    documents: RwLock<Documents>,
    add_doc_fee: InitCell<u64>,
    verify_doc_fee: InitCell<u64>,
    next_doc_id: InitCell<AtomicU64>,
}

impl<L> DocumentRegistry<L> {
    /// Creates an uninitialised registry. Paid operations fail with
    /// [`Error::ConfigNotSet`] until [`Self::init`] or
    /// [`Self::post_upgrade`] is called.
    pub fn new(config: &ReservationConfig, ledger: L) -> Self {
        Self::with_manager(Manager::new(
            config,
            InMemoryContext::new(PersistPolicy::LastWriteWins),
            ledger,
        ))
    }

    pub fn with_manager(manager: Manager<InMemoryContext, L>) -> Self {
        Self {
            manager,
            documents: RwLock::default(),
            add_doc_fee: InitCell::new("add document fee"),
            verify_doc_fee: InitCell::new("verify document fee"),
            next_doc_id: InitCell::new("next doc id"),
        }
    }

    pub fn init(&self, payload: InitPayload) -> Result<(), Error> {
        self.add_doc_fee.init(payload.add_doc_fee)?;
        self.verify_doc_fee.init(payload.verify_doc_fee)?;
        self.next_doc_id.init(AtomicU64::new(0))?;
        log::info!(
            "Registry initialised: add_doc_fee={} verify_doc_fee={}",
            payload.add_doc_fee,
            payload.verify_doc_fee
        );
        Ok(())
    }

    pub fn manager(&self) -> &Manager<InMemoryContext, L> {
        &self.manager
    }

    pub fn is_initialized(&self) -> bool {
        self.add_doc_fee.is_initialized() && self.verify_doc_fee.is_initialized()
    }

    /// Ids of the documents `user` added, oldest first.
    pub fn get_user_docs(&self, user: &Principal) -> Vec<String> {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .user_docs
            .get(user)
            .cloned()
            .unwrap_or_default()
    }

    pub fn view_document(&self, user: &Principal, document_id: &str) -> Result<Document, Error> {
        let documents = self
            .documents
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        if !documents.owns(user, document_id) {
            return Err(no_access(document_id));
        }
        let hash = documents.id_to_hash.get(document_id).ok_or_else(|| {
            OrderError::NotFound(format!("document hash with id={document_id} not found"))
        })?;
        documents.hash_to_doc.get(hash).cloned().ok_or_else(|| {
            OrderError::NotFound(format!("document with id={document_id} not found")).into()
        })
    }

    /// Removes a document the caller added. The total document count is not
    /// decremented.
    pub fn delete_document(&self, caller: &Principal, document_id: &str) -> Result<Message, Error> {
        let mut documents = self
            .documents
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if !documents.owns(caller, document_id) {
            return Err(no_access(document_id));
        }
        if let Some(ids) = documents.user_docs.get_mut(caller) {
            ids.retain(|id| id != document_id);
        }
        let hash = documents.id_to_hash.remove(document_id).ok_or_else(|| {
            OrderError::NotFound(format!(
                "error in deleting doc hash with id={document_id}"
            ))
        })?;
        documents.hash_to_doc.remove(&hash).ok_or_else(|| {
            OrderError::NotFound(format!(
                "error in deleting doc data with id={document_id}"
            ))
        })?;
        log::info!("Document {document_id} removed by {caller}");
        Ok(Message::Success("document removed successfully".to_string()))
    }

    /// Hex account address payments must be sent to.
    pub fn get_canister_address(&self) -> String {
        self.manager.verifier().canister_account().to_hex()
    }

    pub fn get_address_from_principal(principal: &Principal) -> String {
        AccountIdentifier::new(principal, None).to_hex()
    }

    /// Add document fee, `0` while unset.
    pub fn get_add_document_fee(&self) -> u64 {
        self.add_doc_fee.get().map(|fee| *fee).unwrap_or(0)
    }

    /// Verification fee, `0` while unset.
    pub fn get_verification_fee(&self) -> u64 {
        self.verify_doc_fee.get().map(|fee| *fee).unwrap_or(0)
    }

    /// Number of ids handed out so far. Deleted documents still count.
    pub fn get_total_docs(&self) -> u64 {
        self.next_doc_id
            .get()
            .map(|next| next.load(Ordering::SeqCst))
            .unwrap_or(0)
    }
}

impl<L> DocumentRegistry<L>
where
    L: LedgerQuery + Send + Sync,
{
    pub async fn create_add_document_order(&self, caller: &Principal) -> Result<PaymentOrder, Error> {
        let fee = *self.add_doc_fee.get()?;
        let order = self
            .manager
            .create_reservation_for(caller, fee, ADD_DOCUMENT)
            .await?;
        Ok(order.to_payment_order())
    }

    pub async fn create_verify_document_order(
        &self,
        caller: &Principal,
    ) -> Result<PaymentOrder, Error> {
        let fee = *self.verify_doc_fee.get()?;
        let order = self
            .manager
            .create_reservation_for(caller, fee, VERIFY_DOCUMENT)
            .await?;
        Ok(order.to_payment_order())
    }

    /// Registers `payload` once the add document order `memo` is paid at `block`.
    pub async fn add_document(
        &self,
        caller: &Principal,
        payload: AddDocumentPayload,
        order_id: String,
        block: u64,
        memo: CorrelationId,
    ) -> Result<Message, Error> {
        self.add_doc_fee.get()?;
        let next_doc_id = self.next_doc_id.get()?;
        let proof = PaymentProof {
            order_id,
            block_index: block,
            memo,
        };
        let fulfillment = AddDocument {
            documents: &self.documents,
            next_doc_id,
            created_at: self.manager.now_ns(),
        };
        let document = self
            .manager
            .complete_reserved_order(caller, &proof, ADD_DOCUMENT, &fulfillment, payload)
            .await?
            .output;
        log::info!("Document {} added by {caller}", document.id);
        Ok(Message::Success(format!("doc with id {} added", document.id)))
    }

    /// Looks `payload.hash` up once the verification order `memo` is paid at
    /// `block`. The order is consumed whether or not the document is found.
    pub async fn verify_document(
        &self,
        caller: &Principal,
        payload: VerifyDocumentPayload,
        order_id: String,
        block: u64,
        memo: CorrelationId,
    ) -> Result<Message, Error> {
        self.verify_doc_fee.get()?;
        let proof = PaymentProof {
            order_id,
            block_index: block,
            memo,
        };
        let fulfillment = VerifyDocument {
            documents: &self.documents,
        };
        match self
            .manager
            .complete_reserved_order(caller, &proof, VERIFY_DOCUMENT, &fulfillment, payload)
            .await?
            .output
        {
            Some(document) => Ok(Message::Exists(format!(
                "document found with name {} created at {}",
                document.name, document.created_at
            ))),
            None => Err(OrderError::NotFound("document not on registry".to_string()).into()),
        }
    }

    pub async fn get_pending_orders(&self) -> Result<Vec<PaymentOrder>, Error> {
        Ok(self
            .manager
            .pending_orders()
            .await?
            .iter()
            .map(|order| order.to_payment_order())
            .collect())
    }

    pub async fn get_completed_orders(&self) -> Result<Vec<PaymentOrder>, Error> {
        Ok(self
            .manager
            .completed_orders()
            .await?
            .iter()
            .map(|order| order.to_payment_order())
            .collect())
    }

    pub async fn pre_upgrade(&self) -> Result<RegistryState, Error> {
        let orders = self.manager.snapshot().await?;
        let mut documents: Vec<Document> = self
            .documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .hash_to_doc
            .values()
            .cloned()
            .collect();
        documents.sort_by_key(|document| document.id.parse::<u64>().unwrap_or(u64::MAX));
        Ok(RegistryState {
            orders,
            documents,
            next_doc_id: self.get_total_docs(),
        })
    }

    /// Initialises the registry from `payload` and a state saved by
    /// [`Self::pre_upgrade`].
    pub async fn post_upgrade(&self, payload: InitPayload, state: RegistryState) -> Result<(), Error> {
        self.add_doc_fee.init(payload.add_doc_fee)?;
        self.verify_doc_fee.init(payload.verify_doc_fee)?;
        self.next_doc_id.init(AtomicU64::new(state.next_doc_id))?;
        {
            let mut documents = self
                .documents
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            for document in state.documents {
                documents.insert(document);
            }
        }
        self.manager.restore(state.orders).await?;
        log::info!("Registry restored with {} documents", self.get_total_docs());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pvo_core::{host::ManualClock, manager::context::memory::InMemoryLedger, ErrorKind};
    use rstest::*;

    use super::*;

    const ADD_FEE: u64 = 1000;
    const VERIFY_FEE: u64 = 300;

    #[fixture]
    fn canister() -> Principal {
        Principal::from_slice(&[0, 0, 0, 0, 0, 0, 0, 9, 1, 1]).unwrap()
    }

    #[fixture]
    fn alice() -> Principal {
        Principal::from_slice(&[0xa1]).unwrap()
    }

    #[fixture]
    fn bob() -> Principal {
        Principal::from_slice(&[0xb0]).unwrap()
    }

    #[fixture]
    fn ledger() -> InMemoryLedger {
        InMemoryLedger::new()
    }

    #[fixture]
    fn registry(canister: Principal, ledger: InMemoryLedger) -> DocumentRegistry<InMemoryLedger> {
        let manager = Manager::new(
            &ReservationConfig::new(canister),
            InMemoryContext::new(PersistPolicy::LastWriteWins),
            ledger,
        )
        .with_clock(Arc::new(ManualClock::new(1_000)));
        let registry = DocumentRegistry::with_manager(manager);
        registry
            .init(InitPayload {
                add_doc_fee: ADD_FEE,
                verify_doc_fee: VERIFY_FEE,
            })
            .unwrap();
        registry
    }

    fn pay(
        registry: &DocumentRegistry<InMemoryLedger>,
        payer: &Principal,
        order: &PaymentOrder,
    ) -> u64 {
        registry.manager().ledger().transfer(
            &AccountIdentifier::new(payer, None),
            registry.manager().verifier().canister_account(),
            order.fee,
            order.memo.memo(),
            0,
        )
    }

    async fn add(
        registry: &DocumentRegistry<InMemoryLedger>,
        payer: &Principal,
        name: &str,
        hash: &str,
    ) -> Result<Message, Error> {
        let order = registry.create_add_document_order(payer).await.unwrap();
        let block = pay(registry, payer, &order);
        registry
            .add_document(
                payer,
                AddDocumentPayload {
                    name: name.to_string(),
                    hash: hash.to_string(),
                },
                order.order_id,
                block,
                order.memo,
            )
            .await
    }

    #[rstest]
    #[tokio::test]
    async fn order_pays_only_for_its_kind(canister: Principal, alice: Principal) {
        let registry = DocumentRegistry::new(&ReservationConfig::new(canister), InMemoryLedger::new());
        registry
            .init(InitPayload {
                add_doc_fee: ADD_FEE,
                verify_doc_fee: ADD_FEE,
            })
            .unwrap();

        let order = registry.create_verify_document_order(&alice).await.unwrap();
        let block = pay(&registry, &alice, &order);
        let err = registry
            .add_document(
                &alice,
                AddDocumentPayload {
                    name: "deed.pdf".to_string(),
                    hash: "a1b2".to_string(),
                },
                order.order_id.clone(),
                block,
                order.memo,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PendingOrderMismatch { .. }));
        assert_eq!(registry.get_total_docs(), 0);

        // the payment still serves the verification it was reserved for
        let err = registry
            .verify_document(
                &alice,
                VerifyDocumentPayload {
                    hash: "a1b2".to_string(),
                },
                order.order_id,
                block,
                order.memo,
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "document not on registry");
        assert!(registry.get_pending_orders().await.unwrap().is_empty());
    }
    #[rstest]
    #[tokio::test]
    async fn uninitialised_registry_fails_fast(canister: Principal, ledger: InMemoryLedger, alice: Principal) {
        let registry = DocumentRegistry::new(&ReservationConfig::new(canister), ledger);
        let err = registry.create_add_document_order(&alice).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "add document fee not set");
        assert_eq!(registry.get_add_document_fee(), 0);
        assert_eq!(registry.get_verification_fee(), 0);
        assert_eq!(registry.get_total_docs(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn paid_document_is_registered(
        registry: DocumentRegistry<InMemoryLedger>,
        alice: Principal,
    ) {
        let message = add(&registry, &alice, "deed.pdf", "a1b2").await.unwrap();
        assert_eq!(message, Message::Success("doc with id 0 added".to_string()));
        assert_eq!(registry.get_total_docs(), 1);
        assert_eq!(registry.get_user_docs(&alice), vec!["0".to_string()]);

        let document = registry.view_document(&alice, "0").unwrap();
        assert_eq!(document.name, "deed.pdf");
        assert_eq!(document.hash, b"a1b2".to_vec());
        assert_eq!(&document.owner, &alice);

        assert!(registry.get_pending_orders().await.unwrap().is_empty());
        let completed = registry.get_completed_orders().await.unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(&completed[0].payer, &alice);
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_hash_keeps_order_pending(
        registry: DocumentRegistry<InMemoryLedger>,
        alice: Principal,
        bob: Principal,
    ) {
        add(&registry, &alice, "deed.pdf", "a1b2").await.unwrap();

        let err = add(&registry, &bob, "copy.pdf", "a1b2").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Exists);
        assert_eq!(err.to_string(), "document hash exists on registry");
        assert_eq!(registry.get_pending_orders().await.unwrap().len(), 1);
        assert_eq!(registry.get_total_docs(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn completed_orders_keep_latest_per_payer(
        registry: DocumentRegistry<InMemoryLedger>,
        alice: Principal,
    ) {
        add(&registry, &alice, "one.pdf", "h1").await.unwrap();
        add(&registry, &alice, "two.pdf", "h2").await.unwrap();
        assert_eq!(registry.get_completed_orders().await.unwrap().len(), 1);
        assert_eq!(registry.get_user_docs(&alice).len(), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn verification_consumes_the_order(
        registry: DocumentRegistry<InMemoryLedger>,
        alice: Principal,
        bob: Principal,
    ) {
        add(&registry, &alice, "deed.pdf", "a1b2").await.unwrap();

        for (hash, found) in [("a1b2", true), ("ffff", false)] {
            let order = registry.create_verify_document_order(&bob).await.unwrap();
            assert_eq!(order.fee, VERIFY_FEE);
            let block = pay(&registry, &bob, &order);
            let result = registry
                .verify_document(
                    &bob,
                    VerifyDocumentPayload {
                        hash: hash.to_string(),
                    },
                    order.order_id,
                    block,
                    order.memo,
                )
                .await;
            if found {
                assert_eq!(
                    result.unwrap(),
                    Message::Exists("document found with name deed.pdf created at 1001".to_string())
                );
            } else {
                assert_eq!(result.unwrap_err().to_string(), "document not on registry");
            }
            assert!(registry.get_pending_orders().await.unwrap().is_empty());
        }
    }

    #[rstest]
    #[tokio::test]
    async fn only_owner_views_and_deletes(
        registry: DocumentRegistry<InMemoryLedger>,
        alice: Principal,
        bob: Principal,
    ) {
        add(&registry, &alice, "deed.pdf", "a1b2").await.unwrap();

        let err = registry.view_document(&bob, "0").unwrap_err();
        assert_eq!(err.to_string(), "you do not have access to document with id=0");
        assert!(registry.delete_document(&bob, "0").is_err());

        assert_eq!(
            registry.delete_document(&alice, "0").unwrap(),
            Message::Success("document removed successfully".to_string())
        );
        assert!(registry.get_user_docs(&alice).is_empty());
        assert!(registry.view_document(&alice, "0").is_err());
        assert_eq!(registry.get_total_docs(), 1);

        // the hash is free again
        add(&registry, &bob, "deed.pdf", "a1b2").await.unwrap();
        assert_eq!(registry.get_user_docs(&bob), vec!["1".to_string()]);
    }

    #[rstest]
    #[tokio::test]
    async fn empty_hash_is_rejected_before_payment_is_consumed(
        registry: DocumentRegistry<InMemoryLedger>,
        alice: Principal,
    ) {
        let err = add(&registry, &alice, "blank.pdf", "").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPayload);
        assert_eq!(registry.get_pending_orders().await.unwrap().len(), 1);
    }

    #[rstest]
    fn addresses_are_hex_account_ids(registry: DocumentRegistry<InMemoryLedger>, canister: Principal) {
        assert_eq!(
            registry.get_canister_address(),
            DocumentRegistry::<InMemoryLedger>::get_address_from_principal(&canister)
        );
        assert_eq!(
            DocumentRegistry::<InMemoryLedger>::get_address_from_principal(&Principal::anonymous()),
            "1c7a48ba6a562aa9eaa2481a9049cdf0433b9738c992d698c31d8abf89cadc79"
        );
    }

    #[rstest]
    #[tokio::test]
    async fn state_survives_upgrade(
        registry: DocumentRegistry<InMemoryLedger>,
        canister: Principal,
        alice: Principal,
        bob: Principal,
    ) {
        add(&registry, &alice, "deed.pdf", "a1b2").await.unwrap();
        add(&registry, &alice, "lease.pdf", "c3d4").await.unwrap();
        registry.delete_document(&alice, "0").unwrap();
        registry.create_verify_document_order(&bob).await.unwrap();

        let state = registry.pre_upgrade().await.unwrap();
        let json = serde_json::to_string(&state).unwrap();

        let upgraded = DocumentRegistry::new(
            &ReservationConfig::new(canister),
            registry.manager().ledger().clone(),
        );
        upgraded
            .post_upgrade(
                InitPayload {
                    add_doc_fee: ADD_FEE,
                    verify_doc_fee: VERIFY_FEE,
                },
                serde_json::from_str(&json).unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(upgraded.get_total_docs(), 2);
        assert_eq!(upgraded.get_user_docs(&alice), vec!["1".to_string()]);
        assert_eq!(upgraded.view_document(&alice, "1").unwrap().name, "lease.pdf");
        assert_eq!(upgraded.get_pending_orders().await.unwrap().len(), 1);
        assert_eq!(upgraded.get_completed_orders().await.unwrap().len(), 1);
    }
}
