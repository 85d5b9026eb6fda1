// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! In-memory context implementation for the order manager.
//!
//! [`InMemoryContext`] keeps pending orders keyed by memo and completed orders
//! in insertion order. [`InMemoryLedger`] is a ledger whose blocks live in a
//! vector, used by tests and by the local ledger mock.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, RwLock,
    },
};

use async_trait::async_trait;
use pvo_ledger::{
    AccountIdentifier, Block, GetBlocksArgs, Operation, Principal, QueryBlocksResponse, Tokens,
    Transaction, TransferBytes,
};
use pvo_order::{
    state::{Completed, Pending},
    CorrelationId, OrderWithState,
};
use thiserror::Error;

use crate::manager::adapters::*;

pub type PendingStorage = Arc<RwLock<HashMap<CorrelationId, OrderWithState<Pending>>>>;
pub type CompletedStorage = Arc<RwLock<Vec<OrderWithState<Completed>>>>;
pub type BlockStorage = Arc<RwLock<Vec<Block>>>;

/// Fee the in-memory ledger charges per transfer, in e8s
pub const TRANSFER_FEE_E8S: u64 = 10_000;

#[derive(Debug, Error)]
pub enum InMemoryError {
    #[error("something went wrong: {error}")]
    AdapterError { error: String },
}

/// How [`InMemoryContext`] treats a completed order whose payer already has one
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display, strum::EnumString, serde::Serialize, serde::Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
pub enum PersistPolicy {
    /// Keep only the latest completed order of each payer
    #[default]
    LastWriteWins,
    /// Keep every completed order
    AppendOnly,
}

#[derive(Clone)]
pub struct InMemoryContext {
    pending_storage: PendingStorage,
    completed_storage: CompletedStorage,
    policy: PersistPolicy,
}

impl InMemoryContext {
    pub fn new(policy: PersistPolicy) -> Self {
        Self::with_storages(Default::default(), Default::default(), policy)
    }

    /// Builds a context on top of storages that other components also hold.
    pub fn with_storages(
        pending_storage: PendingStorage,
        completed_storage: CompletedStorage,
        policy: PersistPolicy,
    ) -> Self {
        InMemoryContext {
            pending_storage,
            completed_storage,
            policy,
        }
    }

    pub fn policy(&self) -> PersistPolicy {
        self.policy
    }

    pub fn pending_len(&self) -> usize {
        self.pending_storage.read().unwrap().len()
    }
}

#[async_trait]
impl PendingOrderStore for InMemoryContext {
    type AdapterError = InMemoryError;

    async fn reserve(&self, order: OrderWithState<Pending>) -> Result<bool, Self::AdapterError> {
        let mut pending_storage = self.pending_storage.write().unwrap();
        if pending_storage.contains_key(&order.memo()) {
            return Ok(false);
        }
        pending_storage.insert(order.memo(), order);
        Ok(true)
    }

    async fn take_pending(
        &self,
        memo: CorrelationId,
    ) -> Result<Option<OrderWithState<Pending>>, Self::AdapterError> {
        Ok(self.pending_storage.write().unwrap().remove(&memo))
    }
}

#[async_trait]
impl PendingOrderRead for InMemoryContext {
    type AdapterError = InMemoryError;

    async fn pending_order(
        &self,
        memo: CorrelationId,
    ) -> Result<Option<OrderWithState<Pending>>, Self::AdapterError> {
        Ok(self.pending_storage.read().unwrap().get(&memo).cloned())
    }

    async fn pending_orders(&self) -> Result<Vec<OrderWithState<Pending>>, Self::AdapterError> {
        Ok(self
            .pending_storage
            .read()
            .unwrap()
            .values()
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CompletedOrderStore for InMemoryContext {
    type AdapterError = InMemoryError;

    async fn persist(&self, order: OrderWithState<Completed>) -> Result<(), Self::AdapterError> {
        let mut completed_storage = self.completed_storage.write().unwrap();
        if self.policy == PersistPolicy::LastWriteWins {
            completed_storage.retain(|existing| existing.payer() != order.payer());
        }
        completed_storage.push(order);
        Ok(())
    }
}

#[async_trait]
impl CompletedOrderRead for InMemoryContext {
    type AdapterError = InMemoryError;

    async fn completed_orders(
        &self,
    ) -> Result<Vec<OrderWithState<Completed>>, Self::AdapterError> {
        Ok(self.completed_storage.read().unwrap().clone())
    }

    async fn completed_orders_of(
        &self,
        payer: &Principal,
    ) -> Result<Vec<OrderWithState<Completed>>, Self::AdapterError> {
        Ok(self
            .completed_storage
            .read()
            .unwrap()
            .iter()
            .filter(|order| order.payer() == payer)
            .cloned()
            .collect())
    }
}

/// Ledger kept in memory. Block `i` is `blocks[i]`.
#[derive(Clone, Default)]
pub struct InMemoryLedger {
    blocks: BlockStorage,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `block` and returns its index.
    pub fn push_block(&self, block: Block) -> u64 {
        let mut blocks = self.blocks.write().unwrap();
        blocks.push(block);
        (blocks.len() - 1) as u64
    }

    /// Records a transfer of `amount` e8s from `from` to `to` and returns the block index.
    pub fn transfer(
        &self,
        from: &AccountIdentifier,
        to: &AccountIdentifier,
        amount: u64,
        memo: u64,
        time_ns: u64,
    ) -> u64 {
        self.push_block(Block {
            parent_hash: None,
            transaction: Transaction {
                memo,
                operation: Some(Operation::Transfer {
                    from: TransferBytes::from(from),
                    to: TransferBytes::from(to),
                    amount: Tokens::from_e8s(amount),
                    fee: Tokens::from_e8s(TRANSFER_FEE_E8S),
                }),
                created_at_time: time_ns,
            },
            timestamp: time_ns,
        })
    }

    pub fn chain_length(&self) -> u64 {
        self.blocks.read().unwrap().len() as u64
    }

    /// While set, every query fails as if the ledger could not be reached.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl LedgerQuery for InMemoryLedger {
    type AdapterError = InMemoryError;

    async fn query_blocks(
        &self,
        args: GetBlocksArgs,
    ) -> Result<QueryBlocksResponse, Self::AdapterError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(InMemoryError::AdapterError {
                error: "ledger unavailable".to_owned(),
            });
        }
        let blocks = self.blocks.read().unwrap();
        let chain_length = blocks.len() as u64;
        let start = args.start.min(chain_length);
        let end = args.start.saturating_add(args.length).min(chain_length);
        Ok(QueryBlocksResponse {
            chain_length,
            first_block_index: start,
            blocks: blocks[start as usize..end as usize].to_vec(),
        })
    }
}
