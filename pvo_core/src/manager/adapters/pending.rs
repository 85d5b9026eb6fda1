// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use pvo_order::{state::Pending, CorrelationId, OrderWithState};

/// Stores and removes reservations awaiting payment.
///
/// Both methods must be atomic with respect to each other: of any number of
/// concurrent [`Self::take_pending`] calls for one memo, at most one returns
/// the order.
///
/// # Example
///
/// For example code see [crate::manager::context::memory::InMemoryContext]
#[async_trait]
pub trait PendingOrderStore {
    /// Defines the user-specified error type.
    ///
    /// This error type should implement the `Error` and `Debug` traits from the standard library.
    /// Errors of this type are returned to the user when an operation fails.
    type AdapterError: std::error::Error + std::fmt::Debug + Send + Sync + 'static;

    /// Inserts `order` keyed by its memo.
    ///
    /// Returns `false` and leaves the storage untouched when an order with the
    /// same memo is already pending.
    async fn reserve(&self, order: OrderWithState<Pending>) -> Result<bool, Self::AdapterError>;

    /// Removes the pending order with `memo` and hands it to the caller.
    async fn take_pending(
        &self,
        memo: CorrelationId,
    ) -> Result<Option<OrderWithState<Pending>>, Self::AdapterError>;
}

/// Reads reservations awaiting payment.
///
/// # Example
///
/// For example code see [crate::manager::context::memory::InMemoryContext]
#[async_trait]
pub trait PendingOrderRead {
    /// Defines the user-specified error type.
    ///
    /// This error type should implement the `Error` and `Debug` traits from the standard library.
    /// Errors of this type are returned to the user when an operation fails.
    type AdapterError: std::error::Error + std::fmt::Debug + Send + Sync + 'static;

    async fn pending_order(
        &self,
        memo: CorrelationId,
    ) -> Result<Option<OrderWithState<Pending>>, Self::AdapterError>;

    /// Every pending order, in no particular order.
    async fn pending_orders(&self) -> Result<Vec<OrderWithState<Pending>>, Self::AdapterError>;
}
