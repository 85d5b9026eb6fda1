// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use pvo_ledger::Principal;
use pvo_order::{state::Completed, OrderWithState};

/// Records orders whose payment was verified.
///
/// Whether a payer keeps one completed order or all of them is up to the
/// implementation. See [crate::manager::context::memory::PersistPolicy].
#[async_trait]
pub trait CompletedOrderStore {
    /// Defines the user-specified error type.
    ///
    /// This error type should implement the `Error` and `Debug` traits from the standard library.
    /// Errors of this type are returned to the user when an operation fails.
    type AdapterError: std::error::Error + std::fmt::Debug + Send + Sync + 'static;

    /// Stores `order` under its payer.
    async fn persist(&self, order: OrderWithState<Completed>) -> Result<(), Self::AdapterError>;
}

/// Retrieves completed orders.
#[async_trait]
pub trait CompletedOrderRead {
    /// Defines the user-specified error type.
    ///
    /// This error type should implement the `Error` and `Debug` traits from the standard library.
    /// Errors of this type are returned to the user when an operation fails.
    type AdapterError: std::error::Error + std::fmt::Debug + Send + Sync + 'static;

    /// Every completed order in insertion order.
    async fn completed_orders(&self)
        -> Result<Vec<OrderWithState<Completed>>, Self::AdapterError>;

    async fn completed_orders_of(
        &self,
        payer: &Principal,
    ) -> Result<Vec<OrderWithState<Completed>>, Self::AdapterError>;
}
