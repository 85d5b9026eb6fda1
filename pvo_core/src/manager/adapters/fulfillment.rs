// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use pvo_ledger::Principal;
use pvo_order::OrderError;

/// The domain effect a payment pays for, such as registering a document or
/// recording a sale.
///
/// [`Self::precheck`] runs before the pending order is consumed and should
/// reject every payload that [`Self::apply`] would reject. If `apply` fails
/// anyway, the manager puts the pending order back.
#[async_trait]
pub trait Fulfillment<P>: Send + Sync
where
    P: Send + Sync,
{
    type Output: Send;

    async fn precheck(&self, payer: &Principal, payload: &P) -> Result<(), OrderError>;

    async fn apply(&self, payer: &Principal, payload: P) -> Result<Self::Output, OrderError>;
}
