// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::{fmt::Display, sync::Arc, time::Duration};

use pvo_ledger::Principal;
use pvo_order::{
    state::{Completed, Pending},
    CorrelationId, Order, OrderWithState, OrdersSnapshot,
};
use serde::{Deserialize, Serialize};

use super::adapters::{
    CompletedOrderRead, CompletedOrderStore, Fulfillment, LedgerQuery, PendingOrderRead,
    PendingOrderStore,
};
use crate::{
    config::ReservationConfig,
    host::{Clock, SystemClock},
    timer::ReservationTimer,
    verifier::PaymentVerifier,
    Error,
};

/// What a caller presents to complete an order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentProof {
    /// Order id returned at reservation, echoed in error messages
    pub order_id: String,
    /// Ledger block holding the payment
    pub block_index: u64,
    pub memo: CorrelationId,
}

/// A completed order together with the output of its fulfillment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fulfilled<T> {
    pub order: OrderWithState<Completed>,
    pub output: T,
}

fn adapter_error<Err>(err: Err) -> Error
where
    Err: std::error::Error + Send + Sync + 'static,
{
    Error::AdapterError {
        source_error: anyhow::Error::new(err),
    }
}

fn check_purpose(pending: &OrderWithState<Pending>, purpose: &str) -> Result<(), Error> {
    if pending.order().purpose != purpose {
        return Err(Error::PendingOrderMismatch {
            memo: pending.memo(),
            reason: format!("was not reserved for {purpose}"),
        });
    }
    Ok(())
}

pub struct Manager<E, L> {
    /// Context that implements the storage adapters
    context: E,

    /// Client of the ledger payments are read from
    ledger: L,

    verifier: PaymentVerifier,

    timer: ReservationTimer,

    clock: Arc<dyn Clock>,

    reservation_window: Duration,
}

impl<E, L> Manager<E, L> {
    /// Creates a manager that accepts payments to the default account of
    /// `config.canister_id` and discards reservations after
    /// `config.reservation_window`.
    pub fn new(config: &ReservationConfig, context: E, ledger: L) -> Self {
        Self {
            context,
            ledger,
            verifier: PaymentVerifier::new(config.canister_account()),
            timer: ReservationTimer::new(),
            clock: Arc::new(SystemClock),
            reservation_window: config.reservation_window,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn context(&self) -> &E {
        &self.context
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn verifier(&self) -> &PaymentVerifier {
        &self.verifier
    }

    pub fn reservation_window(&self) -> Duration {
        self.reservation_window
    }

    pub fn now_ns(&self) -> u64 {
        self.clock.now_ns()
    }

    /// Stops the expiry of a reservation. The order stays pending until it
    /// is completed.
    pub fn cancel_expiry(&self, memo: CorrelationId) -> bool {
        self.timer.cancel(memo)
    }

    pub fn scheduled_expiries(&self) -> usize {
        self.timer.scheduled()
    }
}

impl<E, L> Manager<E, L>
where
    E: PendingOrderStore + Clone + Send + Sync + 'static,
{
    /// Reserves an order of `amount` e8s for `payer`, seeded with a fresh
    /// order id. The order is not bound to a purpose.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateCorrelationId`] if the derived memo is
    /// already pending.
    ///
    /// Returns [`Error::AdapterError`] if the pending store fails.
    pub async fn create_reservation(
        &self,
        payer: &Principal,
        amount: u64,
    ) -> Result<OrderWithState<Pending>, Error> {
        let order_id = uuid::Uuid::new_v4().to_string();
        self.reserve(order_id.clone(), order_id, String::new(), payer, amount)
            .await
    }

    /// Like [`Self::create_reservation`], with the memo derived from
    /// `purpose` instead of the order id. The order can only be completed
    /// through [`Self::complete_reserved_order`] with the same purpose.
    pub async fn create_reservation_for(
        &self,
        payer: &Principal,
        amount: u64,
        purpose: impl Display + Send,
    ) -> Result<OrderWithState<Pending>, Error> {
        let order_id = uuid::Uuid::new_v4().to_string();
        let purpose = purpose.to_string();
        self.reserve(order_id, &purpose, purpose.clone(), payer, amount)
            .await
    }

    async fn reserve(
        &self,
        order_id: String,
        seed: impl Display + Send,
        purpose: String,
        payer: &Principal,
        amount: u64,
    ) -> Result<OrderWithState<Pending>, Error> {
        let memo = CorrelationId::derive(seed, payer, self.clock.now_ns());
        let order = OrderWithState::new(Order {
            order_id,
            fee: amount,
            payer: payer.clone(),
            memo,
            purpose,
        });

        let reserved = self
            .context
            .reserve(order.clone())
            .await
            .map_err(adapter_error)?;
        if !reserved {
            return Err(Error::DuplicateCorrelationId { memo });
        }

        self.timer
            .schedule_expiry(self.context.clone(), memo, self.reservation_window);
        log::info!(
            "Order reserved: order_id={} memo={memo} fee={amount} payer={payer}",
            order.order().order_id
        );
        Ok(order)
    }

    async fn put_back(&self, order: OrderWithState<Pending>) {
        let memo = order.memo();
        match self.context.reserve(order).await {
            Ok(true) => {
                if !self.timer.is_scheduled(memo) {
                    self.timer
                        .schedule_expiry(self.context.clone(), memo, self.reservation_window);
                }
            }
            Ok(false) => log::warn!("Order with memo {memo} was pending again before restore"),
            Err(err) => log::error!("Failed to restore pending order with memo {memo}: {err}"),
        }
    }
}

impl<E, L> Manager<E, L>
where
    E: PendingOrderStore + PendingOrderRead + CompletedOrderStore + Clone + Send + Sync + 'static,
    L: LedgerQuery + Sync,
{
    /// Completes the order `proof.memo` once its payment is found on the
    /// ledger, applying `fulfillment` with `payload`.
    ///
    /// The payment must move `expected_amount` e8s from the caller's default
    /// account to the canister's default account at block
    /// `proof.block_index`, tagged with `proof.memo`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PaymentNotVerified`] if no such payment is found, the
    /// ledger being unreachable included. The pending order is kept.
    ///
    /// Returns [`Error::PendingOrderNotFound`] if the order is not pending,
    /// which is the case for a second completion of the same order and for
    /// an expired reservation.
    ///
    /// Returns [`Error::PendingOrderMismatch`] if the pending order belongs to
    /// another caller or expects another amount. The pending order is kept.
    ///
    /// Returns [`Error::Order`] if `fulfillment` rejects the payload. When the
    /// rejection comes from [`Fulfillment::precheck`] the pending order is
    /// kept; when it comes from [`Fulfillment::apply`] it is put back.
    pub async fn complete_order<P, F>(
        &self,
        caller: &Principal,
        proof: &PaymentProof,
        expected_amount: u64,
        fulfillment: &F,
        payload: P,
    ) -> Result<Fulfilled<F::Output>, Error>
    where
        P: Send + Sync,
        F: Fulfillment<P>,
    {
        self.complete(caller, proof, expected_amount, None, fulfillment, payload)
            .await
    }

    /// Completes the order `proof.memo` for the amount fixed when it was
    /// reserved. The order must have been reserved for `purpose`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PendingOrderNotFound`] if the order is not pending
    /// and [`Error::PendingOrderMismatch`] if it was reserved for another
    /// purpose, before the ledger is queried. Otherwise fails as
    /// [`Self::complete_order`] does.
    pub async fn complete_reserved_order<P, F>(
        &self,
        caller: &Principal,
        proof: &PaymentProof,
        purpose: &str,
        fulfillment: &F,
        payload: P,
    ) -> Result<Fulfilled<F::Output>, Error>
    where
        P: Send + Sync,
        F: Fulfillment<P>,
    {
        let pending = self
            .context
            .pending_order(proof.memo)
            .await
            .map_err(adapter_error)?
            .ok_or_else(|| Error::PendingOrderNotFound {
                order_id: proof.order_id.clone(),
            })?;
        check_purpose(&pending, purpose)?;
        let amount_due = pending.order().fee;
        self.complete(
            caller,
            proof,
            amount_due,
            Some(purpose),
            fulfillment,
            payload,
        )
        .await
    }

    async fn complete<P, F>(
        &self,
        caller: &Principal,
        proof: &PaymentProof,
        expected_amount: u64,
        purpose: Option<&str>,
        fulfillment: &F,
        payload: P,
    ) -> Result<Fulfilled<F::Output>, Error>
    where
        P: Send + Sync,
        F: Fulfillment<P>,
    {
        let memo = proof.memo;
        if !self
            .verifier
            .verify(&self.ledger, caller, expected_amount, proof.block_index, memo)
            .await
        {
            return Err(Error::PaymentNotVerified { memo });
        }

        let pending = self
            .context
            .pending_order(memo)
            .await
            .map_err(adapter_error)?
            .ok_or_else(|| Error::PendingOrderNotFound {
                order_id: proof.order_id.clone(),
            })?;
        if pending.payer() != caller {
            return Err(Error::PendingOrderMismatch {
                memo,
                reason: "was reserved by another caller".to_string(),
            });
        }
        if let Some(purpose) = purpose {
            check_purpose(&pending, purpose)?;
        }
        if pending.order().fee != expected_amount {
            return Err(Error::PendingOrderMismatch {
                memo,
                reason: format!(
                    "is due {} e8s, not {expected_amount}",
                    pending.order().fee
                ),
            });
        }

        fulfillment.precheck(caller, &payload).await?;

        let pending = self
            .context
            .take_pending(memo)
            .await
            .map_err(adapter_error)?
            .ok_or_else(|| Error::PendingOrderNotFound {
                order_id: proof.order_id.clone(),
            })?;
        let completed = pending.clone().complete(proof.block_index);

        let output = match fulfillment.apply(caller, payload).await {
            Ok(output) => output,
            Err(err) => {
                log::warn!("Order with memo {memo} paid but not fulfilled, keeping it pending: {err}");
                self.put_back(pending).await;
                return Err(err.into());
            }
        };

        if let Err(err) = self.context.persist(completed.clone()).await {
            log::error!(
                "Order with memo {memo} was fulfilled but could not be recorded as completed: {err}"
            );
            return Err(adapter_error(err));
        }
        self.timer.cancel(memo);
        log::info!(
            "Order completed: order_id={} memo={memo} block={}",
            proof.order_id,
            proof.block_index
        );
        Ok(Fulfilled {
            order: completed,
            output,
        })
    }
}

impl<E, L> Manager<E, L>
where
    E: PendingOrderRead,
{
    pub async fn pending_orders(&self) -> Result<Vec<OrderWithState<Pending>>, Error> {
        self.context.pending_orders().await.map_err(adapter_error)
    }

    pub async fn pending_order(
        &self,
        memo: CorrelationId,
    ) -> Result<Option<OrderWithState<Pending>>, Error> {
        self.context.pending_order(memo).await.map_err(adapter_error)
    }
}

impl<E, L> Manager<E, L>
where
    E: CompletedOrderRead,
{
    pub async fn completed_orders(&self) -> Result<Vec<OrderWithState<Completed>>, Error> {
        self.context.completed_orders().await.map_err(adapter_error)
    }

    pub async fn completed_orders_of(
        &self,
        payer: &Principal,
    ) -> Result<Vec<OrderWithState<Completed>>, Error> {
        self.context
            .completed_orders_of(payer)
            .await
            .map_err(adapter_error)
    }
}

impl<E, L> Manager<E, L>
where
    E: PendingOrderRead + CompletedOrderRead,
{
    /// Captures both order collections, for carrying them across an upgrade.
    pub async fn snapshot(&self) -> Result<OrdersSnapshot, Error> {
        let pending = self.pending_orders().await?;
        let completed = self.completed_orders().await?;
        Ok(OrdersSnapshot::new(&pending, &completed))
    }
}

impl<E, L> Manager<E, L>
where
    E: PendingOrderStore + CompletedOrderStore + Clone + Send + Sync + 'static,
{
    /// Loads a snapshot taken by [`Self::snapshot`]. Restored reservations
    /// get a full reservation window.
    ///
    /// Returns the number of pending and completed orders restored.
    pub async fn restore(&self, snapshot: OrdersSnapshot) -> Result<(usize, usize), Error> {
        let (pending, completed) = snapshot.into_orders()?;
        let restored = (pending.len(), completed.len());

        for order in pending {
            let memo = order.memo();
            let reserved = PendingOrderStore::reserve(&self.context, order)
                .await
                .map_err(adapter_error)?;
            if !reserved {
                return Err(Error::DuplicateCorrelationId { memo });
            }
            self.timer
                .schedule_expiry(self.context.clone(), memo, self.reservation_window);
        }
        for order in completed {
            self.context.persist(order).await.map_err(adapter_error)?;
        }

        log::info!(
            "Restored {} pending and {} completed orders",
            restored.0,
            restored.1
        );
        Ok(restored)
    }
}
