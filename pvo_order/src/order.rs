// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Module containing an order with metadata for tracking it through its lifecycle
//!
//! [`OrderWithState`] wraps the immutable [`Order`] fixed at reservation time
//! together with its current state. [`PaymentOrder`] is the flat record
//! returned to clients and written to snapshots.

use pvo_ledger::Principal;
use serde::{Deserialize, Serialize};

use crate::{
    state::{Completed, Expired, OrderState, Pending},
    CorrelationId, OrderError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    PaymentPending,
    Completed,
    Expired,
}

/// Fields fixed when the reservation is created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Human readable identifier, only used for audit and error messages
    pub order_id: String,
    /// Amount due in e8s, taken from the fee or price configuration
    pub fee: u64,
    pub payer: Principal,
    pub memo: CorrelationId,
    /// What the order pays for, e.g. a product id. Empty when the order may
    /// pay for anything at its fee.
    pub purpose: String,
}

/// Typestate pattern for tracking the state of an order
///
/// - The [ `OrderState` ] trait represents the different states an order
///   can be in.
/// - The [ `Pending` ] state is used to represent an order awaiting payment.
/// - The [ `Completed` ] state is used to represent an order whose payment
///   was verified, together with the block that paid it.
/// - The [ `Expired` ] state is used to represent an order discarded by its
///   reservation timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderWithState<S>
where
    S: OrderState,
{
    pub(crate) order: Order,
    pub(crate) _state: S,
}

impl OrderWithState<Pending> {
    /// Creates a new `OrderWithState` in the `Pending` state
    pub fn new(order: Order) -> OrderWithState<Pending> {
        OrderWithState {
            order,
            _state: Pending,
        }
    }

    /// Moves the order to `Completed`, recording the block that paid it
    pub fn complete(self, paid_at_block: u64) -> OrderWithState<Completed> {
        self.perform_state_changes(Completed { paid_at_block })
    }

    /// Moves the order to `Expired`
    pub fn expire(self) -> OrderWithState<Expired> {
        self.perform_state_changes(Expired)
    }
}

impl OrderWithState<Completed> {
    pub fn paid_at_block(&self) -> u64 {
        self._state.paid_at_block
    }
}

impl<S> OrderWithState<S>
where
    S: OrderState,
{
    fn perform_state_changes<T>(self, new_state: T) -> OrderWithState<T>
    where
        T: OrderState,
    {
        OrderWithState {
            order: self.order,
            _state: new_state,
        }
    }

    pub fn order(&self) -> &Order {
        &self.order
    }

    pub fn memo(&self) -> CorrelationId {
        self.order.memo
    }

    pub fn payer(&self) -> &Principal {
        &self.order.payer
    }

    pub fn state(&self) -> &S {
        &self._state
    }

    pub fn to_payment_order(&self) -> PaymentOrder {
        PaymentOrder {
            order_id: self.order.order_id.clone(),
            fee: self.order.fee,
            status: self._state.status(),
            payer: self.order.payer.clone(),
            paid_at_block: self._state.paid_at_block(),
            memo: self.order.memo,
            purpose: self.order.purpose.clone(),
        }
    }
}

/// Order record as exposed to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOrder {
    pub order_id: String,
    pub fee: u64,
    pub status: PaymentStatus,
    pub payer: Principal,
    pub paid_at_block: Option<u64>,
    pub memo: CorrelationId,
    #[serde(default)]
    pub purpose: String,
}

impl PaymentOrder {
    fn into_order(self) -> Order {
        Order {
            order_id: self.order_id,
            fee: self.fee,
            payer: self.payer,
            memo: self.memo,
            purpose: self.purpose,
        }
    }
}

impl TryFrom<PaymentOrder> for OrderWithState<Pending> {
    type Error = OrderError;

    fn try_from(record: PaymentOrder) -> Result<Self, Self::Error> {
        match (record.status, record.paid_at_block) {
            (PaymentStatus::PaymentPending, None) => Ok(OrderWithState::new(record.into_order())),
            (status, _) => Err(OrderError::InvalidPayload(format!(
                "order {} with status {status} is not pending",
                record.order_id
            ))),
        }
    }
}

impl TryFrom<PaymentOrder> for OrderWithState<Completed> {
    type Error = OrderError;

    fn try_from(record: PaymentOrder) -> Result<Self, Self::Error> {
        match (record.status, record.paid_at_block) {
            (PaymentStatus::Completed, Some(block)) => Ok(OrderWithState {
                order: record.into_order(),
                _state: Completed {
                    paid_at_block: block,
                },
            }),
            (status, _) => Err(OrderError::InvalidPayload(format!(
                "order {} with status {status} is not completed",
                record.order_id
            ))),
        }
    }
}
