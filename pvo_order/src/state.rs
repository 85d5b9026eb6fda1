// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Order State
//!
//! These are the implementation of the typestate pattern for tracking the
//! state of an order.
//! The `OrderState` trait represents the different states an order can be in.

use crate::PaymentStatus;

/// Pending state represents an order that was reserved and awaits payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pending;

/// Completed state represents an order whose payment was found on the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completed {
    /// Index of the ledger block that satisfied the payment checks
    pub paid_at_block: u64,
}

/// Expired state represents an order discarded after its reservation window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expired;

/// Trait for the different states an order can be in.
pub trait OrderState {
    fn status(&self) -> PaymentStatus;

    fn paid_at_block(&self) -> Option<u64> {
        None
    }
}

impl OrderState for Pending {
    fn status(&self) -> PaymentStatus {
        PaymentStatus::PaymentPending
    }
}

impl OrderState for Completed {
    fn status(&self) -> PaymentStatus {
        PaymentStatus::Completed
    }

    fn paid_at_block(&self) -> Option<u64> {
        Some(self.paid_at_block)
    }
}

impl OrderState for Expired {
    fn status(&self) -> PaymentStatus {
        PaymentStatus::Expired
    }
}
