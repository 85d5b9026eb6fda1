// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Order states and payment checks
//!
//! An order is a reservation that a caller pays for off-canister by
//! transferring tokens on the ledger, using the order's correlation id as the
//! transfer memo. The canister later looks the transfer up and, if it
//! matches, completes the order.
//!
//! Each order is wrapped into a State Machine that can be in one of the following states:
//! - `Pending`: The order was reserved and awaits payment.
//! - `Completed`: A ledger block satisfying the payment checks was found.
//! - `Expired`: The reservation window elapsed before the order was completed.
//!
//! `Completed` and `Expired` are only reachable from `Pending`, and both
//! transitions consume the pending order.
//!
pub mod checks;
mod correlation;
mod error;
mod order;
mod snapshot;
pub mod state;

pub use correlation::CorrelationId;
pub use error::OrderError;
pub use order::{Order, OrderWithState, PaymentOrder, PaymentStatus};
pub use snapshot::{OrdersSnapshot, SCHEMA_VERSION};

/// Result type for orders
pub type OrderResult<T> = Result<T, OrderError>;
