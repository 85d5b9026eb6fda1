// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The `manager` module drives an order from reservation to completion.
//!
//! [`Manager`] creates reservations, schedules their expiry and completes them
//! once the ledger shows a matching payment. Storage and ledger access go
//! through the user-defined adapters in [adapters]; what a paid order actually
//! does is supplied per call as an [adapters::Fulfillment].
//!
//! Completion is exactly-once: the pending order is removed atomically before
//! its effect is applied, so of two concurrent completions of one order only
//! one gets past the removal.

pub mod adapters;
#[cfg(feature = "in_memory")]
pub mod context;
mod order_manager;

pub use order_manager::{Fulfilled, Manager, PaymentProof};
