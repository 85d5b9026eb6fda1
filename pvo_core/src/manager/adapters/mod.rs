// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Context adapters for the order manager.
//!
//! A canister implements these traits on top of its own storage and ledger
//! client. The manager only asks for the capabilities an operation needs, so
//! a read-only query endpoint can be served by a context that implements the
//! read traits alone.

mod completed;
mod fulfillment;
mod ledger;
mod pending;

pub use completed::*;
pub use fulfillment::Fulfillment;
pub use ledger::LedgerQuery;
pub use pending::*;
