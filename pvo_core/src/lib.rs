// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Payment-Verified Orders (PVO)
//!
//! PVO bridges token transfers made by a caller directly on a ledger with
//! state changes made inside a canister. The caller first reserves an order
//! and receives a correlation id; it then pays on the ledger using that id as
//! the transfer memo and finally asks the canister to complete the order,
//! pointing at the ledger block. The canister looks the block up, checks
//! payer, receiver, amount and memo, and only then applies the side effect the
//! payment is for. Reservations that are not paid within the reservation
//! window are discarded.
//!
//! ## Getting started
//!
//! Take a look at the [`manager`] module to see how reservations are created
//! and completed, and which adapters a canister has to implement.

use std::time::{SystemTime, UNIX_EPOCH};

pub mod config;
mod error;
pub mod host;
pub mod manager;
pub mod timer;
pub mod verifier;

pub use error::{Error, ErrorKind};
use error::Result;

fn get_current_timestamp_u64_ns() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|err| Error::InvalidSystemTime {
            source_error_message: err.to_string(),
        })?
        .as_nanos() as u64)
}
