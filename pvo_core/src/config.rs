// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Canister configuration.
//!
//! Values such as fees and id counters are set once when the canister is
//! initialised and read by every later call. [`InitCell`] holds such a value:
//! reading it before `init` fails with [`Error::ConfigNotSet`] instead of
//! falling back to a default, and a second `init` is rejected.

use std::{sync::OnceLock, time::Duration};

use pvo_ledger::{AccountIdentifier, Principal};

use crate::Error;

/// How long a caller has to pay for a reservation
pub const DEFAULT_RESERVATION_WINDOW: Duration = Duration::from_secs(120);

/// Init-once container with an explicit init-before-use contract
#[derive(Debug)]
pub struct InitCell<T> {
    name: &'static str,
    cell: OnceLock<T>,
}

impl<T> InitCell<T> {
    /// `name` is used in the errors returned by [`Self::get`] and [`Self::init`].
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            cell: OnceLock::new(),
        }
    }

    pub fn init(&self, value: T) -> Result<(), Error> {
        self.cell
            .set(value)
            .map_err(|_| Error::AlreadyInitialized { name: self.name })
    }

    pub fn get(&self) -> Result<&T, Error> {
        self.cell
            .get()
            .ok_or(Error::ConfigNotSet { name: self.name })
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }
}

/// Settings shared by every reservation of a canister
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationConfig {
    /// Identity of this canister; payments must be sent to its default account
    pub canister_id: Principal,
    pub reservation_window: Duration,
}

impl ReservationConfig {
    pub fn new(canister_id: Principal) -> Self {
        Self {
            canister_id,
            reservation_window: DEFAULT_RESERVATION_WINDOW,
        }
    }

    pub fn with_reservation_window(mut self, reservation_window: Duration) -> Self {
        self.reservation_window = reservation_window;
        self
    }

    pub fn canister_account(&self) -> AccountIdentifier {
        AccountIdentifier::new(&self.canister_id, None)
    }
}
