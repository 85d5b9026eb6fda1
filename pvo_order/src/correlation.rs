// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use pvo_ledger::{stable_hash, Principal};
use serde::{Deserialize, Serialize};

/// Links an off-canister ledger transfer to an on-canister reservation.
///
/// The same value is the key of the pending order and the memo of the
/// ledger transfer that pays for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(pub u64);

impl CorrelationId {
    /// Derives the id of a reservation from a domain seed (an order or
    /// product identifier), the caller and the current time in nanoseconds.
    ///
    /// No entropy is involved: identical inputs give identical ids.
    pub fn derive(seed: impl fmt::Display, caller: &Principal, time_ns: u64) -> Self {
        Self(stable_hash(format!("{seed}_{caller}_{time_ns}")))
    }

    pub fn memo(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for CorrelationId {
    fn from(memo: u64) -> Self {
        Self(memo)
    }
}
