// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Ledger blocks
//!
//! The read-only view of the ledger that PVO consumes. A block wraps exactly
//! one transaction; the transaction may carry an operation, and only
//! [`Operation::Transfer`] is relevant to payment verification.

use serde::{Deserialize, Serialize};

/// Amount of ledger tokens in e8s (10^-8 of a token)
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tokens {
    pub e8s: u64,
}

impl Tokens {
    pub const fn from_e8s(e8s: u64) -> Self {
        Self { e8s }
    }
}

/// Raw account address bytes as recorded by the ledger. Hex encoded on the wire.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransferBytes(#[serde(with = "crate::serde_hex")] pub Vec<u8>);

impl From<&crate::AccountIdentifier> for TransferBytes {
    fn from(account: &crate::AccountIdentifier) -> Self {
        Self(account.as_bytes().to_vec())
    }
}

impl AsRef<[u8]> for TransferBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Mint {
        to: TransferBytes,
        amount: Tokens,
    },
    Burn {
        from: TransferBytes,
        amount: Tokens,
    },
    Transfer {
        from: TransferBytes,
        to: TransferBytes,
        amount: Tokens,
        fee: Tokens,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub memo: u64,
    pub operation: Option<Operation>,
    /// Unix Epoch timestamp in nanoseconds
    pub created_at_time: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_hash: Option<TransferBytes>,
    pub transaction: Transaction,
    /// Unix Epoch timestamp in nanoseconds
    pub timestamp: u64,
}

impl Block {
    /// Returns `(from, to, amount)` when the block carries a transfer.
    pub fn transfer(&self) -> Option<(&TransferBytes, &TransferBytes, Tokens)> {
        match &self.transaction.operation {
            Some(Operation::Transfer {
                from, to, amount, ..
            }) => Some((from, to, *amount)),
            _ => None,
        }
    }
}

/// Arguments of the ledger block query: `length` blocks starting at `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetBlocksArgs {
    pub start: u64,
    pub length: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryBlocksResponse {
    pub chain_length: u64,
    pub first_block_index: u64,
    pub blocks: Vec<Block>,
}
