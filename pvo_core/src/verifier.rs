// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Payment verification
//!
//! A payment is accepted only when the ledger block it points at carries a
//! transfer that came from the payer's default account, went to the
//! canister's default account, moved exactly the amount due and was tagged
//! with the order's memo. All four must hold.
//!
//! [`PaymentVerifier::check_payment`] explains a rejection through
//! [`VerificationError`]; [`PaymentVerifier::verify`] collapses the outcome to
//! a boolean and treats every failure, the ledger being unreachable included,
//! as "not paid".

use pvo_ledger::{AccountIdentifier, GetBlocksArgs, Principal};
use pvo_order::{
    checks::{CheckError, ExpectedPayment, PaymentEvidence},
    CorrelationId,
};
use thiserror::Error;

use crate::manager::adapters::LedgerQuery;

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("ledger query failed: {0}")]
    LedgerUnavailable(String),
    #[error("block {block_index} does not exist")]
    BlockNotFound { block_index: u64 },
    #[error("block {block_index} does not carry a transfer")]
    NoTransfer { block_index: u64 },
    #[error(transparent)]
    Mismatch(#[from] CheckError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentVerifier {
    canister_account: AccountIdentifier,
}

impl PaymentVerifier {
    pub fn new(canister_account: AccountIdentifier) -> Self {
        Self { canister_account }
    }

    pub fn for_canister(canister_id: &Principal) -> Self {
        Self::new(AccountIdentifier::new(canister_id, None))
    }

    pub fn canister_account(&self) -> &AccountIdentifier {
        &self.canister_account
    }

    /// Looks up block `block_index` and checks it against the expected payment.
    pub async fn check_payment<L>(
        &self,
        ledger: &L,
        payer: &Principal,
        expected_amount: u64,
        block_index: u64,
        memo: CorrelationId,
    ) -> Result<(), VerificationError>
    where
        L: LedgerQuery + Sync,
    {
        let response = ledger
            .query_blocks(GetBlocksArgs {
                start: block_index,
                length: 1,
            })
            .await
            .map_err(|err| VerificationError::LedgerUnavailable(err.to_string()))?;

        let block = block_index
            .checked_sub(response.first_block_index)
            .and_then(|offset| response.blocks.get(offset as usize))
            .ok_or(VerificationError::BlockNotFound { block_index })?;

        let (from, to, amount) = block
            .transfer()
            .ok_or(VerificationError::NoTransfer { block_index })?;

        let expected = ExpectedPayment {
            sender: AccountIdentifier::new(payer, None),
            receiver: self.canister_account,
            amount: expected_amount,
            memo,
        };
        expected.check_list().check_all(&PaymentEvidence {
            memo: block.transaction.memo,
            from,
            to,
            amount,
        })?;
        Ok(())
    }

    /// Returns `true` only when [`Self::check_payment`] succeeds.
    pub async fn verify<L>(
        &self,
        ledger: &L,
        payer: &Principal,
        expected_amount: u64,
        block_index: u64,
        memo: CorrelationId,
    ) -> bool
    where
        L: LedgerQuery + Sync,
    {
        match self
            .check_payment(ledger, payer, expected_amount, block_index, memo)
            .await
        {
            Ok(()) => true,
            Err(err) => {
                log::debug!(
                    "Payment for memo {memo} at block {block_index} rejected: {err}"
                );
                false
            }
        }
    }
}
