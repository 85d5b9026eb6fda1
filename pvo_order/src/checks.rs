// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Payment Checks
//!
//! A ledger transfer pays for an order only if every check of the order's
//! [`CheckList`] passes. Checks are evaluated against a [`PaymentEvidence`]:
//! the memo of the block's transaction together with its transfer operation.
//!
//! ## Example
//!
//! ```rust
//! use pvo_ledger::{AccountIdentifier, Principal, Tokens, TransferBytes};
//! use pvo_order::{checks::{ExpectedPayment, PaymentEvidence}, CorrelationId};
//!
//! let payer = AccountIdentifier::new(&Principal::anonymous(), None);
//! let canister = AccountIdentifier::new(&Principal::from_slice(&[1]).unwrap(), None);
//!
//! let expected = ExpectedPayment {
//!     sender: payer,
//!     receiver: canister,
//!     amount: 500,
//!     memo: CorrelationId(42),
//! };
//! let (from, to) = (TransferBytes::from(&payer), TransferBytes::from(&canister));
//! let evidence = PaymentEvidence { memo: 42, from: &from, to: &to, amount: Tokens::from_e8s(500) };
//!
//! assert!(expected.check_list().check_all(&evidence).is_ok());
//! ```

use std::{ops::Deref, sync::Arc};

use pvo_ledger::{stable_hash, AccountIdentifier, Tokens, TransferBytes};

use crate::CorrelationId;

/// TransferCheck is a type alias for an Arc of a struct that implements the `Check` trait.
pub type TransferCheck = Arc<dyn Check + Sync + Send>;

/// Result of a check operation.
pub type CheckResult = Result<(), CheckError>;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    #[error("transfer sender does not match the payer account {expected}")]
    SenderMismatch { expected: AccountIdentifier },
    #[error("transfer receiver does not match the canister account {expected}")]
    ReceiverMismatch { expected: AccountIdentifier },
    #[error("transfer amount {received} does not match the amount due {expected}")]
    AmountMismatch { expected: u64, received: u64 },
    #[error("transaction memo {received} does not match the order memo {expected}")]
    MemoMismatch { expected: u64, received: u64 },
}

/// The parts of a ledger block that a payment is judged on
#[derive(Debug, Clone, Copy)]
pub struct PaymentEvidence<'a> {
    pub memo: u64,
    pub from: &'a TransferBytes,
    pub to: &'a TransferBytes,
    pub amount: Tokens,
}

/// Check trait is implemented for each predicate a transfer must satisfy.
pub trait Check {
    fn check(&self, evidence: &PaymentEvidence<'_>) -> CheckResult;
}

/// CheckList is a NewType pattern to store a list of checks.
/// It is a wrapper around an Arc of TransferCheck[].
#[derive(Clone)]
pub struct CheckList(Arc<[TransferCheck]>);

impl CheckList {
    pub fn new(checks: Vec<TransferCheck>) -> Self {
        Self(checks.into())
    }

    /// Runs every check in order and returns the first failure.
    pub fn check_all(&self, evidence: &PaymentEvidence<'_>) -> CheckResult {
        self.0.iter().try_for_each(|check| check.check(evidence))
    }
}

impl Deref for CheckList {
    type Target = [TransferCheck];

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

/// Addresses are compared through their [`stable_hash`] fingerprints rather
/// than byte by byte. Colliding fingerprints are not detected.
fn same_address(expected: &AccountIdentifier, received: &TransferBytes) -> bool {
    stable_hash(expected.as_bytes()) == stable_hash(received)
}

/// The transfer must come from the payer's default account.
pub struct SenderCheck(pub AccountIdentifier);

impl Check for SenderCheck {
    fn check(&self, evidence: &PaymentEvidence<'_>) -> CheckResult {
        if same_address(&self.0, evidence.from) {
            Ok(())
        } else {
            Err(CheckError::SenderMismatch { expected: self.0 })
        }
    }
}

/// The transfer must go to the canister's default account.
pub struct ReceiverCheck(pub AccountIdentifier);

impl Check for ReceiverCheck {
    fn check(&self, evidence: &PaymentEvidence<'_>) -> CheckResult {
        if same_address(&self.0, evidence.to) {
            Ok(())
        } else {
            Err(CheckError::ReceiverMismatch { expected: self.0 })
        }
    }
}

/// The transferred amount must equal the amount due, exactly.
pub struct AmountCheck(pub u64);

impl Check for AmountCheck {
    fn check(&self, evidence: &PaymentEvidence<'_>) -> CheckResult {
        if evidence.amount.e8s == self.0 {
            Ok(())
        } else {
            Err(CheckError::AmountMismatch {
                expected: self.0,
                received: evidence.amount.e8s,
            })
        }
    }
}

/// The transaction memo must be the order's correlation id.
pub struct MemoCheck(pub CorrelationId);

impl Check for MemoCheck {
    fn check(&self, evidence: &PaymentEvidence<'_>) -> CheckResult {
        if evidence.memo == self.0.memo() {
            Ok(())
        } else {
            Err(CheckError::MemoMismatch {
                expected: self.0.memo(),
                received: evidence.memo,
            })
        }
    }
}

/// What a payment for a given order must look like
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectedPayment {
    pub sender: AccountIdentifier,
    pub receiver: AccountIdentifier,
    pub amount: u64,
    pub memo: CorrelationId,
}

impl ExpectedPayment {
    pub fn check_list(&self) -> CheckList {
        CheckList::new(vec![
            Arc::new(SenderCheck(self.sender)),
            Arc::new(ReceiverCheck(self.receiver)),
            Arc::new(AmountCheck(self.amount)),
            Arc::new(MemoCheck(self.memo)),
        ])
    }
}
