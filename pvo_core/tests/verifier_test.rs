// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0
use pvo_core::{
    manager::context::memory::InMemoryLedger,
    verifier::{PaymentVerifier, VerificationError},
};
use pvo_ledger::{AccountIdentifier, Block, Operation, Principal, Tokens, Transaction, TransferBytes};
use pvo_order::{checks::CheckError, CorrelationId};
use rstest::*;

#[fixture]
fn payer() -> Principal {
    Principal::from_slice(&[0xaa; 4]).unwrap()
}

#[fixture]
fn canister() -> Principal {
    Principal::from_slice(&[0, 0, 0, 0, 0, 0, 0, 2, 1, 1]).unwrap()
}

/// A ledger holding one transfer of 500 e8s from `payer` to `canister` with memo 42
#[fixture]
fn ledger(payer: Principal, canister: Principal) -> InMemoryLedger {
    let ledger = InMemoryLedger::new();
    ledger.transfer(
        &AccountIdentifier::new(&payer, None),
        &AccountIdentifier::new(&canister, None),
        500,
        42,
        1_700_000_000_000_000_000,
    );
    ledger
}

#[rstest]
#[case::exact(500, 42, true)]
#[case::one_more(501, 42, false)]
#[case::one_less(499, 42, false)]
#[case::other_memo(500, 43, false)]
#[tokio::test]
async fn every_field_must_match(
    payer: Principal,
    canister: Principal,
    ledger: InMemoryLedger,
    #[case] amount: u64,
    #[case] memo: u64,
    #[case] expected: bool,
) {
    let verifier = PaymentVerifier::for_canister(&canister);
    assert_eq!(
        verifier
            .verify(&ledger, &payer, amount, 0, CorrelationId(memo))
            .await,
        expected
    );
}

#[rstest]
#[tokio::test]
async fn payer_and_receiver_are_not_interchangeable(
    payer: Principal,
    canister: Principal,
    ledger: InMemoryLedger,
) {
    // the canister claiming to have paid the payer
    let flipped = PaymentVerifier::for_canister(&payer);
    assert!(!flipped.verify(&ledger, &canister, 500, 0, CorrelationId(42)).await);

    let err = PaymentVerifier::for_canister(&canister)
        .check_payment(
            &ledger,
            &Principal::anonymous(),
            500,
            0,
            CorrelationId(42),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        VerificationError::Mismatch(CheckError::SenderMismatch { .. })
    ));

    let err = PaymentVerifier::for_canister(&Principal::anonymous())
        .check_payment(&ledger, &payer, 500, 0, CorrelationId(42))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        VerificationError::Mismatch(CheckError::ReceiverMismatch { .. })
    ));
}

#[rstest]
#[tokio::test]
async fn missing_block_is_not_a_payment(
    payer: Principal,
    canister: Principal,
    ledger: InMemoryLedger,
) {
    let verifier = PaymentVerifier::for_canister(&canister);
    let err = verifier
        .check_payment(&ledger, &payer, 500, 1, CorrelationId(42))
        .await
        .unwrap_err();
    assert!(matches!(err, VerificationError::BlockNotFound { block_index: 1 }));
}

#[rstest]
#[tokio::test]
async fn mint_is_not_a_payment(payer: Principal, canister: Principal, ledger: InMemoryLedger) {
    let index = ledger.push_block(Block {
        parent_hash: None,
        transaction: Transaction {
            memo: 42,
            operation: Some(Operation::Mint {
                to: TransferBytes::from(&AccountIdentifier::new(&canister, None)),
                amount: Tokens::from_e8s(500),
            }),
            created_at_time: 0,
        },
        timestamp: 0,
    });
    let verifier = PaymentVerifier::for_canister(&canister);
    let err = verifier
        .check_payment(&ledger, &payer, 500, index, CorrelationId(42))
        .await
        .unwrap_err();
    assert!(matches!(err, VerificationError::NoTransfer { block_index } if block_index == index));
}

#[rstest]
#[tokio::test]
async fn unreachable_ledger_is_not_a_payment(
    payer: Principal,
    canister: Principal,
    ledger: InMemoryLedger,
) {
    ledger.set_unavailable(true);
    let verifier = PaymentVerifier::for_canister(&canister);
    assert!(!verifier.verify(&ledger, &payer, 500, 0, CorrelationId(42)).await);
    assert!(matches!(
        verifier
            .check_payment(&ledger, &payer, 500, 0, CorrelationId(42))
            .await,
        Err(VerificationError::LedgerUnavailable(_))
    ));
}
