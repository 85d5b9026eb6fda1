// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0
use std::time::Duration;

use pvo_core::{
    manager::{
        adapters::{PendingOrderRead, PendingOrderStore},
        context::memory::{InMemoryContext, PersistPolicy},
    },
    timer::ReservationTimer,
};
use pvo_ledger::Principal;
use pvo_order::{CorrelationId, Order, OrderWithState};

async fn reserved(context: &InMemoryContext, memo: u64) -> CorrelationId {
    let order = OrderWithState::new(Order {
        order_id: format!("order-{memo}"),
        fee: 1,
        payer: Principal::anonymous(),
        memo: CorrelationId(memo),
        purpose: String::new(),
    });
    assert!(context.reserve(order).await.unwrap());
    CorrelationId(memo)
}

#[tokio::test(start_paused = true)]
async fn expiry_discards_pending_order() {
    let context = InMemoryContext::new(PersistPolicy::LastWriteWins);
    let timer = ReservationTimer::new();
    let memo = reserved(&context, 1).await;

    timer.schedule_expiry(context.clone(), memo, Duration::from_secs(120));
    assert!(timer.is_scheduled(memo));

    tokio::time::sleep(Duration::from_secs(121)).await;
    assert!(context.pending_order(memo).await.unwrap().is_none());
    assert_eq!(timer.scheduled(), 0);
}

#[tokio::test(start_paused = true)]
async fn expiry_of_completed_order_is_a_no_op() {
    let context = InMemoryContext::new(PersistPolicy::LastWriteWins);
    let timer = ReservationTimer::new();
    let memo = reserved(&context, 2).await;
    timer.schedule_expiry(context.clone(), memo, Duration::from_secs(120));

    assert!(context.take_pending(memo).await.unwrap().is_some());
    tokio::time::sleep(Duration::from_secs(121)).await;
    assert_eq!(context.pending_len(), 0);
    assert_eq!(timer.scheduled(), 0);
}

#[tokio::test(start_paused = true)]
async fn rescheduling_replaces_previous_expiry() {
    let context = InMemoryContext::new(PersistPolicy::LastWriteWins);
    let timer = ReservationTimer::new();
    let memo = reserved(&context, 3).await;

    timer.schedule_expiry(context.clone(), memo, Duration::from_secs(10));
    timer.schedule_expiry(context.clone(), memo, Duration::from_secs(60));
    assert_eq!(timer.scheduled(), 1);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(context.pending_order(memo).await.unwrap().is_some());

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert!(context.pending_order(memo).await.unwrap().is_none());
}
