// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Reservation expiry.
//!
//! Every reservation gets a one-shot task that discards it from the pending
//! store once the reservation window elapses. If the order was completed in
//! the meantime the task finds nothing to remove and does nothing.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use pvo_order::CorrelationId;
use tokio::task::AbortHandle;

use crate::manager::adapters::PendingOrderStore;

#[derive(Default)]
struct Scheduled {
    next_generation: u64,
    tasks: HashMap<CorrelationId, (u64, AbortHandle)>,
}

/// Schedules and cancels expiry tasks, keyed by memo.
#[derive(Clone, Default)]
pub struct ReservationTimer {
    scheduled: Arc<Mutex<Scheduled>>,
}

impl ReservationTimer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Scheduled> {
        self.scheduled.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Discards the pending order `memo` from `store` after `delay`.
    ///
    /// An expiry already scheduled for `memo` is replaced. Must be called from
    /// within a tokio runtime.
    pub fn schedule_expiry<S>(&self, store: S, memo: CorrelationId, delay: Duration)
    where
        S: PendingOrderStore + Send + Sync + 'static,
    {
        let mut scheduled = self.lock();
        let generation = scheduled.next_generation;
        scheduled.next_generation += 1;

        let registry = Arc::clone(&self.scheduled);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);
                if matches!(registry.tasks.get(&memo), Some((g, _)) if *g == generation) {
                    registry.tasks.remove(&memo);
                }
            }
            match store.take_pending(memo).await {
                Ok(Some(order)) => {
                    log::info!(
                        "Order discarded: memo={memo} order_id={}",
                        order.order().order_id
                    );
                    let _expired = order.expire();
                }
                Ok(None) => log::debug!("Expiry of memo {memo}: nothing pending"),
                Err(err) => log::error!("Expiry of memo {memo} failed: {err}"),
            }
        });

        if let Some((_, previous)) = scheduled
            .tasks
            .insert(memo, (generation, task.abort_handle()))
        {
            previous.abort();
        }
    }

    /// Stops the expiry task of `memo`. Returns whether one was scheduled.
    pub fn cancel(&self, memo: CorrelationId) -> bool {
        match self.lock().tasks.remove(&memo) {
            Some((_, task)) => {
                task.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_scheduled(&self, memo: CorrelationId) -> bool {
        self.lock().tasks.contains_key(&memo)
    }

    /// Number of expiry tasks that have not fired yet.
    pub fn scheduled(&self) -> usize {
        self.lock().tasks.len()
    }
}
