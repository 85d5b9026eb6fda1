// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use crate::{
    state::{Completed, Pending},
    OrderError, OrderResult, OrderWithState, PaymentOrder,
};

/// Version of the persisted order layout. Bump it whenever [`OrdersSnapshot`]
/// or [`PaymentOrder`] change shape.
pub const SCHEMA_VERSION: u32 = 1;

/// Both order collections, as carried across an upgrade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrdersSnapshot {
    pub schema_version: u32,
    pub pending: Vec<PaymentOrder>,
    /// Completed orders in insertion order
    pub completed: Vec<PaymentOrder>,
}

impl OrdersSnapshot {
    pub fn new(
        pending: &[OrderWithState<Pending>],
        completed: &[OrderWithState<Completed>],
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            pending: pending.iter().map(OrderWithState::to_payment_order).collect(),
            completed: completed
                .iter()
                .map(OrderWithState::to_payment_order)
                .collect(),
        }
    }

    /// Checks the schema version and converts the records back to typed orders.
    #[allow(clippy::type_complexity)]
    pub fn into_orders(
        self,
    ) -> OrderResult<(Vec<OrderWithState<Pending>>, Vec<OrderWithState<Completed>>)> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(OrderError::InvalidPayload(format!(
                "unsupported order schema version {} (expected {SCHEMA_VERSION})",
                self.schema_version
            )));
        }
        let pending = self
            .pending
            .into_iter()
            .map(TryFrom::try_from)
            .collect::<OrderResult<Vec<_>>>()?;
        let completed = self
            .completed
            .into_iter()
            .map(TryFrom::try_from)
            .collect::<OrderResult<Vec<_>>>()?;
        Ok((pending, completed))
    }
}

#[cfg(test)]
mod tests {
    use pvo_ledger::Principal;

    use super::*;
    use crate::{CorrelationId, Order};

    fn order(memo: u64) -> OrderWithState<Pending> {
        OrderWithState::new(Order {
            order_id: format!("order-{memo}"),
            fee: 10,
            payer: Principal::anonymous(),
            memo: CorrelationId(memo),
            purpose: String::new(),
        })
    }

    #[test]
    fn snapshot_restores_typed_orders() {
        let snapshot = OrdersSnapshot::new(&[order(1)], &[order(2).complete(8)]);
        let json = serde_json::to_string(&snapshot).unwrap();
        let restored: OrdersSnapshot = serde_json::from_str(&json).unwrap();

        let (pending, completed) = restored.into_orders().unwrap();
        assert_eq!(pending, vec![order(1)]);
        assert_eq!(completed, vec![order(2).complete(8)]);
    }

    #[test]
    fn unknown_schema_version_is_rejected() {
        let mut snapshot = OrdersSnapshot::new(&[order(1)], &[]);
        snapshot.schema_version = SCHEMA_VERSION + 1;
        assert!(matches!(
            snapshot.into_orders(),
            Err(OrderError::InvalidPayload(_))
        ));
    }

    #[test]
    fn completed_record_in_pending_list_is_rejected() {
        let mut snapshot = OrdersSnapshot::new(&[], &[]);
        snapshot.pending.push(order(3).complete(1).to_payment_order());
        assert!(snapshot.into_orders().is_err());
    }
}
