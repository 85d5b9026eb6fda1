// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use pvo_ledger::{GetBlocksArgs, QueryBlocksResponse};

/// Read access to the external token ledger.
///
/// # Example
///
/// For example code see [crate::manager::context::memory::InMemoryLedger]
#[async_trait]
pub trait LedgerQuery {
    /// Defines the user-specified error type.
    ///
    /// An error means the ledger could not be asked at all. A block that does
    /// not exist is reported through an empty `blocks` list instead.
    type AdapterError: std::error::Error + std::fmt::Debug + Send + Sync + 'static;

    async fn query_blocks(
        &self,
        args: GetBlocksArgs,
    ) -> Result<QueryBlocksResponse, Self::AdapterError>;
}
