// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! JSON-RPC client of the token ledger.
//!
//! The ledger is expected to expose a `query_blocks` method taking a
//! [`GetBlocksArgs`] and returning a [`QueryBlocksResponse`].

use async_trait::async_trait;
use jsonrpsee::{
    core::{client::ClientT, ClientError},
    http_client::{HttpClient, HttpClientBuilder},
    rpc_params,
};
use pvo_core::manager::adapters::LedgerQuery;
use pvo_ledger::{GetBlocksArgs, QueryBlocksResponse};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerClientError {
    #[error("ledger request failed: {0}")]
    Request(#[from] ClientError),
}

#[derive(Clone)]
pub struct LedgerClient {
    client: HttpClient,
}

impl LedgerClient {
    pub fn new(url: &str) -> Result<Self, LedgerClientError> {
        Ok(Self {
            client: HttpClientBuilder::default().build(url)?,
        })
    }
}

#[async_trait]
impl LedgerQuery for LedgerClient {
    type AdapterError = LedgerClientError;

    async fn query_blocks(
        &self,
        args: GetBlocksArgs,
    ) -> Result<QueryBlocksResponse, Self::AdapterError> {
        Ok(self
            .client
            .request("query_blocks", rpc_params!(args))
            .await?)
    }
}
