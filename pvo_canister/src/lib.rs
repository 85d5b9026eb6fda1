// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

pub mod canister;
pub mod error_codes;
pub mod jsonrpsee_helpers;
pub mod ledger_client;
pub mod marketplace;
pub mod message;
pub mod metrics;
pub mod registry;
pub mod server;
