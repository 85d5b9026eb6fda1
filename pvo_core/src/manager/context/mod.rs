// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Context implementations.
//!
//! Contexts hold the pending and completed orders the manager works on and give it
//! access to the ledger. The in-memory context keeps everything in process memory,
//! which is what a canister heap is, and backs both the canister binary and the tests.
pub mod memory;
