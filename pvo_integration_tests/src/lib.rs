// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! End-to-end tests of the PVO canisters against a mock ledger, both served
//! over JSON-RPC. The tests live in `tests/`.
