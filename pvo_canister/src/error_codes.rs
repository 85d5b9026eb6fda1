// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use pvo_core::ErrorKind;

/// JSON-RPC error codes specific to the PVO canisters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonRpcErrorCode {
    /// -32001 -- Missing configuration, order, entity or payment.
    NotFound = -32001,
    /// -32002 -- Duplicate content or identifier.
    Exists = -32002,
    /// -32003 -- Malformed or unauthorised input.
    InvalidPayload = -32003,
    /// -32004 -- Internal failure, e.g. a storage adapter error.
    Fail = -32004,
}

impl From<ErrorKind> for JsonRpcErrorCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::NotFound => JsonRpcErrorCode::NotFound,
            ErrorKind::Exists => JsonRpcErrorCode::Exists,
            ErrorKind::InvalidPayload => JsonRpcErrorCode::InvalidPayload,
            ErrorKind::Fail => JsonRpcErrorCode::Fail,
        }
    }
}

/// JSON-RPC warning codes
/// These are not part of the JSON-RPC spec, but are used to provide additional information to the
/// client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonRpcWarningCode {
    /// -32101 -- The value returned is a default because the canister is not initialised.
    ConfigNotSet = -32101,
}
