// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use pvo_core::{Error, ErrorKind};
use serde::{Deserialize, Serialize};

/// Outcome message returned by canister calls, tagged by its variant name
/// on the wire (`{"NotFound": "..."}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, strum::AsRefStr)]
pub enum Message {
    Exists(String),
    NotFound(String),
    InvalidPayload(String),
    PaymentFailed(String),
    PaymentCompleted(String),
    Success(String),
    Fail(String),
}

impl Message {
    pub fn text(&self) -> &str {
        match self {
            Message::Exists(text)
            | Message::NotFound(text)
            | Message::InvalidPayload(text)
            | Message::PaymentFailed(text)
            | Message::PaymentCompleted(text)
            | Message::Success(text)
            | Message::Fail(text) => text,
        }
    }
}

impl From<&Error> for Message {
    fn from(err: &Error) -> Self {
        let text = err.to_string();
        match err.kind() {
            ErrorKind::NotFound => Message::NotFound(text),
            ErrorKind::Exists => Message::Exists(text),
            ErrorKind::InvalidPayload => Message::InvalidPayload(text),
            ErrorKind::Fail => Message::Fail(text),
        }
    }
}
