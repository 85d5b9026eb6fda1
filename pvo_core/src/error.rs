// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Module containing the error type of the order manager
//!

use std::result::Result as StdResult;

use pvo_order::{CorrelationId, OrderError};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    #[error("{name} not set")]
    ConfigNotSet { name: &'static str },
    #[error("{name} is already initialized")]
    AlreadyInitialized { name: &'static str },
    #[error("Failed to get current system time: {source_error_message} ")]
    InvalidSystemTime { source_error_message: String },
    #[error("cannot complete the payment: cannot verify the payment, memo={memo}")]
    PaymentNotVerified { memo: CorrelationId },
    #[error("cannot complete the payment: there is no pending order with id={order_id}")]
    PendingOrderNotFound { order_id: String },
    #[error("cannot complete the payment: pending order with memo={memo} {reason}")]
    PendingOrderMismatch { memo: CorrelationId, reason: String },
    #[error("an order with memo={memo} is already pending")]
    DuplicateCorrelationId { memo: CorrelationId },
    #[error(transparent)]
    Order(#[from] OrderError),
    #[error("Error from adapter.\n Caused by: {source_error}")]
    AdapterError { source_error: anyhow::Error },
}

/// Coarse classification of [`Error`], used to pick the variant of the
/// message returned to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ErrorKind {
    NotFound,
    Exists,
    InvalidPayload,
    Fail,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ConfigNotSet { .. }
            | Error::PaymentNotVerified { .. }
            | Error::PendingOrderNotFound { .. }
            | Error::PendingOrderMismatch { .. }
            | Error::Order(OrderError::NotFound(_)) => ErrorKind::NotFound,
            Error::AlreadyInitialized { .. }
            | Error::DuplicateCorrelationId { .. }
            | Error::Order(OrderError::Exists(_)) => ErrorKind::Exists,
            Error::Order(OrderError::InvalidPayload(_)) => ErrorKind::InvalidPayload,
            Error::InvalidSystemTime { .. } | Error::AdapterError { .. } => ErrorKind::Fail,
        }
    }
}

pub type Result<T> = StdResult<T, Error>;
