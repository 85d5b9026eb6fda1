// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha224};

use crate::Principal;

const ACCOUNT_DOMAIN_SEPARATOR: &[u8] = b"\x0Aaccount-id";

/// Errors returned when parsing an [`AccountIdentifier`]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error("account identifier is not valid hex: {0}")]
    InvalidHex(String),
    #[error("account identifier must be 32 bytes, got {length}")]
    InvalidLength { length: usize },
    #[error("account identifier checksum does not match")]
    InvalidChecksum,
}

/// Sub-division of the funds owned by a principal. Subaccount zero is the default.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subaccount(pub [u8; 32]);

/// Address of a ledger account: `crc32(hash) ‖ hash` where `hash` is the
/// SHA-224 of the owner principal and subaccount.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountIdentifier([u8; 32]);

impl AccountIdentifier {
    pub fn new(owner: &Principal, subaccount: Option<&Subaccount>) -> Self {
        let subaccount = subaccount.copied().unwrap_or_default();
        let mut hasher = Sha224::new();
        hasher.update(ACCOUNT_DOMAIN_SEPARATOR);
        hasher.update(owner.as_slice());
        hasher.update(subaccount.0);
        let hash = hasher.finalize();

        let mut bytes = [0u8; 32];
        bytes[..4].copy_from_slice(&crc32fast::hash(&hash).to_be_bytes());
        bytes[4..].copy_from_slice(&hash);
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, AccountError> {
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| AccountError::InvalidLength {
                length: bytes.len(),
            })?;
        if bytes[..4] != crc32fast::hash(&bytes[4..]).to_be_bytes() {
            return Err(AccountError::InvalidChecksum);
        }
        Ok(Self(bytes))
    }

    pub fn from_hex(text: &str) -> Result<Self, AccountError> {
        let bytes = hex::decode(text).map_err(|e| AccountError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for AccountIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for AccountIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountIdentifier({})", self.to_hex())
    }
}

impl Serialize for AccountIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for AccountIdentifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_hex(&text).map_err(serde::de::Error::custom)
    }
}
