// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Ledger types
//!
//! This crate contains the types that PVO consumes from an external token
//! ledger: caller identities ([`Principal`]), the 32-byte account addresses the
//! ledger moves funds between ([`AccountIdentifier`]) and the blocks returned by
//! the ledger block query ([`Block`], [`QueryBlocksResponse`]).
//!
//! # Example
//! ```rust
//! use pvo_ledger::{AccountIdentifier, Principal};
//!
//! let ledger: Principal = "ryjl3-tyaaa-aaaaa-aaaba-cai".parse().unwrap();
//! let account = AccountIdentifier::new(&ledger, None);
//!
//! assert_eq!(account, AccountIdentifier::from_hex(&account.to_hex()).unwrap());
//! ```
//!

mod account;
mod block;
mod principal;

pub use account::{AccountError, AccountIdentifier, Subaccount};
pub use block::{
    Block, GetBlocksArgs, Operation, QueryBlocksResponse, Tokens, Transaction, TransferBytes,
};
pub use principal::{Principal, PrincipalError};
use sha2::{Digest, Sha256};

/// Deterministic 64-bit fingerprint of `bytes`.
///
/// The first eight bytes of the SHA-256 digest, big-endian, with the top bit
/// cleared. The result is therefore non-negative when read as a signed 64-bit
/// integer and fits the ledger memo field.
///
/// Two inputs may share a fingerprint. Callers comparing addresses through
/// this function accept that imprecision.
pub fn stable_hash(bytes: impl AsRef<[u8]>) -> u64 {
    let digest = Sha256::digest(bytes.as_ref());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(head) & (u64::MAX >> 1)
}

pub(crate) mod serde_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        hex::decode(text.trim_start_matches("0x")).map_err(serde::de::Error::custom)
    }
}
