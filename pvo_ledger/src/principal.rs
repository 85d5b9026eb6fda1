// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

const MAX_PRINCIPAL_LENGTH: usize = 29;
const CHECKSUM_LENGTH: usize = 4;
const GROUP_LENGTH: usize = 5;
const BASE32_ALPHABET: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz234567";

/// Errors returned when parsing or building a [`Principal`]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PrincipalError {
    #[error("principal is longer than {MAX_PRINCIPAL_LENGTH} bytes: {length}")]
    TooLong { length: usize },
    #[error("principal text contains a character outside the base32 alphabet")]
    InvalidBase32,
    #[error("principal text is too short")]
    TooShort,
    #[error("principal checksum does not match")]
    InvalidChecksum,
    #[error("principal text is not in canonical form, expected {expected}")]
    NotCanonical { expected: String },
}

/// Identity of a caller or of a canister.
///
/// The textual form is the CRC32 of the raw bytes followed by the bytes
/// themselves, base32 encoded and grouped by five characters.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Principal(Vec<u8>);

impl Principal {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, PrincipalError> {
        if bytes.len() > MAX_PRINCIPAL_LENGTH {
            return Err(PrincipalError::TooLong {
                length: bytes.len(),
            });
        }
        Ok(Self(bytes.to_vec()))
    }

    /// The identity of unauthenticated callers.
    pub fn anonymous() -> Self {
        Self(vec![0x04])
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn from_text(text: &str) -> Result<Self, PrincipalError> {
        let normalized: String = text
            .chars()
            .filter(|c| *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let decoded = base32_decode(&normalized).ok_or(PrincipalError::InvalidBase32)?;
        if decoded.len() < CHECKSUM_LENGTH {
            return Err(PrincipalError::TooShort);
        }
        let (checksum, bytes) = decoded.split_at(CHECKSUM_LENGTH);
        if checksum != crc32fast::hash(bytes).to_be_bytes() {
            return Err(PrincipalError::InvalidChecksum);
        }
        let principal = Self::from_slice(bytes)?;

        let expected = principal.to_text();
        if expected != text.to_ascii_lowercase() {
            return Err(PrincipalError::NotCanonical { expected });
        }
        Ok(principal)
    }

    pub fn to_text(&self) -> String {
        let mut bytes = crc32fast::hash(&self.0).to_be_bytes().to_vec();
        bytes.extend_from_slice(&self.0);
        let encoded = base32_encode(&bytes);

        encoded
            .as_bytes()
            .chunks(GROUP_LENGTH)
            .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
            .collect::<Vec<_>>()
            .join("-")
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Principal({})", self.to_text())
    }
}

impl FromStr for Principal {
    type Err = PrincipalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_text(s)
    }
}

impl Serialize for Principal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_text())
    }
}

impl<'de> Deserialize<'de> for Principal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_text(&text).map_err(serde::de::Error::custom)
    }
}

// RFC 4648 alphabet, lowercase, no padding
fn base32_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len().div_ceil(5) * 8);
    let mut buffer: u32 = 0;
    let mut bits = 0u32;
    for &byte in data {
        buffer = ((buffer << 8) | byte as u32) & 0xffff;
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(BASE32_ALPHABET[((buffer >> bits) & 0x1f) as usize] as char);
        }
    }
    if bits > 0 {
        out.push(BASE32_ALPHABET[((buffer << (5 - bits)) & 0x1f) as usize] as char);
    }
    out
}

fn base32_decode(text: &str) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len() * 5 / 8);
    let mut buffer: u32 = 0;
    let mut bits = 0u32;
    for c in text.bytes() {
        let value = BASE32_ALPHABET.iter().position(|&a| a == c)? as u32;
        buffer = ((buffer << 5) | value) & 0xffff;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((buffer >> bits) as u8);
        }
    }
    Some(out)
}
