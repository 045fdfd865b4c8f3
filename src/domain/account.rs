// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::error::AppError;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use std::fmt;
use std::str::FromStr;

/// A private key and the address derived from it.
#[derive(Clone)]
pub struct Account {
    signer: PrivateKeySigner,
    address: Address,
}

impl Account {
    pub fn from_key(raw: &str) -> Result<Self, AppError> {
        let trimmed = raw.trim();
        let signer = PrivateKeySigner::from_str(trimmed)
            .map_err(|e| AppError::InvalidKey(format!("{}: {}", mask(trimmed), e)))?;
        Ok(Self::from_signer(signer))
    }

    pub fn from_signer(signer: PrivateKeySigner) -> Self {
        let address = signer.address();
        Self { signer, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// EIP-55 rendering used in URLs and signed messages.
    pub fn checksum(&self) -> String {
        self.address.to_checksum(None)
    }

    pub fn masked(&self) -> String {
        mask(&self.checksum())
    }

    pub(crate) fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Keep the first and last six characters, hide the middle.
pub fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 6..].iter().collect();
    format!("{head}******{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const HARDHAT_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn derives_checksummed_address_from_key() {
        let account = Account::from_key(HARDHAT_KEY).expect("valid key");
        assert_eq!(
            account.checksum(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );
        let unprefixed = Account::from_key(HARDHAT_KEY.trim_start_matches("0x")).expect("valid");
        assert_eq!(unprefixed.address(), account.address());
    }

    #[test]
    fn malformed_key_is_rejected_without_leaking_it() {
        let err = Account::from_key("0xnot-a-key-at-all-but-long-enough").unwrap_err();
        match err {
            AppError::InvalidKey(msg) => assert!(!msg.contains("not-a-key-at-all")),
            other => panic!("Unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn mask_keeps_edges_only() {
        assert_eq!(
            mask("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
            "0xf39F******b92266"
        );
        assert_eq!(mask("short"), "*****");
    }
}
