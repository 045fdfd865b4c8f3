// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::common::time_utils::current_millis;
use crate::domain::account::Account;
use alloy::signers::SignerSync;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedPayload {
    pub sign: String,
    pub timestamp: u64,
    #[serde(rename = "walletAddress", skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeAction {
    Activation,
    Deactivation,
}

impl NodeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeAction::Activation => "activation",
            NodeAction::Deactivation => "deactivation",
        }
    }
}

pub fn checkin_message(address: &str, timestamp_ms: u64) -> String {
    format!("I am claiming my daily node point for {address} at {timestamp_ms}")
}

pub fn node_action_message(action: NodeAction, address: &str, timestamp_ms: u64) -> String {
    format!("Node {} request for {address} at {timestamp_ms}", action.as_str())
}

/// EIP-191 personal-message signature as `0x`-prefixed `r || s || v` with `v` in {27, 28}.
fn sign_text(account: &Account, message: &str) -> Result<String, AppError> {
    let signature = account
        .signer()
        .sign_message_sync(message.as_bytes())
        .map_err(|e| AppError::Signing(format!("{}: {}", account.masked(), e)))?;

    let mut sig_bytes = [0u8; 65];
    sig_bytes[..32].copy_from_slice(&signature.r().to_be_bytes::<32>());
    sig_bytes[32..64].copy_from_slice(&signature.s().to_be_bytes::<32>());
    sig_bytes[64] = 27 + signature.v() as u8;
    Ok(format!("0x{}", hex::encode(sig_bytes)))
}

pub fn sign_checkin(account: &Account) -> Result<SignedPayload, AppError> {
    sign_checkin_at(account, current_millis())
}

pub fn sign_checkin_at(account: &Account, timestamp_ms: u64) -> Result<SignedPayload, AppError> {
    let address = account.checksum();
    let sign = sign_text(account, &checkin_message(&address, timestamp_ms))?;
    Ok(SignedPayload {
        sign,
        timestamp: timestamp_ms,
        wallet_address: Some(address),
    })
}

pub fn sign_node_action(account: &Account, action: NodeAction) -> Result<SignedPayload, AppError> {
    sign_node_action_at(account, action, current_millis())
}

pub fn sign_node_action_at(
    account: &Account,
    action: NodeAction,
    timestamp_ms: u64,
) -> Result<SignedPayload, AppError> {
    let address = account.checksum();
    let sign = sign_text(account, &node_action_message(action, &address, timestamp_ms))?;
    Ok(SignedPayload {
        sign,
        timestamp: timestamp_ms,
        wallet_address: None,
    })
}
