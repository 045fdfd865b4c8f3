// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::account::Account;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Notice,
    Failure,
}

/// One status line for an account, tagged with its masked address and proxy.
pub fn status(account: &Account, proxy: Option<&str>, outcome: Outcome, message: &str) {
    let masked = account.masked();
    let proxy = proxy.unwrap_or("direct");
    match outcome {
        Outcome::Success => tracing::info!(target: "account", account = %masked, proxy, "{message}"),
        Outcome::Notice => tracing::warn!(target: "account", account = %masked, proxy, "{message}"),
        Outcome::Failure => tracing::error!(target: "account", account = %masked, proxy, "{message}"),
    }
}
