// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error("Connection failed to endpoint: {0}")]
    Connection(String),

    #[error("API error: {endpoint} responded with {status}")]
    ApiCall { endpoint: String, status: u16 },

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Invalid private key {0}")]
    InvalidKey(String),

    #[error("Unexpected {endpoint} response: {reason}")]
    Decode { endpoint: String, reason: String },

    #[error("{endpoint} failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        endpoint: String,
        attempts: usize,
        last: String,
    },

    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}
