// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::app::config::ProxyMode;
use crate::common::error::AppError;
use crate::common::parsing::parse_line_list;
use crate::common::retry::retry_async;
use crate::domain::constants::PROXY_LIST_TIMEOUT_SECS;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;

/// Read the newline-delimited private-key file.
pub fn load_accounts(path: &Path) -> Result<Vec<String>, AppError> {
    let body = std::fs::read_to_string(path).map_err(|e| {
        AppError::Config(format!("Accounts file {} unreadable: {}", path.display(), e))
    })?;
    Ok(parse_line_list(&body))
}

async fn download_proxy_list(url: &str) -> Result<String, AppError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(PROXY_LIST_TIMEOUT_SECS))
        .build()
        .map_err(|e| AppError::Initialization(format!("HTTP client build failed: {e}")))?;

    retry_async(
        |attempt| {
            let client = client.clone();
            async move {
                let resp = client
                    .get(url)
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .map_err(|e| AppError::Connection(format!("{url}: {e}")))?;
                let body = resp
                    .text()
                    .await
                    .map_err(|e| AppError::Connection(format!("{url}: body read failed: {e}")))?;
                tracing::debug!(target: "sources", attempt, bytes = body.len(), "Proxy list downloaded");
                Ok::<_, AppError>(body)
            }
        },
        3,
        Duration::from_secs(1),
    )
    .await
}

/// Candidate proxies for `mode`. Any failure degrades to an empty list so the
/// fleet falls back to direct connections.
pub async fn load_proxies(mode: ProxyMode, path: &Path, public_url: &str) -> Vec<String> {
    let loaded = match mode {
        ProxyMode::None => return Vec::new(),
        ProxyMode::PublicList => match download_proxy_list(public_url).await {
            Ok(body) => {
                if let Err(e) = std::fs::write(path, &body) {
                    tracing::warn!(
                        target: "sources",
                        path = %path.display(),
                        error = %e,
                        "Could not save downloaded proxy list"
                    );
                }
                Ok(parse_line_list(&body))
            }
            Err(e) => Err(e),
        },
        ProxyMode::PrivateFile => std::fs::read_to_string(path)
            .map(|body| parse_line_list(&body))
            .map_err(|e| {
                AppError::Config(format!("Proxy file {} unreadable: {}", path.display(), e))
            }),
    };

    match loaded {
        Ok(proxies) if proxies.is_empty() => {
            tracing::warn!(target: "sources", ?mode, "No proxies found; using direct connections");
            proxies
        }
        Ok(proxies) => {
            tracing::info!(target: "sources", ?mode, count = proxies.len(), "Proxies loaded");
            proxies
        }
        Err(e) => {
            tracing::warn!(target: "sources", ?mode, error = %e, "Proxy load failed; using direct connections");
            Vec::new()
        }
    }
}
