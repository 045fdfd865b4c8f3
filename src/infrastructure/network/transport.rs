// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::error::AppError;
use crate::domain::constants::{
    ACCEPT_LANGUAGE, CONNECT_TIMEOUT_SECS, DASHBOARD_ORIGIN, MAX_CACHED_CLIENTS,
};
use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Proxy};
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: HttpMethod,
    pub url: String,
    pub body: Option<Value>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// One HTTP exchange, optionally routed through a proxy.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn send(
        &self,
        request: &OutboundRequest,
        proxy: Option<&str>,
    ) -> Result<RawResponse, AppError>;
}

/// reqwest-backed transport. Keeps one client per distinct proxy so
/// connections are reused across accounts sharing a proxy. The cache holds at
/// most `client_limit` clients; a full cache evicts an arbitrary entry.
pub struct HttpTransport {
    headers: HeaderMap,
    clients: DashMap<Option<String>, Client>,
    client_limit: usize,
}

impl HttpTransport {
    pub fn new(user_agent: &str) -> Result<Self, AppError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static(ACCEPT_LANGUAGE),
        );
        headers.insert(header::ORIGIN, HeaderValue::from_static(DASHBOARD_ORIGIN));
        headers.insert(
            header::REFERER,
            HeaderValue::from_str(&format!("{DASHBOARD_ORIGIN}/"))
                .map_err(|e| AppError::Config(format!("Invalid referer: {e}")))?,
        );
        headers.insert("Sec-Fetch-Dest", HeaderValue::from_static("empty"));
        headers.insert("Sec-Fetch-Mode", HeaderValue::from_static("cors"));
        headers.insert("Sec-Fetch-Site", HeaderValue::from_static("same-site"));
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_str(user_agent)
                .map_err(|e| AppError::Config(format!("Invalid user_agent: {e}")))?,
        );
        Ok(Self {
            headers,
            clients: DashMap::new(),
            client_limit: MAX_CACHED_CLIENTS,
        })
    }

    pub fn with_client_limit(mut self, limit: usize) -> Self {
        self.client_limit = limit.max(1);
        self
    }

    fn client_for(&self, proxy: Option<&str>) -> Result<Client, AppError> {
        let key = proxy.map(ToString::to_string);
        if let Some(client) = self.clients.get(&key) {
            return Ok(client.clone());
        }

        let mut builder = Client::builder()
            .default_headers(self.headers.clone())
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS));
        if let Some(url) = proxy {
            let proxy = Proxy::all(url)
                .map_err(|e| AppError::Connection(format!("Invalid proxy {url}: {e}")))?;
            builder = builder.proxy(proxy);
        }
        let client = builder
            .build()
            .map_err(|e| AppError::Initialization(format!("HTTP client build failed: {e}")))?;
        self.evict_until_below_limit();
        self.clients.insert(key, client.clone());
        Ok(client)
    }

    fn evict_until_below_limit(&self) {
        while self.clients.len() >= self.client_limit {
            // Shard read guards must be released before `remove` takes a write lock.
            let victim = self.clients.iter().next().map(|entry| entry.key().clone());
            match victim {
                Some(key) => {
                    self.clients.remove(&key);
                    tracing::debug!(target: "transport", proxy = ?key, "Evicted cached HTTP client");
                }
                None => break,
            }
        }
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn send(
        &self,
        request: &OutboundRequest,
        proxy: Option<&str>,
    ) -> Result<RawResponse, AppError> {
        let client = self.client_for(proxy)?;
        let mut builder = match request.method {
            HttpMethod::Get => client.get(&request.url),
            HttpMethod::Post => client.post(&request.url),
        }
        .timeout(request.timeout);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| AppError::Connection(format!("{}: {}", request.url, e)))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| AppError::Connection(format!("{}: body read failed: {}", request.url, e)))?;
        Ok(RawResponse { status, body })
    }
}
