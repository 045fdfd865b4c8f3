// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::time_utils::{current_unix, format_hms, sleep_or_shutdown};
use crate::domain::account::Account;
use crate::domain::constants::{NODE_FALLBACK_WAIT_SECS, NODE_RENEW_SETTLE_SECS, NODE_SESSION_SECS};
use crate::network::layeredge::LayerEdgeApi;
use crate::services::keeper::proxy_pool::ProxyPool;
use crate::services::keeper::report::{Outcome, status};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Node session as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Unconnected,
    /// `start_timestamp` is in UNIX seconds.
    Connected { start_timestamp: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodePlan {
    Start,
    /// Session expired: stop, then start again.
    Renew,
    Wait(Duration),
}

/// Time left in a session started at `start_timestamp`, `None` once it has expired.
pub fn remaining(start_timestamp: u64, now: u64) -> Option<Duration> {
    let deadline = start_timestamp.saturating_add(NODE_SESSION_SECS);
    (now < deadline).then(|| Duration::from_secs(deadline - now))
}

pub fn plan(state: NodeState, now: u64) -> NodePlan {
    match state {
        NodeState::Unconnected => NodePlan::Start,
        NodeState::Connected { start_timestamp } => match remaining(start_timestamp, now) {
            Some(wait) => NodePlan::Wait(wait),
            None => NodePlan::Renew,
        },
    }
}

pub struct NodeLifecycleManager {
    api: LayerEdgeApi,
    account: Arc<Account>,
    proxies: Arc<ProxyPool>,
    clock: fn() -> u64,
}

impl NodeLifecycleManager {
    pub fn new(api: LayerEdgeApi, account: Arc<Account>, proxies: Arc<ProxyPool>) -> Self {
        Self {
            api,
            account,
            proxies,
            clock: current_unix,
        }
    }

    pub fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.clock = clock;
        self
    }

    fn fallback() -> Duration {
        Duration::from_secs(NODE_FALLBACK_WAIT_SECS)
    }

    /// Evaluate the node once and return how long to wait before the next evaluation.
    pub async fn tick(&self) -> Duration {
        let proxy = self.proxies.assign(self.account.address());
        let proxy = proxy.as_deref();

        let state = match self.api.node_status(&self.account, proxy).await {
            Ok(state) => state,
            Err(e) => {
                status(
                    &self.account,
                    proxy,
                    Outcome::Failure,
                    &format!("Failed to fetch node status: {e}"),
                );
                return Self::fallback();
            }
        };

        match plan(state, (self.clock)()) {
            NodePlan::Wait(wait) => {
                status(
                    &self.account,
                    proxy,
                    Outcome::Notice,
                    &format!("Node already connected - reconnecting in {}", format_hms(wait)),
                );
                wait
            }
            NodePlan::Start => self.start(proxy).await,
            NodePlan::Renew => {
                if let Err(e) = self.api.stop_node(&self.account, proxy).await {
                    status(
                        &self.account,
                        proxy,
                        Outcome::Failure,
                        &format!("Failed to stop node: {e}"),
                    );
                    return Self::fallback();
                }
                status(
                    &self.account,
                    proxy,
                    Outcome::Success,
                    "Node disconnected - reconnecting...",
                );
                tokio::time::sleep(Duration::from_secs(NODE_RENEW_SETTLE_SECS)).await;
                self.start(proxy).await
            }
        }
    }

    async fn start(&self, proxy: Option<&str>) -> Duration {
        let started = match self.api.start_node(&self.account, proxy).await {
            Ok(ts) => ts,
            Err(e) => {
                status(
                    &self.account,
                    proxy,
                    Outcome::Failure,
                    &format!("Failed to start node: {e}"),
                );
                return Self::fallback();
            }
        };
        match remaining(started, (self.clock)()) {
            Some(wait) => {
                status(
                    &self.account,
                    proxy,
                    Outcome::Success,
                    &format!("Node connected - reconnecting in {}", format_hms(wait)),
                );
                wait
            }
            None => {
                status(
                    &self.account,
                    proxy,
                    Outcome::Notice,
                    &format!("Node start reported an expired session ({started}), re-checking later"),
                );
                Self::fallback()
            }
        }
    }

    pub async fn run(&self, shutdown: CancellationToken) {
        loop {
            let wait = tokio::select! {
                _ = shutdown.cancelled() => return,
                wait = self.tick() => wait,
            };
            if !sleep_or_shutdown(&shutdown, wait).await {
                return;
            }
        }
    }
}
