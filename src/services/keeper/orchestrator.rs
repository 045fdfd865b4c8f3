// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::time_utils::sleep_or_shutdown;
use crate::domain::account::Account;
use crate::domain::constants::{
    CHECKIN_INTERVAL_SECS, DEFAULT_RESTART_DELAY_SECS, EARNINGS_INTERVAL_SECS,
};
use crate::network::layeredge::{CheckinOutcome, LayerEdgeApi, WalletDetails};
use crate::services::keeper::node::NodeLifecycleManager;
use crate::services::keeper::proxy_pool::ProxyPool;
use crate::services::keeper::report::{Outcome, status};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{Id, JoinSet};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy)]
pub struct Schedule {
    pub earnings_every: Duration,
    pub checkin_every: Duration,
    /// Pause before a duty that ended unexpectedly is started again.
    pub duty_restart_delay: Duration,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            earnings_every: Duration::from_secs(EARNINGS_INTERVAL_SECS),
            checkin_every: Duration::from_secs(CHECKIN_INTERVAL_SECS),
            duty_restart_delay: Duration::from_secs(DEFAULT_RESTART_DELAY_SECS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Duty {
    Earnings,
    Checkin,
    Node,
}

impl Duty {
    const ALL: [Duty; 3] = [Duty::Earnings, Duty::Checkin, Duty::Node];

    fn name(&self) -> &'static str {
        match self {
            Duty::Earnings => "earnings",
            Duty::Checkin => "check-in",
            Duty::Node => "node",
        }
    }
}

/// Keeps one account active: wallet bootstrap, then the earnings, check-in and
/// node duties running side by side until shutdown.
pub struct AccountOrchestrator {
    api: LayerEdgeApi,
    account: Arc<Account>,
    proxies: Arc<ProxyPool>,
    schedule: Schedule,
}

impl AccountOrchestrator {
    pub fn new(
        api: LayerEdgeApi,
        account: Arc<Account>,
        proxies: Arc<ProxyPool>,
        schedule: Schedule,
    ) -> Self {
        Self {
            api,
            account,
            proxies,
            schedule,
        }
    }

    fn report_balance(&self, proxy: Option<&str>, details: Option<&WalletDetails>) {
        let points = details
            .map(WalletDetails::node_points)
            .unwrap_or_else(|| "N/A".to_string());
        status(
            &self.account,
            proxy,
            Outcome::Success,
            &format!("Earned {points} points"),
        );
    }

    /// Fetch wallet details until they arrive, moving to the next proxy after each failure.
    /// Returns `None` only when cancelled.
    pub async fn bootstrap(&self, shutdown: &CancellationToken) -> Option<WalletDetails> {
        let address = self.account.address();
        let mut proxy = self.proxies.assign(address);
        loop {
            let fetched = tokio::select! {
                _ = shutdown.cancelled() => return None,
                fetched = self.api.wallet_details(&self.account, proxy.as_deref()) => fetched,
            };
            match fetched {
                Ok(details) => {
                    self.report_balance(proxy.as_deref(), Some(&details));
                    return Some(details);
                }
                Err(e) => {
                    status(
                        &self.account,
                        proxy.as_deref(),
                        Outcome::Failure,
                        &format!("Failed to fetch wallet details: {e}"),
                    );
                    proxy = self.proxies.rotate(address);
                }
            }
        }
    }

    pub async fn check_in_once(&self) -> Option<CheckinOutcome> {
        let proxy = self.proxies.assign(self.account.address());
        let proxy = proxy.as_deref();
        match self.api.claim_points(&self.account, proxy).await {
            Ok(outcome) => {
                match &outcome {
                    CheckinOutcome::Claimed => {
                        status(&self.account, proxy, Outcome::Success, "Check-in successful")
                    }
                    CheckinOutcome::AlreadyClaimed => status(
                        &self.account,
                        proxy,
                        Outcome::Notice,
                        "Already checked in for this period",
                    ),
                    CheckinOutcome::Unexpected(message) => status(
                        &self.account,
                        proxy,
                        Outcome::Notice,
                        &format!("Check-in returned: {message}"),
                    ),
                }
                Some(outcome)
            }
            Err(e) => {
                status(
                    &self.account,
                    proxy,
                    Outcome::Failure,
                    &format!("Check-in failed: {e}"),
                );
                None
            }
        }
    }

    pub async fn earnings_once(&self) {
        let proxy = self.proxies.assign(self.account.address());
        let proxy = proxy.as_deref();
        match self.api.wallet_details(&self.account, proxy).await {
            Ok(details) => self.report_balance(proxy, Some(&details)),
            Err(e) => {
                tracing::debug!(target: "account", account = %self.account.masked(), error = %e, "Earnings poll failed");
                self.report_balance(proxy, None);
            }
        }
    }

    async fn earnings_duty(&self, shutdown: &CancellationToken) {
        while sleep_or_shutdown(shutdown, self.schedule.earnings_every).await {
            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = self.earnings_once() => {}
            }
        }
    }

    async fn checkin_duty(&self, shutdown: &CancellationToken) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = self.check_in_once() => {}
            }
            if !sleep_or_shutdown(shutdown, self.schedule.checkin_every).await {
                return;
            }
        }
    }

    async fn run_duty(&self, duty: Duty, shutdown: CancellationToken) {
        match duty {
            Duty::Earnings => self.earnings_duty(&shutdown).await,
            Duty::Checkin => self.checkin_duty(&shutdown).await,
            Duty::Node => {
                NodeLifecycleManager::new(
                    self.api.clone(),
                    self.account.clone(),
                    self.proxies.clone(),
                )
                .run(shutdown)
                .await
            }
        }
    }

    fn spawn_duty(
        self: &Arc<Self>,
        duties: &mut JoinSet<Duty>,
        running: &mut HashMap<Id, Duty>,
        duty: Duty,
        delay: Duration,
        shutdown: &CancellationToken,
    ) {
        let this = self.clone();
        let token = shutdown.child_token();
        let handle = duties.spawn(async move {
            if sleep_or_shutdown(&token, delay).await {
                this.run_duty(duty, token).await;
            }
            duty
        });
        running.insert(handle.id(), duty);
    }

    /// Bootstrap, then supervise the three duties. A duty that ends or panics
    /// is restarted on its own; the others keep running.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        if self.bootstrap(&shutdown).await.is_none() {
            return;
        }

        let mut duties: JoinSet<Duty> = JoinSet::new();
        let mut running: HashMap<Id, Duty> = HashMap::new();
        for duty in Duty::ALL {
            self.spawn_duty(&mut duties, &mut running, duty, Duration::ZERO, &shutdown);
        }

        loop {
            let joined = tokio::select! {
                _ = shutdown.cancelled() => break,
                joined = duties.join_next_with_id(), if !duties.is_empty() => joined,
            };
            let Some(joined) = joined else { break };
            let (id, panic) = match joined {
                Ok((id, _)) => (id, None),
                Err(e) => (e.id(), Some(e.to_string())),
            };
            let Some(duty) = running.remove(&id) else {
                continue;
            };
            if shutdown.is_cancelled() {
                break;
            }
            tracing::warn!(
                target: "account",
                account = %self.account.masked(),
                duty = duty.name(),
                error = panic.as_deref().unwrap_or("ended"),
                "Duty stopped unexpectedly; restarting"
            );
            self.spawn_duty(
                &mut duties,
                &mut running,
                duty,
                self.schedule.duty_restart_delay,
                &shutdown,
            );
        }

        duties.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::constants::MSG_CHECKIN_CLAIMED;
    use crate::network::layeredge::test_support::{account, api};
    use crate::network::transport::HttpMethod;
    use crate::network::transport::mock::{Scripted, ScriptedTransport};
    use serde_json::json;

    fn orchestrator(
        transport: Arc<ScriptedTransport>,
        proxies: ProxyPool,
        schedule: Schedule,
    ) -> Arc<AccountOrchestrator> {
        Arc::new(AccountOrchestrator::new(
            api(transport),
            Arc::new(account()),
            Arc::new(proxies),
            schedule,
        ))
    }

    fn wallet_ok() -> Scripted {
        Scripted::Reply(200, json!({"data": {"nodePoints": 15}}))
    }

    #[tokio::test(start_paused = true)]
    async fn bootstrap_rotates_proxy_after_each_failure() {
        let mut replies = vec![Scripted::Unreachable; 5];
        replies.push(wallet_ok());
        let transport = Arc::new(ScriptedTransport::new().route(
            HttpMethod::Get,
            "/wallet-details/",
            replies,
        ));
        let pool = ProxyPool::new(vec!["10.0.0.1:80".to_string(), "10.0.0.2:80".to_string()]);
        let orchestrator = orchestrator(transport.clone(), pool, Schedule::default());

        let details = orchestrator
            .bootstrap(&CancellationToken::new())
            .await
            .expect("details");

        assert_eq!(details.node_points(), "15");
        let proxies: Vec<_> = transport
            .sent()
            .into_iter()
            .map(|s| s.proxy.unwrap_or_default())
            .collect();
        assert_eq!(proxies.len(), 6);
        assert!(proxies[..5].iter().all(|p| p == "http://10.0.0.1:80"));
        assert_eq!(proxies[5], "http://10.0.0.2:80");
    }

    #[tokio::test(start_paused = true)]
    async fn bootstrap_returns_none_when_cancelled() {
        let transport = Arc::new(ScriptedTransport::new().route(
            HttpMethod::Get,
            "/wallet-details/",
            vec![Scripted::Unreachable],
        ));
        let orchestrator = orchestrator(transport, ProxyPool::empty(), Schedule::default());
        let shutdown = CancellationToken::new();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(120)).await;
            trigger.cancel();
        });
        assert!(orchestrator.bootstrap(&shutdown).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn check_in_reports_already_claimed() {
        let transport = Arc::new(ScriptedTransport::new().route(
            HttpMethod::Post,
            "/claim-node-points",
            vec![Scripted::Reply(405, json!({}))],
        ));
        let orchestrator = orchestrator(transport.clone(), ProxyPool::empty(), Schedule::default());
        assert_eq!(
            orchestrator.check_in_once().await,
            Some(CheckinOutcome::AlreadyClaimed)
        );
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn duties_follow_their_schedules() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .route(HttpMethod::Get, "/wallet-details/", vec![wallet_ok()])
                .route(
                    HttpMethod::Post,
                    "/claim-node-points",
                    vec![Scripted::Reply(200, json!({"message": MSG_CHECKIN_CLAIMED}))],
                ),
        );
        let schedule = Schedule {
            earnings_every: Duration::from_secs(3 * 3600),
            checkin_every: Duration::from_secs(3600),
            duty_restart_delay: Duration::from_secs(10),
        };
        let orchestrator = orchestrator(transport.clone(), ProxyPool::empty(), schedule);
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(orchestrator.run(shutdown.clone()));

        // Check-ins at ~0h, ~1h and ~2h; the first earnings poll is due at 3h.
        tokio::time::sleep(Duration::from_secs(2 * 3600 + 1800)).await;
        shutdown.cancel();
        handle.await.expect("orchestrator task");

        assert_eq!(transport.count(HttpMethod::Post, "/claim-node-points"), 3);
        assert_eq!(transport.count(HttpMethod::Get, "/wallet-details/"), 1);
        assert!(transport.count(HttpMethod::Get, "/node-status/") >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_node_duty_restarts_while_check_in_continues() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .route(HttpMethod::Get, "/wallet-details/", vec![wallet_ok()])
                .route(
                    HttpMethod::Post,
                    "/claim-node-points",
                    vec![Scripted::Reply(200, json!({"message": MSG_CHECKIN_CLAIMED}))],
                )
                .route(HttpMethod::Get, "/node-status/", vec![Scripted::Panic]),
        );
        let schedule = Schedule {
            earnings_every: Duration::from_secs(24 * 3600),
            checkin_every: Duration::from_secs(60),
            duty_restart_delay: Duration::from_secs(10),
        };
        let orchestrator = orchestrator(transport.clone(), ProxyPool::empty(), schedule);
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(orchestrator.run(shutdown.clone()));

        tokio::time::sleep(Duration::from_secs(300)).await;
        shutdown.cancel();
        handle.await.expect("supervisor survives duty panics");

        // Each node restart costs the 10 s delay plus the 3 s settle.
        assert!(transport.count(HttpMethod::Get, "/node-status/") >= 10);
        assert!(transport.count(HttpMethod::Post, "/claim-node-points") >= 4);
        assert_eq!(transport.count(HttpMethod::Get, "/wallet-details/"), 1);
    }
}
