// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::common::time_utils::sleep_or_shutdown;
use crate::domain::account::{Account, mask};
use crate::domain::constants::{DEFAULT_HEARTBEAT_SECS, DEFAULT_RESTART_DELAY_SECS};
use crate::network::layeredge::LayerEdgeApi;
use crate::services::keeper::orchestrator::{AccountOrchestrator, Schedule};
use crate::services::keeper::proxy_pool::ProxyPool;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{Id, JoinSet};
use tokio_util::sync::CancellationToken;

/// Derive accounts from raw keys. Invalid keys are logged (masked) and skipped;
/// keys resolving to an address already seen are scheduled once.
pub fn prepare_accounts(keys: &[String]) -> Vec<Arc<Account>> {
    let mut seen = HashSet::new();
    let mut accounts = Vec::with_capacity(keys.len());
    for key in keys {
        match Account::from_key(key) {
            Ok(account) => {
                if seen.insert(account.address()) {
                    accounts.push(Arc::new(account));
                } else {
                    tracing::warn!(
                        target: "fleet",
                        account = %account.masked(),
                        "Duplicate account skipped"
                    );
                }
            }
            Err(e) => {
                tracing::error!(
                    target: "fleet",
                    account = %mask(key.trim()),
                    error = %e,
                    "Address derivation failed; check the private key"
                );
            }
        }
    }
    accounts
}

#[derive(Debug, Clone, Copy)]
pub struct FleetTimings {
    pub heartbeat: Duration,
    pub restart_delay: Duration,
}

impl Default for FleetTimings {
    fn default() -> Self {
        Self {
            heartbeat: Duration::from_secs(DEFAULT_HEARTBEAT_SECS),
            restart_delay: Duration::from_secs(DEFAULT_RESTART_DELAY_SECS),
        }
    }
}

pub struct FleetScheduler {
    api: LayerEdgeApi,
    proxies: Arc<ProxyPool>,
    accounts: Vec<Arc<Account>>,
    schedule: Schedule,
    timings: FleetTimings,
}

impl FleetScheduler {
    pub fn new(
        api: LayerEdgeApi,
        proxies: Arc<ProxyPool>,
        accounts: Vec<Arc<Account>>,
        schedule: Schedule,
        timings: FleetTimings,
    ) -> Self {
        Self {
            api,
            proxies,
            accounts,
            schedule,
            timings,
        }
    }

    fn spawn_account(
        &self,
        set: &mut JoinSet<()>,
        running: &mut HashMap<Id, Arc<Account>>,
        account: Arc<Account>,
        delay: Duration,
        shutdown: &CancellationToken,
    ) {
        let orchestrator = Arc::new(AccountOrchestrator::new(
            self.api.clone(),
            account.clone(),
            self.proxies.clone(),
            self.schedule,
        ));
        let token = shutdown.child_token();
        let handle = set.spawn(async move {
            if sleep_or_shutdown(&token, delay).await {
                orchestrator.run(token).await;
            }
        });
        running.insert(handle.id(), account);
    }

    /// One aggregate run over every account plus the liveness duty. Returns
    /// `Ok` on shutdown.
    pub async fn run_cycle(&self, shutdown: &CancellationToken) -> Result<(), AppError> {
        if self.accounts.is_empty() {
            return Err(AppError::Config("No valid accounts to schedule".to_string()));
        }

        let mut set = JoinSet::new();
        let mut running = HashMap::new();
        for account in &self.accounts {
            self.spawn_account(&mut set, &mut running, account.clone(), Duration::ZERO, shutdown);
        }

        let cycle = shutdown.child_token();
        let heartbeat = tokio::spawn(heartbeat(
            self.accounts.len(),
            self.timings.heartbeat,
            cycle.clone(),
        ));

        let outcome = loop {
            let joined = tokio::select! {
                _ = shutdown.cancelled() => break Ok(()),
                joined = set.join_next_with_id() => joined,
            };
            let Some(joined) = joined else {
                break Err(AppError::Initialization(
                    "All account tasks exited".to_string(),
                ));
            };
            let (id, error) = match joined {
                Ok((id, ())) => (id, None),
                Err(e) => (e.id(), Some(e.to_string())),
            };
            let Some(account) = running.remove(&id) else {
                continue;
            };
            if shutdown.is_cancelled() {
                break Ok(());
            }
            tracing::error!(
                target: "fleet",
                account = %account.masked(),
                error = error.as_deref().unwrap_or("ended"),
                "Account task stopped; restarting it alone"
            );
            self.spawn_account(
                &mut set,
                &mut running,
                account,
                self.timings.restart_delay,
                shutdown,
            );
        };

        cycle.cancel();
        set.shutdown().await;
        if let Err(e) = heartbeat.await {
            tracing::warn!(target: "fleet", error = %e, "Heartbeat task join failed");
        }
        outcome
    }

    /// Run aggregate cycles until shutdown, pausing `restart_delay` after a failed cycle.
    pub async fn run(&self, shutdown: CancellationToken) {
        tracing::info!(
            target: "fleet",
            accounts = self.accounts.len(),
            proxies = self.proxies.len(),
            "Fleet starting"
        );
        loop {
            if let Err(e) = self.run_cycle(&shutdown).await {
                tracing::error!(target: "fleet", error = %e, "Fleet cycle failed");
            }
            if shutdown.is_cancelled()
                || !sleep_or_shutdown(&shutdown, self.timings.restart_delay).await
            {
                break;
            }
        }
        tracing::info!(target: "fleet", "Fleet stopped");
    }
}

async fn heartbeat(accounts: usize, every: Duration, shutdown: CancellationToken) {
    while sleep_or_shutdown(&shutdown, every).await {
        tracing::info!(
            target: "fleet",
            accounts,
            "All accounts processed, waiting for next cycle"
        );
    }
}
