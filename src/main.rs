// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use clap::Parser;
use lightnode_keeper::app::config::{GlobalSettings, ProxyMode};
use lightnode_keeper::app::logging::{level_for, setup_logging};
use lightnode_keeper::domain::error::AppError;
use lightnode_keeper::infrastructure::data::sources::{load_accounts, load_proxies};
use lightnode_keeper::infrastructure::network::client::RetryingClient;
use lightnode_keeper::infrastructure::network::layeredge::LayerEdgeApi;
use lightnode_keeper::infrastructure::network::transport::HttpTransport;
use lightnode_keeper::services::keeper::{FleetScheduler, ProxyPool, Schedule, prepare_accounts};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(author, version, about = "LayerEdge light-node keeper")]
struct Cli {
    /// Path to config file (default: config.{toml,yaml,...})
    #[arg(long)]
    config: Option<String>,

    /// Proxy source (overrides config/env)
    #[arg(long, value_enum)]
    proxy_mode: Option<ProxyMode>,

    /// Newline-delimited private keys
    #[arg(long)]
    accounts: Option<String>,

    /// Newline-delimited proxy URIs
    #[arg(long)]
    proxies: Option<String>,

    /// Verbose logging
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// Emit logs as JSON
    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

impl Cli {
    fn apply(&self, settings: &mut GlobalSettings) {
        if let Some(mode) = self.proxy_mode {
            settings.proxy_mode = mode;
        }
        if let Some(path) = &self.accounts {
            settings.accounts_path = path.clone();
        }
        if let Some(path) = &self.proxies {
            settings.proxy_path = path.clone();
        }
        settings.debug |= self.debug;
        settings.json_logs |= self.json_logs;
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    let mut settings = GlobalSettings::load_with_path(cli.config.as_deref())?;
    cli.apply(&mut settings);
    setup_logging(level_for(settings.debug), settings.json_logs);

    let keys = load_accounts(Path::new(&settings.accounts_path))?;
    tracing::info!(target: "app", accounts = keys.len(), "Accounts loaded");

    let proxies = load_proxies(
        settings.proxy_mode,
        Path::new(&settings.proxy_path),
        &settings.public_proxy_list_url,
    )
    .await;
    if settings.proxy_mode.uses_proxies() && proxies.is_empty() {
        tracing::warn!(target: "app", mode = ?settings.proxy_mode, "Proxy pool is empty; all accounts connect directly");
    }

    let accounts = prepare_accounts(&keys);
    if accounts.is_empty() {
        return Err(AppError::Config(format!(
            "No valid private keys in {}",
            settings.accounts_path
        )));
    }

    let transport = Arc::new(HttpTransport::new(&settings.user_agent)?);
    let client = RetryingClient::new(transport, settings.retry_policy(), settings.settle_delay());
    let api = LayerEdgeApi::new(client, &settings.api_base_url, &settings.referral_code);
    let fleet = FleetScheduler::new(
        api,
        Arc::new(ProxyPool::new(proxies)),
        accounts,
        Schedule::default(),
        settings.fleet_timings(),
    );

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!(target: "app", "Interrupt received; shutting down");
                signal.cancel();
            }
            Err(e) => tracing::warn!(target: "app", error = %e, "Signal handler unavailable"),
        }
    });

    fleet.run(shutdown).await;
    tracing::info!(target: "app", "Keeper exited");
    Ok(())
}
