// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::retry::RetryPolicy;
use crate::domain::constants;
use crate::domain::error::AppError;
use crate::services::keeper::fleet::FleetTimings;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Where the proxy pool comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ProxyMode {
    /// Download the public list and overwrite the proxy file with it.
    #[serde(alias = "public_list", alias = "public")]
    PublicList,
    /// Read proxies from the local proxy file.
    #[serde(alias = "private_file", alias = "private")]
    PrivateFile,
    /// Connect directly.
    #[default]
    None,
}

impl ProxyMode {
    pub fn uses_proxies(&self) -> bool {
        !matches!(self, ProxyMode::None)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GlobalSettings {
    // General
    #[serde(default = "default_false")]
    pub debug: bool,
    #[serde(default = "default_false")]
    pub json_logs: bool,

    // Sources
    #[serde(default = "default_accounts_path")]
    pub accounts_path: String,
    #[serde(default = "default_proxy_path")]
    pub proxy_path: String,
    #[serde(default)]
    pub proxy_mode: ProxyMode,
    #[serde(default = "default_public_proxy_list_url")]
    pub public_proxy_list_url: String,

    // Remote service
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_referral_code")]
    pub referral_code: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    // Timing
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: usize,
    #[serde(default = "default_retry_interval_secs")]
    pub retry_interval_secs: u64,
    #[serde(default = "default_settle_delay_secs")]
    pub settle_delay_secs: u64,
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,
    #[serde(default = "default_restart_delay_secs")]
    pub restart_delay_secs: u64,
}

// Defaults
fn default_false() -> bool {
    false
}
fn default_accounts_path() -> String {
    "accounts.txt".to_string()
}
fn default_proxy_path() -> String {
    "proxy.txt".to_string()
}
fn default_public_proxy_list_url() -> String {
    constants::PUBLIC_PROXY_LIST_URL.to_string()
}
fn default_api_base_url() -> String {
    constants::API_BASE_URL.to_string()
}
fn default_referral_code() -> String {
    constants::DEFAULT_REFERRAL_CODE.to_string()
}
fn default_user_agent() -> String {
    constants::DEFAULT_USER_AGENT.to_string()
}
fn default_retry_attempts() -> usize {
    constants::DEFAULT_RETRY_ATTEMPTS
}
fn default_retry_interval_secs() -> u64 {
    constants::DEFAULT_RETRY_INTERVAL_SECS
}
fn default_settle_delay_secs() -> u64 {
    constants::DEFAULT_SETTLE_DELAY_SECS
}
fn default_heartbeat_secs() -> u64 {
    constants::DEFAULT_HEARTBEAT_SECS
}
fn default_restart_delay_secs() -> u64 {
    constants::DEFAULT_RESTART_DELAY_SECS
}

impl GlobalSettings {
    pub fn load_with_path(path: Option<&str>) -> Result<Self, AppError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let mut builder = Config::builder();
        if let Some(selected_path) = path {
            builder = builder.add_source(File::from(Path::new(selected_path)).required(true));
        } else {
            builder = builder.add_source(File::with_name("config").required(false));
        }
        // Precedence: CLI (in main) > env/.env > config file.
        builder = builder.add_source(Environment::default());

        let settings: GlobalSettings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.api_base_url.trim().is_empty() {
            return Err(AppError::Config("API_BASE_URL is empty".to_string()));
        }
        url::Url::parse(&self.api_base_url)
            .map_err(|e| AppError::Config(format!("Invalid api_base_url: {e}")))?;
        if self.proxy_mode == ProxyMode::PublicList {
            url::Url::parse(&self.public_proxy_list_url)
                .map_err(|e| AppError::Config(format!("Invalid public_proxy_list_url: {e}")))?;
        }
        if self.referral_code.trim().is_empty() {
            return Err(AppError::Config("REFERRAL_CODE is empty".to_string()));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.retry_attempts.max(1),
            interval: Duration::from_secs(self.retry_interval_secs),
        }
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }

    pub fn fleet_timings(&self) -> FleetTimings {
        FleetTimings {
            heartbeat: Duration::from_secs(self.heartbeat_secs.max(1)),
            restart_delay: Duration::from_secs(self.restart_delay_secs.max(1)),
        }
    }
}
