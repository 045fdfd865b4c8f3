// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

// =============================================================================
// REMOTE SERVICE
// =============================================================================

pub const API_BASE_URL: &str = "https://referralapi.layeredge.io/api";
pub const DASHBOARD_ORIGIN: &str = "https://dashboard.layeredge.io";
pub const DEFAULT_REFERRAL_CODE: &str = "tHc67a1g";
pub const PUBLIC_PROXY_LIST_URL: &str =
    "https://raw.githubusercontent.com/monosans/proxy-list/main/proxies/all.txt";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";
pub const ACCEPT_LANGUAGE: &str = "id-ID,id;q=0.9,en-US;q=0.8,en;q=0.7";

// Literal `message` values the service returns on success
pub const MSG_CHECKIN_CLAIMED: &str = "node points claimed successfully";
pub const MSG_NODE_ACTION_OK: &str = "node action executed successfully";
pub const MSG_NODE_STATUS: &str = "node status";

// =============================================================================
// RETRY & TIMEOUTS
// =============================================================================

pub const DEFAULT_RETRY_ATTEMPTS: usize = 5;
pub const DEFAULT_RETRY_INTERVAL_SECS: u64 = 5;
/// Courtesy pause before the first attempt of every call.
pub const DEFAULT_SETTLE_DELAY_SECS: u64 = 3;

pub const WALLET_TIMEOUT_SECS: u64 = 60;
pub const NODE_TIMEOUT_SECS: u64 = 120;
pub const PROXY_LIST_TIMEOUT_SECS: u64 = 30;
pub const CONNECT_TIMEOUT_SECS: u64 = 15;
/// Upper bound on cached per-proxy HTTP clients.
pub const MAX_CACHED_CLIENTS: usize = 64;

// =============================================================================
// SCHEDULE
// =============================================================================

/// A started node stays valid for one day.
pub const NODE_SESSION_SECS: u64 = 86_400;
pub const NODE_FALLBACK_WAIT_SECS: u64 = 600;
pub const NODE_RENEW_SETTLE_SECS: u64 = 3;
pub const EARNINGS_INTERVAL_SECS: u64 = 24 * 60 * 60;
pub const CHECKIN_INTERVAL_SECS: u64 = 12 * 60 * 60;
pub const DEFAULT_HEARTBEAT_SECS: u64 = 60;
pub const DEFAULT_RESTART_DELAY_SECS: u64 = 10;

// =============================================================================
// PROXIES
// =============================================================================

pub const PROXY_SCHEMES: [&str; 4] = ["http://", "https://", "socks4://", "socks5://"];
pub const DEFAULT_PROXY_SCHEME: &str = "http://";
