// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use std::str::FromStr;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const QUIET_MODULES: [&str; 5] = ["h2", "hyper", "hyper_util", "reqwest", "rustls"];

/// Expand a bare level into a directive string that keeps the HTTP stack quiet.
/// Directive strings (with ',' or '=') pass through untouched.
pub fn filter_spec(log_level: &str) -> String {
    let normalized = log_level.trim();
    if normalized.contains(',') || normalized.contains('=') {
        return normalized.to_string();
    }
    let base = if normalized.is_empty() { "info" } else { normalized };
    QUIET_MODULES
        .iter()
        .fold(base.to_string(), |mut spec, module| {
            spec.push_str(&format!(",{module}=warn"));
            spec
        })
}

pub fn level_for(debug: bool) -> &'static str {
    if debug { "debug" } else { "info" }
}

pub fn setup_logging(log_level: &str, json_format: bool) {
    let spec = filter_spec(log_level);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::from_str(&spec))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::registry().with(filter);

    if json_format {
        let json_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(false);
        subscriber.with(json_layer).init();
    } else {
        let fmt_layer = fmt::layer().with_target(true).compact();
        subscriber.with(fmt_layer).init();
    }

    tracing::info!(
        target: "app",
        filter = %spec,
        format = if json_format { "json" } else { "compact" },
        "Logging initialized"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_level_gets_quiet_http_modules() {
        let spec = filter_spec("debug");
        assert!(spec.starts_with("debug,"));
        assert!(spec.contains("reqwest=warn"));
        assert!(spec.contains("hyper_util=warn"));
    }

    #[test]
    fn directive_strings_are_respected() {
        assert_eq!(filter_spec("info,account=debug"), "info,account=debug");
        assert!(filter_spec("  ").starts_with("info,"));
    }

    #[test]
    fn debug_flag_selects_level() {
        assert_eq!(level_for(true), "debug");
        assert_eq!(level_for(false), "info");
    }
}
