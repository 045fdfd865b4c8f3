// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::common::parsing::{json_display, json_u64};
use crate::domain::account::Account;
use crate::domain::constants::{
    MSG_CHECKIN_CLAIMED, MSG_NODE_ACTION_OK, MSG_NODE_STATUS, NODE_TIMEOUT_SECS,
    WALLET_TIMEOUT_SECS,
};
use crate::network::client::{CallSpec, Payload, Reply, RetryingClient, SpecialCase};
use crate::network::transport::HttpMethod;
use crate::services::keeper::node::NodeState;
use crate::services::keeper::report::{Outcome, status};
use crate::services::keeper::signer::{NodeAction, sign_checkin, sign_node_action};
use serde_json::{Value, json};
use std::time::Duration;

const WALLET_LOOKUP_CASES: &[(u16, SpecialCase)] = &[(404, SpecialCase::Recover)];
const CHECKIN_CASES: &[(u16, SpecialCase)] = &[(405, SpecialCase::AlreadyDone)];

/// The `data` object of a wallet-details reply.
#[derive(Debug, Clone, PartialEq)]
pub struct WalletDetails(pub Value);

impl WalletDetails {
    pub fn node_points(&self) -> String {
        json_display(self.0.get("nodePoints"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckinOutcome {
    Claimed,
    AlreadyClaimed,
    /// 2xx reply whose `message` did not match the success literal.
    Unexpected(String),
}

fn message_of(body: &Value) -> &str {
    body.get("message").and_then(Value::as_str).unwrap_or_default()
}

/// Typed endpoints of the referral service.
#[derive(Clone)]
pub struct LayerEdgeApi {
    client: RetryingClient,
    base_url: String,
    referral_code: String,
}

impl LayerEdgeApi {
    pub fn new(client: RetryingClient, base_url: &str, referral_code: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            referral_code: referral_code.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn register_spec(&self, account: &Account) -> CallSpec<'static> {
        CallSpec {
            name: "register-wallet",
            method: HttpMethod::Post,
            url: self.url(&format!("/referral/register-wallet/{}", self.referral_code)),
            timeout: Duration::from_secs(WALLET_TIMEOUT_SECS),
            special_cases: &[],
            payload: Payload::Json(json!({ "walletAddress": account.checksum() })),
        }
    }

    /// Fetch wallet details, registering the wallet first when the service
    /// does not know it yet.
    pub async fn wallet_details(
        &self,
        account: &Account,
        proxy: Option<&str>,
    ) -> Result<WalletDetails, AppError> {
        let spec = CallSpec {
            name: "wallet-details",
            method: HttpMethod::Get,
            url: self.url(&format!("/referral/wallet-details/{}", account.checksum())),
            timeout: Duration::from_secs(WALLET_TIMEOUT_SECS),
            special_cases: WALLET_LOOKUP_CASES,
            payload: Payload::Empty,
        };
        let register = self.register_spec(account);
        let reply = self
            .client
            .call_recovering(&spec, proxy, || async {
                if let Err(e) = self.client.call_plain(&register, proxy).await {
                    status(
                        account,
                        proxy,
                        Outcome::Failure,
                        &format!("Wallet registration failed: {e}"),
                    );
                }
            })
            .await?;
        match reply {
            Reply::Body(mut body) => match body.get_mut("data").map(Value::take) {
                Some(data) if !data.is_null() => Ok(WalletDetails(data)),
                _ => Err(AppError::Decode {
                    endpoint: spec.name.to_string(),
                    reason: "missing data".to_string(),
                }),
            },
            Reply::AlreadyDone => Err(AppError::Decode {
                endpoint: spec.name.to_string(),
                reason: "unexpected terminal status".to_string(),
            }),
        }
    }

    pub async fn claim_points(
        &self,
        account: &Account,
        proxy: Option<&str>,
    ) -> Result<CheckinOutcome, AppError> {
        let render = || -> Result<Value, AppError> {
            serde_json::to_value(sign_checkin(account)?).map_err(|e| AppError::Unknown(e.into()))
        };
        let spec = CallSpec {
            name: "claim-node-points",
            method: HttpMethod::Post,
            url: self.url("/light-node/claim-node-points"),
            timeout: Duration::from_secs(NODE_TIMEOUT_SECS),
            special_cases: CHECKIN_CASES,
            payload: Payload::Fresh(&render),
        };
        Ok(match self.client.call(&spec, proxy).await? {
            Reply::AlreadyDone => CheckinOutcome::AlreadyClaimed,
            Reply::Body(body) => match message_of(&body) {
                MSG_CHECKIN_CLAIMED => CheckinOutcome::Claimed,
                other => CheckinOutcome::Unexpected(other.to_string()),
            },
        })
    }

    pub async fn node_status(
        &self,
        account: &Account,
        proxy: Option<&str>,
    ) -> Result<NodeState, AppError> {
        let spec = CallSpec {
            name: "node-status",
            method: HttpMethod::Get,
            url: self.url(&format!("/light-node/node-status/{}", account.checksum())),
            timeout: Duration::from_secs(NODE_TIMEOUT_SECS),
            special_cases: &[],
            payload: Payload::Empty,
        };
        let body = self.expect_body(&spec, proxy).await?;
        if message_of(&body) != MSG_NODE_STATUS {
            return Err(AppError::Decode {
                endpoint: spec.name.to_string(),
                reason: format!("unexpected message {:?}", message_of(&body)),
            });
        }
        Ok(match body.pointer("/data/startTimestamp").and_then(json_u64) {
            Some(start_timestamp) => NodeState::Connected { start_timestamp },
            None => NodeState::Unconnected,
        })
    }

    /// Start the node and return the session's `startTimestamp` in seconds.
    pub async fn start_node(&self, account: &Account, proxy: Option<&str>) -> Result<u64, AppError> {
        let body = self.node_action(account, NodeAction::Activation, proxy).await?;
        body.pointer("/data/startTimestamp")
            .and_then(json_u64)
            .ok_or_else(|| AppError::Decode {
                endpoint: "node-action/start".to_string(),
                reason: "missing startTimestamp".to_string(),
            })
    }

    pub async fn stop_node(&self, account: &Account, proxy: Option<&str>) -> Result<(), AppError> {
        self.node_action(account, NodeAction::Deactivation, proxy)
            .await
            .map(|_| ())
    }

    async fn node_action(
        &self,
        account: &Account,
        action: NodeAction,
        proxy: Option<&str>,
    ) -> Result<Value, AppError> {
        let (name, verb) = match action {
            NodeAction::Activation => ("node-action/start", "start"),
            NodeAction::Deactivation => ("node-action/stop", "stop"),
        };
        let render = || -> Result<Value, AppError> {
            serde_json::to_value(sign_node_action(account, action)?)
                .map_err(|e| AppError::Unknown(e.into()))
        };
        let spec = CallSpec {
            name,
            method: HttpMethod::Post,
            url: self.url(&format!(
                "/light-node/node-action/{}/{verb}",
                account.checksum()
            )),
            timeout: Duration::from_secs(NODE_TIMEOUT_SECS),
            special_cases: &[],
            payload: Payload::Fresh(&render),
        };
        let body = self.expect_body(&spec, proxy).await?;
        if message_of(&body) != MSG_NODE_ACTION_OK {
            return Err(AppError::Decode {
                endpoint: name.to_string(),
                reason: format!("unexpected message {:?}", message_of(&body)),
            });
        }
        Ok(body)
    }

    async fn expect_body(&self, spec: &CallSpec<'_>, proxy: Option<&str>) -> Result<Value, AppError> {
        match self.client.call_plain(spec, proxy).await? {
            Reply::Body(body) => Ok(body),
            Reply::AlreadyDone => Err(AppError::Decode {
                endpoint: spec.name.to_string(),
                reason: "unexpected terminal status".to_string(),
            }),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{account, api};
    use super::*;
    use crate::network::transport::mock::{Scripted, ScriptedTransport};
    use std::sync::Arc;
    use tracing_test::traced_test;

    #[tokio::test(start_paused = true)]
    async fn unregistered_wallet_is_registered_with_referral_code() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .route(
                    HttpMethod::Get,
                    "/referral/wallet-details/",
                    vec![
                        Scripted::Reply(404, json!({"message": "not found"})),
                        Scripted::Reply(200, json!({"data": {"nodePoints": 1530}})),
                    ],
                )
                .route(
                    HttpMethod::Post,
                    "/referral/register-wallet/REFCODE",
                    vec![Scripted::Reply(200, json!({"message": "registered"}))],
                ),
        );
        let account = account();

        let details = api(transport.clone())
            .wallet_details(&account, None)
            .await
            .expect("details");

        assert_eq!(details.node_points(), "1530");
        let register: Vec<_> = transport
            .sent()
            .into_iter()
            .filter(|s| s.url.contains("register-wallet"))
            .collect();
        assert_eq!(register.len(), 1);
        assert_eq!(register[0].url, "https://api.test/api/referral/register-wallet/REFCODE");
        assert_eq!(
            register[0].body,
            Some(json!({ "walletAddress": account.checksum() }))
        );
    }

    #[tokio::test(start_paused = true)]
    #[traced_test]
    async fn failed_registration_is_reported_with_account_and_proxy() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .route(
                    HttpMethod::Get,
                    "/referral/wallet-details/",
                    vec![
                        Scripted::Reply(404, json!({})),
                        Scripted::Reply(200, json!({"data": {"nodePoints": 9}})),
                    ],
                )
                .route(
                    HttpMethod::Post,
                    "/referral/register-wallet/",
                    vec![Scripted::Reply(500, json!({}))],
                ),
        );
        let account = account();
        let proxy = "http://10.0.0.7:3128";

        let details = api(transport.clone())
            .wallet_details(&account, Some(proxy))
            .await
            .expect("lookup still settles");

        assert_eq!(details.node_points(), "9");
        assert_eq!(transport.count(HttpMethod::Post, "/register-wallet/"), 5);
        assert!(logs_contain("Wallet registration failed"));
        assert!(logs_contain(&account.masked()));
        assert!(logs_contain(proxy));
    }

    #[tokio::test(start_paused = true)]
    async fn wallet_reply_without_data_is_an_error() {
        let transport = Arc::new(ScriptedTransport::new().route(
            HttpMethod::Get,
            "/wallet-details/",
            vec![Scripted::Reply(200, json!({"data": null}))],
        ));
        let err = api(transport)
            .wallet_details(&account(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Decode { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn checkin_outcomes_follow_status_and_message() {
        let claimed = Arc::new(ScriptedTransport::new().route(
            HttpMethod::Post,
            "/claim-node-points",
            vec![Scripted::Reply(200, json!({"message": MSG_CHECKIN_CLAIMED}))],
        ));
        let already = Arc::new(ScriptedTransport::new().route(
            HttpMethod::Post,
            "/claim-node-points",
            vec![Scripted::Reply(405, json!({"message": "already claimed"}))],
        ));
        let odd = Arc::new(ScriptedTransport::new().route(
            HttpMethod::Post,
            "/claim-node-points",
            vec![Scripted::Reply(200, json!({"message": "try later"}))],
        ));
        let account = account();

        assert_eq!(
            api(claimed.clone()).claim_points(&account, None).await.unwrap(),
            CheckinOutcome::Claimed
        );
        assert_eq!(
            api(already.clone()).claim_points(&account, None).await.unwrap(),
            CheckinOutcome::AlreadyClaimed
        );
        assert_eq!(already.sent().len(), 1);
        assert_eq!(
            api(odd).claim_points(&account, None).await.unwrap(),
            CheckinOutcome::Unexpected("try later".to_string())
        );

        let body = claimed.sent()[0].body.clone().expect("signed body");
        assert_eq!(body["walletAddress"], account.checksum());
        assert!(body["sign"].as_str().unwrap().starts_with("0x"));
    }

    #[tokio::test(start_paused = true)]
    async fn node_status_reads_start_timestamp() {
        let connected = Arc::new(ScriptedTransport::new().route(
            HttpMethod::Get,
            "/node-status/",
            vec![Scripted::Reply(
                200,
                json!({"message": "node status", "data": {"startTimestamp": 1_700_000_000u64}}),
            )],
        ));
        let idle = Arc::new(ScriptedTransport::new().route(
            HttpMethod::Get,
            "/node-status/",
            vec![Scripted::Reply(200, json!({"message": "node status", "data": {"startTimestamp": null}}))],
        ));
        let account = account();

        assert_eq!(
            api(connected).node_status(&account, None).await.unwrap(),
            NodeState::Connected {
                start_timestamp: 1_700_000_000
            }
        );
        assert_eq!(
            api(idle).node_status(&account, None).await.unwrap(),
            NodeState::Unconnected
        );
    }

    #[tokio::test(start_paused = true)]
    async fn start_node_returns_session_timestamp() {
        let transport = Arc::new(ScriptedTransport::new().route(
            HttpMethod::Post,
            "/start",
            vec![Scripted::Reply(
                200,
                json!({"message": MSG_NODE_ACTION_OK, "data": {"startTimestamp": 1_700_000_123u64}}),
            )],
        ));
        let account = account();
        let started = api(transport.clone())
            .start_node(&account, Some("socks5://10.0.0.2:1080"))
            .await
            .expect("started");
        assert_eq!(started, 1_700_000_123);

        let sent = &transport.sent()[0];
        assert_eq!(
            sent.url,
            format!(
                "https://api.test/api/light-node/node-action/{}/start",
                account.checksum()
            )
        );
        assert_eq!(sent.proxy.as_deref(), Some("socks5://10.0.0.2:1080"));
        let body = sent.body.as_ref().expect("body");
        assert!(body.get("walletAddress").is_none());
        assert!(body["timestamp"].as_u64().is_some());
    }
}
