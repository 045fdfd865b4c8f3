use async_trait::async_trait;
use lightnode_keeper::common::retry::RetryPolicy;
use lightnode_keeper::domain::account::Account;
use lightnode_keeper::domain::error::AppError;
use lightnode_keeper::network::client::RetryingClient;
use lightnode_keeper::network::layeredge::{CheckinOutcome, LayerEdgeApi};
use lightnode_keeper::network::transport::{ApiTransport, HttpMethod, OutboundRequest, RawResponse};
use lightnode_keeper::services::keeper::{AccountOrchestrator, ProxyPool, Schedule};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

#[derive(Debug, Clone)]
struct Call {
    method: HttpMethod,
    url: String,
    proxy: Option<String>,
}

/// Replies are consumed in order per URL fragment; the final reply repeats.
#[derive(Default)]
struct FakeService {
    replies: Mutex<Vec<(HttpMethod, &'static str, VecDeque<(u16, Value)>)>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeService {
    fn with(self, method: HttpMethod, fragment: &'static str, replies: Vec<(u16, Value)>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push((method, fragment, replies.into()));
        self
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ApiTransport for FakeService {
    async fn send(
        &self,
        request: &OutboundRequest,
        proxy: Option<&str>,
    ) -> Result<RawResponse, AppError> {
        self.calls.lock().unwrap().push(Call {
            method: request.method,
            url: request.url.clone(),
            proxy: proxy.map(ToString::to_string),
        });
        let mut routes = self.replies.lock().unwrap();
        let reply = routes
            .iter_mut()
            .find(|(m, fragment, _)| *m == request.method && request.url.contains(fragment))
            .and_then(|(_, _, queue)| {
                if queue.len() > 1 {
                    queue.pop_front()
                } else {
                    queue.front().cloned()
                }
            })
            .unwrap_or((500, json!({})));
        Ok(RawResponse {
            status: reply.0,
            body: reply.1.to_string(),
        })
    }
}

fn api(service: Arc<FakeService>) -> LayerEdgeApi {
    let client = RetryingClient::new(
        service,
        RetryPolicy {
            attempts: 5,
            interval: Duration::from_secs(5),
        },
        Duration::from_secs(3),
    );
    LayerEdgeApi::new(client, "https://service.test/api", "tHc67a1g")
}

#[tokio::test(start_paused = true)]
async fn double_not_found_registers_twice_and_returns_final_data() {
    let service = Arc::new(
        FakeService::default()
            .with(
                HttpMethod::Get,
                "/referral/wallet-details/",
                vec![
                    (404, json!({})),
                    (404, json!({})),
                    (200, json!({"data": {"nodePoints": 77, "referralCode": "abc"}})),
                ],
            )
            .with(
                HttpMethod::Post,
                "/referral/register-wallet/tHc67a1g",
                vec![(200, json!({"message": "ok"}))],
            ),
    );
    let account = Account::from_key(KEY).expect("valid key");

    let details = api(service.clone())
        .wallet_details(&account, None)
        .await
        .expect("wallet details");

    assert_eq!(details.0, json!({"nodePoints": 77, "referralCode": "abc"}));
    let calls = service.calls();
    let registrations = calls
        .iter()
        .filter(|c| c.method == HttpMethod::Post && c.url.contains("register-wallet"))
        .count();
    assert_eq!(registrations, 2);
    let order: Vec<_> = calls
        .iter()
        .map(|c| c.url.contains("register-wallet"))
        .collect();
    assert_eq!(order, vec![false, true, false, true, false]);
}

#[tokio::test(start_paused = true)]
async fn empty_proxy_pool_sends_everything_direct() {
    let service = Arc::new(
        FakeService::default()
            .with(
                HttpMethod::Get,
                "/wallet-details/",
                std::iter::repeat_n((500, json!({})), 5)
                    .chain([(200, json!({"data": {"nodePoints": 1}}))])
                    .collect(),
            )
            .with(HttpMethod::Post, "/claim-node-points", vec![(405, json!({}))]),
    );
    let pool = Arc::new(ProxyPool::new(Vec::new()));
    let account = Arc::new(Account::from_key(KEY).expect("valid key"));
    assert_eq!(pool.assign(account.address()), None);
    assert_eq!(pool.rotate(account.address()), None);

    let orchestrator = AccountOrchestrator::new(
        api(service.clone()),
        account,
        pool,
        Schedule::default(),
    );
    orchestrator
        .bootstrap(&CancellationToken::new())
        .await
        .expect("bootstrap");
    assert_eq!(
        orchestrator.check_in_once().await,
        Some(CheckinOutcome::AlreadyClaimed)
    );

    let calls = service.calls();
    assert_eq!(calls.len(), 7);
    assert!(calls.iter().all(|c| c.proxy.is_none()));
}

#[tokio::test(start_paused = true)]
async fn sticky_proxy_is_used_until_rotation() {
    let service = Arc::new(
        FakeService::default()
            .with(
                HttpMethod::Get,
                "/wallet-details/",
                vec![(200, json!({"data": {"nodePoints": 3}}))],
            )
            .with(HttpMethod::Post, "/claim-node-points", vec![(405, json!({}))]),
    );
    let pool = Arc::new(ProxyPool::new(vec![
        "10.1.1.1:3128".to_string(),
        "10.1.1.2:3128".to_string(),
    ]));
    let orchestrator = AccountOrchestrator::new(
        api(service.clone()),
        Arc::new(Account::from_key(KEY).expect("valid key")),
        pool,
        Schedule::default(),
    );

    orchestrator
        .bootstrap(&CancellationToken::new())
        .await
        .expect("bootstrap");
    orchestrator.check_in_once().await;

    let proxies: Vec<_> = service
        .calls()
        .into_iter()
        .map(|c| c.proxy.unwrap_or_default())
        .collect();
    assert_eq!(proxies, vec!["http://10.1.1.1:3128", "http://10.1.1.1:3128"]);
}
