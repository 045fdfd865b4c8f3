// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::common::retry::{Attempt, RetryError, RetryPolicy, retry_fixed};
use crate::network::transport::{ApiTransport, HttpMethod, OutboundRequest};
use serde_json::Value;
use std::future::{Future, Ready, ready};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Status codes that mean something other than "failed" for a given endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialCase {
    /// Run the call's recovery request, then retry without backoff.
    Recover,
    /// The request was already satisfied for this period.
    AlreadyDone,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Body(Value),
    AlreadyDone,
}

type PayloadFn<'a> = dyn Fn() -> Result<Value, AppError> + Send + Sync + 'a;

pub enum Payload<'a> {
    Empty,
    Json(Value),
    /// Rebuilt before every attempt so signed timestamps stay current.
    Fresh(&'a PayloadFn<'a>),
}

pub struct CallSpec<'a> {
    pub name: &'static str,
    pub method: HttpMethod,
    pub url: String,
    pub timeout: Duration,
    pub special_cases: &'static [(u16, SpecialCase)],
    pub payload: Payload<'a>,
}

impl CallSpec<'_> {
    fn special_for(&self, status: u16) -> Option<SpecialCase> {
        self.special_cases
            .iter()
            .find(|(code, _)| *code == status)
            .map(|(_, case)| *case)
    }

    fn render(&self) -> Result<OutboundRequest, AppError> {
        let body = match &self.payload {
            Payload::Empty => None,
            Payload::Json(v) => Some(v.clone()),
            Payload::Fresh(build) => Some(build()?),
        };
        Ok(OutboundRequest {
            method: self.method,
            url: self.url.clone(),
            body,
            timeout: self.timeout,
        })
    }
}

type Step = Attempt<Reply, AppError>;

fn no_special(_: SpecialCase) -> Ready<Option<Step>> {
    ready(None)
}

/// Fixed-attempt, fixed-interval wrapper around every remote call.
#[derive(Clone)]
pub struct RetryingClient {
    transport: Arc<dyn ApiTransport>,
    policy: RetryPolicy,
    settle: Duration,
}

impl RetryingClient {
    pub fn new(transport: Arc<dyn ApiTransport>, policy: RetryPolicy, settle: Duration) -> Self {
        Self {
            transport,
            policy,
            settle,
        }
    }

    /// Run `spec` honoring its `AlreadyDone` cases. A `Recover` status counts
    /// as an ordinary failure here; use [`Self::call_recovering`] to act on it.
    pub async fn call(&self, spec: &CallSpec<'_>, proxy: Option<&str>) -> Result<Reply, AppError> {
        self.execute(spec, proxy, |case| {
            ready(match case {
                SpecialCase::AlreadyDone => Some(Attempt::Done(Reply::AlreadyDone)),
                SpecialCase::Recover => None,
            })
        })
        .await
    }

    /// Like [`Self::call`], but a `Recover` status awaits `recover` and then
    /// retries without backoff. The hook owns its own error reporting.
    pub async fn call_recovering<R, RFut>(
        &self,
        spec: &CallSpec<'_>,
        proxy: Option<&str>,
        recover: R,
    ) -> Result<Reply, AppError>
    where
        R: Fn() -> RFut,
        RFut: Future<Output = ()>,
    {
        let recover = &recover;
        self.execute(spec, proxy, move |case| async move {
            match case {
                SpecialCase::AlreadyDone => Some(Attempt::Done(Reply::AlreadyDone)),
                SpecialCase::Recover => {
                    recover().await;
                    Some(Attempt::Recovered)
                }
            }
        })
        .await
    }

    /// Run `spec` treating every non-2xx status as a generic failure.
    pub async fn call_plain(
        &self,
        spec: &CallSpec<'_>,
        proxy: Option<&str>,
    ) -> Result<Reply, AppError> {
        self.execute(spec, proxy, no_special).await
    }

    async fn execute<F, Fut>(
        &self,
        spec: &CallSpec<'_>,
        proxy: Option<&str>,
        on_special: F,
    ) -> Result<Reply, AppError>
    where
        F: Fn(SpecialCase) -> Fut,
        Fut: Future<Output = Option<Step>>,
    {
        sleep(self.settle).await;
        let on_special = &on_special;
        let outcome = retry_fixed(self.policy, |attempt| async move {
            let request = match spec.render() {
                Ok(r) => r,
                Err(e) => return Attempt::Fatal(e),
            };
            match self.transport.send(&request, proxy).await {
                Ok(resp) if resp.is_success() => match resp.json() {
                    Ok(body) => Attempt::Done(Reply::Body(body)),
                    Err(e) => Attempt::Failed(AppError::Decode {
                        endpoint: spec.name.to_string(),
                        reason: e.to_string(),
                    }),
                },
                Ok(resp) => {
                    if let Some(case) = spec.special_for(resp.status)
                        && let Some(step) = on_special(case).await
                    {
                        return step;
                    }
                    tracing::debug!(
                        target: "client",
                        endpoint = spec.name,
                        attempt,
                        status = resp.status,
                        "Request rejected"
                    );
                    Attempt::Failed(AppError::ApiCall {
                        endpoint: spec.name.to_string(),
                        status: resp.status,
                    })
                }
                Err(e) => {
                    tracing::debug!(
                        target: "client",
                        endpoint = spec.name,
                        attempt,
                        error = %e,
                        "Request failed"
                    );
                    Attempt::Failed(e)
                }
            }
        })
        .await;

        outcome.map_err(|err| match err {
            RetryError::Fatal(e) => e,
            RetryError::Exhausted { attempts, last } => AppError::RetriesExhausted {
                endpoint: spec.name.to_string(),
                attempts,
                last: last
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "recovery never settled".to_string()),
            },
        })
    }
}
