// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTTP executor with retries and typed status errors.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
use crate::error::{Error, Result};
use crate::poller::{PollError, sleep_or_cancel};

/// Settings for the HTTP executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Total attempts for a retryable failure, including the first one.
    pub max_attempts: u32,
    /// Wait between attempts.
    pub retry_interval: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_attempts: 3,
            retry_interval: Duration::from_secs(2),
        }
    }
}

/// Executes requests through a transport, retrying transport errors and
/// 429/503 responses.
///
/// Every non-2xx response that survives the retries is returned as
/// [`Error::Http`]. The wait between attempts ends early when the executor's
/// cancellation token fires.
#[derive(Clone)]
pub struct HttpExecutor {
    transport: Arc<dyn HttpTransport>,
    max_attempts: u32,
    retry_interval: Duration,
    cancel: CancellationToken,
}

impl HttpExecutor {
    /// Create an executor over the given transport with default retry settings.
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        let defaults = HttpConfig::default();
        Self {
            transport,
            max_attempts: defaults.max_attempts,
            retry_interval: defaults.retry_interval,
            cancel: CancellationToken::new(),
        }
    }

    /// Create a reqwest-backed executor from configuration.
    pub fn from_config(config: &HttpConfig) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(config.request_timeout)?);
        Ok(Self::new(transport).with_retry(config.max_attempts, config.retry_interval))
    }

    /// Override the retry settings. A zero attempt count means a single try.
    pub fn with_retry(mut self, max_attempts: u32, retry_interval: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.retry_interval = retry_interval;
        self
    }

    /// Abort retry waits when `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Send a request, retrying while the failure is retryable.
    pub async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut attempt = 0;
        loop {
            attempt += 1;

            let err = match self.transport.send(&request).await {
                Ok(response) if response.is_success() => {
                    debug!(
                        method = %request.method,
                        url = %request.url,
                        status = response.status,
                        "Request succeeded"
                    );
                    return Ok(response);
                }
                Ok(response) => Error::Http {
                    method: request.method.to_string(),
                    url: request.url.clone(),
                    status: response.status,
                    body: response.text(),
                },
                Err(e) => e,
            };

            if !err.is_retryable() || attempt >= self.max_attempts {
                return Err(err);
            }

            warn!(
                method = %request.method,
                url = %request.url,
                attempt,
                max_attempts = self.max_attempts,
                error = %err,
                "Request failed, retrying"
            );
            if !sleep_or_cancel(self.retry_interval, &self.cancel).await {
                return Err(Error::Poll(PollError::Cancelled {
                    target: format!("{} {}", request.method, request.url),
                }));
            }
        }
    }

    /// GET a URL and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<T> {
        let response = self
            .execute(HttpRequest::get(url).with_headers(headers))
            .await?;
        response.json()
    }

    /// POST a JSON body. The response body is returned undecoded since many
    /// write endpoints answer with an empty body.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &B,
    ) -> Result<HttpResponse> {
        let body = serde_json::to_value(body)?;
        self.execute(HttpRequest::post(url).with_headers(headers).with_json(body))
            .await
    }

    /// POST a form and decode the JSON body.
    pub async fn post_form<T: DeserializeOwned>(
        &self,
        url: &str,
        pairs: Vec<(String, String)>,
    ) -> Result<T> {
        let response = self.execute(HttpRequest::post(url).with_form(pairs)).await?;
        response.json()
    }
}

impl std::fmt::Debug for HttpExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpExecutor")
            .field("max_attempts", &self.max_attempts)
            .field("retry_interval", &self.retry_interval)
            .finish_non_exhaustive()
    }
}
