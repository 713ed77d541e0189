// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Mock transport for testing.
//!
//! Answers requests from scripted rules without touching the network and
//! records every request it sees.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use super::transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use crate::error::{Error, Result};

type Matcher = Box<dyn Fn(&HttpRequest) -> bool + Send + Sync>;

/// A scripted reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    Response(HttpResponse),
    /// Fails the send with [`Error::Transport`].
    TransportError(String),
}

struct Rule {
    matcher: Matcher,
    /// Replies are consumed in order; the last one repeats forever.
    replies: VecDeque<MockReply>,
}

/// Mock transport driven by request rules.
///
/// Rules are checked in insertion order and the first match answers.
/// Requests no rule matches get a 404.
#[derive(Clone, Default)]
pub struct MockTransport {
    rules: Arc<Mutex<Vec<Rule>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl MockTransport {
    /// Create an empty mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer requests with this method and exact URL path (query ignored).
    pub async fn on(&self, method: HttpMethod, path: &str, replies: Vec<MockReply>) {
        let path = path.to_string();
        self.on_match(
            move |req| req.method == method && url_path(&req.url) == path,
            replies,
        )
        .await;
    }

    /// Answer requests with this method whose URL path starts with `prefix`.
    pub async fn on_prefix(&self, method: HttpMethod, prefix: &str, replies: Vec<MockReply>) {
        let prefix = prefix.to_string();
        self.on_match(
            move |req| req.method == method && url_path(&req.url).starts_with(&prefix),
            replies,
        )
        .await;
    }

    /// Answer requests accepted by an arbitrary predicate.
    pub async fn on_match<F>(&self, matcher: F, replies: Vec<MockReply>)
    where
        F: Fn(&HttpRequest) -> bool + Send + Sync + 'static,
    {
        self.rules.lock().await.push(Rule {
            matcher: Box::new(matcher),
            replies: replies.into(),
        });
    }

    /// All requests sent so far, in order.
    pub async fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().await.clone()
    }

    /// Number of requests sent with the given method.
    pub async fn count(&self, method: HttpMethod) -> usize {
        self.requests
            .lock()
            .await
            .iter()
            .filter(|r| r.method == method)
            .count()
    }
}

/// Shorthand for a JSON reply.
pub fn json(status: u16, value: Value) -> MockReply {
    MockReply::Response(HttpResponse::json_body(status, &value))
}

/// Shorthand for a reply with an empty body.
pub fn status(status: u16) -> MockReply {
    MockReply::Response(HttpResponse::new(status, Vec::new()))
}

/// Path component of a URL, without scheme, authority or query.
pub fn url_path(url: &str) -> &str {
    let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let path = match without_scheme.find('/') {
        Some(idx) => &without_scheme[idx..],
        None => "/",
    };
    path.split('?').next().unwrap_or(path)
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().await.push(request.clone());

        let mut rules = self.rules.lock().await;
        let reply = rules
            .iter_mut()
            .find(|rule| (rule.matcher)(request))
            .and_then(|rule| {
                if rule.replies.len() > 1 {
                    rule.replies.pop_front()
                } else {
                    rule.replies.front().cloned()
                }
            });

        match reply {
            Some(MockReply::Response(response)) => Ok(response),
            Some(MockReply::TransportError(message)) => Err(Error::Transport(message)),
            None => Ok(HttpResponse::new(
                404,
                format!("no mock for {} {}", request.method, request.url),
            )),
        }
    }
}
