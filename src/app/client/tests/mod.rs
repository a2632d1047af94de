//! Test support for the report clients
//!
//! [`ScriptedTransport`] replays canned responses per endpoint and records
//! every request, so the polling, parsing and isolation rules of the clients
//! can be exercised without network access. `live_api` holds ignored tests
//! that hit the real APIs.

pub mod live_api;

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::app::client::http::{ApiRequest, ApiResponse, ReportTransport};
use crate::errors::{FetchError, FetchResult};

enum Scripted {
    Respond(ApiResponse),
    Fail,
}

struct Route {
    prefix: String,
    queue: VecDeque<Scripted>,
    sticky: Option<ApiResponse>,
}

/// In-memory transport answering by URL prefix
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<ApiRequest>>,
    sent_at: Mutex<Vec<Instant>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_route<F>(self, prefix: &str, update: F) -> Self
    where
        F: FnOnce(&mut Route),
    {
        {
            let mut routes = self.routes.lock().unwrap();
            let index = match routes.iter().position(|route| route.prefix == prefix) {
                Some(index) => index,
                None => {
                    routes.push(Route {
                        prefix: prefix.to_string(),
                        queue: VecDeque::new(),
                        sticky: None,
                    });
                    routes.len() - 1
                }
            };
            update(&mut routes[index]);
        }
        self
    }

    /// Queue one response for URLs starting with `prefix`
    pub fn respond(self, prefix: &str, response: ApiResponse) -> Self {
        self.with_route(prefix, |route| route.queue.push_back(Scripted::Respond(response)))
    }

    /// Queue one transport failure for URLs starting with `prefix`
    pub fn fail(self, prefix: &str) -> Self {
        self.with_route(prefix, |route| route.queue.push_back(Scripted::Fail))
    }

    /// Answer with `response` whenever the queue for `prefix` is empty
    pub fn respond_always(self, prefix: &str, response: ApiResponse) -> Self {
        self.with_route(prefix, |route| route.sticky = Some(response))
    }

    /// Every request seen so far
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Tokio clock reading of every request, in order
    pub fn request_times(&self) -> Vec<Instant> {
        self.sent_at.lock().unwrap().clone()
    }

    /// Requests whose URL starts with `prefix`
    pub fn requests_to(&self, prefix: &str) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.url.as_str().starts_with(prefix))
            .collect()
    }
}

#[async_trait]
impl ReportTransport for ScriptedTransport {
    async fn execute(&self, request: ApiRequest) -> FetchResult<ApiResponse> {
        let url = request.url.to_string();
        self.requests.lock().unwrap().push(request);
        self.sent_at.lock().unwrap().push(Instant::now());

        let mut routes = self.routes.lock().unwrap();
        let route = routes
            .iter_mut()
            .find(|route| url.starts_with(&route.prefix))
            .ok_or_else(|| FetchError::MalformedReport {
                reason: format!("no scripted response for {}", url),
            })?;

        match route.queue.pop_front() {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::Fail) => Err(FetchError::MalformedReport {
                reason: "scripted transport failure".to_string(),
            }),
            None => route.sticky.clone().ok_or_else(|| FetchError::MalformedReport {
                reason: format!("scripted responses exhausted for {}", url),
            }),
        }
    }
}
