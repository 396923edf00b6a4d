//! Scripted transport for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;

#[derive(Debug, Default)]
struct Script {
    responses: VecDeque<Result<HttpResponse, ApiError>>,
    requests: Vec<HttpRequest>,
}

/// Replays queued responses in order and records every request it sees.
/// Clones share the same script.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    script: Arc<Mutex<Script>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, status: u16, body: Value) -> Self {
        self.push(Ok(HttpResponse::new(status, body.to_string())))
    }

    pub fn respond_raw(self, status: u16, body: &str) -> Self {
        self.push(Ok(HttpResponse::new(status, body)))
    }

    pub fn fail(self, error: ApiError) -> Self {
        self.push(Err(error))
    }

    fn push(self, outcome: Result<HttpResponse, ApiError>) -> Self {
        self.script.lock().unwrap().responses.push_back(outcome);
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.script.lock().unwrap().requests.clone()
    }

    pub fn call_count(&self) -> usize {
        self.script.lock().unwrap().requests.len()
    }
}

impl Transport for MockTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let mut script = self.script.lock().unwrap();
        script.requests.push(request.clone());
        script.responses.pop_front().unwrap_or_else(|| {
            Err(ApiError::Transport(format!(
                "no scripted response for {} {}",
                request.method.as_str(),
                request.url()
            )))
        })
    }
}
