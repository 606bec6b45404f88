//! In-memory transport for development and tests
//!
//! Routes are keyed by method and path. Each route plays back its scripted
//! outcomes in order; the last one repeats once the rest are used up.
//! Unscripted routes answer 404.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use cm_core::{CmError, CmResult};
use serde_json::Value;
use tokio::sync::Notify;

use crate::transport::{ApiRequest, Method, RawResponse, Transport};

#[derive(Debug, Clone)]
enum Outcome {
    Respond(RawResponse),
    Fail(CmError),
}

#[derive(Debug, Clone)]
struct Step {
    outcome: Outcome,
    delay: Option<Duration>,
    gate: Option<Arc<Notify>>,
}

type RouteKey = (Method, String);

/// Scripted stand-in for a backend
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<RouteKey, VecDeque<Step>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, method: Method, path: &str, step: Step) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry((method, path.to_string()))
            .or_default()
            .push_back(step);
    }

    /// Answer with a raw response
    pub fn respond(&self, method: Method, path: &str, response: RawResponse) -> &Self {
        self.push(
            method,
            path,
            Step {
                outcome: Outcome::Respond(response),
                delay: None,
                gate: None,
            },
        );
        self
    }

    /// Answer with a JSON body
    pub fn json(&self, method: Method, path: &str, status: u16, body: Value) -> &Self {
        self.respond(method, path, RawResponse::json(status, &body))
    }

    /// Fail without producing a response
    pub fn fail(&self, method: Method, path: &str, error: CmError) -> &Self {
        self.push(
            method,
            path,
            Step {
                outcome: Outcome::Fail(error),
                delay: None,
                gate: None,
            },
        );
        self
    }

    /// Answer after `delay` (honours a paused tokio clock)
    pub fn delayed(&self, method: Method, path: &str, delay: Duration, response: RawResponse) -> &Self {
        self.push(
            method,
            path,
            Step {
                outcome: Outcome::Respond(response),
                delay: Some(delay),
                gate: None,
            },
        );
        self
    }

    /// Answer only once the returned gate is notified
    pub fn gated(&self, method: Method, path: &str, response: RawResponse) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.push(
            method,
            path,
            Step {
                outcome: Outcome::Respond(response),
                delay: None,
                gate: Some(gate.clone()),
            },
        );
        gate
    }

    /// Every request received so far, in arrival order
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn request_count(&self, method: Method, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    fn next_step(&self, method: Method, path: &str) -> Option<Step> {
        let mut routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        let queue = routes.get_mut(&(method, path.to_string()))?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> CmResult<RawResponse> {
        let step = self.next_step(request.method, &request.path);
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        let Some(step) = step else {
            return Ok(RawResponse::json(404, &serde_json::json!({ "detail": "Not Found" })));
        };

        if let Some(gate) = step.gate {
            gate.notified().await;
        }
        if let Some(delay) = step.delay {
            tokio::time::sleep(delay).await;
        }

        match step.outcome {
            Outcome::Respond(response) => Ok(response),
            Outcome::Fail(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_steps_play_in_order_and_last_repeats() {
        let transport = ScriptedTransport::new();
        transport
            .json(Method::Get, "/api/projects", 200, json!([1]))
            .json(Method::Get, "/api/projects", 200, json!([2]));

        let mut bodies = Vec::new();
        for _ in 0..3 {
            bodies.push(transport.send(ApiRequest::get("/api/projects")).await.unwrap().body);
        }
        assert_eq!(bodies, vec!["[1]", "[2]", "[2]"]);
        assert_eq!(transport.request_count(Method::Get, "/api/projects"), 3);
    }

    #[tokio::test]
    async fn test_unscripted_route_is_404() {
        let transport = ScriptedTransport::new();
        let response = transport.send(ApiRequest::get("/api/nowhere")).await.unwrap();
        assert_eq!(response.status, 404);
    }

    #[tokio::test]
    async fn test_fail_step() {
        let transport = ScriptedTransport::new();
        transport.fail(Method::Get, "/api/materials", CmError::Transport("down".into()));
        let err = transport.send(ApiRequest::get("/api/materials")).await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_gate_holds_response() {
        let transport = Arc::new(ScriptedTransport::new());
        let gate = transport.gated(Method::Get, "/api/employees", RawResponse::new(200, "[]"));

        let pending = {
            let transport = transport.clone();
            tokio::spawn(async move { transport.send(ApiRequest::get("/api/employees")).await })
        };
        tokio::task::yield_now().await;
        assert!(!pending.is_finished());

        gate.notify_one();
        let response = pending.await.unwrap().unwrap();
        assert_eq!(response.body, "[]");
    }
}
