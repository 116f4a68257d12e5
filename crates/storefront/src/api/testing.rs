//! Scripted transport for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

use serde_json::Value;

use super::{Action, ApiError, Transport};

/// A canned response.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Answer with this body.
    Json(Value),
    /// Fail with [`ApiError::Unavailable`].
    Fail(String),
    /// Never answer.
    Hang,
}

/// One recorded request.
#[derive(Debug, Clone)]
pub struct Call {
    pub action: Action,
    pub params: Vec<(String, String)>,
}

impl Call {
    /// Value of a query parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Transport that replays queued replies per action, then a default.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    queued: Mutex<HashMap<Action, VecDeque<Reply>>>,
    defaults: HashMap<Action, Reply>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a one-shot reply for an action.
    pub fn with_reply(self, action: Action, reply: Reply) -> Self {
        self.push_reply(action, reply);
        self
    }

    /// Reply used once the queue for an action is drained.
    pub fn with_default(mut self, action: Action, reply: Reply) -> Self {
        self.defaults.insert(action, reply);
        self
    }

    /// Queue a one-shot reply on a shared transport.
    pub fn push_reply(&self, action: Action, reply: Reply) {
        self.queued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(action)
            .or_default()
            .push_back(reply);
    }

    /// Every request made so far.
    pub fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of requests made for an action.
    pub fn call_count(&self, action: Action) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|c| c.action == action)
            .count()
    }

    fn next_reply(&self, action: Action, params: &[(&str, &str)]) -> Reply {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Call {
                action,
                params: params
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect(),
            });

        let queued = self
            .queued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(&action)
            .and_then(VecDeque::pop_front);

        queued
            .or_else(|| self.defaults.get(&action).cloned())
            .unwrap_or_else(|| Reply::Fail(format!("no reply scripted for {action}")))
    }
}

impl Transport for ScriptedTransport {
    async fn fetch_json(&self, action: Action, params: &[(&str, &str)]) -> Result<Value, ApiError> {
        match self.next_reply(action, params) {
            Reply::Json(value) => Ok(value),
            Reply::Fail(reason) => Err(ApiError::Unavailable(reason)),
            Reply::Hang => std::future::pending().await,
        }
    }
}
