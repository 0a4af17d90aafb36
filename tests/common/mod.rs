//! Shared fixtures: a scripted transport and a recording sleeper.

#![allow(dead_code)]

use antinex_client::transport::{ApiReply, ApiRequest, Transport, TransportError};
use antinex_client::{AiClient, ClientConfig, Sleeper};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const BASE_URL: &str = "http://antinex.test:8080";
pub const TOKEN: &str = "test-token";

/// Replays queued replies in order and records every request it was given.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    replies: Arc<Mutex<VecDeque<ApiReply>>>,
    requests: Arc<Mutex<Vec<ApiRequest>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, reply: ApiReply) -> &Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn push_json(&self, status: u16, body: Value) -> &Self {
        self.push(ApiReply::json(status, &body))
    }

    pub fn push_login(&self) -> &Self {
        self.push_json(200, json!({ "token": TOKEN }))
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// `METHOD path` of each recorded request, relative to [`BASE_URL`].
    pub fn trace(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| format!("{} {}", r.method.as_str(), r.url.trim_start_matches(BASE_URL)))
            .collect()
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().unwrap().len()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &ApiRequest) -> antinex_client::Result<ApiReply> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| TransportError::Other(format!("no reply scripted for {}", request.url)).into())
    }
}

/// Records requested pauses instead of sleeping.
#[derive(Default)]
pub struct RecordingSleeper {
    naps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn naps(&self) -> Vec<Duration> {
        self.naps.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.naps.lock().unwrap().len()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.naps.lock().unwrap().push(duration);
    }
}

pub fn config() -> ClientConfig {
    ClientConfig::new(BASE_URL, "trex", "123321").with_verbose(false)
}

/// Client over a scripted transport, not logged in.
pub fn client_with(config: ClientConfig) -> (AiClient, ScriptedTransport, Arc<RecordingSleeper>) {
    let transport = ScriptedTransport::new();
    let sleeper = Arc::new(RecordingSleeper::default());
    let client = AiClient::builder()
        .config(config)
        .transport(transport.clone())
        .sleeper(sleeper.clone())
        .build()
        .expect("client");
    (client, transport, sleeper)
}

pub fn client() -> (AiClient, ScriptedTransport, Arc<RecordingSleeper>) {
    client_with(config())
}

/// Client that has already completed one successful login.
pub fn logged_in() -> (AiClient, ScriptedTransport, Arc<RecordingSleeper>) {
    let (mut client, transport, sleeper) = client();
    transport.push_login();
    assert!(client.retry_login().unwrap().is_success());
    (client, transport, sleeper)
}
