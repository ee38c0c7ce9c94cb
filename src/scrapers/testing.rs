use crate::config::{Config, HeaderProfile};
use crate::scrapers::error::TransportError;
use crate::scrapers::traits::Transport;
use crate::scrapers::types::ApiRequest;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

type Responder = dyn Fn(&ApiRequest, usize) -> Result<Value, TransportError> + Send + Sync;

/// Transport answering from a closure and recording every request it sees.
/// The closure gets the request and the zero-based index of the call.
pub struct StubTransport {
    responder: Box<Responder>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl StubTransport {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&ApiRequest, usize) -> Result<Value, TransportError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn send(&self, request: &ApiRequest) -> Result<Value, TransportError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len() - 1
        };
        (self.responder)(request, call)
    }
}

/// Config pointing at `example.test` endpoints with no retry delay
pub fn test_config(days: u32) -> Config {
    let mut base_header = BTreeMap::new();
    base_header.insert("accept".to_string(), "application/json".to_string());
    let mut data_header = BTreeMap::new();
    data_header.insert("x-api-key".to_string(), "secret".to_string());

    Config {
        max_retries: 2,
        retry_delay_seconds: 0.0,
        max_workers: 2,
        graphql_url: "https://api.example.test/graphql".into(),
        duration_days: days,
        get_hostels_url: "https://www.example.test/hostels.json".into(),
        hostel_id_url: "https://www.example.test/hostels/".into(),
        headers: vec![HeaderProfile {
            base_header,
            data_header,
        }],
        raw_dir: PathBuf::from("raw"),
        output_path: PathBuf::from("room_data.csv"),
        request_timeout_seconds: None,
        retry_delay: Duration::ZERO,
        request_timeout: None,
    }
}
