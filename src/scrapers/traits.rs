use crate::scrapers::error::TransportError;
use crate::scrapers::types::ApiRequest;
use async_trait::async_trait;
use serde_json::Value;

/// One HTTP exchange with the provider, returning the parsed JSON body.
/// Kept behind a trait so the pipeline can run against a stubbed provider.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<Value, TransportError>;
}
