//! HTTP service adapter — invokes a downstream service by POSTing the
//! request as JSON to its endpoint.

use async_trait::async_trait;
use std::time::Duration;
use switchboard_core::error::ServiceError;
use switchboard_core::service::{Service, ServiceDescriptor, ServiceRequest};
use tracing::debug;

/// A service reachable at `POST {endpoint}` with health at `GET {endpoint}/health`.
pub struct HttpService {
    name: String,
    endpoint: String,
    client: reqwest::Client,
}

impl HttpService {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .unwrap_or_default(),
        }
    }

    pub fn from_descriptor(descriptor: &ServiceDescriptor) -> Self {
        Self::new(descriptor.name.clone(), descriptor.endpoint.clone())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Service for HttpService {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, request: &ServiceRequest) -> Result<serde_json::Value, ServiceError> {
        debug!(service = %self.name, endpoint = %self.endpoint, "Sending service request");

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::InvocationFailed {
                service: self.name.clone(),
                message: format!("HTTP {status}: {body}"),
            });
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| ServiceError::InvocationFailed {
                service: self.name.clone(),
                message: format!("Failed to parse response: {e}"),
            })
    }

    async fn health_check(&self) -> Result<f32, ServiceError> {
        let response = self
            .client
            .get(format!("{}/health", self.endpoint))
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Ok(0.0);
        }

        // A bare 2xx means healthy; a JSON body may carry a finer-grained score.
        let score = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| body.get("score").and_then(|s| s.as_f64()))
            .unwrap_or(1.0);
        Ok((score as f32).clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_core::capability::Capability;
    use switchboard_core::service::Tier;

    #[test]
    fn from_descriptor_trims_trailing_slash() {
        let d = ServiceDescriptor::new("code", vec![Capability::CodeAnalysis], Tier::Primary)
            .with_endpoint("http://localhost:8101/");
        let svc = HttpService::from_descriptor(&d);
        assert_eq!(svc.name(), "code");
        assert_eq!(svc.endpoint(), "http://localhost:8101");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_network_error() {
        let svc = HttpService::new("ghost", "http://127.0.0.1:1");
        let request = ServiceRequest {
            text: "hello".into(),
            analyzed: crate::analyzer::analyze("hello", None),
        };
        let err = svc.invoke(&request).await.unwrap_err();
        assert!(matches!(err, ServiceError::Network(_)));
        assert!(svc.health_check().await.is_err());
    }
}
