//! Compute REST client

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use vmprov_common::{
    ComputeApi, DiskDescriptor, Error, InstanceSpec, Operation, ProviderConfig, Result, Target,
};

use crate::auth::TokenSource;

/// Per-request timeout. Operation waits are bounded separately.
const REQUEST_TIMEOUT_SECS: u64 = 150;

/// Client for the provider's compute API
pub struct ComputeClient {
    http: Client,
    base_url: String,
    tokens: TokenSource,
    token: OnceCell<String>,
}

impl ComputeClient {
    pub fn new(base_url: impl Into<String>, tokens: TokenSource) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(transport)?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
            token: OnceCell::new(),
        })
    }

    /// Build a client from configuration and ambient credentials
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let tokens = TokenSource::discover(config.credentials.as_deref())?;
        Self::new(config.api_endpoint.clone(), tokens)
    }

    fn zonal_url(&self, target: &Target, path: &str) -> String {
        format!(
            "{}/projects/{}/zones/{}/{}",
            self.base_url, target.project, target.zone, path
        )
    }

    async fn bearer(&self) -> Result<&str> {
        let token = self
            .token
            .get_or_try_init(|| self.tokens.access_token(&self.http))
            .await?;
        Ok(token.as_str())
    }

    /// Make an authenticated GET request
    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(url = %url, "GET request");

        let response = self
            .http
            .get(url)
            .bearer_auth(self.bearer().await?)
            .send()
            .await
            .map_err(transport)?;

        handle_response(response).await
    }

    /// Make an authenticated POST request
    async fn post<T, B>(&self, url: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        debug!(url = %url, "POST request");

        let response = self
            .http
            .post(url)
            .bearer_auth(self.bearer().await?)
            .json(body)
            .send()
            .await
            .map_err(transport)?;

        handle_response(response).await
    }
}

fn transport(e: reqwest::Error) -> Error {
    Error::Transport(e.to_string())
}

/// Map the HTTP status onto the error kinds callers care about
async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let text = response.text().await.map_err(transport)?;

    if status.is_success() {
        serde_json::from_str(&text).map_err(|e| {
            warn!(error = %e, body = %text, "Failed to parse response");
            Error::Serialization(e)
        })
    } else if status == StatusCode::NOT_FOUND {
        Err(Error::NotFound(text))
    } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        Err(Error::Auth(text))
    } else {
        Err(Error::Api {
            status: status.as_u16(),
            message: text,
        })
    }
}

#[async_trait]
impl ComputeApi for ComputeClient {
    async fn insert_instance(&self, target: &Target, spec: &InstanceSpec) -> Result<Operation> {
        self.post(&self.zonal_url(target, "instances"), spec).await
    }

    async fn get_disk(&self, target: &Target, disk: &str) -> Result<DiskDescriptor> {
        self.get(&self.zonal_url(target, &format!("disks/{}", disk)))
            .await
    }

    async fn resize_disk(&self, target: &Target, disk: &str, size_gb: u64) -> Result<Operation> {
        let url = self.zonal_url(target, &format!("disks/{}/resize", disk));
        self.post(&url, &json!({ "sizeGb": size_gb.to_string() }))
            .await
    }

    async fn suspend_instance(&self, target: &Target, instance: &str) -> Result<Operation> {
        let url = self.zonal_url(target, &format!("instances/{}/suspend", instance));
        self.post(&url, &json!({})).await
    }

    async fn wait_operation(&self, target: &Target, operation: &str) -> Result<Operation> {
        let url = self.zonal_url(target, &format!("operations/{}/wait", operation));
        self.post(&url, &json!({})).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vmprov_common::operation::OperationStatus;
    use wiremock::matchers::{body_json, body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn target() -> Target {
        Target::new("lab", "europe-west2-a")
    }

    fn client(server: &MockServer) -> ComputeClient {
        ComputeClient::new(server.uri(), TokenSource::Static("test-token".to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_insert_posts_spec_with_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/projects/lab/zones/europe-west2-a/instances"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_partial_json(json!({
                "name": "vm-a",
                "machineType": "zones/europe-west2-a/machineTypes/e2-small"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "operation-1",
                "status": "RUNNING",
                "operationType": "insert"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let spec = InstanceSpec::builder("vm-a", "zones/europe-west2-a/machineTypes/e2-small")
            .build()
            .unwrap();
        let op = client(&server).insert_instance(&target(), &spec).await.unwrap();
        assert_eq!(op.name, "operation-1");
        assert_eq!(op.status, OperationStatus::Running);
    }

    #[tokio::test]
    async fn test_resize_sends_size_as_string() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/projects/lab/zones/europe-west2-a/disks/vm-a/resize"))
            .and(body_json(json!({ "sizeGb": "200" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "operation-2",
                "status": "DONE"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let op = client(&server).resize_disk(&target(), "vm-a", 200).await.unwrap();
        assert!(op.is_done());
    }

    #[tokio::test]
    async fn test_get_disk_and_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/projects/lab/zones/europe-west2-a/disks/vm-a"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "vm-a",
                "sizeGb": "100",
                "status": "READY"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/projects/lab/zones/europe-west2-a/disks/ghost"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .mount(&server)
            .await;

        let client = client(&server);
        let disk = client.get_disk(&target(), "vm-a").await.unwrap();
        assert_eq!(disk.size_gb, Some(100));

        let err = client.get_disk(&target(), "ghost").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_rejected_credentials_map_to_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/projects/lab/zones/europe-west2-a/instances/vm-a/suspend"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid credentials"))
            .mount(&server)
            .await;

        let err = client(&server)
            .suspend_instance(&target(), "vm-a")
            .await
            .unwrap_err();
        assert!(err.is_auth());
    }

    #[tokio::test]
    async fn test_wait_operation_and_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/projects/lab/zones/europe-west2-a/operations/operation-1/wait"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "operation-1",
                "status": "DONE",
                "warnings": [{"code": "SINGLE_INSTANCE_PROPERTY_TEMPLATE", "message": "note"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/projects/lab/zones/europe-west2-a/operations/operation-2/wait"))
            .respond_with(ResponseTemplate::new(503).set_body_string("backend unavailable"))
            .mount(&server)
            .await;

        let client = client(&server);
        let op = client.wait_operation(&target(), "operation-1").await.unwrap();
        assert!(op.is_done());
        assert_eq!(op.warnings.len(), 1);

        let err = client.wait_operation(&target(), "operation-2").await.unwrap_err();
        assert!(matches!(err, Error::Api { status: 503, .. }));
    }
}
