//! HTTP implementation of the management API traits.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::models::{
    CreateEnvironmentDto, CreateFeatureDto, Environment, Feature, UpdateEnvironmentDto,
    UpdateFeatureDto,
};
use super::response::{ApiError, ApiResponse, ApiResult, STATUS_OK};
use super::{EnvironmentsApi, FeaturesApi};

/// Production API host.
pub const DEFAULT_API_URL: &str = "https://api.devcycle.com";

/// Maximum length of response body to log
const MAX_LOG_BODY_LENGTH: usize = 200;

fn sanitize_for_log(body: &str) -> String {
    let mut truncated: String = body.chars().take(MAX_LOG_BODY_LENGTH).collect();
    if truncated.len() < body.len() {
        truncated.push_str(&format!("... [truncated, {} bytes total]", body.len()));
    }
    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Authenticated client for the DevCycle management API.
#[derive(Clone)]
pub struct DevCycleClient {
    http: Client,
    base_url: Url,
    token: String,
}

impl std::fmt::Debug for DevCycleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DevCycleClient")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"<redacted>")
            .finish()
    }
}

impl DevCycleClient {
    /// Create a client for `base_url` that sends `token` as a bearer credential.
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self, ApiError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }

        let http = Client::builder()
            .user_agent(concat!("devcycle-provider/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            token: token.into(),
        })
    }

    /// Base URL every endpoint path is appended to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build `<base>/v1/<segments...>`, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push("v1")
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        tracing::debug!(%method, %url, "DevCycle API request");
        self.http.request(method, url).bearer_auth(&self.token)
    }

    async fn execute(&self, request: RequestBuilder) -> Result<(u16, String), ApiError> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        if status != STATUS_OK {
            tracing::error!(status, body = %sanitize_for_log(&body), "DevCycle API error");
        }
        Ok((status, body))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let (status, body) = self.execute(request).await?;
        if status != STATUS_OK {
            return Ok(ApiResponse::failed(status, body));
        }
        Ok(ApiResponse::ok(serde_json::from_str(&body)?))
    }

    async fn send_empty(&self, request: RequestBuilder) -> ApiResult<()> {
        let (status, body) = self.execute(request).await?;
        if status != STATUS_OK {
            return Ok(ApiResponse::failed(status, body));
        }
        Ok(ApiResponse::ok(()))
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> ApiResult<T> {
        let url = self.endpoint(segments)?;
        self.send_json(self.request(Method::GET, url)).await
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> ApiResult<T> {
        let url = self.endpoint(segments)?;
        self.send_json(self.request(Method::POST, url).json(body)).await
    }

    async fn patch<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> ApiResult<T> {
        let url = self.endpoint(segments)?;
        self.send_json(self.request(Method::PATCH, url).json(body)).await
    }

    async fn delete(&self, segments: &[&str]) -> ApiResult<()> {
        let url = self.endpoint(segments)?;
        self.send_empty(self.request(Method::DELETE, url)).await
    }
}

#[async_trait]
impl EnvironmentsApi for DevCycleClient {
    async fn find_environment(&self, key: &str, project: &str) -> ApiResult<Environment> {
        self.get(&["projects", project, "environments", key]).await
    }

    async fn create_environment(
        &self,
        dto: &CreateEnvironmentDto,
        project: &str,
    ) -> ApiResult<Environment> {
        self.post(&["projects", project, "environments"], dto).await
    }

    async fn update_environment(
        &self,
        dto: &UpdateEnvironmentDto,
        key: &str,
        project: &str,
    ) -> ApiResult<Environment> {
        self.patch(&["projects", project, "environments", key], dto)
            .await
    }

    async fn remove_environment(&self, key: &str, project: &str) -> ApiResult<()> {
        self.delete(&["projects", project, "environments", key]).await
    }
}

#[async_trait]
impl FeaturesApi for DevCycleClient {
    async fn find_feature(&self, key: &str, project: &str) -> ApiResult<Feature> {
        self.get(&["projects", project, "features", key]).await
    }

    async fn create_feature(&self, dto: &CreateFeatureDto, project: &str) -> ApiResult<Feature> {
        self.post(&["projects", project, "features"], dto).await
    }

    async fn update_feature(
        &self,
        dto: &UpdateFeatureDto,
        key: &str,
        project: &str,
    ) -> ApiResult<Feature> {
        self.patch(&["projects", project, "features", key], dto).await
    }

    async fn remove_feature(&self, key: &str, project: &str) -> ApiResult<()> {
        self.delete(&["projects", project, "features", key]).await
    }
}
