use anyhow::Result;
use log::debug;
use reqwest::{Method, RequestBuilder, Response};
use serde_json::Value;

use super::constants;
use super::models::SiteIdentity;
use super::pipeline::Pipeline;

/// HTTP client bound to one SharePoint site.
///
/// Every request goes through the site's [`Pipeline`], which adds headers and
/// the bearer token, retries transient failures and normalizes errors.
pub struct SharePointClient {
    identity: SiteIdentity,
    base_url: String,
    scopes: Vec<String>,
    pipeline: Pipeline,
}

impl SharePointClient {
    pub fn new(identity: SiteIdentity, scopes: Vec<String>, pipeline: Pipeline) -> Self {
        let base_url = identity.base_url();
        Self::with_base_url(identity, base_url, scopes, pipeline)
    }

    /// Bind to an explicit base URL instead of the one derived from the identity
    pub fn with_base_url(
        identity: SiteIdentity,
        base_url: String,
        scopes: Vec<String>,
        pipeline: Pipeline,
    ) -> Self {
        Self {
            identity,
            base_url,
            scopes,
            pipeline,
        }
    }

    pub fn identity(&self) -> &SiteIdentity {
        &self.identity
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Scopes the bearer token is requested for
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    pub fn behavior_names(&self) -> Vec<&'static str> {
        self.pipeline.behavior_names()
    }

    /// Start a request against `{base_url}/_api/{path}`
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.request_url(method, &constants::api_endpoint(&self.base_url, path))
    }

    fn request_url(&self, method: Method, url: &str) -> RequestBuilder {
        self.pipeline.http_client().request(method, url)
    }

    /// Send a request built with [`SharePointClient::request`] through the pipeline
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let request = builder.build()?;
        debug!("{} {}", request.method(), request.url());
        self.pipeline.send(request).await
    }

    pub async fn get_json(&self, path: &str) -> Result<Value> {
        let response = self.send(self.request(Method::GET, path)).await?;
        read_json(response).await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        let response = self.send(self.request(Method::POST, path).json(body)).await?;
        read_json(response).await
    }

    /// The site's web object
    pub async fn web(&self) -> Result<Value> {
        self.get_json("web").await
    }

    pub async fn list_by_title(&self, title: &str) -> Result<Value> {
        let url = constants::list_by_title_endpoint(&self.base_url, title);
        let response = self.send(self.request_url(Method::GET, &url)).await?;
        read_json(response).await
    }
}

/// Empty bodies (204, or 200 with no content) come back as `Value::Null`
async fn read_json(response: Response) -> Result<Value> {
    let bytes = response.bytes().await?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(&bytes)?)
}
