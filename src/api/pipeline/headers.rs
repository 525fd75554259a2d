use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Request, Response};

use super::{Behavior, Next};
use crate::api::constants::headers;

/// Standard SharePoint headers, only filled in where the caller left them unset
#[derive(Debug, Clone, Default)]
pub struct DefaultHeaders;

impl DefaultHeaders {
    pub fn new() -> Self {
        Self
    }

    pub fn apply(&self, request: &mut Request) {
        let has_body = request.body().is_some();
        let request_id = uuid::Uuid::new_v4().to_string();
        let map = request.headers_mut();

        map.entry(ACCEPT)
            .or_insert(HeaderValue::from_static(headers::ACCEPT_JSON));
        map.entry(USER_AGENT)
            .or_insert(HeaderValue::from_static(headers::LIBRARY_USER_AGENT));
        map.entry(HeaderName::from_static("x-clientservice-clienttag"))
            .or_insert(HeaderValue::from_static(headers::LIBRARY_CLIENT_TAG));
        if has_body {
            map.entry(CONTENT_TYPE)
                .or_insert(HeaderValue::from_static(headers::CONTENT_TYPE_JSON));
        }
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            map.entry(HeaderName::from_static(headers::CLIENT_REQUEST_ID))
                .or_insert(value);
        }
    }
}

#[async_trait]
impl Behavior for DefaultHeaders {
    fn name(&self) -> &'static str {
        "DefaultHeaders"
    }

    async fn handle(&self, mut request: Request, next: Next<'_>) -> Result<Response> {
        self.apply(&mut request);
        next.run(request).await
    }
}

/// Sets fixed headers on every request, replacing whatever was there before
#[derive(Debug, Clone)]
pub struct InjectHeaders {
    headers: HeaderMap,
}

impl InjectHeaders {
    pub fn new<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            let name = name.as_ref();
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .with_context(|| format!("Invalid header name: {}", name))?;
            let header_value = HeaderValue::from_str(value.as_ref())
                .with_context(|| format!("Invalid value for header {}", name))?;
            map.insert(header_name, header_value);
        }
        Ok(Self { headers: map })
    }

    /// `UserAgent` and `X-ClientTag`, both carrying the configured user agent
    pub fn user_agent(user_agent: &str) -> Result<Self> {
        Self::new([
            (headers::USER_AGENT_CUSTOM, user_agent),
            (headers::CLIENT_TAG, user_agent),
        ])
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn apply(&self, request: &mut Request) {
        let map = request.headers_mut();
        for (name, value) in &self.headers {
            map.insert(name.clone(), value.clone());
        }
    }
}

#[async_trait]
impl Behavior for InjectHeaders {
    fn name(&self) -> &'static str {
        "InjectHeaders"
    }

    async fn handle(&self, mut request: Request, next: Next<'_>) -> Result<Response> {
        self.apply(&mut request);
        next.run(request).await
    }
}
