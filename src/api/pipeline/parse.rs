use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use reqwest::{Request, Response, StatusCode};
use serde_json::Value;
use std::fmt;

use super::{Behavior, Next};

/// A non-success answer from SharePoint, normalized from its OData error body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePointError {
    pub status: StatusCode,
    pub code: Option<String>,
    pub message: String,
}

impl SharePointError {
    /// Understands the `odata.error` (nometadata/minimal) and `error`
    /// (verbose, Graph-style) shapes; anything else becomes the raw body.
    pub fn from_body(status: StatusCode, body: &str) -> Self {
        let parsed = serde_json::from_str::<Value>(body).ok();
        let error = parsed
            .as_ref()
            .and_then(|v| v.get("odata.error").or_else(|| v.get("error")));

        let code = error
            .and_then(|e| e.get("code"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let message = error
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str().or_else(|| m.get("value").and_then(Value::as_str)))
            .or_else(|| {
                parsed
                    .as_ref()
                    .and_then(|v| v.get("error_description"))
                    .and_then(Value::as_str)
            })
            .map(str::to_string)
            .unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    status.canonical_reason().unwrap_or("Unknown error").to_string()
                } else {
                    trimmed.to_string()
                }
            });

        Self {
            status,
            code,
            message,
        }
    }
}

impl fmt::Display for SharePointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(
                f,
                "SharePoint request failed ({}): {} [{}]",
                self.status, self.message, code
            ),
            None => write!(f, "SharePoint request failed ({}): {}", self.status, self.message),
        }
    }
}

impl std::error::Error for SharePointError {}

/// Passes successful responses through and turns the rest into [`SharePointError`]
#[derive(Debug, Clone, Default)]
pub struct DefaultParse;

#[async_trait]
impl Behavior for DefaultParse {
    fn name(&self) -> &'static str {
        "DefaultParse"
    }

    async fn handle(&self, request: Request, next: Next<'_>) -> Result<Response> {
        let response = next.run(request).await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().clone();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!("Could not read error body from {}: {}", url, e);
                String::new()
            }
        };
        let error = SharePointError::from_body(status, &body);
        debug!("{} returned {}", url, error);

        Err(error.into())
    }
}
