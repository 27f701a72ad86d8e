// src/utils/http.rs
use std::time::Duration;
use anyhow::{Result, Context};
use reqwest::{Client, Response, header};
use serde::Serialize;
use tracing::debug;

/// HTTP client for talking to analysis services
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    user_agent: String,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(user_agent: Option<String>, timeout_secs: Option<u64>) -> Result<Self> {
        let user_agent = user_agent.unwrap_or_else(|| format!("trimurti/{}", env!("CARGO_PKG_VERSION")));
        let timeout = Duration::from_secs(timeout_secs.unwrap_or(30));

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(&user_agent)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, user_agent })
    }

    /// Make a GET request with query parameters; non-success statuses are errors
    pub async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<Response> {
        debug!("GET {}", url);

        self.client
            .get(url)
            .query(query)
            .send()
            .await
            .context(format!("Failed to GET {}", url))?
            .error_for_status()
            .context(format!("{} returned an error status", url))
    }

    /// Make a POST request with JSON body; non-success statuses are errors
    pub async fn post_json<T: Serialize>(&self, url: &str, data: &T) -> Result<Response> {
        debug!("POST {}", url);

        self.client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(data)
            .send()
            .await
            .context(format!("Failed to POST to {}", url))?
            .error_for_status()
            .context(format!("{} returned an error status", url))
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_user_agent() {
        let client = HttpClient::new(None, Some(5)).unwrap();
        assert!(client.user_agent().starts_with("trimurti/"));
    }
}
