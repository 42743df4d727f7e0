//! HTTP client for the backend API.
//!
//! Every request carries the configured timeout so an unresponsive
//! backend degrades into a failed check instead of a hang.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use serde_json::Value;

/// Blocking client bound to the backend's base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Absolute URL for an API path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }
}

/// Status and body of a completed request.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    /// Body parsed as JSON, if it is JSON.
    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }

    /// String field at the top level of a JSON body.
    pub fn str_field(&self, key: &str) -> Option<String> {
        self.json()?.get(key)?.as_str().map(String::from)
    }
}

/// Send a request and read the whole body.
pub trait Fetch {
    fn fetch(self) -> reqwest::Result<ApiResponse>;
}

impl Fetch for RequestBuilder {
    fn fetch(self) -> reqwest::Result<ApiResponse> {
        let resp = self.send()?;
        let status = resp.status().as_u16();
        let body = resp.text()?;
        tracing::debug!("{} <- {} bytes", status, body.len());
        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn joins_paths_onto_base() {
        let api = ApiClient::new("http://localhost:8000/", Duration::from_secs(1)).unwrap();
        assert_eq!(api.url("/api/mood-entries"), "http://localhost:8000/api/mood-entries");
    }

    #[test]
    fn fetch_reads_status_and_json() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST)
                .path("/api/preview/session")
                .header("Authorization", "Bearer t0k");
            then.status(200).json_body(json!({"session_id": "abc123"}));
        });

        let api = ApiClient::new(&server.base_url(), Duration::from_secs(2)).unwrap();
        let resp = api
            .post("/api/preview/session")
            .bearer_auth("t0k")
            .fetch()
            .unwrap();

        assert_eq!(resp.status, 200);
        assert_eq!(resp.str_field("session_id").as_deref(), Some("abc123"));
    }

    #[test]
    fn non_json_body_has_no_fields() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/plain");
            then.status(500).body("Internal Server Error");
        });

        let api = ApiClient::new(&server.base_url(), Duration::from_secs(2)).unwrap();
        let resp = api.get("/plain").fetch().unwrap();
        assert_eq!(resp.status, 500);
        assert!(resp.json().is_none());
        assert!(resp.str_field("anything").is_none());
    }

    #[test]
    fn slow_backend_times_out() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/slow");
            then.status(200).delay(Duration::from_millis(800));
        });

        let api = ApiClient::new(&server.base_url(), Duration::from_millis(100)).unwrap();
        let err = api.get("/slow").fetch().unwrap_err();
        assert!(err.is_timeout());
    }
}
