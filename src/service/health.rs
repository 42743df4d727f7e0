//! Liveness probing for the backend.

use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;

/// Result of a single liveness probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthProbe {
    /// The service answered with a success status.
    Healthy {
        /// `version` field of the response body, if present
        version: Option<String>,
    },
    /// Nothing answered yet (connection refused, timeout). Expected while
    /// the process is still starting.
    Unavailable(String),
    /// The service answered with a non-success status.
    BadStatus(u16),
}

/// A readiness check polled by the supervisor.
pub trait HealthCheck {
    /// Probe once, returning within `budget`.
    fn check(&self, budget: Duration) -> HealthProbe;

    /// Human-readable target for logs.
    fn describe(&self) -> String;
}

/// HTTP GET against the backend's liveness path.
pub struct HttpHealthCheck {
    client: Client,
    url: String,
    request_timeout: Duration,
}

impl HttpHealthCheck {
    /// Build a check for `<base_url><path>`. No single request runs longer
    /// than `request_timeout`, or the caller's budget when that is shorter.
    pub fn new(base_url: &str, path: &str, request_timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            url: format!("{}{}", base_url.trim_end_matches('/'), path),
            request_timeout,
        })
    }
}

impl HealthCheck for HttpHealthCheck {
    fn check(&self, budget: Duration) -> HealthProbe {
        let timeout = budget.min(self.request_timeout);
        match self.client.get(&self.url).timeout(timeout).send() {
            Ok(resp) if resp.status().is_success() => {
                let version = resp
                    .json::<Value>()
                    .ok()
                    .and_then(|body| body.get("version").and_then(Value::as_str).map(String::from));
                HealthProbe::Healthy { version }
            }
            Ok(resp) => HealthProbe::BadStatus(resp.status().as_u16()),
            Err(e) => {
                // Connection refused is expected while the server is starting
                if !e.is_connect() && !e.is_timeout() {
                    tracing::warn!("Health check error: {}", e);
                }
                HealthProbe::Unavailable(e.to_string())
            }
        }
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}
