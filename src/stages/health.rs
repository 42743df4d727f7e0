//! Backend liveness stage.

use crate::api::Fetch;
use crate::runner::{Stage, StageContext};

/// `GET /health` must answer 200; the reported version is recorded.
pub struct BackendHealth;

impl Stage for BackendHealth {
    fn name(&self) -> &str {
        "Backend Health"
    }

    fn gating(&self) -> bool {
        true
    }

    fn execute(&self, ctx: &mut StageContext<'_>) -> anyhow::Result<()> {
        let path = ctx.config().backend.health_path.clone();
        let outcome = ctx.api().get(&path).fetch();
        match outcome {
            Ok(resp) if resp.status == 200 => {
                let version = resp
                    .str_field("version")
                    .unwrap_or_else(|| "unknown".to_string());
                ctx.pass(
                    self.name(),
                    format!("Backend is running - Version {}", version),
                );
            }
            Ok(resp) => ctx.fail(self.name(), format!("Status code: {}", resp.status)),
            Err(e) if e.is_connect() => ctx.fail(self.name(), "Backend server not running"),
            Err(e) => ctx.fail(self.name(), format!("Error: {}", e)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HarnessError;
    use crate::stages::testing::Harness;
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn healthy_backend_reports_version() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/health");
            then.status(200)
                .json_body(json!({"status": "healthy", "version": "2.1.0"}));
        });

        let mut h = Harness::new(&server.base_url());
        h.run(vec![Box::new(BackendHealth)]).unwrap();

        assert_eq!(
            h.check("Backend Health"),
            Some((true, "Backend is running - Version 2.1.0".to_string()))
        );
    }

    #[test]
    fn missing_version_is_unknown() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/health");
            then.status(200).json_body(json!({"status": "healthy"}));
        });

        let mut h = Harness::new(&server.base_url());
        h.run(vec![Box::new(BackendHealth)]).unwrap();
        assert_eq!(
            h.check("Backend Health").unwrap().1,
            "Backend is running - Version unknown"
        );
    }

    #[test]
    fn unhealthy_backend_gates_the_run() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/health");
            then.status(503);
        });

        let mut h = Harness::new(&server.base_url());
        let err = h
            .run(vec![
                Box::new(BackendHealth),
                Box::new(crate::stages::auth::UserRegistration),
            ])
            .unwrap_err();

        assert!(matches!(err, HarnessError::GatingStage { .. }));
        assert_eq!(
            h.checks(),
            vec![(
                "Backend Health".to_string(),
                false,
                "Status code: 503".to_string()
            )]
        );
    }

    #[test]
    fn unreachable_backend_is_not_running() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let mut h = Harness::new(&format!("http://127.0.0.1:{}", port));
        assert!(h.run(vec![Box::new(BackendHealth)]).is_err());
        assert_eq!(
            h.check("Backend Health"),
            Some((false, "Backend server not running".to_string()))
        );
    }
}
