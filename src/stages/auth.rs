//! Registration and login.

use serde_json::Value;

use crate::api::{ApiResponse, Fetch};
use crate::config::Account;
use crate::runner::{keys, Stage, StageContext};

use super::{accepted, expect_status};

fn display_name(account: &Account) -> &str {
    account.name.as_deref().unwrap_or("Test User")
}

/// Registers the configured test user. An existing account is a failure
/// of this check only; login still runs.
pub struct UserRegistration;

impl Stage for UserRegistration {
    fn name(&self) -> &str {
        "User Registration"
    }

    fn execute(&self, ctx: &mut StageContext<'_>) -> anyhow::Result<()> {
        let user = ctx.config().credentials.user.clone();
        let outcome = ctx
            .api()
            .post("/api/auth/register")
            .form(&[
                ("email", user.email.as_str()),
                ("password", user.password.as_str()),
                ("name", display_name(&user)),
            ])
            .fetch();

        expect_status(
            ctx,
            self.name(),
            outcome,
            &[200, 201],
            "User registered successfully",
        );
        Ok(())
    }
}

/// Logs the test user in and publishes the bearer token.
pub struct UserLogin;

impl Stage for UserLogin {
    fn name(&self) -> &str {
        "User Login"
    }

    fn produces(&self) -> &[&'static str] {
        &[keys::ACCESS_TOKEN]
    }

    fn execute(&self, ctx: &mut StageContext<'_>) -> anyhow::Result<()> {
        let user = ctx.config().credentials.user.clone();
        let outcome = login(ctx, &user);
        let Some(resp) = accepted(ctx, self.name(), outcome, &[200]) else {
            return Ok(());
        };

        match resp.json().as_ref().and_then(access_token) {
            Some(token) => {
                ctx.pass(self.name(), "Login successful");
                ctx.provide(keys::ACCESS_TOKEN, token);
            }
            None => ctx.fail(self.name(), "Invalid response format"),
        }
        Ok(())
    }
}

/// Form-encoded login for an account.
pub(crate) fn login(ctx: &StageContext<'_>, account: &Account) -> reqwest::Result<ApiResponse> {
    ctx.api()
        .post("/api/auth/login")
        .form(&[
            ("email", account.email.as_str()),
            ("password", account.password.as_str()),
        ])
        .fetch()
}

/// Token from a login body that also reports `success: true`.
pub(crate) fn access_token(body: &Value) -> Option<String> {
    let success = body.get("success").and_then(Value::as_bool).unwrap_or(false);
    if !success {
        return None;
    }
    body.get("access_token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(String::from)
}
