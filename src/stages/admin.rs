//! Admin login and admin endpoints.

use serde_json::Value;

use crate::api::Fetch;
use crate::runner::{keys, Stage, StageContext};

use super::auth::{access_token, login};
use super::{accepted, expect_status};

fn is_admin(body: &Value) -> bool {
    body.pointer("/user/is_admin")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Logs the configured admin account in. The token is published only
/// when the backend confirms the account is privileged.
pub struct AdminLogin;

impl Stage for AdminLogin {
    fn name(&self) -> &str {
        "Admin Login"
    }

    fn produces(&self) -> &[&'static str] {
        &[keys::ADMIN_TOKEN]
    }

    fn execute(&self, ctx: &mut StageContext<'_>) -> anyhow::Result<()> {
        let Some(admin) = ctx.config().credentials.admin.clone() else {
            ctx.fail(self.name(), "No admin credentials configured");
            return Ok(());
        };

        let outcome = login(ctx, &admin);
        let Some(resp) = accepted(ctx, self.name(), outcome, &[200]) else {
            return Ok(());
        };
        let Some(body) = resp.json() else {
            ctx.fail(self.name(), "Invalid response format");
            return Ok(());
        };

        match access_token(&body) {
            Some(token) if is_admin(&body) => {
                ctx.pass(self.name(), "Admin login successful");
                ctx.provide(keys::ADMIN_TOKEN, token);
            }
            Some(_) => ctx.fail(self.name(), "Login successful but not admin"),
            None => ctx.fail(self.name(), "Invalid response format"),
        }
        Ok(())
    }
}

/// Statistics and user listing behind the admin token.
pub struct AdminPanel;

impl Stage for AdminPanel {
    fn name(&self) -> &str {
        "Admin"
    }

    fn requires(&self) -> &[&'static str] {
        &[keys::ADMIN_TOKEN]
    }

    fn execute(&self, ctx: &mut StageContext<'_>) -> anyhow::Result<()> {
        let token = ctx.require(keys::ADMIN_TOKEN)?;

        let outcome = ctx.api().get("/api/admin/stats").bearer_auth(&token).fetch();
        expect_status(
            ctx,
            "Admin Stats",
            outcome,
            &[200],
            "Admin statistics retrieved",
        );

        let outcome = ctx.api().get("/api/admin/users").bearer_auth(&token).fetch();
        expect_status(ctx, "Admin Users List", outcome, &[200], "Users list retrieved");

        Ok(())
    }
}
