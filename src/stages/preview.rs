//! Account-less preview flow.

use serde_json::json;

use crate::api::Fetch;
use crate::runner::{keys, Stage, StageContext};

use super::{accepted, expect_status};

/// Opens a preview session and publishes its id.
pub struct PreviewSession;

impl Stage for PreviewSession {
    fn name(&self) -> &str {
        "Preview Session"
    }

    fn produces(&self) -> &[&'static str] {
        &[keys::SESSION_ID]
    }

    fn execute(&self, ctx: &mut StageContext<'_>) -> anyhow::Result<()> {
        const CHECK: &str = "Preview Session Creation";

        let outcome = ctx.api().post("/api/preview/session").fetch();
        let Some(resp) = accepted(ctx, CHECK, outcome, &[200]) else {
            return Ok(());
        };

        match resp.str_field("session_id").filter(|id| !id.is_empty()) {
            Some(id) => {
                let short: String = id.chars().take(8).collect();
                ctx.pass(CHECK, format!("Session created: {}...", short));
                ctx.provide(keys::SESSION_ID, id);
            }
            None => ctx.fail(CHECK, "Invalid response format"),
        }
        Ok(())
    }
}

/// Mood entry, analysis and insights within the preview session.
pub struct PreviewFlow;

impl Stage for PreviewFlow {
    fn name(&self) -> &str {
        "Preview Flow"
    }

    fn requires(&self) -> &[&'static str] {
        &[keys::SESSION_ID]
    }

    fn execute(&self, ctx: &mut StageContext<'_>) -> anyhow::Result<()> {
        let session = ctx.require(keys::SESSION_ID)?;

        let outcome = ctx
            .api()
            .post("/api/preview/mood-entries")
            .form(&[
                ("session_id", session.as_str()),
                ("mood", "8"),
                ("energy", "7"),
                ("stress", "3"),
                ("sleep_hours", "8.5"),
                ("notes", "Feeling great in preview mode!"),
                ("activities", r#"["exercise", "socializing"]"#),
            ])
            .fetch();
        expect_status(
            ctx,
            "Preview Mood Entry",
            outcome,
            &[200],
            "Mood entry created successfully",
        );

        let outcome = ctx
            .api()
            .post("/api/preview/analyze-mood")
            .json(&json!({
                "session_id": session,
                "text": "I'm feeling really happy and excited about trying this app!",
            }))
            .fetch();
        expect_status(
            ctx,
            "Preview AI Analysis",
            outcome,
            &[200],
            "AI analysis working",
        );

        let outcome = ctx
            .api()
            .get("/api/preview/insights")
            .query(&[("session_id", session.as_str())])
            .fetch();
        expect_status(
            ctx,
            "Preview Insights",
            outcome,
            &[200],
            "Insights generated successfully",
        );

        Ok(())
    }
}
