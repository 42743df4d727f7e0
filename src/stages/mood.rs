//! Mood entry create and list.

use serde_json::json;

use crate::api::Fetch;
use crate::runner::{keys, Stage, StageContext};

use super::expect_status;

pub struct MoodEntries;

impl Stage for MoodEntries {
    fn name(&self) -> &str {
        "Mood Entries"
    }

    fn requires(&self) -> &[&'static str] {
        &[keys::ACCESS_TOKEN]
    }

    fn execute(&self, ctx: &mut StageContext<'_>) -> anyhow::Result<()> {
        let token = ctx.require(keys::ACCESS_TOKEN)?;

        let entry = json!({
            "mood": 8,
            "energy": 7,
            "stress": 3,
            "sleep_hours": 8.5,
            "notes": "Feeling great today!",
            "activities": ["exercise", "socializing"],
        });
        let outcome = ctx
            .api()
            .post("/api/mood-entries")
            .bearer_auth(&token)
            .json(&entry)
            .fetch();
        expect_status(
            ctx,
            "Create Mood Entry",
            outcome,
            &[200, 201],
            "Mood entry created successfully",
        );

        let outcome = ctx
            .api()
            .get("/api/mood-entries")
            .bearer_auth(&token)
            .fetch();
        expect_status(
            ctx,
            "Get Mood Entries",
            outcome,
            &[200],
            "Mood entries retrieved successfully",
        );

        Ok(())
    }
}
