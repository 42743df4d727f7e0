//! AI analysis endpoints. Only status codes are verified.

use serde_json::{json, Value};

use crate::api::Fetch;
use crate::runner::{keys, Stage, StageContext};

use super::expect_status;

struct Probe {
    check: &'static str,
    path: &'static str,
    success: &'static str,
}

const PROBES: [Probe; 4] = [
    Probe {
        check: "Mood Prediction",
        path: "/api/ai/predict-mood",
        success: "AI mood prediction working",
    },
    Probe {
        check: "Sentiment Analysis",
        path: "/api/ai/sentiment-analysis",
        success: "Sentiment analysis working",
    },
    Probe {
        check: "Smart Recommendations",
        path: "/api/ai/smart-recommendations",
        success: "Smart recommendations working",
    },
    Probe {
        check: "Therapeutic AI",
        path: "/api/therapy/analyze-emotion",
        success: "Therapeutic AI analysis working",
    },
];

fn payload(path: &str) -> Value {
    match path {
        "/api/ai/predict-mood" => json!({"text": "I am feeling very happy today!"}),
        "/api/ai/sentiment-analysis" => json!({"text": "I am feeling stressed and overwhelmed"}),
        "/api/ai/smart-recommendations" => json!({
            "current_context": {
                "mood": 6,
                "energy": 5,
                "weather": "sunny",
                "time_of_day": "afternoon",
            }
        }),
        _ => json!({"text": "I am feeling sad and lonely"}),
    }
}

pub struct AiAnalysis;

impl Stage for AiAnalysis {
    fn name(&self) -> &str {
        "AI Analysis"
    }

    fn requires(&self) -> &[&'static str] {
        &[keys::ACCESS_TOKEN]
    }

    fn execute(&self, ctx: &mut StageContext<'_>) -> anyhow::Result<()> {
        let token = ctx.require(keys::ACCESS_TOKEN)?;

        for probe in &PROBES {
            let outcome = ctx
                .api()
                .post(probe.path)
                .bearer_auth(&token)
                .json(&payload(probe.path))
                .fetch();
            expect_status(ctx, probe.check, outcome, &[200], probe.success);
        }
        Ok(())
    }
}
