//! The verification stages run against a live backend.
//!
//! Stages are listed in execution order by [`catalogue`]; optional groups
//! are switched on and off through [`StageToggles`](crate::config::StageToggles).
//!
//! # Modules
//!
//! - [`health`] - backend liveness (gating)
//! - [`auth`] - registration and login, producing `access_token`
//! - [`mood`] - mood entry create and list
//! - [`ai`] - AI analysis endpoints
//! - [`preview`] - the account-less preview flow, producing `session_id`
//! - [`admin`] - admin login and admin endpoints, producing `admin_token`
//! - [`client`] - startup scripts and companion client checks

pub mod admin;
pub mod ai;
pub mod auth;
pub mod client;
pub mod health;
pub mod mood;
pub mod preview;

use crate::api::ApiResponse;
use crate::config::HarnessConfig;
use crate::runner::{Stage, StageContext};

/// Build the ordered stage list for a config.
pub fn catalogue(config: &HarnessConfig) -> Vec<Box<dyn Stage>> {
    let toggles = &config.stages;
    let mut stages: Vec<Box<dyn Stage>> = vec![Box::new(health::BackendHealth)];

    if toggles.api {
        stages.push(Box::new(auth::UserRegistration));
        stages.push(Box::new(auth::UserLogin));
        stages.push(Box::new(mood::MoodEntries));
        stages.push(Box::new(ai::AiAnalysis));
    }

    if toggles.preview {
        stages.push(Box::new(preview::PreviewSession));
        stages.push(Box::new(preview::PreviewFlow));
    }

    if toggles.admin {
        stages.push(Box::new(admin::AdminLogin));
        stages.push(Box::new(admin::AdminPanel));
    }

    if toggles.startup_scripts {
        stages.push(Box::new(client::StartupScripts));
    }

    if toggles.client {
        stages.push(Box::new(client::ClientStructure));
        if config.client.compile.is_some() {
            stages.push(Box::new(client::ClientCompile));
        }
    }

    stages
}

/// Record a failure for a transport error or an unexpected status.
///
/// Returns the response only when its status is one of `accepted`; the
/// caller records the passing check.
pub(crate) fn accepted(
    ctx: &mut StageContext<'_>,
    name: &str,
    outcome: reqwest::Result<ApiResponse>,
    accepted: &[u16],
) -> Option<ApiResponse> {
    match outcome {
        Ok(resp) if accepted.contains(&resp.status) => Some(resp),
        Ok(resp) => {
            ctx.fail(name, format!("Status code: {}", resp.status));
            None
        }
        Err(e) => {
            ctx.fail(name, format!("Error: {}", e));
            None
        }
    }
}

/// Record a single status-code check.
pub(crate) fn expect_status(
    ctx: &mut StageContext<'_>,
    name: &str,
    outcome: reqwest::Result<ApiResponse>,
    codes: &[u16],
    success: &str,
) {
    if accepted(ctx, name, outcome, codes).is_some() {
        ctx.pass(name, success);
    }
}
