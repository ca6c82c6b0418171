//! Event Scripts
//!
//! A script is a JSON document describing one session and the interaction
//! outcomes the orchestrator reported for it, in order. Replaying a script
//! drives the store exactly as the runtime would, without calling a model.

use crate::store::{InMemorySessionStore, SessionKey, StoreError};
use anyhow::{Context, Result};
use sahayak_core::{
    Domain, SessionEvent, SessionState, StateError,
    activity::ActivityEvent,
    clock::Clock,
    planning::PlanningEvent,
    summary::SessionSummary,
};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::info;

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Script {
    pub domain: Domain,
    pub owner_id: String,
    /// Defaults to `{domain}_app`.
    #[serde(default)]
    pub app_name: Option<String>,
    /// Defaults to the generated state session id.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Grade level (fun activity) or teaching style (planning).
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub events: Vec<ScriptStep>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptStep {
    Activity(ActivityEvent),
    Planning(PlanningEvent),
    Interaction { content: String },
}

#[derive(Serialize, Debug, Clone)]
pub struct ReplayOutcome {
    pub key: SessionKey,
    pub state: SessionState,
    pub summary: SessionSummary,
}

impl Script {
    pub fn parse(text: &str) -> Result<Self, StateError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Could not read script {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Could not parse script {}", path.display()))
    }
}

/// Creates the script's session in `store` and applies every step in order.
///
/// `fallback_default` is used when the script does not name its own default.
/// Replay stops at the first step the session rejects.
pub fn replay(
    script: &Script,
    store: &mut InMemorySessionStore,
    clock: &dyn Clock,
    fallback_default: &str,
) -> Result<ReplayOutcome, StoreError> {
    let default = script.default.as_deref().unwrap_or(fallback_default);
    let initial = SessionState::initialize(script.domain, &script.owner_id, Some(default), clock);

    let key = SessionKey::new(
        script
            .app_name
            .clone()
            .unwrap_or_else(|| format!("{}_app", script.domain)),
        script.owner_id.clone(),
        script
            .session_id
            .clone()
            .unwrap_or_else(|| initial.session_id().to_string()),
    );
    store.create(key.clone(), initial)?;

    for (index, step) in script.events.iter().enumerate() {
        match step {
            ScriptStep::Interaction { content } => {
                store.record_interaction(&key, content, clock)?;
            }
            ScriptStep::Activity(event) => {
                store.apply(&key, &SessionEvent::Activity(event.clone()), clock)?;
            }
            ScriptStep::Planning(event) => {
                store.apply(&key, &SessionEvent::Planning(event.clone()), clock)?;
            }
        }
        info!(session = %key, step = index, "Replayed script step");
    }

    let summary = store.summary(&key)?;
    let state = store
        .get(&key)
        .map(|stored| stored.state.clone())
        .ok_or_else(|| StoreError::NotFound(key.clone()))?;

    Ok(ReplayOutcome {
        key,
        state,
        summary,
    })
}
