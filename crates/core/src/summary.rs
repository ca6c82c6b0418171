//! Session Summary
//!
//! A read-only report over a session: preferences, recent items, aggregate
//! history and current suggestions.

use crate::{
    error::StateError,
    state::{Domain, SessionState},
};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub domain: Domain,
    pub owner_id: String,
    pub session_id: String,
    pub preferences: Value,
    /// Recent topics, or the topics of recent plans, newest first.
    pub recent: Vec<String>,
    pub history: Value,
    pub suggestions: Vec<String>,
    pub interaction_count: usize,
}

impl SessionSummary {
    pub fn from_state(state: &SessionState, interaction_count: usize) -> Result<Self, StateError> {
        let (preferences, recent, history) = match state {
            SessionState::FunActivity(s) => (
                serde_json::to_value(s.user_preferences())?,
                s.recent_topics.clone(),
                serde_json::to_value(&s.activity_history)?,
            ),
            SessionState::Planning(s) => (
                serde_json::to_value(s.teacher_preferences())?,
                s.recent_plans
                    .iter()
                    .map(|p| format!("{} ({})", p.topic, p.grade))
                    .collect(),
                serde_json::to_value(&s.planning_history)?,
            ),
        };

        Ok(Self {
            domain: state.domain(),
            owner_id: state.owner_id().to_string(),
            session_id: state.session_id().to_string(),
            preferences,
            recent,
            history,
            suggestions: state.suggestions(),
            interaction_count,
        })
    }
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (recent_label, suggestion_label) = match self.domain {
            Domain::FunActivity => ("Recent Topics", "Suggested Activity Types"),
            Domain::Planning => ("Recent Plans", "Teaching Suggestions"),
        };

        writeln!(f, "SESSION SUMMARY ({})", self.session_id)?;
        writeln!(f, "Owner: {}", self.owner_id)?;
        writeln!(f, "Preferences: {}", self.preferences)?;
        writeln!(f, "{}: [{}]", recent_label, self.recent.join(", "))?;
        writeln!(f, "History: {}", self.history)?;
        if self.suggestions.is_empty() {
            writeln!(f, "{}: none", suggestion_label)?;
        } else {
            writeln!(f, "{}:", suggestion_label)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  - {}", suggestion)?;
            }
        }
        write!(f, "Total Interactions: {}", self.interaction_count)
    }
}
