//! Session State
//!
//! The per-owner state value passed between the caller and the aggregator. A
//! session tracks exactly one domain; the caller owns the value and replaces
//! it with whatever `apply` returns.

use crate::{
    activity::{ActivityEvent, FunActivityState},
    clock::Clock,
    error::StateError,
    planning::{PlanningEvent, PlanningState},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{fmt, str::FromStr};

/// `completed / generated`, or 0 when nothing has been generated.
pub fn completion_rate(completed: u64, generated: u64) -> f64 {
    if generated == 0 {
        0.0
    } else {
        completed as f64 / generated as f64
    }
}

/// The two tracked domains.
///
/// Decoding and [`FromStr`] accept the same names: the canonical snake_case
/// form plus a few aliases.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    #[serde(alias = "fun-activity", alias = "activity")]
    FunActivity,
    #[serde(alias = "lesson_planning", alias = "lesson-planning")]
    Planning,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::FunActivity => write!(f, "fun_activity"),
            Domain::Planning => write!(f, "planning"),
        }
    }
}

impl FromStr for Domain {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fun_activity" | "fun-activity" | "activity" => Ok(Domain::FunActivity),
            "planning" | "lesson_planning" | "lesson-planning" => Ok(Domain::Planning),
            other => Err(StateError::InvalidInput(format!("unknown domain '{}'", other))),
        }
    }
}

/// State for one (owner, domain) pair.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
#[serde(tag = "domain", rename_all = "snake_case")]
pub enum SessionState {
    FunActivity(FunActivityState),
    Planning(PlanningState),
}

/// An interaction outcome reported by the orchestrator.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    Activity(ActivityEvent),
    Planning(PlanningEvent),
}

impl SessionEvent {
    pub fn domain(&self) -> Domain {
        match self {
            SessionEvent::Activity(_) => Domain::FunActivity,
            SessionEvent::Planning(_) => Domain::Planning,
        }
    }
}

impl SessionState {
    /// Creates a fresh state. `default` is the grade level for fun activities
    /// and the teaching style for planning.
    pub fn initialize(
        domain: Domain,
        owner_id: &str,
        default: Option<&str>,
        clock: &dyn Clock,
    ) -> Self {
        match domain {
            Domain::FunActivity => {
                SessionState::FunActivity(FunActivityState::initialize(owner_id, default, clock))
            }
            Domain::Planning => {
                SessionState::Planning(PlanningState::initialize(owner_id, default, clock))
            }
        }
    }

    pub fn domain(&self) -> Domain {
        match self {
            SessionState::FunActivity(_) => Domain::FunActivity,
            SessionState::Planning(_) => Domain::Planning,
        }
    }

    pub fn owner_id(&self) -> &str {
        match self {
            SessionState::FunActivity(s) => &s.user_preferences.user_id,
            SessionState::Planning(s) => &s.teacher_preferences.teacher_id,
        }
    }

    pub fn session_id(&self) -> &str {
        match self {
            SessionState::FunActivity(s) => &s.current_session.session_id,
            SessionState::Planning(s) => &s.current_planning_session.session_id,
        }
    }

    /// Returns the state after `event`. Events for the other domain are rejected.
    pub fn apply(&self, event: &SessionEvent, clock: &dyn Clock) -> Result<Self, StateError> {
        match (self, event) {
            (SessionState::FunActivity(s), SessionEvent::Activity(e)) => {
                Ok(SessionState::FunActivity(s.apply(e)))
            }
            (SessionState::Planning(s), SessionEvent::Planning(e)) => {
                Ok(SessionState::Planning(s.apply(e, clock)))
            }
            _ => Err(StateError::InvalidInput(format!(
                "{} event cannot update a {} session",
                event.domain(),
                self.domain()
            ))),
        }
    }

    /// Suggestions for the owner: activity types, or teaching improvement messages.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            SessionState::FunActivity(s) => s.suggest_activity_types(),
            SessionState::Planning(s) => s
                .suggest_teaching_improvements()
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Decodes a state document. Missing keys take their defaults; values of
    /// the wrong type are rejected.
    pub fn from_value(value: Value) -> Result<Self, StateError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_value(&self) -> Result<Value, StateError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Top-level state sections keyed by name (`recent_topics`,
    /// `teacher_preferences`, ...), used to fill instruction placeholders.
    pub fn sections(&self) -> Result<Map<String, Value>, StateError> {
        let value = match self {
            SessionState::FunActivity(s) => serde_json::to_value(s)?,
            SessionState::Planning(s) => serde_json::to_value(s)?,
        };
        match value {
            Value::Object(map) => Ok(map),
            _ => Err(StateError::InvalidInput(
                "state did not serialize to an object".to_string(),
            )),
        }
    }
}
