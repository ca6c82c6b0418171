//! Fun Activity Session State
//!
//! Tracks what a user has generated with the fun-activity agents (quizzes,
//! scenarios, fill-in-the-blank, word games): recently covered topics, running
//! completion counters, and the active session marker.

use crate::{
    clock::{Clock, deserialize_optional_timestamp, id_timestamp},
    history::HistoryBound,
    state::completion_rate,
};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Grade level used when the caller does not supply one.
pub const DEFAULT_GRADE_LEVEL: &str = "5th";

/// Activity categories offered to every new user, in preference order.
pub const DEFAULT_ACTIVITY_TYPES: [&str; 4] = ["quiz", "scenario", "word_games", "fitb"];

/// Preferences captured when the session is created.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct UserPreferences {
    /// Favored activity categories, most preferred first.
    pub preferred_activity_types: Vec<String>,
    pub grade_level: String,
    pub difficulty_preference: String,
    /// Session length in minutes.
    pub session_duration: u32,
    pub user_id: String,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            preferred_activity_types: DEFAULT_ACTIVITY_TYPES
                .iter()
                .map(|t| t.to_string())
                .collect(),
            grade_level: DEFAULT_GRADE_LEVEL.to_string(),
            difficulty_preference: "medium".to_string(),
            session_duration: 30,
            user_id: String::new(),
        }
    }
}

/// Running aggregates over every activity generated for the user.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct ActivityHistory {
    pub last_activity_type: Option<String>,
    pub last_topic: Option<String>,
    /// `total_activities_completed / total_activities_generated`, or 0 before any activity.
    pub completion_rate: f64,
    pub total_activities_generated: u64,
    pub total_activities_completed: u64,
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct CurrentActivitySession {
    pub topic: Option<String>,
    pub activities_generated: u64,
    #[serde(deserialize_with = "deserialize_optional_timestamp")]
    #[schemars(with = "Option<DateTime<Utc>>")]
    pub start_time: Option<DateTime<Utc>>,
    pub session_id: String,
}

/// Complete session state for the fun-activity domain.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct FunActivityState {
    pub user_preferences: UserPreferences,
    /// Most recent topic first, at most [`HistoryBound::RECENT_TOPICS`] entries.
    pub recent_topics: Vec<String>,
    pub activity_history: ActivityHistory,
    pub current_session: CurrentActivitySession,
}

/// One activity generated by the agent.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
pub struct ActivityEvent {
    pub topic: String,
    pub activity_type: String,
    #[serde(default)]
    pub completed: bool,
}

impl ActivityEvent {
    pub fn new(topic: impl Into<String>, activity_type: impl Into<String>, completed: bool) -> Self {
        Self {
            topic: topic.into(),
            activity_type: activity_type.into(),
            completed,
        }
    }
}

impl FunActivityState {
    /// Builds the state for a new user session.
    ///
    /// The clock is read once; the start time and the session id
    /// (`fun_activity_{user_id}_{%Y%m%d_%H%M%S}`) share that instant.
    pub fn initialize(user_id: &str, grade_level: Option<&str>, clock: &dyn Clock) -> Self {
        let now = clock.now();
        Self {
            user_preferences: UserPreferences {
                grade_level: grade_level.unwrap_or(DEFAULT_GRADE_LEVEL).to_string(),
                user_id: user_id.to_string(),
                ..UserPreferences::default()
            },
            recent_topics: Vec::new(),
            activity_history: ActivityHistory::default(),
            current_session: CurrentActivitySession {
                topic: None,
                activities_generated: 0,
                start_time: Some(now),
                session_id: format!("fun_activity_{}_{}", user_id, id_timestamp(now)),
            },
        }
    }

    /// Folds one generated activity into the state, returning the new state.
    ///
    /// A topic already in `recent_topics` is not moved or duplicated.
    pub fn apply(&self, event: &ActivityEvent) -> Self {
        let recent_topics =
            HistoryBound::RECENT_TOPICS.record_unique(&self.recent_topics, event.topic.clone());

        let history = &self.activity_history;
        let total_generated = history
            .total_activities_generated
            .max(history.total_activities_completed)
            + 1;
        let total_completed = history.total_activities_completed + u64::from(event.completed);

        debug!(
            topic = %event.topic,
            activity_type = %event.activity_type,
            completed = event.completed,
            total_generated,
            total_completed,
            "Recorded fun activity"
        );

        Self {
            user_preferences: self.user_preferences.clone(),
            recent_topics,
            activity_history: ActivityHistory {
                last_activity_type: Some(event.activity_type.clone()),
                last_topic: Some(event.topic.clone()),
                completion_rate: completion_rate(total_completed, total_generated),
                total_activities_generated: total_generated,
                total_activities_completed: total_completed,
            },
            current_session: CurrentActivitySession {
                topic: Some(event.topic.clone()),
                activities_generated: self.current_session.activities_generated + 1,
                ..self.current_session.clone()
            },
        }
    }

    pub fn user_preferences(&self) -> &UserPreferences {
        &self.user_preferences
    }

    /// Preferred activity types, with the last one used moved to the front
    /// when it is among them. Stored preferences are left as they are.
    pub fn suggest_activity_types(&self) -> Vec<String> {
        let mut suggested = self.user_preferences.preferred_activity_types.clone();
        if let Some(last) = &self.activity_history.last_activity_type {
            if let Some(pos) = suggested.iter().position(|t| t == last) {
                let favorite = suggested.remove(pos);
                suggested.insert(0, favorite);
            }
        }
        suggested
    }
}
