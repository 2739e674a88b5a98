use super::evaluator::{is_goal_reached, is_triggered};
use super::signals::FunnelPosition;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

pub const NO_STAGE_TEXT: &str = "Waiting: no funnel stage assigned";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationStatus {
    Success,
    Waiting,
    InProgress,
    Alert,
}

impl RecommendationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Waiting => "Waiting",
            Self::InProgress => "In Progress",
            Self::Alert => "Alert",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub text: String,
    pub status: RecommendationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours_left: Option<u32>,
}

impl Recommendation {
    fn waiting(text: String) -> Self {
        Self {
            text,
            status: RecommendationStatus::Waiting,
            hours_left: None,
        }
    }

    pub fn is_alert(&self) -> bool {
        self.status == RecommendationStatus::Alert
    }
}

/// Follow-up timer for a triggered stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running { hours_left: u32 },
    Expired,
}

impl TimerState {
    /// The threshold is inclusive: exactly `delay_hours` elapsed is expired.
    /// A start time in the future counts as zero elapsed.
    pub fn evaluate(
        started_at: Option<DateTime<Utc>>,
        delay_hours: u32,
        now: DateTime<Utc>,
    ) -> Self {
        let Some(started_at) = started_at else {
            return Self::Idle;
        };

        let elapsed_millis = now.signed_duration_since(started_at).num_milliseconds().max(0);
        let elapsed_hours = elapsed_millis as f64 / MILLIS_PER_HOUR;
        let delay = f64::from(delay_hours);

        if elapsed_hours >= delay {
            Self::Expired
        } else {
            Self::Running {
                hours_left: (delay - elapsed_hours).ceil() as u32,
            }
        }
    }
}

/// Classifies a prospect into success, waiting, in-progress, or alert at `now`.
///
/// Reaching the stage goal always reports success, even once the timer has expired.
pub fn recommend(position: &FunnelPosition, now: DateTime<Utc>) -> Recommendation {
    let Some(stage) = position.stage else {
        return Recommendation::waiting(NO_STAGE_TEXT.to_string());
    };
    let rule = stage.rule();

    if is_goal_reached(position) {
        return Recommendation {
            text: rule.success_message.to_string(),
            status: RecommendationStatus::Success,
            hours_left: None,
        };
    }

    let pending_trigger = || format!("Waiting for: {}", rule.trigger.label);
    if !is_triggered(position) {
        return Recommendation::waiting(pending_trigger());
    }

    match TimerState::evaluate(position.timer_started_at, rule.delay_hours, now) {
        TimerState::Idle => Recommendation::waiting(pending_trigger()),
        TimerState::Running { hours_left } => Recommendation {
            text: format!("{hours_left}h left to reach: {}", rule.goal.label),
            status: RecommendationStatus::InProgress,
            hours_left: Some(hours_left),
        },
        TimerState::Expired => Recommendation {
            text: rule.alert_message.to_string(),
            status: RecommendationStatus::Alert,
            hours_left: Some(0),
        },
    }
}
