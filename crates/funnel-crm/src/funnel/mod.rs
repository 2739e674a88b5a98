//! Funnel scoring and follow-up recommendation engine.
//!
//! Everything here is a pure function of a prospect's stage, signals, and
//! timer start. Callers pass the evaluation time explicitly so that one
//! request evaluates every prospect against the same `now`.

pub mod catalog;
pub mod dashboard;
mod evaluator;
pub mod recommendation;
mod score;
pub mod signals;

pub(crate) use evaluator::trigger_fired;

pub use catalog::{FieldRule, FunnelStage, StageCatalog, StageRule, UnknownStage};
pub use dashboard::{FunnelDashboard, StageCountEntry};
pub use evaluator::{is_goal_reached, is_triggered};
pub use recommendation::{recommend, Recommendation, RecommendationStatus, TimerState};
pub use score::{calculate_score, MAX_SCORE};
pub use signals::{FieldKind, FieldValue, FunnelField, FunnelPosition, FunnelSignals};
