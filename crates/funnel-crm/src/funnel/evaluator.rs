use super::catalog::FunnelStage;
use super::signals::{FieldValue, FunnelPosition, FunnelSignals};

/// Whether the current stage's exit criterion is met. No stage means no goal.
pub fn is_goal_reached(position: &FunnelPosition) -> bool {
    position
        .stage
        .is_some_and(|stage| goal_reached(stage, &position.signals))
}

/// Whether the current stage's trigger has fired, i.e. whether its timer may run.
pub fn is_triggered(position: &FunnelPosition) -> bool {
    position
        .stage
        .is_some_and(|stage| trigger_fired(stage, &position.signals))
}

pub(crate) fn goal_reached(stage: FunnelStage, signals: &FunnelSignals) -> bool {
    let rule = stage.rule();
    match rule.goal.field.read(signals) {
        FieldValue::Flag(value) => value,
        FieldValue::Count(value) => value >= rule.goal_target,
    }
}

pub(crate) fn trigger_fired(stage: FunnelStage, signals: &FunnelSignals) -> bool {
    match stage.rule().trigger.field.read(signals) {
        FieldValue::Flag(value) => value,
        FieldValue::Count(value) => value > 0,
    }
}
