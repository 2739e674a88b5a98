use super::catalog::FunnelStage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cumulative funnel flags and counters recorded for a prospect.
///
/// Every field defaults to `false`/`0`, so partial payloads deserialize into a
/// scoreable value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunnelSignals {
    pub action_taken: bool,
    pub link_clicked: bool,
    pub registered: bool,
    pub shop_configured: bool,
    pub product_count: u32,
    pub link_shared: bool,
    pub order_count: u32,
}

/// Closed set of signal fields a stage rule can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FunnelField {
    ActionTaken,
    LinkClicked,
    Registered,
    ShopConfigured,
    ProductCount,
    LinkShared,
    OrderCount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Flag,
    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue {
    Flag(bool),
    Count(u32),
}

impl FunnelField {
    pub const fn kind(self) -> FieldKind {
        match self {
            Self::ProductCount | Self::OrderCount => FieldKind::Count,
            Self::ActionTaken
            | Self::LinkClicked
            | Self::Registered
            | Self::ShopConfigured
            | Self::LinkShared => FieldKind::Flag,
        }
    }

    pub const fn read(self, signals: &FunnelSignals) -> FieldValue {
        match self {
            Self::ActionTaken => FieldValue::Flag(signals.action_taken),
            Self::LinkClicked => FieldValue::Flag(signals.link_clicked),
            Self::Registered => FieldValue::Flag(signals.registered),
            Self::ShopConfigured => FieldValue::Flag(signals.shop_configured),
            Self::ProductCount => FieldValue::Count(signals.product_count),
            Self::LinkShared => FieldValue::Flag(signals.link_shared),
            Self::OrderCount => FieldValue::Count(signals.order_count),
        }
    }
}

/// Everything the engine reads for one evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FunnelPosition {
    pub stage: Option<FunnelStage>,
    pub signals: FunnelSignals,
    pub timer_started_at: Option<DateTime<Utc>>,
}

impl FunnelPosition {
    pub fn new(stage: FunnelStage, signals: FunnelSignals) -> Self {
        Self {
            stage: Some(stage),
            signals,
            timer_started_at: None,
        }
    }

    pub fn with_timer(mut self, started_at: DateTime<Utc>) -> Self {
        self.timer_started_at = Some(started_at);
        self
    }
}
