use crate::funnel::{
    calculate_score, is_goal_reached, is_triggered, recommend, trigger_fired, FunnelPosition,
    FunnelSignals, FunnelStage, Recommendation,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Identifier wrapper for stored prospects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProspectId(pub String);

impl fmt::Display for ProspectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stored prospect record. `score` is derived from `signals` on every write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prospect {
    pub id: ProspectId,
    pub code: String,
    pub name: String,
    pub stage: FunnelStage,
    #[serde(flatten)]
    pub signals: FunnelSignals,
    pub score: u8,
    pub timer_started_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Prospect {
    pub(crate) fn from_draft(id: ProspectId, draft: NewProspect, now: DateTime<Utc>) -> Self {
        let NewProspect {
            code,
            name,
            stage,
            signals,
            timer_started_at,
        } = draft;

        let mut prospect = Self {
            id,
            code,
            name,
            stage,
            signals,
            score: calculate_score(&signals),
            timer_started_at: None,
            created_at: now,
            updated_at: None,
        };
        prospect.reconcile_timer(true, timer_started_at.map(Some), now);
        prospect
    }

    pub fn position(&self) -> FunnelPosition {
        FunnelPosition {
            stage: Some(self.stage),
            signals: self.signals,
            timer_started_at: self.timer_started_at,
        }
    }

    pub fn recommendation(&self, now: DateTime<Utc>) -> Recommendation {
        recommend(&self.position(), now)
    }

    pub fn view(&self, now: DateTime<Utc>) -> ProspectView {
        let position = self.position();
        ProspectView {
            prospect: self.clone(),
            stage_label: self.stage.label(),
            triggered: is_triggered(&position),
            goal_reached: is_goal_reached(&position),
            recommendation: recommend(&position, now),
        }
    }

    pub(crate) fn trigger_fired(&self) -> bool {
        trigger_fired(self.stage, &self.signals)
    }

    /// Keeps `timer_started_at` consistent with the current stage trigger.
    ///
    /// The timer is cleared whenever the trigger is not firing. While it fires,
    /// an explicit `requested` value wins; otherwise the timer starts at `now`
    /// when `restart` is set (the trigger just fired, or the stage changed) and
    /// is left untouched when it is not.
    pub(crate) fn reconcile_timer(
        &mut self,
        restart: bool,
        requested: Option<Option<DateTime<Utc>>>,
        now: DateTime<Utc>,
    ) {
        if !self.trigger_fired() {
            self.timer_started_at = None;
            return;
        }

        self.timer_started_at = match requested {
            Some(explicit) => explicit,
            None if restart => Some(now),
            None => self.timer_started_at,
        };
    }

    pub(crate) fn rescore(&mut self) {
        self.score = calculate_score(&self.signals);
    }
}

/// Create payload. Server-owned fields (id, score, timestamps) are never read from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProspect {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub stage: FunnelStage,
    #[serde(flatten)]
    pub signals: FunnelSignals,
    #[serde(default)]
    pub timer_started_at: Option<DateTime<Utc>>,
}

/// Partial update. Absent fields keep their stored value.
///
/// `timer_started_at` distinguishes an absent key from an explicit `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProspectPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<FunnelStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_taken: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_clicked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registered: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shop_configured: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_shared: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_count: Option<u32>,
    #[serde(
        deserialize_with = "explicit_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub timer_started_at: Option<Option<DateTime<Utc>>>,
}

impl ProspectPatch {
    /// Overlays the patch onto a stored record. Score and timer are left to the caller.
    pub(crate) fn merge_into(&self, prospect: &mut Prospect) {
        if let Some(code) = &self.code {
            prospect.code = code.clone();
        }
        if let Some(name) = &self.name {
            prospect.name = name.clone();
        }
        if let Some(stage) = self.stage {
            prospect.stage = stage;
        }

        let signals = &mut prospect.signals;
        if let Some(value) = self.action_taken {
            signals.action_taken = value;
        }
        if let Some(value) = self.link_clicked {
            signals.link_clicked = value;
        }
        if let Some(value) = self.registered {
            signals.registered = value;
        }
        if let Some(value) = self.shop_configured {
            signals.shop_configured = value;
        }
        if let Some(value) = self.product_count {
            signals.product_count = value;
        }
        if let Some(value) = self.link_shared {
            signals.link_shared = value;
        }
        if let Some(value) = self.order_count {
            signals.order_count = value;
        }
    }
}

fn explicit_option<'de, D>(deserializer: D) -> Result<Option<Option<DateTime<Utc>>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<DateTime<Utc>>::deserialize(deserializer).map(Some)
}

/// Prospect as returned by the API, with its evaluation attached.
#[derive(Debug, Clone, Serialize)]
pub struct ProspectView {
    #[serde(flatten)]
    pub prospect: Prospect,
    pub stage_label: &'static str,
    pub triggered: bool,
    pub goal_reached: bool,
    pub recommendation: Recommendation,
}

/// List filters mirroring the prospect table controls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProspectFilter {
    pub search: Option<String>,
    pub stage: Option<FunnelStage>,
    pub alerts_only: bool,
}

impl ProspectFilter {
    pub fn alerts() -> Self {
        Self {
            alerts_only: true,
            ..Self::default()
        }
    }

    pub fn matches(&self, prospect: &Prospect, now: DateTime<Utc>) -> bool {
        if let Some(search) = self.search.as_deref().map(str::trim) {
            let needle = search.to_lowercase();
            if !needle.is_empty()
                && !prospect.name.to_lowercase().contains(&needle)
                && !prospect.code.to_lowercase().contains(&needle)
            {
                return false;
            }
        }

        if self.stage.is_some_and(|stage| stage != prospect.stage) {
            return false;
        }

        !self.alerts_only || prospect.recommendation(now).is_alert()
    }
}
