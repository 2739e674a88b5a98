use super::signals::{FieldKind, FunnelField};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordered position of a prospect in the sales funnel.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum FunnelStage {
    #[default]
    Prospecting,
    LandingPage,
    Configuration,
    Catalog,
    Sharing,
    Sales,
    FiveOrders,
}

impl FunnelStage {
    pub const fn ordered() -> [Self; 7] {
        [
            Self::Prospecting,
            Self::LandingPage,
            Self::Configuration,
            Self::Catalog,
            Self::Sharing,
            Self::Sales,
            Self::FiveOrders,
        ]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Prospecting => "prospecting",
            Self::LandingPage => "landing_page",
            Self::Configuration => "configuration",
            Self::Catalog => "catalog",
            Self::Sharing => "sharing",
            Self::Sales => "sales",
            Self::FiveOrders => "five_orders",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Prospecting => "Prospecting",
            Self::LandingPage => "Landing Page",
            Self::Configuration => "Configuration",
            Self::Catalog => "Catalog",
            Self::Sharing => "Sharing",
            Self::Sales => "Sales",
            Self::FiveOrders => "5 Orders",
        }
    }

    /// Labels used by the French dashboard exports.
    const fn legacy_label(self) -> &'static str {
        match self {
            Self::Prospecting => "Prospection",
            Self::LandingPage => "Landing Page",
            Self::Configuration => "Configuration",
            Self::Catalog => "Catalogue",
            Self::Sharing => "Partage",
            Self::Sales => "Ventes",
            Self::FiveOrders => "5 Commandes",
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Self::Prospecting => 0,
            Self::LandingPage => 1,
            Self::Configuration => 2,
            Self::Catalog => 3,
            Self::Sharing => 4,
            Self::Sales => 5,
            Self::FiveOrders => 6,
        }
    }

    pub fn next(self) -> Option<Self> {
        Self::ordered().get(self.index() + 1).copied()
    }

    /// Trigger, goal, and timing rules for this stage.
    pub const fn rule(self) -> StageRule {
        match self {
            Self::Prospecting => StageRule {
                stage: self,
                label: self.label(),
                trigger: FieldRule::new(FunnelField::ActionTaken, "Outreach sent"),
                goal: FieldRule::new(FunnelField::LinkClicked, "Link clicked"),
                goal_target: 1,
                delay_hours: 24,
                alert_message: "Follow up: the prospect has not clicked the link within 24h",
                success_message: "Link clicked, ready for the landing page",
            },
            Self::LandingPage => StageRule {
                stage: self,
                label: self.label(),
                trigger: FieldRule::new(FunnelField::LinkClicked, "Link clicked"),
                goal: FieldRule::new(FunnelField::Registered, "Registration completed"),
                goal_target: 1,
                delay_hours: 48,
                alert_message: "Follow up: the prospect visited the landing page but has not registered",
                success_message: "Registered, ready to configure the shop",
            },
            Self::Configuration => StageRule {
                stage: self,
                label: self.label(),
                trigger: FieldRule::new(FunnelField::Registered, "Registration completed"),
                goal: FieldRule::new(FunnelField::ShopConfigured, "Shop configured"),
                goal_target: 1,
                delay_hours: 72,
                alert_message: "Offer setup help: the shop is still not configured",
                success_message: "Shop configured, ready to build the catalog",
            },
            Self::Catalog => StageRule {
                stage: self,
                label: self.label(),
                trigger: FieldRule::new(FunnelField::ShopConfigured, "Shop configured"),
                goal: FieldRule::new(FunnelField::ProductCount, "Product added"),
                goal_target: 1,
                delay_hours: 72,
                alert_message: "Follow up: no product has been added to the shop yet",
                success_message: "First product added, ready to share the shop",
            },
            Self::Sharing => StageRule {
                stage: self,
                label: self.label(),
                trigger: FieldRule::new(FunnelField::ProductCount, "Product added"),
                goal: FieldRule::new(FunnelField::LinkShared, "Link shared"),
                goal_target: 1,
                delay_hours: 48,
                alert_message: "Encourage the prospect to share their shop link",
                success_message: "Shop link shared, waiting for the first sale",
            },
            Self::Sales => StageRule {
                stage: self,
                label: self.label(),
                trigger: FieldRule::new(FunnelField::LinkShared, "Link shared"),
                goal: FieldRule::new(FunnelField::OrderCount, "At least 1 order"),
                goal_target: 1,
                delay_hours: 168,
                alert_message: "No order after a week: review the shop and promotion with the prospect",
                success_message: "First order received, ready to aim for 5 orders",
            },
            Self::FiveOrders => StageRule {
                stage: self,
                label: self.label(),
                trigger: FieldRule::new(FunnelField::OrderCount, "First order received"),
                goal: FieldRule::new(FunnelField::OrderCount, "5 orders reached"),
                goal_target: 5,
                delay_hours: 336,
                alert_message: "Order pace is slow: plan a sales coaching call",
                success_message: "5 orders reached, the prospect is fully onboarded",
            },
        }
    }
}

impl fmt::Display for FunnelStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown funnel stage '{0}'")]
pub struct UnknownStage(pub String);

impl FromStr for FunnelStage {
    type Err = UnknownStage;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let value = raw.trim();
        Self::ordered()
            .into_iter()
            .find(|stage| {
                value.eq_ignore_ascii_case(stage.key())
                    || value.eq_ignore_ascii_case(stage.label())
                    || value.eq_ignore_ascii_case(stage.legacy_label())
            })
            .ok_or_else(|| UnknownStage(raw.to_string()))
    }
}

impl TryFrom<String> for FunnelStage {
    type Error = UnknownStage;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One side (trigger or goal) of a stage rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldRule {
    pub field: FunnelField,
    pub kind: FieldKind,
    pub label: &'static str,
}

impl FieldRule {
    const fn new(field: FunnelField, label: &'static str) -> Self {
        Self {
            field,
            kind: field.kind(),
            label,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageRule {
    pub stage: FunnelStage,
    pub label: &'static str,
    pub trigger: FieldRule,
    pub goal: FieldRule,
    pub goal_target: u32,
    pub delay_hours: u32,
    pub alert_message: &'static str,
    pub success_message: &'static str,
}

/// The fixed funnel definition, one rule per stage in funnel order.
#[derive(Debug, Clone)]
pub struct StageCatalog {
    rules: [StageRule; 7],
}

impl StageCatalog {
    pub fn standard() -> Self {
        Self {
            rules: FunnelStage::ordered().map(FunnelStage::rule),
        }
    }

    pub fn rules(&self) -> &[StageRule] {
        &self.rules
    }

    pub fn rule(&self, stage: FunnelStage) -> &StageRule {
        &self.rules[stage.index()]
    }
}
