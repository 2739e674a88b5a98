use super::catalog::FunnelStage;
use super::recommendation::recommend;
use super::signals::FunnelPosition;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct StageCountEntry {
    pub stage: FunnelStage,
    pub stage_label: &'static str,
    pub count: usize,
}

/// Funnel-wide counters shown on the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct FunnelDashboard {
    pub total: usize,
    pub stages: Vec<StageCountEntry>,
    pub alerts: usize,
    pub average_score: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub busiest_stage: Option<FunnelStage>,
}

impl FunnelDashboard {
    /// Builds the dashboard from `(position, stored score)` pairs evaluated at `now`.
    pub fn summarize<I>(entries: I, now: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = (FunnelPosition, u8)>,
    {
        let mut counts = [0usize; 7];
        let mut total = 0usize;
        let mut alerts = 0usize;
        let mut score_sum = 0u64;

        for (position, score) in entries {
            total += 1;
            score_sum += u64::from(score);
            if let Some(stage) = position.stage {
                counts[stage.index()] += 1;
            }
            if recommend(&position, now).is_alert() {
                alerts += 1;
            }
        }

        let stages = FunnelStage::ordered()
            .into_iter()
            .map(|stage| StageCountEntry {
                stage,
                stage_label: stage.label(),
                count: counts[stage.index()],
            })
            .collect::<Vec<_>>();

        // Earliest stage wins ties.
        let busiest_stage = stages
            .iter()
            .filter(|entry| entry.count > 0)
            .fold(None::<&StageCountEntry>, |best, entry| match best {
                Some(current) if current.count >= entry.count => Some(current),
                _ => Some(entry),
            })
            .map(|entry| entry.stage);

        Self {
            total,
            stages,
            alerts,
            average_score: rounded_average(score_sum, total),
            busiest_stage,
        }
    }

    pub fn count_for(&self, stage: FunnelStage) -> usize {
        self.stages
            .iter()
            .find(|entry| entry.stage == stage)
            .map_or(0, |entry| entry.count)
    }
}

fn rounded_average(sum: u64, count: usize) -> u8 {
    if count == 0 {
        return 0;
    }
    let count = count as u64;
    let average = (2 * sum + count) / (2 * count);
    u8::try_from(average).unwrap_or(u8::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::funnel::signals::FunnelSignals;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    #[test]
    fn empty_dashboard_is_zeroed() {
        let dashboard = FunnelDashboard::summarize(Vec::new(), now());
        assert_eq!(dashboard.total, 0);
        assert_eq!(dashboard.alerts, 0);
        assert_eq!(dashboard.average_score, 0);
        assert_eq!(dashboard.stages.len(), 7);
        assert!(dashboard.busiest_stage.is_none());
    }

    #[test]
    fn counts_stages_alerts_and_average() {
        let stale = FunnelPosition::new(
            FunnelStage::Prospecting,
            FunnelSignals {
                action_taken: true,
                ..FunnelSignals::default()
            },
        )
        .with_timer(now() - Duration::hours(30));
        let fresh = FunnelPosition::new(FunnelStage::Prospecting, FunnelSignals::default());
        let selling = FunnelPosition::new(
            FunnelStage::Sales,
            FunnelSignals {
                link_shared: true,
                ..FunnelSignals::default()
            },
        );

        let dashboard =
            FunnelDashboard::summarize(vec![(stale, 0), (fresh, 10), (selling, 75)], now());

        assert_eq!(dashboard.total, 3);
        assert_eq!(dashboard.alerts, 1);
        assert_eq!(dashboard.count_for(FunnelStage::Prospecting), 2);
        assert_eq!(dashboard.count_for(FunnelStage::Sales), 1);
        assert_eq!(dashboard.count_for(FunnelStage::Catalog), 0);
        assert_eq!(dashboard.average_score, 28);
        assert_eq!(dashboard.busiest_stage, Some(FunnelStage::Prospecting));
    }

    #[test]
    fn ties_go_to_earliest_stage() {
        let entries = vec![
            (FunnelPosition::new(FunnelStage::Sharing, FunnelSignals::default()), 0),
            (FunnelPosition::new(FunnelStage::Catalog, FunnelSignals::default()), 0),
        ];
        let dashboard = FunnelDashboard::summarize(entries, now());
        assert_eq!(dashboard.busiest_stage, Some(FunnelStage::Catalog));
    }

    #[test]
    fn average_rounds_half_up() {
        assert_eq!(rounded_average(5, 2), 3);
        assert_eq!(rounded_average(4, 3), 1);
        assert_eq!(rounded_average(100, 1), 100);
    }
}
