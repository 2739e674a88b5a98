use super::signals::FunnelSignals;

pub const MAX_SCORE: u8 = 100;

const LINK_CLICKED_POINTS: u16 = 10;
const REGISTERED_POINTS: u16 = 20;
const SHOP_CONFIGURED_POINTS: u16 = 20;
const FIRST_PRODUCT_POINTS: u16 = 15;
const LINK_SHARED_POINTS: u16 = 15;
const FIRST_ORDER_POINTS: u16 = 20;

/// Engagement score across the whole funnel, independent of the current stage.
pub fn calculate_score(signals: &FunnelSignals) -> u8 {
    let contributions = [
        (signals.link_clicked, LINK_CLICKED_POINTS),
        (signals.registered, REGISTERED_POINTS),
        (signals.shop_configured, SHOP_CONFIGURED_POINTS),
        (signals.product_count >= 1, FIRST_PRODUCT_POINTS),
        (signals.link_shared, LINK_SHARED_POINTS),
        (signals.order_count >= 1, FIRST_ORDER_POINTS),
    ];

    let total: u16 = contributions
        .iter()
        .filter(|(earned, _)| *earned)
        .map(|(_, points)| points)
        .sum();

    u8::try_from(total.min(u16::from(MAX_SCORE))).unwrap_or(MAX_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> FunnelSignals {
        FunnelSignals {
            action_taken: true,
            link_clicked: true,
            registered: true,
            shop_configured: true,
            product_count: 2,
            link_shared: true,
            order_count: 1,
        }
    }

    #[test]
    fn empty_signals_score_zero() {
        assert_eq!(calculate_score(&FunnelSignals::default()), 0);
    }

    #[test]
    fn full_funnel_scores_one_hundred() {
        assert_eq!(calculate_score(&complete()), 100);
    }

    #[test]
    fn action_taken_alone_earns_nothing() {
        let signals = FunnelSignals {
            action_taken: true,
            ..FunnelSignals::default()
        };
        assert_eq!(calculate_score(&signals), 0);
    }

    #[test]
    fn each_contribution_is_monotone_and_bounded() {
        let setters: [fn(&mut FunnelSignals); 6] = [
            |s| s.link_clicked = true,
            |s| s.registered = true,
            |s| s.shop_configured = true,
            |s| s.product_count = 1,
            |s| s.link_shared = true,
            |s| s.order_count = 1,
        ];

        let mut baselines = vec![FunnelSignals::default(), complete()];
        baselines.push(FunnelSignals {
            registered: true,
            order_count: 7,
            ..FunnelSignals::default()
        });

        for baseline in baselines {
            for setter in setters {
                let before = calculate_score(&baseline);
                let mut after_signals = baseline;
                setter(&mut after_signals);
                let after = calculate_score(&after_signals);
                assert!(after >= before, "score dropped from {before} to {after}");
                assert!(after <= MAX_SCORE);
            }
        }
    }

    #[test]
    fn counters_only_count_once() {
        let signals = FunnelSignals {
            product_count: 40,
            order_count: 12,
            ..FunnelSignals::default()
        };
        assert_eq!(calculate_score(&signals), 35);
    }
}
