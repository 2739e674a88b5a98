use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use funnel_crm::funnel::{
    calculate_score, recommend, FunnelPosition, FunnelSignals, FunnelStage, RecommendationStatus,
    StageCatalog,
};
use funnel_crm::prospects::{
    sort_newest_first, Prospect, ProspectCsvImporter, ProspectFilter, ProspectId, ProspectPatch,
    ProspectRepository, ProspectService, RepositoryError,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

#[derive(Default)]
struct VecRepository {
    records: Mutex<HashMap<ProspectId, Prospect>>,
}

impl ProspectRepository for VecRepository {
    fn insert(&self, prospect: Prospect) -> Result<Prospect, RepositoryError> {
        let mut guard = self.records.lock().expect("lock");
        if guard.contains_key(&prospect.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(prospect.id.clone(), prospect.clone());
        Ok(prospect)
    }

    fn update(&self, prospect: Prospect) -> Result<Prospect, RepositoryError> {
        let mut guard = self.records.lock().expect("lock");
        if !guard.contains_key(&prospect.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(prospect.id.clone(), prospect.clone());
        Ok(prospect)
    }

    fn fetch(&self, id: &ProspectId) -> Result<Option<Prospect>, RepositoryError> {
        Ok(self.records.lock().expect("lock").get(id).cloned())
    }

    fn list(&self) -> Result<Vec<Prospect>, RepositoryError> {
        let mut prospects: Vec<Prospect> =
            self.records.lock().expect("lock").values().cloned().collect();
        sort_newest_first(&mut prospects);
        Ok(prospects)
    }

    fn delete(&self, id: &ProspectId) -> Result<(), RepositoryError> {
        self.records
            .lock()
            .expect("lock")
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

#[test]
fn catalog_chains_each_trigger_to_the_previous_goal() {
    let catalog = StageCatalog::standard();
    for pair in catalog.rules().windows(2) {
        assert_eq!(
            pair[1].trigger.field, pair[0].goal.field,
            "{} should start when {} completes",
            pair[1].label, pair[0].label
        );
    }
    assert_eq!(catalog.rule(FunnelStage::FiveOrders).goal_target, 5);
}

#[test]
fn stale_outreach_raises_an_alert() {
    let position = FunnelPosition::new(
        FunnelStage::Prospecting,
        FunnelSignals {
            action_taken: true,
            ..FunnelSignals::default()
        },
    )
    .with_timer(now() - Duration::hours(30));

    let recommendation = recommend(&position, now());
    assert_eq!(recommendation.status, RecommendationStatus::Alert);
    assert_eq!(recommendation.hours_left, Some(0));
    assert_eq!(
        recommendation.text,
        FunnelStage::Prospecting.rule().alert_message
    );
}

#[test]
fn full_engagement_scores_the_maximum() {
    let signals = FunnelSignals {
        action_taken: true,
        link_clicked: true,
        registered: true,
        shop_configured: true,
        product_count: 3,
        link_shared: true,
        order_count: 7,
    };
    assert_eq!(calculate_score(&signals), 100);
}

#[test]
fn csv_export_feeds_the_dashboard() {
    let csv = "\
code,name,stage,action_taken,link_clicked,registered,shop_configured,product_count,link_shared,order_count,timer_started_at
P-001,Atelier Nord,Prospection,oui,,,,,,,2025-09-30T00:00:00Z
P-002,Boutique Sud,landing_page,true,true,,,,,,2025-10-01T00:00:00Z
P-003,Ferme Est,5 Commandes,true,true,true,true,4,true,5,
";
    let drafts = ProspectCsvImporter::from_reader(Cursor::new(csv)).expect("csv parses");
    let service = ProspectService::new(Arc::new(VecRepository::default()));
    let imported = service.import(drafts, now()).expect("import succeeds");
    assert_eq!(imported.len(), 3);
    assert_eq!(imported[2].score, 100);

    let dashboard = service.dashboard(now()).expect("dashboard");
    assert_eq!(dashboard.total, 3);
    assert_eq!(dashboard.alerts, 1, "only the 36h old outreach is overdue");
    assert_eq!(dashboard.count_for(FunnelStage::FiveOrders), 1);
    assert_eq!(dashboard.busiest_stage, Some(FunnelStage::Prospecting));

    let alerts = service.recommendations(now()).expect("alerts");
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].code, "P-001");

    let landing = service
        .list(
            &ProspectFilter {
                stage: Some(FunnelStage::LandingPage),
                ..ProspectFilter::default()
            },
            now(),
        )
        .expect("list");
    let recommendation = landing[0].recommendation(now());
    assert_eq!(recommendation.status, RecommendationStatus::InProgress);
    assert_eq!(recommendation.hours_left, Some(36));
}

#[test]
fn partial_update_is_scored_against_the_merged_record() {
    let service = ProspectService::new(Arc::new(VecRepository::default()));
    let csv = "code,name,stage,action_taken,registered\nP-9,Atelier,landing_page,true,true\n";
    let drafts = ProspectCsvImporter::from_reader(Cursor::new(csv)).expect("csv parses");
    let stored = service
        .import(drafts, now())
        .expect("import")
        .pop()
        .expect("one prospect");
    assert_eq!(stored.score, 20);

    let updated = service
        .update_at(
            &stored.id,
            ProspectPatch {
                link_clicked: Some(true),
                ..ProspectPatch::default()
            },
            now(),
        )
        .expect("update");
    assert_eq!(updated.score, 30);
    assert_eq!(
        updated.recommendation(now()).status,
        RecommendationStatus::Success
    );
}
