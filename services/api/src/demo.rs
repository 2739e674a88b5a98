use crate::infra::InMemoryProspectRepository;
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use funnel_crm::error::AppError;
use funnel_crm::funnel::{FunnelDashboard, FunnelSignals, FunnelStage};
use funnel_crm::prospects::{
    NewProspect, Prospect, ProspectCsvImporter, ProspectFilter, ProspectPatch, ProspectService,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DashboardArgs {
    /// Prospect CSV export to evaluate
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Evaluation time (RFC 3339 or YYYY-MM-DD). Defaults to now.
    #[arg(long, value_parser = crate::infra::parse_now)]
    pub(crate) now: Option<DateTime<Utc>>,
    /// List every prospect with its recommendation
    #[arg(long)]
    pub(crate) list: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Evaluation time (RFC 3339 or YYYY-MM-DD). Defaults to now.
    #[arg(long, value_parser = crate::infra::parse_now)]
    pub(crate) now: Option<DateTime<Utc>>,
}

type LocalService = ProspectService<InMemoryProspectRepository>;

fn local_service() -> LocalService {
    ProspectService::new(Arc::new(InMemoryProspectRepository::default()))
}

pub(crate) fn run_dashboard_report(args: DashboardArgs) -> Result<(), AppError> {
    let DashboardArgs { csv, now, list } = args;
    let now = now.unwrap_or_else(Utc::now);

    let drafts = ProspectCsvImporter::from_path(&csv)?;
    let service = local_service();
    service.import(drafts, now)?;

    println!("Funnel dashboard for {} (evaluated {})", csv.display(), now.to_rfc3339());
    render_report(&service, now, list)
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let now = args.now.unwrap_or_else(Utc::now);
    let service = local_service();

    println!("Funnel CRM demo");
    for (draft, started_hours_ago) in demo_prospects() {
        let created = now - Duration::hours(started_hours_ago);
        let stored = service.create_at(draft, created)?;
        println!(
            "- Added {} ({}) at stage {} with score {}",
            stored.name, stored.code, stored.stage, stored.score
        );
    }

    let registered = service
        .list(
            &ProspectFilter {
                stage: Some(FunnelStage::LandingPage),
                ..ProspectFilter::default()
            },
            now,
        )?
        .into_iter()
        .next();
    if let Some(prospect) = registered {
        let updated = service.update_at(
            &prospect.id,
            ProspectPatch {
                registered: Some(true),
                ..ProspectPatch::default()
            },
            now,
        )?;
        println!(
            "- {} registered: score {} -> {}",
            updated.name, prospect.score, updated.score
        );
    }

    println!();
    render_report(&service, now, true)
}

fn render_report(service: &LocalService, now: DateTime<Utc>, list: bool) -> Result<(), AppError> {
    let dashboard = service.dashboard(now)?;
    render_dashboard(&dashboard);

    let alerts = service.recommendations(now)?;
    if alerts.is_empty() {
        println!("\nOverdue follow-ups: none");
    } else {
        println!("\nOverdue follow-ups");
        for prospect in &alerts {
            render_prospect(prospect, now);
        }
    }

    if list {
        println!("\nAll prospects");
        for prospect in service.list(&ProspectFilter::default(), now)? {
            render_prospect(&prospect, now);
        }
    }

    Ok(())
}

fn render_dashboard(dashboard: &FunnelDashboard) {
    println!(
        "{} prospects | {} alerts | average score {}",
        dashboard.total, dashboard.alerts, dashboard.average_score
    );
    if let Some(stage) = dashboard.busiest_stage {
        println!("Busiest stage: {}", stage);
    }

    println!("\nStage distribution");
    for entry in &dashboard.stages {
        println!("- {}: {}", entry.stage_label, entry.count);
    }
}

fn render_prospect(prospect: &Prospect, now: DateTime<Utc>) {
    let recommendation = prospect.recommendation(now);
    println!(
        "- {} {} [{}] score {} | {}: {}",
        prospect.code,
        prospect.name,
        prospect.stage,
        prospect.score,
        recommendation.status.label(),
        recommendation.text
    );
}

fn demo_prospects() -> Vec<(NewProspect, i64)> {
    let prospect = |code: &str, name: &str, stage: FunnelStage, signals: FunnelSignals| {
        NewProspect {
            code: code.to_string(),
            name: name.to_string(),
            stage,
            signals,
            timer_started_at: None,
        }
    };

    vec![
        (
            prospect(
                "P-001",
                "Atelier Nord",
                FunnelStage::Prospecting,
                FunnelSignals {
                    action_taken: true,
                    ..FunnelSignals::default()
                },
            ),
            30,
        ),
        (
            prospect(
                "P-002",
                "Boutique Sud",
                FunnelStage::LandingPage,
                FunnelSignals {
                    action_taken: true,
                    link_clicked: true,
                    ..FunnelSignals::default()
                },
            ),
            6,
        ),
        (
            prospect(
                "P-003",
                "Ferme Est",
                FunnelStage::Sales,
                FunnelSignals {
                    action_taken: true,
                    link_clicked: true,
                    registered: true,
                    shop_configured: true,
                    product_count: 12,
                    link_shared: true,
                    order_count: 0,
                },
            ),
            200,
        ),
        (
            prospect(
                "P-004",
                "Cave Ouest",
                FunnelStage::FiveOrders,
                FunnelSignals {
                    action_taken: true,
                    link_clicked: true,
                    registered: true,
                    shop_configured: true,
                    product_count: 8,
                    link_shared: true,
                    order_count: 5,
                },
            ),
            400,
        ),
    ]
}
