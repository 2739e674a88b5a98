use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use super::domain::{NewProspect, ProspectFilter, ProspectId, ProspectPatch, ProspectView};
use super::repository::ProspectRepository;
use super::service::ProspectService;
use crate::error::AppError;
use crate::funnel::StageCatalog;

/// Router builder exposing prospect CRUD, the alert feed, and dashboard stats.
pub fn prospect_router<R>(service: Arc<ProspectService<R>>) -> Router
where
    R: ProspectRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/prospects",
            get(list_handler::<R>).post(create_handler::<R>),
        )
        .route(
            "/api/v1/prospects/:prospect_id",
            get(get_handler::<R>)
                .put(update_handler::<R>)
                .delete(delete_handler::<R>),
        )
        .route("/api/v1/recommendations", get(recommendations_handler::<R>))
        .route("/api/v1/dashboard", get(dashboard_handler::<R>))
        .route("/api/v1/funnel/stages", get(stages_handler))
        .with_state(service)
}

type HandlerResult = Result<Response, AppError>;

pub(crate) async fn list_handler<R>(
    State(service): State<Arc<ProspectService<R>>>,
    Query(filter): Query<ProspectFilter>,
) -> HandlerResult
where
    R: ProspectRepository + 'static,
{
    let now = Utc::now();
    let views: Vec<ProspectView> = service
        .list(&filter, now)?
        .iter()
        .map(|prospect| prospect.view(now))
        .collect();
    Ok((StatusCode::OK, Json(views)).into_response())
}

pub(crate) async fn create_handler<R>(
    State(service): State<Arc<ProspectService<R>>>,
    Json(draft): Json<NewProspect>,
) -> HandlerResult
where
    R: ProspectRepository + 'static,
{
    let now = Utc::now();
    let prospect = service.create_at(draft, now)?;
    Ok((StatusCode::CREATED, Json(prospect.view(now))).into_response())
}

pub(crate) async fn get_handler<R>(
    State(service): State<Arc<ProspectService<R>>>,
    Path(prospect_id): Path<String>,
) -> HandlerResult
where
    R: ProspectRepository + 'static,
{
    let prospect = service.get(&ProspectId(prospect_id))?;
    Ok((StatusCode::OK, Json(prospect.view(Utc::now()))).into_response())
}

pub(crate) async fn update_handler<R>(
    State(service): State<Arc<ProspectService<R>>>,
    Path(prospect_id): Path<String>,
    Json(patch): Json<ProspectPatch>,
) -> HandlerResult
where
    R: ProspectRepository + 'static,
{
    let now = Utc::now();
    let prospect = service.update_at(&ProspectId(prospect_id), patch, now)?;
    Ok((StatusCode::OK, Json(prospect.view(now))).into_response())
}

pub(crate) async fn delete_handler<R>(
    State(service): State<Arc<ProspectService<R>>>,
    Path(prospect_id): Path<String>,
) -> HandlerResult
where
    R: ProspectRepository + 'static,
{
    service.delete(&ProspectId(prospect_id))?;
    Ok((StatusCode::OK, Json(json!({ "success": true }))).into_response())
}

pub(crate) async fn recommendations_handler<R>(
    State(service): State<Arc<ProspectService<R>>>,
) -> HandlerResult
where
    R: ProspectRepository + 'static,
{
    let now = Utc::now();
    let views: Vec<ProspectView> = service
        .recommendations(now)?
        .iter()
        .map(|prospect| prospect.view(now))
        .collect();
    Ok((StatusCode::OK, Json(views)).into_response())
}

pub(crate) async fn dashboard_handler<R>(
    State(service): State<Arc<ProspectService<R>>>,
) -> HandlerResult
where
    R: ProspectRepository + 'static,
{
    let dashboard = service.dashboard(Utc::now())?;
    Ok((StatusCode::OK, Json(dashboard)).into_response())
}

pub(crate) async fn stages_handler() -> Json<serde_json::Value> {
    let catalog = StageCatalog::standard();
    Json(json!({ "stages": catalog.rules() }))
}
