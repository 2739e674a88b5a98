use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::funnel::{FunnelSignals, FunnelStage};
use crate::prospects::domain::{NewProspect, Prospect, ProspectId};
use crate::prospects::repository::{sort_newest_first, ProspectRepository, RepositoryError};
use crate::prospects::{prospect_router, ProspectService};

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn draft(code: &str, name: &str) -> NewProspect {
    NewProspect {
        code: code.to_string(),
        name: name.to_string(),
        ..NewProspect::default()
    }
}

pub(super) fn registered_draft() -> NewProspect {
    NewProspect {
        stage: FunnelStage::LandingPage,
        signals: FunnelSignals {
            action_taken: true,
            registered: true,
            ..FunnelSignals::default()
        },
        ..draft("P-100", "Atelier Nord")
    }
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    records: Mutex<HashMap<ProspectId, Prospect>>,
}

impl ProspectRepository for MemoryRepository {
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
        match guard.get_mut(&prospect.id) {
            Some(slot) => {
                *slot = prospect.clone();
                Ok(prospect)
            }
            None => Err(RepositoryError::NotFound),
        }
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

pub(super) struct UnavailableRepository;

impl ProspectRepository for UnavailableRepository {
    fn insert(&self, _prospect: Prospect) -> Result<Prospect, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".into()))
    }

    fn update(&self, _prospect: Prospect) -> Result<Prospect, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".into()))
    }

    fn fetch(&self, _id: &ProspectId) -> Result<Option<Prospect>, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".into()))
    }

    fn list(&self) -> Result<Vec<Prospect>, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".into()))
    }

    fn delete(&self, _id: &ProspectId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("offline".into()))
    }
}

pub(super) fn build_service() -> (ProspectService<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    (ProspectService::new(repository.clone()), repository)
}

pub(super) fn router_with_service(service: ProspectService<MemoryRepository>) -> axum::Router {
    prospect_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

pub(super) fn assert_status(response: &Response, expected: StatusCode) {
    assert_eq!(response.status(), expected, "unexpected status code");
}
