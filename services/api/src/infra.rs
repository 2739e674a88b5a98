use chrono::{DateTime, Utc};
use funnel_crm::prospects::{
    parse_timestamp, sort_newest_first, Prospect, ProspectId, ProspectRepository,
    RepositoryError,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local prospect store backing the HTTP service and the CLI reports.
#[derive(Default, Clone)]
pub(crate) struct InMemoryProspectRepository {
    records: Arc<Mutex<HashMap<ProspectId, Prospect>>>,
}

impl InMemoryProspectRepository {
    fn records(&self) -> Result<MutexGuard<'_, HashMap<ProspectId, Prospect>>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("prospect store lock poisoned".into()))
    }
}

impl ProspectRepository for InMemoryProspectRepository {
    fn insert(&self, prospect: Prospect) -> Result<Prospect, RepositoryError> {
        let mut guard = self.records()?;
        if guard.contains_key(&prospect.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(prospect.id.clone(), prospect.clone());
        Ok(prospect)
    }

    fn update(&self, prospect: Prospect) -> Result<Prospect, RepositoryError> {
        let mut guard = self.records()?;
        match guard.get_mut(&prospect.id) {
            Some(slot) => {
                *slot = prospect.clone();
                Ok(prospect)
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &ProspectId) -> Result<Option<Prospect>, RepositoryError> {
        Ok(self.records()?.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<Prospect>, RepositoryError> {
        let mut prospects: Vec<Prospect> = self.records()?.values().cloned().collect();
        sort_newest_first(&mut prospects);
        Ok(prospects)
    }

    fn delete(&self, id: &ProspectId) -> Result<(), RepositoryError> {
        self.records()?
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

pub(crate) fn parse_now(raw: &str) -> Result<DateTime<Utc>, String> {
    parse_timestamp(raw)
        .ok_or_else(|| format!("failed to parse '{raw}' as RFC 3339 or YYYY-MM-DD"))
}
