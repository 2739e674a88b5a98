use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::domain::{NewProspect, Prospect, ProspectFilter, ProspectId, ProspectPatch};
use super::repository::{ProspectRepository, RepositoryError};
use crate::funnel::FunnelDashboard;

/// Service owning the write path: validation, merge, timer upkeep, and scoring.
pub struct ProspectService<R> {
    repository: Arc<R>,
}

static PROSPECT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_prospect_id() -> ProspectId {
    let id = PROSPECT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ProspectId(format!("prs-{id:06}"))
}

impl<R> ProspectService<R>
where
    R: ProspectRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn create(&self, draft: NewProspect) -> Result<Prospect, ProspectServiceError> {
        self.create_at(draft, Utc::now())
    }

    /// Stores a new prospect with its score computed from the initial payload.
    pub fn create_at(
        &self,
        draft: NewProspect,
        now: DateTime<Utc>,
    ) -> Result<Prospect, ProspectServiceError> {
        validate_labels(Some(&draft.code), Some(&draft.name))?;

        let prospect = Prospect::from_draft(next_prospect_id(), draft, now);
        let stored = self.repository.insert(prospect)?;

        info!(
            prospect_id = %stored.id,
            stage = stored.stage.key(),
            score = stored.score,
            "prospect created"
        );
        Ok(stored)
    }

    /// Creates every draft in order, stopping at the first failure.
    pub fn import(
        &self,
        drafts: Vec<NewProspect>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Prospect>, ProspectServiceError> {
        let imported = drafts
            .into_iter()
            .map(|draft| self.create_at(draft, now))
            .collect::<Result<Vec<_>, _>>()?;
        info!(count = imported.len(), "prospects imported");
        Ok(imported)
    }

    pub fn update(
        &self,
        id: &ProspectId,
        patch: ProspectPatch,
    ) -> Result<Prospect, ProspectServiceError> {
        self.update_at(id, patch, Utc::now())
    }

    /// Merges `patch` over the stored record, then rescores the merged result.
    pub fn update_at(
        &self,
        id: &ProspectId,
        patch: ProspectPatch,
        now: DateTime<Utc>,
    ) -> Result<Prospect, ProspectServiceError> {
        validate_labels(patch.code.as_ref(), patch.name.as_ref())?;

        let mut prospect = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;

        let previous_stage = prospect.stage;
        let was_firing = prospect.trigger_fired();

        patch.merge_into(&mut prospect);
        let restart = prospect.stage != previous_stage || !was_firing;
        prospect.reconcile_timer(restart, patch.timer_started_at, now);
        prospect.rescore();
        prospect.updated_at = Some(now);

        let stored = self.repository.update(prospect)?;
        debug!(
            prospect_id = %stored.id,
            stage = stored.stage.key(),
            score = stored.score,
            timer_running = stored.timer_started_at.is_some(),
            "prospect updated"
        );
        Ok(stored)
    }

    pub fn get(&self, id: &ProspectId) -> Result<Prospect, ProspectServiceError> {
        let prospect = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(prospect)
    }

    pub fn delete(&self, id: &ProspectId) -> Result<(), ProspectServiceError> {
        self.repository.delete(id)?;
        info!(prospect_id = %id, "prospect deleted");
        Ok(())
    }

    /// Newest-first listing restricted by `filter`, evaluated at `now`.
    pub fn list(
        &self,
        filter: &ProspectFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<Prospect>, ProspectServiceError> {
        let prospects = self
            .repository
            .list()?
            .into_iter()
            .filter(|prospect| filter.matches(prospect, now))
            .collect();
        Ok(prospects)
    }

    /// Prospects whose follow-up delay has run out.
    pub fn recommendations(&self, now: DateTime<Utc>) -> Result<Vec<Prospect>, ProspectServiceError> {
        self.list(&ProspectFilter::alerts(), now)
    }

    pub fn dashboard(&self, now: DateTime<Utc>) -> Result<FunnelDashboard, ProspectServiceError> {
        let prospects = self.repository.list()?;
        Ok(FunnelDashboard::summarize(
            prospects
                .iter()
                .map(|prospect| (prospect.position(), prospect.score)),
            now,
        ))
    }
}

fn validate_labels(code: Option<&String>, name: Option<&String>) -> Result<(), ValidationError> {
    if code.is_some_and(|code| code.trim().is_empty()) {
        return Err(ValidationError::BlankCode);
    }
    if name.is_some_and(|name| name.trim().is_empty()) {
        return Err(ValidationError::BlankName);
    }
    Ok(())
}

/// Payload problems rejected before touching the repository.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("prospect code must not be blank")]
    BlankCode,
    #[error("prospect name must not be blank")]
    BlankName,
}

/// Error raised by the prospect service.
#[derive(Debug, thiserror::Error)]
pub enum ProspectServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
