use super::domain::{Prospect, ProspectId};

/// Storage abstraction so the service can be exercised without a database.
///
/// Writes replace whole records; concurrent updates to one prospect are
/// last-write-wins.
pub trait ProspectRepository: Send + Sync {
    fn insert(&self, prospect: Prospect) -> Result<Prospect, RepositoryError>;
    fn update(&self, prospect: Prospect) -> Result<Prospect, RepositoryError>;
    fn fetch(&self, id: &ProspectId) -> Result<Option<Prospect>, RepositoryError>;
    /// All prospects, newest first.
    fn list(&self) -> Result<Vec<Prospect>, RepositoryError>;
    fn delete(&self, id: &ProspectId) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("prospect already exists")]
    Conflict,
    #[error("prospect not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Newest-first ordering shared by repository implementations.
///
/// Ties on `created_at` fall back to the id sequence, compared by length first
/// so that `prs-1000000` stays newer than `prs-999999`.
pub fn sort_newest_first(prospects: &mut [Prospect]) {
    prospects.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.0.len().cmp(&a.id.0.len()))
            .then_with(|| b.id.cmp(&a.id))
    });
}
