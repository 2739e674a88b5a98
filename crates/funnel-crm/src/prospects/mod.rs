//! Prospect persistence, write path, and HTTP transport around the funnel engine.

pub mod domain;
pub mod import;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{NewProspect, Prospect, ProspectFilter, ProspectId, ProspectPatch, ProspectView};
pub use import::{parse_timestamp, ProspectCsvImporter, ProspectImportError};
pub use repository::{sort_newest_first, ProspectRepository, RepositoryError};
pub use router::prospect_router;
pub use service::{ProspectService, ProspectServiceError, ValidationError};
