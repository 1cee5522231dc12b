//! Eligibility matching of equipment-finance applications against lender programs.
//!
//! `evaluation` holds the pure criterion table and orchestrator; the remaining modules wrap
//! it with intake validation, storage traits, a service facade, and HTTP routes.

pub mod catalog;
pub mod domain;
pub mod evaluation;
pub mod export;
pub mod intake;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use catalog::{CatalogError, ProgramCatalogFile};
pub use domain::{
    Application, ApplicationId, ApplicationStatus, ApplicationSubmission, CriterionKey,
    CriterionResult, MatchResult, MatchResultId, Program, ProgramId,
};
pub use evaluation::{rank_results, CriterionFault, MatchEngine};
pub use export::write_results_csv;
pub use intake::{IntakeGuard, IntakeViolation};
pub use repository::{
    ApplicationRecord, ApplicationRepository, ApplicationStatusView, ProgramCatalog,
    RepositoryError,
};
pub use router::matching_router;
pub use service::{LenderMatchService, LenderMatchServiceError};
