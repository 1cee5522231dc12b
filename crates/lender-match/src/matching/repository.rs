use serde::{Deserialize, Serialize};

use super::domain::{Application, ApplicationId, ApplicationStatus, MatchResult, Program, ProgramId};

/// Repository record holding an application and the verdicts of its latest match run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub application: Application,
    pub results: Vec<MatchResult>,
}

impl ApplicationRecord {
    pub fn new(application: Application) -> Self {
        Self {
            application,
            results: Vec::new(),
        }
    }

    pub fn status_view(&self) -> ApplicationStatusView {
        let completed = self.application.status == ApplicationStatus::Completed;
        ApplicationStatusView {
            application_id: self.application.id.clone(),
            business_name: self.application.submission.business_name.clone(),
            status: self.application.status.label(),
            programs_evaluated: completed.then_some(self.results.len()),
            eligible_programs: completed
                .then(|| self.results.iter().filter(|result| result.is_eligible).count()),
            best_fit_score: if completed {
                self.results.iter().map(|result| result.fit_score).max()
            } else {
                None
            },
        }
    }
}

/// Storage abstraction for applications and their match results.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError>;
    fn update(&self, record: ApplicationRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError>;
    fn list(&self) -> Result<Vec<ApplicationRecord>, RepositoryError>;
}

/// Lending program storage: lookup, registration of newly ingested programs, and edits.
pub trait ProgramCatalog: Send + Sync {
    fn list(&self) -> Result<Vec<Program>, RepositoryError>;
    fn fetch(&self, id: ProgramId) -> Result<Option<Program>, RepositoryError>;
    fn insert(&self, program: Program) -> Result<Program, RepositoryError>;
    /// Replace an existing program; `NotFound` when the id is unknown.
    fn update(&self, program: Program) -> Result<Program, RepositoryError>;
    fn remove(&self, id: ProgramId) -> Result<Program, RepositoryError>;

    fn active(&self) -> Result<Vec<Program>, RepositoryError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|program| program.active)
            .collect())
    }
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Sanitized summary of an application's lifecycle and match outcome.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationStatusView {
    pub application_id: ApplicationId,
    pub business_name: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub programs_evaluated: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eligible_programs: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_fit_score: Option<u8>,
}
