use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::domain::{
    ApplicationId, ApplicationStatus, ApplicationSubmission, MatchResult, Program, ProgramId,
};
use super::evaluation::{rank_results, MatchEngine};
use super::intake::{IntakeGuard, IntakeViolation};
use super::repository::{
    ApplicationRecord, ApplicationRepository, ProgramCatalog, RepositoryError,
};

/// Service composing intake validation, the repositories, and the matching engine.
pub struct LenderMatchService<R, C> {
    guard: IntakeGuard,
    applications: Arc<R>,
    catalog: Arc<C>,
    engine: MatchEngine,
}

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

impl<R, C> LenderMatchService<R, C>
where
    R: ApplicationRepository + 'static,
    C: ProgramCatalog + 'static,
{
    pub fn new(applications: Arc<R>, catalog: Arc<C>) -> Self {
        Self {
            guard: IntakeGuard::new(),
            applications,
            catalog,
            engine: MatchEngine::new(),
        }
    }

    /// Validate and store a new application in the `pending` state.
    pub fn submit(
        &self,
        submission: ApplicationSubmission,
    ) -> Result<ApplicationRecord, LenderMatchServiceError> {
        let application =
            self.guard
                .application_from_submission(next_application_id(), submission, Utc::now())?;

        let stored = self.applications.insert(ApplicationRecord::new(application))?;
        info!(application_id = %stored.application.id.0, "application received");
        Ok(stored)
    }

    /// Match an application against every active program and persist the verdicts.
    ///
    /// Prior results are replaced; the application's own fields are never modified.
    pub fn run_matching(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Vec<MatchResult>, LenderMatchServiceError> {
        let mut record = self
            .applications
            .fetch(application_id)?
            .ok_or(RepositoryError::NotFound)?;

        record.application.status = ApplicationStatus::Processing;
        self.applications.update(record.clone())?;

        let programs = self.catalog.active()?;
        info!(
            application_id = %application_id.0,
            programs = programs.len(),
            "match run started"
        );

        let results = self.engine.match_programs(&record.application, &programs);
        let eligible = results.iter().filter(|result| result.is_eligible).count();

        record.results = results.clone();
        record.application.status = ApplicationStatus::Completed;
        self.applications.update(record)?;

        info!(
            application_id = %application_id.0,
            programs = results.len(),
            eligible,
            "match run completed"
        );

        Ok(results)
    }

    /// Stored verdicts ranked for presentation.
    pub fn results(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Vec<MatchResult>, LenderMatchServiceError> {
        let record = self.get(application_id)?;
        let priorities: BTreeMap<_, _> = self
            .catalog
            .list()?
            .into_iter()
            .map(|program| (program.id, program.priority))
            .collect();

        let mut results = record.results;
        rank_results(&mut results, &priorities);
        Ok(results)
    }

    pub fn get(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ApplicationRecord, LenderMatchServiceError> {
        let record = self
            .applications
            .fetch(application_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    /// Every stored application, newest first.
    pub fn applications(&self) -> Result<Vec<ApplicationRecord>, LenderMatchServiceError> {
        let mut records = self.applications.list()?;
        records.sort_by(|left, right| {
            right
                .application
                .created_at
                .cmp(&left.application.created_at)
                .then_with(|| right.application.id.cmp(&left.application.id))
        });
        Ok(records)
    }

    pub fn program(&self, id: ProgramId) -> Result<Program, LenderMatchServiceError> {
        let program = self.catalog.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        Ok(program)
    }

    pub fn programs(&self) -> Result<Vec<Program>, LenderMatchServiceError> {
        let mut programs = self.catalog.list()?;
        programs.sort_by(|left, right| {
            right
                .priority
                .cmp(&left.priority)
                .then_with(|| left.id.cmp(&right.id))
        });
        Ok(programs)
    }

    /// Register a program produced by document ingestion or manual entry.
    pub fn register_program(&self, program: Program) -> Result<Program, LenderMatchServiceError> {
        let stored = self.catalog.insert(program)?;
        info!(program_id = %stored.id, name = %stored.name, "program registered");
        Ok(stored)
    }

    /// Replace a program definition. Stored results are untouched until the next match run.
    pub fn update_program(&self, program: Program) -> Result<Program, LenderMatchServiceError> {
        let stored = self.catalog.update(program)?;
        info!(
            program_id = %stored.id,
            name = %stored.name,
            active = stored.active,
            "program updated"
        );
        Ok(stored)
    }

    pub fn remove_program(&self, id: ProgramId) -> Result<Program, LenderMatchServiceError> {
        let removed = self.catalog.remove(id)?;
        info!(program_id = %removed.id, "program removed");
        Ok(removed)
    }
}

/// Error raised by the lender match service.
#[derive(Debug, thiserror::Error)]
pub enum LenderMatchServiceError {
    #[error(transparent)]
    Intake(#[from] IntakeViolation),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
