use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{TimeZone, Utc};
use serde_json::Value;

use crate::matching::domain::{
    Application, ApplicationId, ApplicationSubmission, Program, ProgramId,
};
use crate::matching::evaluation::MatchEngine;
use crate::matching::repository::{
    ApplicationRecord, ApplicationRepository, ProgramCatalog, RepositoryError,
};
use crate::matching::{matching_router, LenderMatchService};

pub(super) fn submission() -> ApplicationSubmission {
    ApplicationSubmission {
        business_name: "Lone Star Grading LLC".to_string(),
        industry: "Construction".to_string(),
        state: "TX".to_string(),
        years_in_business: 5.0,
        annual_revenue: 750_000.0,
        guarantor_name: "Dana Whitfield".to_string(),
        fico_score: 720,
        paynet_score: Some(680),
        is_homeowner: true,
        is_us_citizen: true,
        bankruptcies: 0,
        bankruptcy_discharge_years: None,
        has_tax_liens: false,
        has_judgments: false,
        has_foreclosures: false,
        loan_amount: 50_000.0,
        term_months: 36,
        equipment_type: "Construction Equipment".to_string(),
        equipment_age_years: 2.0,
        equipment_description: Some("2022 compact track loader".to_string()),
        soft_cost_percent: 0.0,
    }
}

pub(super) fn application_from(submission: ApplicationSubmission) -> Application {
    Application::new(
        ApplicationId("app-test".to_string()),
        submission,
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0)
            .single()
            .expect("valid timestamp"),
    )
}

pub(super) fn application() -> Application {
    application_from(submission())
}

/// Active program with every bound absent.
pub(super) fn open_program(id: u64) -> Program {
    Program::new(ProgramId(id), format!("Program {id}"))
}

pub(super) fn engine() -> MatchEngine {
    MatchEngine::new()
}

pub(super) fn build_service() -> (
    LenderMatchService<MemoryRepository, MemoryCatalog>,
    Arc<MemoryRepository>,
    Arc<MemoryCatalog>,
) {
    build_service_with(Vec::new())
}

pub(super) fn build_service_with(
    programs: Vec<Program>,
) -> (
    LenderMatchService<MemoryRepository, MemoryCatalog>,
    Arc<MemoryRepository>,
    Arc<MemoryCatalog>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let catalog = Arc::new(MemoryCatalog::with_programs(programs));
    let service = LenderMatchService::new(repository.clone(), catalog.clone());
    (service, repository, catalog)
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<ApplicationId, ApplicationRecord>>>,
    pub(super) status_history: Arc<Mutex<Vec<&'static str>>>,
}

impl MemoryRepository {
    pub(super) fn status_history(&self) -> Vec<&'static str> {
        self.status_history
            .lock()
            .expect("history mutex poisoned")
            .clone()
    }

    fn record_status(&self, record: &ApplicationRecord) {
        self.status_history
            .lock()
            .expect("history mutex poisoned")
            .push(record.application.status.label());
    }
}

impl ApplicationRepository for MemoryRepository {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.application.id) {
            return Err(RepositoryError::Conflict);
        }
        self.record_status(&record);
        guard.insert(record.application.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: ApplicationRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        self.record_status(&record);
        guard.insert(record.application.id.clone(), record);
        Ok(())
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryCatalog {
    programs: Arc<Mutex<Vec<Program>>>,
}

impl MemoryCatalog {
    pub(super) fn with_programs(programs: Vec<Program>) -> Self {
        Self {
            programs: Arc::new(Mutex::new(programs)),
        }
    }

    pub(super) fn replace(&self, program: Program) {
        let mut guard = self.programs.lock().expect("catalog mutex poisoned");
        guard.retain(|existing| existing.id != program.id);
        guard.push(program);
    }
}

impl ProgramCatalog for MemoryCatalog {
    fn list(&self) -> Result<Vec<Program>, RepositoryError> {
        Ok(self.programs.lock().expect("catalog mutex poisoned").clone())
    }

    fn fetch(&self, id: ProgramId) -> Result<Option<Program>, RepositoryError> {
        let guard = self.programs.lock().expect("catalog mutex poisoned");
        Ok(guard.iter().find(|program| program.id == id).cloned())
    }

    fn insert(&self, program: Program) -> Result<Program, RepositoryError> {
        let mut guard = self.programs.lock().expect("catalog mutex poisoned");
        if guard.iter().any(|existing| existing.id == program.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(program.clone());
        Ok(program)
    }

    fn update(&self, program: Program) -> Result<Program, RepositoryError> {
        let mut guard = self.programs.lock().expect("catalog mutex poisoned");
        let slot = guard
            .iter_mut()
            .find(|existing| existing.id == program.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = program.clone();
        Ok(program)
    }

    fn remove(&self, id: ProgramId) -> Result<Program, RepositoryError> {
        let mut guard = self.programs.lock().expect("catalog mutex poisoned");
        let index = guard
            .iter()
            .position(|program| program.id == id)
            .ok_or(RepositoryError::NotFound)?;
        Ok(guard.remove(index))
    }
}

pub(super) struct UnavailableRepository;

impl ApplicationRepository for UnavailableRepository {
    fn insert(&self, _record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: ApplicationRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn router_with_service(
    service: LenderMatchService<MemoryRepository, MemoryCatalog>,
) -> axum::Router {
    matching_router(Arc::new(service))
}
