use lender_match::matching::{
    ApplicationId, ApplicationRecord, ApplicationRepository, CatalogError, Program,
    ProgramCatalog, ProgramCatalogFile, ProgramId, RepositoryError,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationRepository {
    records: Arc<Mutex<HashMap<ApplicationId, ApplicationRecord>>>,
}

impl ApplicationRepository for InMemoryApplicationRepository {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.application.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.application.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: ApplicationRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.application.id) {
            guard.insert(record.application.id.clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
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
pub(crate) struct InMemoryProgramCatalog {
    programs: Arc<Mutex<BTreeMap<ProgramId, Program>>>,
}

impl InMemoryProgramCatalog {
    pub(crate) fn with_programs(programs: Vec<Program>) -> Self {
        let programs = programs
            .into_iter()
            .map(|program| (program.id, program))
            .collect();
        Self {
            programs: Arc::new(Mutex::new(programs)),
        }
    }
}

impl ProgramCatalog for InMemoryProgramCatalog {
    fn list(&self) -> Result<Vec<Program>, RepositoryError> {
        let guard = self.programs.lock().expect("catalog mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn fetch(&self, id: ProgramId) -> Result<Option<Program>, RepositoryError> {
        let guard = self.programs.lock().expect("catalog mutex poisoned");
        Ok(guard.get(&id).cloned())
    }

    fn insert(&self, program: Program) -> Result<Program, RepositoryError> {
        let mut guard = self.programs.lock().expect("catalog mutex poisoned");
        if guard.contains_key(&program.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(program.id, program.clone());
        Ok(program)
    }

    fn update(&self, program: Program) -> Result<Program, RepositoryError> {
        let mut guard = self.programs.lock().expect("catalog mutex poisoned");
        match guard.get_mut(&program.id) {
            Some(slot) => {
                *slot = program.clone();
                Ok(program)
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn remove(&self, id: ProgramId) -> Result<Program, RepositoryError> {
        let mut guard = self.programs.lock().expect("catalog mutex poisoned");
        guard.remove(&id).ok_or(RepositoryError::NotFound)
    }
}

/// Programs from `path` when configured, otherwise the bundled demo catalog.
pub(crate) fn load_programs(path: Option<&Path>) -> Result<Vec<Program>, CatalogError> {
    match path {
        Some(path) => ProgramCatalogFile::from_path(path),
        None => Ok(demo_programs()),
    }
}

fn set(values: &[&str]) -> std::collections::BTreeSet<String> {
    values.iter().map(|value| value.to_string()).collect()
}

/// Four lenders spanning prime, standard, startup and trucking credit boxes.
pub(crate) fn demo_programs() -> Vec<Program> {
    let mut prime = Program::new(ProgramId(1), "Summit Capital Tier A");
    prime.description = Some("Prime credit, established businesses".to_string());
    prime.priority = 10;
    prime.min_fico = Some(720);
    prime.min_paynet = Some(660);
    prime.min_years_in_business = Some(3.0);
    prime.min_revenue = Some(500_000.0);
    prime.min_loan_amount = Some(25_000.0);
    prime.max_loan_amount = Some(1_000_000.0);
    prime.max_term_months = Some(72);
    prime.allow_tax_liens = false;
    prime.allow_judgments = false;
    prime.allow_foreclosures = false;
    prime.max_equipment_age_years = Some(10.0);
    prime.max_soft_cost_percent = Some(15.0);
    prime.restricted_states = set(&["CA", "NV"]);
    prime.restricted_industries = set(&["Cannabis", "Gaming"]);

    let mut standard = Program::new(ProgramId(2), "Harbor Equipment Finance Standard");
    standard.priority = 5;
    standard.min_fico = Some(660);
    standard.min_fico_no_paynet = Some(690);
    standard.min_years_in_business = Some(2.0);
    standard.min_years_no_paynet = Some(3.0);
    standard.max_loan_amount = Some(500_000.0);
    standard.min_term_months = Some(12);
    standard.max_term_months = Some(60);
    standard.max_bankruptcies = 1;
    standard.min_bankruptcy_years = Some(7);
    standard.allow_judgments = false;
    standard.max_equipment_age_years = Some(15.0);
    standard.max_soft_cost_percent = Some(25.0);
    standard.excluded_equipment_types = set(&["Aircraft", "Vessels"]);
    standard.industry_loan_limits =
        BTreeMap::from([("Trucking".to_string(), 150_000.0)]);

    let mut startup = Program::new(ProgramId(3), "Keystone Startup Program");
    startup.priority = 1;
    startup.min_fico = Some(700);
    startup.max_loan_amount = Some(75_000.0);
    startup.max_term_months = Some(48);
    startup.require_homeownership = true;
    startup.require_us_citizen = true;
    startup.allowed_equipment_types =
        set(&["Construction Equipment", "Machine Tools", "Restaurant Equipment"]);

    let mut trucking = Program::new(ProgramId(4), "Interstate Transport Credit");
    trucking.priority = 3;
    trucking.min_fico = Some(640);
    trucking.min_years_in_business = Some(2.0);
    trucking.min_loan_amount = Some(20_000.0);
    trucking.max_loan_amount = Some(250_000.0);
    trucking.max_term_months = Some(60);
    trucking.max_bankruptcies = 1;
    trucking.min_bankruptcy_years = Some(5);
    trucking.allowed_equipment_types = set(&["Class 8 Truck", "Trailer"]);
    trucking.max_equipment_age_years = Some(8.0);

    vec![prime, standard, startup, trucking]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_catalog_ids_are_unique() {
        let programs = demo_programs();
        let catalog = InMemoryProgramCatalog::with_programs(programs.clone());
        assert_eq!(catalog.list().expect("list").len(), programs.len());
        assert!(matches!(
            catalog.insert(programs[0].clone()),
            Err(RepositoryError::Conflict)
        ));
    }

    #[test]
    fn update_requires_an_existing_record() {
        use chrono::Utc;
        use lender_match::matching::{Application, ApplicationSubmission};

        let submission: ApplicationSubmission = serde_json::from_value(serde_json::json!({
            "business_name": "Ridge Line Excavating",
            "industry": "Construction",
            "state": "CO",
            "years_in_business": 4.0,
            "annual_revenue": 900000.0,
            "guarantor_name": "Sam Ortega",
            "fico_score": 710,
            "loan_amount": 80000.0,
            "term_months": 48,
            "equipment_type": "Construction Equipment"
        }))
        .expect("submission json");
        let record = ApplicationRecord::new(Application::new(
            ApplicationId("app-900001".to_string()),
            submission,
            Utc::now(),
        ));
        let repository = InMemoryApplicationRepository::default();

        assert!(matches!(
            repository.update(record.clone()),
            Err(RepositoryError::NotFound)
        ));
        repository.insert(record.clone()).expect("insert");
        repository.update(record).expect("update");
    }
}
