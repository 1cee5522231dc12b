use chrono::{DateTime, Utc};

use super::domain::{Application, ApplicationId, ApplicationSubmission};

/// Validation errors raised before a submission becomes an `Application`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntakeViolation {
    #[error("{field} must not be empty")]
    MissingField { field: &'static str },
    #[error("state must be a two-letter code, found '{found}'")]
    InvalidState { found: String },
    #[error("{field} must be between {min} and {max}, found {found}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        found: f64,
    },
    #[error("{field} must be a finite, non-negative number")]
    InvalidAmount { field: &'static str },
    #[error("term_months must be greater than zero")]
    ZeroTerm,
    #[error("bankruptcy_discharge_years reported without any bankruptcies")]
    DischargeWithoutBankruptcy,
}

const FICO_RANGE: (f64, f64) = (300.0, 850.0);
const PAYNET_RANGE: (f64, f64) = (0.0, 999.0);
const PERCENT_RANGE: (f64, f64) = (0.0, 100.0);

/// Boundary guard producing well-formed applications for the matching engine.
#[derive(Debug, Clone, Default)]
pub struct IntakeGuard;

impl IntakeGuard {
    pub fn new() -> Self {
        Self
    }

    /// Validate and normalize a submission, returning a `pending` application.
    pub fn application_from_submission(
        &self,
        id: ApplicationId,
        submission: ApplicationSubmission,
        created_at: DateTime<Utc>,
    ) -> Result<Application, IntakeViolation> {
        let submission = self.normalize(submission)?;
        Ok(Application::new(id, submission, created_at))
    }

    pub fn normalize(
        &self,
        mut submission: ApplicationSubmission,
    ) -> Result<ApplicationSubmission, IntakeViolation> {
        submission.business_name = required("business_name", &submission.business_name)?;
        submission.guarantor_name = required("guarantor_name", &submission.guarantor_name)?;
        submission.industry = required("industry", &submission.industry)?;
        submission.equipment_type = required("equipment_type", &submission.equipment_type)?;

        let state = submission.state.trim().to_ascii_uppercase();
        if state.len() != 2 || !state.chars().all(|ch| ch.is_ascii_alphabetic()) {
            return Err(IntakeViolation::InvalidState {
                found: submission.state,
            });
        }
        submission.state = state;

        in_range("fico_score", f64::from(submission.fico_score), FICO_RANGE)?;
        if let Some(paynet) = submission.paynet_score {
            in_range("paynet_score", f64::from(paynet), PAYNET_RANGE)?;
        }

        non_negative("years_in_business", submission.years_in_business)?;
        non_negative("annual_revenue", submission.annual_revenue)?;
        non_negative("loan_amount", submission.loan_amount)?;
        non_negative("equipment_age_years", submission.equipment_age_years)?;
        non_negative("soft_cost_percent", submission.soft_cost_percent)?;
        in_range("soft_cost_percent", submission.soft_cost_percent, PERCENT_RANGE)?;

        if submission.term_months == 0 {
            return Err(IntakeViolation::ZeroTerm);
        }

        if submission.bankruptcies == 0 && submission.bankruptcy_discharge_years.is_some() {
            return Err(IntakeViolation::DischargeWithoutBankruptcy);
        }

        submission.equipment_description = submission
            .equipment_description
            .map(|description| description.trim().to_string())
            .filter(|description| !description.is_empty());

        Ok(submission)
    }
}

fn required(field: &'static str, value: &str) -> Result<String, IntakeViolation> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(IntakeViolation::MissingField { field })
    } else {
        Ok(trimmed.to_string())
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), IntakeViolation> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(IntakeViolation::InvalidAmount { field })
    }
}

fn in_range(field: &'static str, value: f64, (min, max): (f64, f64)) -> Result<(), IntakeViolation> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(IntakeViolation::OutOfRange {
            field,
            min,
            max,
            found: value,
        })
    }
}
