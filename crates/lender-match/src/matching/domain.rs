use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for lending programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProgramId(pub u64);

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier wrapper for submitted applications.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Identifier of a single (application, program) verdict.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchResultId(pub String);

impl MatchResultId {
    pub fn for_pair(application_id: &ApplicationId, program_id: ProgramId) -> Self {
        Self(format!("match-{}-{}", application_id.0, program_id.0))
    }
}

/// A lender's eligibility policy. `None` on a bound means the dimension is unconstrained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub id: ProgramId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub priority: i32,

    #[serde(default)]
    pub min_fico: Option<u16>,
    #[serde(default)]
    pub max_fico: Option<u16>,
    /// Floor applied instead of `min_fico` when the applicant has no PayNet score.
    #[serde(default)]
    pub min_fico_no_paynet: Option<u16>,
    #[serde(default)]
    pub min_paynet: Option<u16>,

    #[serde(default)]
    pub min_years_in_business: Option<f64>,
    /// Tenure floor applied instead of `min_years_in_business` when PayNet is absent.
    #[serde(default)]
    pub min_years_no_paynet: Option<f64>,
    #[serde(default)]
    pub min_revenue: Option<f64>,

    #[serde(default)]
    pub min_loan_amount: Option<f64>,
    #[serde(default)]
    pub max_loan_amount: Option<f64>,
    #[serde(default)]
    pub min_term_months: Option<u32>,
    #[serde(default)]
    pub max_term_months: Option<u32>,

    #[serde(default)]
    pub max_bankruptcies: u32,
    #[serde(default)]
    pub min_bankruptcy_years: Option<u32>,
    #[serde(default = "default_true")]
    pub allow_tax_liens: bool,
    #[serde(default = "default_true")]
    pub allow_judgments: bool,
    #[serde(default = "default_true")]
    pub allow_foreclosures: bool,

    #[serde(default)]
    pub require_homeownership: bool,
    #[serde(default)]
    pub require_us_citizen: bool,

    #[serde(default)]
    pub max_equipment_age_years: Option<f64>,
    #[serde(default)]
    pub max_soft_cost_percent: Option<f64>,

    #[serde(default)]
    pub restricted_states: BTreeSet<String>,
    #[serde(default)]
    pub restricted_industries: BTreeSet<String>,
    /// Empty means every equipment type not explicitly excluded is accepted.
    #[serde(default)]
    pub allowed_equipment_types: BTreeSet<String>,
    #[serde(default)]
    pub excluded_equipment_types: BTreeSet<String>,
    /// Per-industry loan caps tightening `max_loan_amount`.
    #[serde(default)]
    pub industry_loan_limits: BTreeMap<String, f64>,
}

fn default_true() -> bool {
    true
}

impl Program {
    /// An active program with no constraints on any dimension.
    pub fn new(id: ProgramId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            active: true,
            priority: 0,
            min_fico: None,
            max_fico: None,
            min_fico_no_paynet: None,
            min_paynet: None,
            min_years_in_business: None,
            min_years_no_paynet: None,
            min_revenue: None,
            min_loan_amount: None,
            max_loan_amount: None,
            min_term_months: None,
            max_term_months: None,
            max_bankruptcies: 0,
            min_bankruptcy_years: None,
            allow_tax_liens: true,
            allow_judgments: true,
            allow_foreclosures: true,
            require_homeownership: false,
            require_us_citizen: false,
            max_equipment_age_years: None,
            max_soft_cost_percent: None,
            restricted_states: BTreeSet::new(),
            restricted_industries: BTreeSet::new(),
            allowed_equipment_types: BTreeSet::new(),
            excluded_equipment_types: BTreeSet::new(),
            industry_loan_limits: BTreeMap::new(),
        }
    }
}

/// Applicant provided fields, before an identifier and lifecycle status are assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationSubmission {
    pub business_name: String,
    pub industry: String,
    pub state: String,
    pub years_in_business: f64,
    pub annual_revenue: f64,

    pub guarantor_name: String,
    pub fico_score: u16,
    #[serde(default)]
    pub paynet_score: Option<u16>,
    #[serde(default)]
    pub is_homeowner: bool,
    #[serde(default = "default_true")]
    pub is_us_citizen: bool,

    #[serde(default)]
    pub bankruptcies: u32,
    /// Years since the most recent discharge.
    #[serde(default)]
    pub bankruptcy_discharge_years: Option<u32>,
    #[serde(default)]
    pub has_tax_liens: bool,
    #[serde(default)]
    pub has_judgments: bool,
    #[serde(default)]
    pub has_foreclosures: bool,

    pub loan_amount: f64,
    pub term_months: u32,

    pub equipment_type: String,
    #[serde(default)]
    pub equipment_age_years: f64,
    #[serde(default)]
    pub equipment_description: Option<String>,
    #[serde(default)]
    pub soft_cost_percent: f64,
}

/// One applicant's submission as read by the matching engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    #[serde(flatten)]
    pub submission: ApplicationSubmission,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
}

impl Application {
    pub fn new(id: ApplicationId, submission: ApplicationSubmission, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            submission,
            status: ApplicationStatus::Pending,
            created_at,
        }
    }

    pub fn has_paynet(&self) -> bool {
        self.submission.paynet_score.is_some()
    }
}

/// Lifecycle of an application through a match run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Processing,
    Completed,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Processing => "processing",
            ApplicationStatus::Completed => "completed",
        }
    }
}

/// Eligibility dimensions in evaluation order. Ordering of the variants is the table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionKey {
    FicoScore,
    PaynetScore,
    YearsInBusiness,
    AnnualRevenue,
    LoanAmount,
    TermMonths,
    State,
    Industry,
    EquipmentType,
    Bankruptcies,
    TaxLiens,
    Judgments,
    Homeownership,
    Citizenship,
    EquipmentAge,
    SoftCosts,
}

impl CriterionKey {
    pub const ALL: [CriterionKey; 16] = [
        CriterionKey::FicoScore,
        CriterionKey::PaynetScore,
        CriterionKey::YearsInBusiness,
        CriterionKey::AnnualRevenue,
        CriterionKey::LoanAmount,
        CriterionKey::TermMonths,
        CriterionKey::State,
        CriterionKey::Industry,
        CriterionKey::EquipmentType,
        CriterionKey::Bankruptcies,
        CriterionKey::TaxLiens,
        CriterionKey::Judgments,
        CriterionKey::Homeownership,
        CriterionKey::Citizenship,
        CriterionKey::EquipmentAge,
        CriterionKey::SoftCosts,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            CriterionKey::FicoScore => "fico_score",
            CriterionKey::PaynetScore => "paynet_score",
            CriterionKey::YearsInBusiness => "years_in_business",
            CriterionKey::AnnualRevenue => "annual_revenue",
            CriterionKey::LoanAmount => "loan_amount",
            CriterionKey::TermMonths => "term_months",
            CriterionKey::State => "state",
            CriterionKey::Industry => "industry",
            CriterionKey::EquipmentType => "equipment_type",
            CriterionKey::Bankruptcies => "bankruptcies",
            CriterionKey::TaxLiens => "tax_liens",
            CriterionKey::Judgments => "judgments",
            CriterionKey::Homeownership => "homeownership",
            CriterionKey::Citizenship => "citizenship",
            CriterionKey::EquipmentAge => "equipment_age",
            CriterionKey::SoftCosts => "soft_costs",
        }
    }
}

impl fmt::Display for CriterionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pass/fail verdict for one criterion with its audit reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionResult {
    pub passed: bool,
    pub reason: String,
}

/// Verdict for one (application, program) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub id: MatchResultId,
    pub program_id: ProgramId,
    pub program_name: String,
    pub is_eligible: bool,
    pub fit_score: u8,
    pub criteria_results: BTreeMap<CriterionKey, CriterionResult>,
    pub rejection_reasons: Vec<String>,
}

impl MatchResult {
    pub fn failed_criteria(&self) -> impl Iterator<Item = CriterionKey> + '_ {
        self.criteria_results
            .iter()
            .filter(|(_, result)| !result.passed)
            .map(|(key, _)| *key)
    }
}
