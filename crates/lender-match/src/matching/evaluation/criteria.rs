use std::collections::{BTreeMap, BTreeSet};

use super::super::domain::{Application, CriterionKey, CriterionResult, Program};

/// Raised when a criterion reads a numeric input it cannot compare.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{field} is not a finite number ({value})")]
pub struct CriterionFault {
    pub field: &'static str,
    pub value: f64,
}

pub(crate) type Evaluator = fn(&Application, &Program) -> Result<CriterionResult, CriterionFault>;

/// One named, pure eligibility predicate.
#[derive(Clone, Copy)]
pub(crate) struct Criterion {
    pub key: CriterionKey,
    pub evaluate: Evaluator,
}

pub(crate) const CRITERIA: [Criterion; 16] = [
    Criterion { key: CriterionKey::FicoScore, evaluate: fico_score },
    Criterion { key: CriterionKey::PaynetScore, evaluate: paynet_score },
    Criterion { key: CriterionKey::YearsInBusiness, evaluate: years_in_business },
    Criterion { key: CriterionKey::AnnualRevenue, evaluate: annual_revenue },
    Criterion { key: CriterionKey::LoanAmount, evaluate: loan_amount },
    Criterion { key: CriterionKey::TermMonths, evaluate: term_months },
    Criterion { key: CriterionKey::State, evaluate: state },
    Criterion { key: CriterionKey::Industry, evaluate: industry },
    Criterion { key: CriterionKey::EquipmentType, evaluate: equipment_type },
    Criterion { key: CriterionKey::Bankruptcies, evaluate: bankruptcies },
    Criterion { key: CriterionKey::TaxLiens, evaluate: tax_liens },
    Criterion { key: CriterionKey::Judgments, evaluate: judgments },
    Criterion { key: CriterionKey::Homeownership, evaluate: homeownership },
    Criterion { key: CriterionKey::Citizenship, evaluate: citizenship },
    Criterion { key: CriterionKey::EquipmentAge, evaluate: equipment_age },
    Criterion { key: CriterionKey::SoftCosts, evaluate: soft_costs },
];

pub(crate) fn criterion(key: CriterionKey) -> Criterion {
    // CRITERIA is declared in CriterionKey order.
    CRITERIA[key as usize]
}

fn pass(reason: impl Into<String>) -> Result<CriterionResult, CriterionFault> {
    Ok(CriterionResult {
        passed: true,
        reason: reason.into(),
    })
}

fn fail(reason: impl Into<String>) -> Result<CriterionResult, CriterionFault> {
    Ok(CriterionResult {
        passed: false,
        reason: reason.into(),
    })
}

fn finite(field: &'static str, value: f64) -> Result<f64, CriterionFault> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CriterionFault { field, value })
    }
}

fn finite_bound(field: &'static str, bound: Option<f64>) -> Result<Option<f64>, CriterionFault> {
    bound.map(|value| finite(field, value)).transpose()
}

fn same_label(left: &str, right: &str) -> bool {
    left.trim().eq_ignore_ascii_case(right.trim())
}

fn find_member<'a>(set: &'a BTreeSet<String>, value: &str) -> Option<&'a String> {
    set.iter().find(|candidate| same_label(candidate, value))
}

fn find_limit<'a>(limits: &'a BTreeMap<String, f64>, industry: &str) -> Option<(&'a String, f64)> {
    limits
        .iter()
        .find(|(name, _)| same_label(name, industry))
        .map(|(name, limit)| (name, *limit))
}

fn join(set: &BTreeSet<String>) -> String {
    set.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

/// Dollar amount with thousands separators, e.g. `$150,000` or `$50,000.40`.
///
/// Fractional amounts keep every significant digit so a breach is never rounded away.
fn money(value: f64) -> String {
    let text = format!("{}", value.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, ch) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    match fraction.len() {
        0 => {}
        1 => {
            grouped.push('.');
            grouped.push_str(fraction);
            grouped.push('0');
        }
        _ => {
            grouped.push('.');
            grouped.push_str(fraction);
        }
    }
    if value < 0.0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

/// Gap between an amount and its bound, to the cent.
fn money_gap(gap: f64) -> String {
    let cents = (gap * 100.0).round() / 100.0;
    if cents == 0.0 {
        "less than $0.01".to_string()
    } else {
        money(cents)
    }
}

/// Shortest exact rendering of a measured value, with at least one decimal place.
fn measure(value: f64) -> String {
    let text = format!("{value}");
    if text.contains('.') {
        text
    } else {
        format!("{text}.0")
    }
}

fn fico_score(app: &Application, program: &Program) -> Result<CriterionResult, CriterionFault> {
    let fico = app.submission.fico_score;
    let (floor, no_paynet_floor) = match (app.has_paynet(), program.min_fico_no_paynet) {
        (false, Some(floor)) => (Some(floor), true),
        _ => (program.min_fico, false),
    };
    let note = if no_paynet_floor {
        " (no-PayNet floor)"
    } else {
        ""
    };

    if let Some(min) = floor {
        if fico < min {
            return fail(format!(
                "FICO {fico} below required {min}{note}, short by {} points",
                min - fico
            ));
        }
    }

    if let Some(max) = program.max_fico {
        if fico > max {
            return fail(format!("FICO {fico} above program maximum {max}"));
        }
    }

    match floor {
        Some(min) => pass(format!(
            "FICO {fico} meets minimum {min}{note} (+{})",
            fico - min
        )),
        None => pass(format!("FICO {fico} accepted, no minimum required")),
    }
}

fn paynet_score(app: &Application, program: &Program) -> Result<CriterionResult, CriterionFault> {
    let Some(min) = program.min_paynet else {
        return pass("No PayNet minimum required");
    };

    match app.submission.paynet_score {
        None => pass(format!(
            "No PayNet score provided; minimum {min} not applied, no-PayNet floors used instead"
        )),
        Some(score) if score < min => fail(format!(
            "PayNet {score} below required {min}, short by {} points",
            min - score
        )),
        Some(score) => pass(format!("PayNet {score} meets minimum {min} (+{})", score - min)),
    }
}

fn years_in_business(
    app: &Application,
    program: &Program,
) -> Result<CriterionResult, CriterionFault> {
    let years = finite("years_in_business", app.submission.years_in_business)?;
    let standard = finite_bound("min_years_in_business", program.min_years_in_business)?;
    let no_paynet = finite_bound("min_years_no_paynet", program.min_years_no_paynet)?;

    let (floor, no_paynet_floor) = match (app.has_paynet(), no_paynet) {
        (false, Some(floor)) => (Some(floor), true),
        _ => (standard, false),
    };
    let note = if no_paynet_floor {
        " (no-PayNet floor)"
    } else {
        ""
    };

    match floor {
        None => pass(format!(
            "{} years in business, no minimum required",
            measure(years)
        )),
        Some(min) if years < min => {
            let months_short = ((min - years) * 12.0).ceil();
            fail(format!(
                "{} years in business below required {}{note}, about {months_short:.0} months short",
                measure(years),
                measure(min)
            ))
        }
        Some(min) => pass(format!(
            "{} years in business meets minimum {}{note}",
            measure(years),
            measure(min)
        )),
    }
}

fn annual_revenue(app: &Application, program: &Program) -> Result<CriterionResult, CriterionFault> {
    let revenue = finite("annual_revenue", app.submission.annual_revenue)?;
    match finite_bound("min_revenue", program.min_revenue)? {
        None => pass(format!("Revenue {} accepted, no minimum required", money(revenue))),
        Some(min) if revenue < min => fail(format!(
            "Revenue {} below required {}, short by {}",
            money(revenue),
            money(min),
            money_gap(min - revenue)
        )),
        Some(min) => pass(format!(
            "Revenue {} meets minimum {}",
            money(revenue),
            money(min)
        )),
    }
}

fn loan_amount(app: &Application, program: &Program) -> Result<CriterionResult, CriterionFault> {
    let amount = finite("loan_amount", app.submission.loan_amount)?;
    let min = finite_bound("min_loan_amount", program.min_loan_amount)?;
    let max = finite_bound("max_loan_amount", program.max_loan_amount)?;
    let industry_cap = match find_limit(&program.industry_loan_limits, &app.submission.industry) {
        Some((industry, limit)) => Some((industry, finite("industry_loan_limits", limit)?)),
        None => None,
    };

    if let Some(min) = min {
        if amount < min {
            return fail(format!(
                "Loan {} below program minimum {}",
                money(amount),
                money(min)
            ));
        }
    }

    if let Some((industry, cap)) = industry_cap {
        if amount > cap {
            return fail(format!(
                "Loan {} exceeds {} cap for {industry} industry by {}",
                money(amount),
                money(cap),
                money_gap(amount - cap)
            ));
        }
    }

    if let Some(max) = max {
        if amount > max {
            return fail(format!(
                "Loan {} exceeds program maximum {} by {}",
                money(amount),
                money(max),
                money_gap(amount - max)
            ));
        }
    }

    let ceiling = match (max, industry_cap) {
        (Some(max), Some((_, cap))) => Some(max.min(cap)),
        (Some(max), None) => Some(max),
        (None, Some((_, cap))) => Some(cap),
        (None, None) => None,
    };
    match (min, ceiling) {
        (None, None) => pass(format!("Loan {} accepted, no amount limits", money(amount))),
        (Some(min), None) => pass(format!(
            "Loan {} at or above minimum {}",
            money(amount),
            money(min)
        )),
        (None, Some(ceiling)) => pass(format!(
            "Loan {} within maximum {}",
            money(amount),
            money(ceiling)
        )),
        (Some(min), Some(ceiling)) => pass(format!(
            "Loan {} within range {} to {}",
            money(amount),
            money(min),
            money(ceiling)
        )),
    }
}

fn term_months(app: &Application, program: &Program) -> Result<CriterionResult, CriterionFault> {
    let term = app.submission.term_months;

    if let Some(min) = program.min_term_months {
        if term < min {
            return fail(format!("Term {term} months below minimum {min}"));
        }
    }
    if let Some(max) = program.max_term_months {
        if term > max {
            return fail(format!("Term {term} months exceeds maximum {max}"));
        }
    }

    match (program.min_term_months, program.max_term_months) {
        (None, None) => pass(format!("Term {term} months accepted, no term limits")),
        (Some(min), None) => pass(format!("Term {term} months at or above minimum {min}")),
        (None, Some(max)) => pass(format!("Term {term} months within maximum {max}")),
        (Some(min), Some(max)) => pass(format!("Term {term} months within {min} to {max}")),
    }
}

fn state(app: &Application, program: &Program) -> Result<CriterionResult, CriterionFault> {
    let state = app.submission.state.trim();
    if find_member(&program.restricted_states, state).is_some() {
        return fail(format!(
            "State {state} is restricted (restricted: {})",
            join(&program.restricted_states)
        ));
    }
    pass(format!("State {state} eligible"))
}

fn industry(app: &Application, program: &Program) -> Result<CriterionResult, CriterionFault> {
    let industry = app.submission.industry.trim();
    if find_member(&program.restricted_industries, industry).is_some() {
        return fail(format!("Industry '{industry}' is restricted by this program"));
    }
    pass(format!("Industry '{industry}' eligible"))
}

fn equipment_type(app: &Application, program: &Program) -> Result<CriterionResult, CriterionFault> {
    let equipment = app.submission.equipment_type.trim();

    if find_member(&program.excluded_equipment_types, equipment).is_some() {
        return fail(format!(
            "Equipment '{equipment}' is excluded (excluded: {})",
            join(&program.excluded_equipment_types)
        ));
    }

    if program.allowed_equipment_types.is_empty() {
        return pass(format!("Equipment '{equipment}' accepted"));
    }

    if find_member(&program.allowed_equipment_types, equipment).is_some() {
        pass(format!("Equipment '{equipment}' on approved list"))
    } else {
        fail(format!(
            "Equipment '{equipment}' not on approved list ({})",
            join(&program.allowed_equipment_types)
        ))
    }
}

fn bankruptcies(app: &Application, program: &Program) -> Result<CriterionResult, CriterionFault> {
    let count = app.submission.bankruptcies;
    let max = program.max_bankruptcies;

    if count > max {
        return fail(format!(
            "{count} bankruptcies exceed program maximum of {max}"
        ));
    }

    if count == 0 {
        return pass("No bankruptcies reported");
    }

    if let Some(min_years) = program.min_bankruptcy_years {
        return match app.submission.bankruptcy_discharge_years {
            None => fail(format!(
                "Bankruptcy discharge date not reported, program requires {min_years}+ years since discharge"
            )),
            Some(years) if years < min_years => fail(format!(
                "Bankruptcy discharged {years} years ago, program requires {min_years}+ years"
            )),
            Some(years) => pass(format!(
                "{count} bankruptcies within maximum {max}, discharged {years} years ago (requires {min_years}+)"
            )),
        };
    }

    pass(format!("{count} bankruptcies within maximum {max}"))
}

fn tax_liens(app: &Application, program: &Program) -> Result<CriterionResult, CriterionFault> {
    match (app.submission.has_tax_liens, program.allow_tax_liens) {
        (false, _) => pass("No tax liens reported"),
        (true, true) => pass("Tax liens reported, permitted by program"),
        (true, false) => fail("Tax liens reported, not allowed by program"),
    }
}

/// Covers civil judgments and foreclosures, both court-recorded adverse filings.
fn judgments(app: &Application, program: &Program) -> Result<CriterionResult, CriterionFault> {
    let judgment_blocked = app.submission.has_judgments && !program.allow_judgments;
    let foreclosure_blocked = app.submission.has_foreclosures && !program.allow_foreclosures;

    match (judgment_blocked, foreclosure_blocked) {
        (true, true) => fail("Judgments and foreclosures reported, not allowed by program"),
        (true, false) => fail("Judgments reported, not allowed by program"),
        (false, true) => fail("Foreclosures reported, not allowed by program"),
        (false, false) => {
            if app.submission.has_judgments || app.submission.has_foreclosures {
                pass("Judgment or foreclosure history permitted by program")
            } else {
                pass("No judgments or foreclosures reported")
            }
        }
    }
}

fn homeownership(app: &Application, program: &Program) -> Result<CriterionResult, CriterionFault> {
    match (program.require_homeownership, app.submission.is_homeowner) {
        (true, false) => fail("Homeownership required by program, applicant is not a homeowner"),
        (true, true) => pass("Homeownership requirement met"),
        (false, _) => pass("No homeownership requirement"),
    }
}

fn citizenship(app: &Application, program: &Program) -> Result<CriterionResult, CriterionFault> {
    match (program.require_us_citizen, app.submission.is_us_citizen) {
        (true, false) => fail("US citizenship required by program, applicant is not a US citizen"),
        (true, true) => pass("US citizenship requirement met"),
        (false, _) => pass("No citizenship requirement"),
    }
}

fn equipment_age(app: &Application, program: &Program) -> Result<CriterionResult, CriterionFault> {
    let age = finite("equipment_age_years", app.submission.equipment_age_years)?;
    match finite_bound("max_equipment_age_years", program.max_equipment_age_years)? {
        None => pass(format!(
            "Equipment age {} years, no maximum required",
            measure(age)
        )),
        Some(max) if age > max => fail(format!(
            "Equipment age {} years exceeds maximum {}",
            measure(age),
            measure(max)
        )),
        Some(max) => pass(format!(
            "Equipment age {} years within maximum {}",
            measure(age),
            measure(max)
        )),
    }
}

fn soft_costs(app: &Application, program: &Program) -> Result<CriterionResult, CriterionFault> {
    let percent = finite("soft_cost_percent", app.submission.soft_cost_percent)?;
    match finite_bound("max_soft_cost_percent", program.max_soft_cost_percent)? {
        None => pass(format!(
            "Soft costs {}%, no maximum required",
            measure(percent)
        )),
        Some(max) if percent > max => fail(format!(
            "Soft costs {}% exceed maximum {}%",
            measure(percent),
            measure(max)
        )),
        Some(max) => pass(format!(
            "Soft costs {}% within maximum {}%",
            measure(percent),
            measure(max)
        )),
    }
}
