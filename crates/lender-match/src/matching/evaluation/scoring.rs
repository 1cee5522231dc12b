use std::collections::BTreeMap;

use super::super::domain::{CriterionKey, CriterionResult};

pub(crate) const MAX_FIT_SCORE: u8 = 100;

/// Every criterion carries an equal share of the 100 points; failed criteria earn nothing.
///
/// Profiles passing the same set of criteria always receive the same score, and
/// failing an additional criterion can only lower it.
pub(crate) fn fit_score(criteria_results: &BTreeMap<CriterionKey, CriterionResult>) -> u8 {
    let total = criteria_results.len();
    if total == 0 {
        return MAX_FIT_SCORE;
    }
    let passed = criteria_results.values().filter(|result| result.passed).count();
    let earned = passed * usize::from(MAX_FIT_SCORE) / total;
    earned.min(usize::from(MAX_FIT_SCORE)) as u8
}

pub(crate) fn rejection_reasons(
    criteria_results: &BTreeMap<CriterionKey, CriterionResult>,
) -> Vec<String> {
    criteria_results
        .values()
        .filter(|result| !result.passed)
        .map(|result| result.reason.clone())
        .collect()
}

pub(crate) fn fault_reason(key: CriterionKey, detail: &str) -> String {
    format!("evaluation fault in {key}: {detail}")
}
