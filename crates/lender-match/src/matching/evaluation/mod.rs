mod criteria;
mod scoring;

pub use criteria::CriterionFault;

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::domain::{
    Application, CriterionKey, CriterionResult, MatchResult, MatchResultId, Program, ProgramId,
};
use criteria::{criterion, CRITERIA};

/// Stateless orchestrator running the criterion table for every program.
///
/// Holds no mutable state, so one engine can be shared across threads and
/// repeated runs over the same inputs produce identical verdicts.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchEngine;

impl MatchEngine {
    pub fn new() -> Self {
        Self
    }

    /// Number of criteria evaluated for every program.
    pub const fn criteria_count() -> usize {
        CRITERIA.len()
    }

    /// One verdict per input program, in input order. Programs are not filtered by `active`.
    pub fn match_programs(&self, application: &Application, programs: &[Program]) -> Vec<MatchResult> {
        programs
            .iter()
            .map(|program| self.evaluate(application, program))
            .collect()
    }

    /// Run the full criterion table for a single (application, program) pair.
    pub fn evaluate(&self, application: &Application, program: &Program) -> MatchResult {
        let mut criteria_results = BTreeMap::new();

        for entry in &CRITERIA {
            let result = match (entry.evaluate)(application, program) {
                Ok(result) => result,
                Err(fault) => {
                    warn!(
                        application_id = %application.id.0,
                        program_id = %program.id,
                        criterion = %entry.key,
                        %fault,
                        "criterion evaluation fault"
                    );
                    CriterionResult {
                        passed: false,
                        reason: scoring::fault_reason(entry.key, &fault.to_string()),
                    }
                }
            };
            criteria_results.insert(entry.key, result);
        }

        let is_eligible = criteria_results.values().all(|result| result.passed);
        let fit_score = scoring::fit_score(&criteria_results);
        let rejection_reasons = scoring::rejection_reasons(&criteria_results);

        debug!(
            application_id = %application.id.0,
            program_id = %program.id,
            is_eligible,
            fit_score,
            failed = rejection_reasons.len(),
            "program evaluated"
        );

        MatchResult {
            id: MatchResultId::for_pair(&application.id, program.id),
            program_id: program.id,
            program_name: program.name.clone(),
            is_eligible,
            fit_score,
            criteria_results,
            rejection_reasons,
        }
    }

    /// Evaluate a single criterion, surfacing faults instead of folding them into a verdict.
    pub fn evaluate_criterion(
        &self,
        key: CriterionKey,
        application: &Application,
        program: &Program,
    ) -> Result<CriterionResult, CriterionFault> {
        (criterion(key).evaluate)(application, program)
    }
}

/// Presentation ordering: eligible first, then fit score, then program priority, then name.
///
/// `priorities` maps program ids to their priority hint; unknown programs rank as priority 0.
pub fn rank_results(results: &mut [MatchResult], priorities: &BTreeMap<ProgramId, i32>) {
    let priority = |result: &MatchResult| priorities.get(&result.program_id).copied().unwrap_or(0);

    results.sort_by(|left, right| {
        right
            .is_eligible
            .cmp(&left.is_eligible)
            .then_with(|| right.fit_score.cmp(&left.fit_score))
            .then_with(|| priority(right).cmp(&priority(left)))
            .then_with(|| left.program_name.cmp(&right.program_name))
            .then_with(|| left.program_id.cmp(&right.program_id))
    });
}
