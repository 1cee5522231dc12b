use std::io::Write;

use serde::Serialize;

use super::domain::MatchResult;

#[derive(Debug, Serialize)]
struct MatchResultRow<'a> {
    program_id: u64,
    program_name: &'a str,
    is_eligible: bool,
    fit_score: u8,
    failed_criteria: String,
    rejection_reasons: String,
}

const HEADER: [&str; 6] = [
    "program_id",
    "program_name",
    "is_eligible",
    "fit_score",
    "failed_criteria",
    "rejection_reasons",
];

/// Write one flat CSV row per verdict, in the order given.
///
/// The header row is always written, so an empty run still yields a well-formed file.
pub fn write_results_csv<W: Write>(writer: W, results: &[MatchResult]) -> Result<(), csv::Error> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(HEADER)?;

    for result in results {
        let failed_criteria = result
            .failed_criteria()
            .map(|key| key.as_str())
            .collect::<Vec<_>>()
            .join(";");

        csv_writer.serialize(MatchResultRow {
            program_id: result.program_id.0,
            program_name: &result.program_name,
            is_eligible: result.is_eligible,
            fit_score: result.fit_score,
            failed_criteria,
            rejection_reasons: result.rejection_reasons.join(" | "),
        })?;
    }

    csv_writer.flush()?;
    Ok(())
}
