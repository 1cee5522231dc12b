use crate::infra::{demo_programs, load_programs};
use chrono::Utc;
use clap::Args;
use lender_match::error::AppError;
use lender_match::matching::{
    rank_results, write_results_csv, ApplicationId, ApplicationSubmission, IntakeGuard,
    LenderMatchServiceError, MatchEngine, MatchResult, Program,
};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub(crate) struct MatchArgs {
    /// Application submission as a JSON file
    #[arg(long)]
    pub(crate) application: PathBuf,
    /// Program catalog JSON (defaults to the demo catalog)
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
    /// Also write the verdicts as CSV to this path
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
    /// Print every criterion, not just rejection reasons
    #[arg(long)]
    pub(crate) verbose: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Write the demo verdicts as CSV to this path
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
}

pub(crate) fn run_match(args: MatchArgs) -> Result<(), AppError> {
    let MatchArgs {
        application,
        catalog,
        csv,
        verbose,
    } = args;

    let file = File::open(&application)?;
    let submission: ApplicationSubmission = serde_json::from_reader(BufReader::new(file))?;
    let programs = load_programs(catalog.as_deref())?;

    let results = evaluate(submission, &programs)?;
    render_results(&results, verbose);
    if let Some(path) = csv {
        export_csv(&path, &results)?;
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    println!("Lender match demo");
    let programs = demo_programs();
    println!("Catalog: {} programs", programs.len());
    for program in &programs {
        println!("  [{}] {} (priority {})", program.id, program.name, program.priority);
    }

    let submission = demo_submission();
    println!(
        "\nApplicant: {} ({}, {}), FICO {}, requesting ${:.0} over {} months",
        submission.business_name,
        submission.industry,
        submission.state,
        submission.fico_score,
        submission.loan_amount,
        submission.term_months
    );

    let results = evaluate(submission, &programs)?;
    render_results(&results, true);
    if let Some(path) = args.csv {
        export_csv(&path, &results)?;
    }
    Ok(())
}

/// Validate the submission, evaluate every active program and rank the verdicts.
fn evaluate(
    submission: ApplicationSubmission,
    programs: &[Program],
) -> Result<Vec<MatchResult>, AppError> {
    let application = IntakeGuard::new()
        .application_from_submission(ApplicationId("app-cli".to_string()), submission, Utc::now())
        .map_err(LenderMatchServiceError::from)?;

    let active: Vec<Program> = programs
        .iter()
        .filter(|program| program.active)
        .cloned()
        .collect();
    let priorities: BTreeMap<_, _> = active
        .iter()
        .map(|program| (program.id, program.priority))
        .collect();

    let mut results = MatchEngine::new().match_programs(&application, &active);
    rank_results(&mut results, &priorities);
    Ok(results)
}

fn render_results(results: &[MatchResult], verbose: bool) {
    let eligible = results.iter().filter(|result| result.is_eligible).count();
    println!(
        "\nMatch results: {} of {} programs eligible",
        eligible,
        results.len()
    );

    for result in results {
        let verdict = if result.is_eligible {
            "ELIGIBLE"
        } else {
            "DECLINED"
        };
        println!(
            "\n  {} [{}] fit {}/100  {}",
            verdict, result.program_id, result.fit_score, result.program_name
        );

        if verbose {
            for (key, criterion) in &result.criteria_results {
                let mark = if criterion.passed { "pass" } else { "FAIL" };
                println!("    {:<18} {}  {}", key.as_str(), mark, criterion.reason);
            }
        } else {
            for reason in &result.rejection_reasons {
                println!("    - {}", reason);
            }
        }
    }
}

fn export_csv(path: &Path, results: &[MatchResult]) -> Result<(), AppError> {
    let file = File::create(path)?;
    write_results_csv(file, results)?;
    println!("\nCSV written to {}", path.display());
    Ok(())
}

fn demo_submission() -> ApplicationSubmission {
    ApplicationSubmission {
        business_name: "Blue Ridge Site Works LLC".to_string(),
        industry: "Construction".to_string(),
        state: "NC".to_string(),
        years_in_business: 4.5,
        annual_revenue: 1_250_000.0,
        guarantor_name: "Jordan Pike".to_string(),
        fico_score: 705,
        paynet_score: None,
        is_homeowner: true,
        is_us_citizen: true,
        bankruptcies: 0,
        bankruptcy_discharge_years: None,
        has_tax_liens: false,
        has_judgments: false,
        has_foreclosures: false,
        loan_amount: 185_000.0,
        term_months: 60,
        equipment_type: "Construction Equipment".to_string(),
        equipment_age_years: 3.0,
        equipment_description: Some("2021 hydraulic excavator".to_string()),
        soft_cost_percent: 8.0,
    }
}
