use crate::infra::PolicyValidator;
use clap::{ArgGroup, Args};
use cnes_eligibility::config::{AppConfig, UnknownEstablishmentPolicy};
use cnes_eligibility::error::AppError;
use cnes_eligibility::telemetry::{self, LogTarget};
use cnes_eligibility::workflows::eligibility::{
    EligibilityReport, EligibilityService, ProgressLog, SqliteEstablishmentStore, REQUIRED_MONTHS,
};
use cnes_eligibility::workflows::registry::ProfessionalHistory;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(["csv", "history"])))]
pub(crate) struct EvaluateArgs {
    /// Semicolon-delimited registry export
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
    /// Professional history JSON document
    #[arg(long)]
    pub(crate) history: Option<PathBuf>,
    /// Establishment snapshot (defaults to APP_ESTABLISHMENT_DB)
    #[arg(long)]
    pub(crate) database: Option<PathBuf>,
    /// Count work at facilities missing from the snapshot
    #[arg(long)]
    pub(crate) accept_unknown: bool,
    /// Print every accepted registration
    #[arg(long)]
    pub(crate) list_rows: bool,
}

pub(crate) fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let EvaluateArgs {
        csv,
        history,
        database,
        accept_unknown,
        list_rows,
    } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry, LogTarget::Stderr)?;

    let database = database.unwrap_or(config.establishments.database_path);
    let policy = if accept_unknown {
        UnknownEstablishmentPolicy::Accept
    } else {
        config.establishments.unknown_establishments
    };

    let service = EligibilityService::new(
        Arc::new(SqliteEstablishmentStore::open(&database)?),
        Arc::new(PolicyValidator::new(policy)),
    );
    let progress = ProgressLog::default();

    let (professional, report) = match (csv, history) {
        (Some(path), _) => {
            let report = service.evaluate_csv(File::open(path)?, &progress)?;
            (None, report)
        }
        (None, Some(path)) => {
            let reader = BufReader::new(File::open(path)?);
            let history: ProfessionalHistory = serde_json::from_reader(reader)
                .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
            let professional = history.name.clone();
            (professional, service.evaluate_history(history, &progress)?)
        }
        (None, None) => {
            return Err(AppError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "either --csv or --history is required",
            )))
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    render_report(&mut out, professional.as_deref(), &report, list_rows)?;
    Ok(())
}

pub(crate) fn render_report<W: Write>(
    out: &mut W,
    professional: Option<&str>,
    report: &EligibilityReport,
    list_rows: bool,
) -> io::Result<()> {
    writeln!(out, "Clinical work eligibility")?;
    if let Some(name) = professional {
        writeln!(out, "Professional: {name}")?;
    }
    writeln!(
        out,
        "Verdict: {} ({:.2} of {:.0} valid months, {:.2} pending)",
        report.verdict.label(),
        report.total,
        REQUIRED_MONTHS,
        report.pending
    )?;

    writeln!(out, "\nSemesters")?;
    writeln!(out, "- 40 hours: {}", report.semesters.full_time)?;
    writeln!(out, "- 30 hours: {}", report.semesters.thirty_hours)?;
    writeln!(out, "- 20 hours: {}", report.semesters.twenty_hours)?;

    if report.credited_months.is_empty() {
        writeln!(out, "\nCredited months: none")?;
    } else {
        writeln!(out, "\nCredited months")?;
        for month in &report.credited_months {
            writeln!(
                out,
                "- {}: {} x{} = {:.2}",
                month.competence,
                month.tier.label(),
                month.occurrences,
                month.weight
            )?;
        }
    }

    if report.skipped_rows > 0 {
        writeln!(out, "\nSkipped rows: {}", report.skipped_rows)?;
    }

    if !report.establishment_failures.is_empty() {
        writeln!(out, "\nEstablishments not validated")?;
        for failure in &report.establishment_failures {
            writeln!(
                out,
                "- {} ({}): {}",
                failure.facility_name, failure.facility_id, failure.reason
            )?;
        }
    }

    if list_rows {
        writeln!(out, "\nAccepted registrations")?;
        for row in &report.accepted_rows {
            writeln!(
                out,
                "- {} | {} {} | {} | {}h",
                row.competence,
                row.facility_id,
                row.facility_name,
                row.occupation,
                row.weekly_hours
            )?;
        }
    }

    Ok(())
}
