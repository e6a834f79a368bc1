mod history;
mod normalizer;
mod parser;

pub use history::{HistoryRegistration, ProfessionalHistory};

use crate::workflows::eligibility::{CareerEntry, CompetenceError};
use parser::RegistryRow;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// Failure that prevents a registry export from being used at all.
#[derive(Debug)]
pub enum RegistryImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    MissingColumns(Vec<String>),
}

impl std::fmt::Display for RegistryImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryImportError::Io(err) => write!(f, "failed to read registry export: {}", err),
            RegistryImportError::Csv(err) => write!(f, "invalid registry CSV data: {}", err),
            RegistryImportError::MissingColumns(columns) => write!(
                f,
                "registry export is missing required columns: {}",
                columns.join(", ")
            ),
        }
    }
}

impl std::error::Error for RegistryImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistryImportError::Io(err) => Some(err),
            RegistryImportError::Csv(err) => Some(err),
            RegistryImportError::MissingColumns(_) => None,
        }
    }
}

impl From<std::io::Error> for RegistryImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for RegistryImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Reason a single registration was discarded.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryRowError {
    #[error("missing facility code")]
    MissingFacility,
    #[error("invalid weekly hours '{0}'")]
    InvalidHours(String),
    #[error(transparent)]
    Competence(#[from] CompetenceError),
}

/// Registrations that survived validation plus the number that did not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistryImport {
    pub entries: Vec<CareerEntry>,
    pub skipped: usize,
}

pub struct RegistryImporter;

impl RegistryImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<RegistryImport, RegistryImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<RegistryImport, RegistryImportError> {
        let parsed = parser::parse_rows(reader)?;
        let mut import = convert_rows(parsed.rows);
        import.skipped += parsed.unreadable;
        Ok(import)
    }

    pub fn from_history(history: ProfessionalHistory) -> RegistryImport {
        convert_rows(history.registrations.into_iter().map(RegistryRow::from))
    }
}

fn convert_rows<I>(rows: I) -> RegistryImport
where
    I: IntoIterator<Item = RegistryRow>,
{
    let mut import = RegistryImport::default();

    for (index, row) in rows.into_iter().enumerate() {
        match row.into_entry() {
            Ok(entry) => import.entries.push(entry),
            Err(err) => {
                warn!(row = index + 1, %err, "skipping invalid registration");
                import.skipped += 1;
            }
        }
    }

    info!(
        accepted = import.entries.len(),
        skipped = import.skipped,
        "registry import finished"
    );
    import
}
