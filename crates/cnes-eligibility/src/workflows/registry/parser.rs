use super::normalizer::{clean_header, pad_facility_code, parse_weekly_hours};
use super::{RegistryImportError, RegistryRowError};
use crate::workflows::eligibility::{CareerEntry, Competence};
use csv::StringRecord;
use serde::Deserialize;
use std::io::Read;
use tracing::warn;

pub(crate) const REQUIRED_COLUMNS: [&str; 6] = [
    "CNES",
    "IBGE",
    "ESTABELECIMENTO",
    "CHS AMB.",
    "DESCRICAO CBO",
    "COMP.",
];

/// Raw registration as exported by the registry, before any validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RegistryRow {
    #[serde(rename = "CNES")]
    pub(crate) facility_code: String,
    #[serde(rename = "IBGE")]
    pub(crate) municipality_code: String,
    #[serde(rename = "ESTABELECIMENTO")]
    pub(crate) facility_name: String,
    #[serde(rename = "CHS AMB.")]
    pub(crate) weekly_hours: String,
    #[serde(rename = "DESCRICAO CBO")]
    pub(crate) occupation: String,
    #[serde(rename = "COMP.")]
    pub(crate) competence: String,
}

impl RegistryRow {
    pub(crate) fn into_entry(self) -> Result<CareerEntry, RegistryRowError> {
        if self.facility_code.trim().is_empty() {
            return Err(RegistryRowError::MissingFacility);
        }

        let weekly_hours = parse_weekly_hours(&self.weekly_hours)
            .ok_or_else(|| RegistryRowError::InvalidHours(self.weekly_hours.clone()))?;
        let competence = Competence::parse(&self.competence)?;

        Ok(CareerEntry {
            facility_id: pad_facility_code(&self.facility_code),
            municipality_code: self.municipality_code.trim().to_string(),
            facility_name: self.facility_name.trim().to_string(),
            weekly_hours,
            occupation: self.occupation.trim().to_string(),
            competence,
        })
    }
}

pub(crate) struct ParsedRows {
    pub(crate) rows: Vec<RegistryRow>,
    pub(crate) unreadable: usize,
}

pub(crate) fn parse_rows<R: Read>(reader: R) -> Result<ParsedRows, RegistryImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: StringRecord = csv_reader.headers()?.iter().map(clean_header).collect();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !headers.iter().any(|header| header == **column))
        .map(|column| column.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(RegistryImportError::MissingColumns(missing));
    }
    csv_reader.set_headers(headers);

    let mut rows = Vec::new();
    let mut unreadable = 0;

    for record in csv_reader.deserialize::<RegistryRow>() {
        match record {
            Ok(row) => rows.push(row),
            Err(err) if err.is_io_error() => return Err(err.into()),
            Err(err) => {
                warn!(%err, "skipping unreadable registry row");
                unreadable += 1;
            }
        }
    }

    Ok(ParsedRows { rows, unreadable })
}
