use serde::{Deserialize, Serialize};

const FAMILY_MEDICINE_TERMS: &[&[&str]] = &[&["MEDICO", "FAMILIA"]];
const CLINICIAN_TERMS: &[&[&str]] = &[&["MEDICO", "CLINICO"], &["MEDICOS", "CLINICO"]];
const GENERALIST_TERMS: &[&[&str]] = &[&["MEDICO", "GENERALISTA"]];

/// Occupation families that can count toward eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccupationVocabulary {
    FamilyMedicine,
    Clinician,
    Generalist,
}

impl OccupationVocabulary {
    /// Family medicine wins when a description matches several vocabularies.
    pub fn classify(description: &str) -> Option<Self> {
        let normalized = fold_description(description);

        if matches_any(&normalized, FAMILY_MEDICINE_TERMS) {
            Some(Self::FamilyMedicine)
        } else if matches_any(&normalized, CLINICIAN_TERMS) {
            Some(Self::Clinician)
        } else if matches_any(&normalized, GENERALIST_TERMS) {
            Some(Self::Generalist)
        } else {
            None
        }
    }

    /// Clinician and generalist work only counts at a qualifying facility.
    pub fn requires_qualified_facility(self) -> bool {
        !matches!(self, Self::FamilyMedicine)
    }

    pub fn admits(self, facility_qualified: bool) -> bool {
        !self.requires_qualified_facility() || facility_qualified
    }
}

fn matches_any(normalized: &str, term_sets: &[&[&str]]) -> bool {
    term_sets
        .iter()
        .any(|terms| terms.iter().all(|term| normalized.contains(term)))
}

fn fold_description(description: &str) -> String {
    description
        .chars()
        .flat_map(char::to_uppercase)
        .map(|ch| match ch {
            'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'A',
            'É' | 'È' | 'Ê' | 'Ë' => 'E',
            'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
            'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
            'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
            'Ç' => 'C',
            other => other,
        })
        .collect()
}
