use super::parser::RegistryRow;
use serde::{Deserialize, Deserializer, Serialize};

/// Professional history document published by the registry (`historico-profissional`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfessionalHistory {
    #[serde(rename = "nome", default)]
    pub name: Option<String>,
    #[serde(rename = "cns", default)]
    pub health_card: Option<String>,
    #[serde(rename = "vinculos", default)]
    pub registrations: Vec<HistoryRegistration>,
}

/// One `vinculo` of the history document. Numeric fields arrive as numbers or strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryRegistration {
    #[serde(rename = "nuComp", default, deserialize_with = "lenient_text")]
    pub competence: String,
    #[serde(rename = "coMun", default, deserialize_with = "lenient_text")]
    pub municipality_code: String,
    #[serde(rename = "cnes", default, deserialize_with = "lenient_text")]
    pub facility_code: String,
    #[serde(rename = "noFant", default, deserialize_with = "lenient_text")]
    pub facility_name: String,
    #[serde(rename = "dsCbo", default, deserialize_with = "lenient_text")]
    pub occupation: String,
    #[serde(rename = "chAmb", default, deserialize_with = "lenient_text")]
    pub weekly_hours: String,
}

impl From<HistoryRegistration> for RegistryRow {
    fn from(value: HistoryRegistration) -> Self {
        RegistryRow {
            facility_code: value.facility_code,
            municipality_code: value.municipality_code,
            facility_name: value.facility_name,
            weekly_hours: value.weekly_hours,
            occupation: value.occupation,
            competence: value.competence,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Number(serde_json::Number),
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<TextOrNumber>::deserialize(deserializer)?;
    Ok(match value {
        Some(TextOrNumber::Text(text)) => text,
        Some(TextOrNumber::Number(number)) => number.to_string(),
        None => String::new(),
    })
}
