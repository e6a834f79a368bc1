use serde::{Deserialize, Serialize};

use super::domain::{CareerEntry, Competence};
use super::establishment::FacilityFailure;
use super::tiers::{CreditAccumulator, Tier};

/// Weighted months required for eligibility.
pub const REQUIRED_MONTHS: f64 = 48.0;
pub const MONTHS_PER_SEMESTER: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "ELIGIBLE")]
    Eligible,
    #[serde(rename = "NOT ELIGIBLE")]
    NotEligible,
}

impl Verdict {
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Eligible => "ELIGIBLE",
            Verdict::NotEligible => "NOT ELIGIBLE",
        }
    }
}

/// Whole semesters per tier; fractional remainders are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SemesterSummary {
    pub full_time: u32,
    pub thirty_hours: u32,
    pub twenty_hours: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditedMonth {
    pub competence: Competence,
    pub tier: Tier,
    pub occurrences: u32,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityReport {
    pub total: f64,
    pub verdict: Verdict,
    pub pending: f64,
    pub semesters: SemesterSummary,
    /// Newest month first.
    pub credited_months: Vec<CreditedMonth>,
    /// Qualifying history, newest month first.
    pub accepted_rows: Vec<CareerEntry>,
    pub skipped_rows: usize,
    pub establishment_failures: Vec<FacilityFailure>,
}

impl EligibilityReport {
    pub fn is_eligible(&self) -> bool {
        self.verdict == Verdict::Eligible
    }
}

/// Reads the final accumulator and produces the verdict.
pub fn decide(accumulator: CreditAccumulator) -> EligibilityReport {
    let full_time = accumulator.months_at_top().len() as u32;
    let thirty: u32 = accumulator.tier30_counts().values().sum();
    let twenty: u32 = accumulator.tier20_counts().values().sum();

    let total = f64::from(full_time) * Tier::FullTime.weight()
        + f64::from(thirty) * Tier::ThirtyHours.weight()
        + f64::from(twenty) * Tier::TwentyHours.weight();

    let verdict = if total >= REQUIRED_MONTHS {
        Verdict::Eligible
    } else {
        Verdict::NotEligible
    };

    let mut credited_months: Vec<CreditedMonth> = accumulator
        .months_at_top()
        .iter()
        .map(|competence| credited(*competence, Tier::FullTime, 1))
        .chain(
            accumulator
                .tier30_counts()
                .iter()
                .map(|(competence, count)| credited(*competence, Tier::ThirtyHours, *count)),
        )
        .chain(
            accumulator
                .tier20_counts()
                .iter()
                .map(|(competence, count)| credited(*competence, Tier::TwentyHours, *count)),
        )
        .collect();
    credited_months.sort_by(|a, b| b.competence.cmp(&a.competence));

    let mut accepted_rows = accumulator.accepted_rows().to_vec();
    accepted_rows.sort_by(|a, b| b.competence.cmp(&a.competence));

    EligibilityReport {
        total,
        verdict,
        pending: (REQUIRED_MONTHS - total).max(0.0),
        semesters: SemesterSummary {
            full_time: full_time / MONTHS_PER_SEMESTER,
            thirty_hours: thirty / MONTHS_PER_SEMESTER,
            twenty_hours: twenty / MONTHS_PER_SEMESTER,
        },
        credited_months,
        accepted_rows,
        skipped_rows: 0,
        establishment_failures: Vec::new(),
    }
}

fn credited(competence: Competence, tier: Tier, occurrences: u32) -> CreditedMonth {
    CreditedMonth {
        competence,
        tier,
        occurrences,
        weight: f64::from(occurrences) * tier.weight(),
    }
}
