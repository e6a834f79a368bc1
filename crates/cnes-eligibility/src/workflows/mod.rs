pub mod eligibility;
pub mod registry;
