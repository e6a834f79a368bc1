pub(crate) const FACILITY_CODE_WIDTH: usize = 7;

pub(crate) fn clean_header(value: &str) -> String {
    value
        .replace(['\u{feff}', '\u{200b}'], "")
        .trim()
        .to_string()
}

pub(crate) fn pad_facility_code(value: &str) -> String {
    format!("{:0>width$}", value.trim(), width = FACILITY_CODE_WIDTH)
}

/// Weekly hours as exported; a decimal comma is accepted.
pub(crate) fn parse_weekly_hours(value: &str) -> Option<f64> {
    let hours = value.trim().replace(',', ".").parse::<f64>().ok()?;
    (hours.is_finite() && hours >= 0.0).then_some(hours)
}
