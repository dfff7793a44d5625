//! Daily eligibility gate.
//!
//! The gate is derived state: it is recomputed on every request from the
//! stored last-sent date and "today", so no reset job exists. Crossing the
//! local date boundary turns Blocked back into Eligible.

use chrono::NaiveDate;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    Blocked,
}

impl Eligibility {
    pub fn is_eligible(self) -> bool {
        matches!(self, Eligibility::Eligible)
    }
}

/// Decide eligibility from the raw stored value (ISO `YYYY-MM-DD`).
///
/// No record and an unparseable record both mean Eligible; a corrupt row must
/// never lock a user out.
pub fn evaluate(stored: Option<&str>, today: NaiveDate) -> Eligibility {
    let Some(raw) = stored else {
        return Eligibility::Eligible;
    };
    match parse_stored_date(raw) {
        Some(last) if last >= today => Eligibility::Blocked,
        _ => Eligibility::Eligible,
    }
}

pub fn parse_stored_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

pub fn format_stored_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
