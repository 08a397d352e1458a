//! # Age Calculator
//!
//! Elapsed age between a birth date and an evaluation date.
//!
//! Two arithmetic policies exist and are never mixed:
//!
//! | Policy | Years / months / days | Notes |
//! |--------|-----------------------|-------|
//! | `Calendar` | calendar subtraction, month lengths respected | exact |
//! | `DayCount` | `d/365`, `(d%365)/30`, `(d%365)%30` | approximation, drifts near month/year boundaries |
//!
//! `total_months` is the reference table lookup key: whole calendar months
//! under `Calendar`, whole 30-day months (`d / 30`) under `DayCount`.

use crate::GrowthError;
use crate::primitives::{DAY_COUNT_MONTH, DAY_COUNT_YEAR};
use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Arithmetic convention used to derive age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgePolicy {
    /// True calendar arithmetic.
    #[default]
    Calendar,
    /// Fixed 365-day years and 30-day months.
    DayCount,
}

impl FromStr for AgePolicy {
    type Err = GrowthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "calendar" => Ok(AgePolicy::Calendar),
            "day-count" | "daycount" | "days" => Ok(AgePolicy::DayCount),
            other => Err(GrowthError::InvalidInput(format!(
                "unknown age policy: '{}' (use calendar, day-count)",
                other
            ))),
        }
    }
}

/// Elapsed age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Age {
    pub years: u32,
    pub months: u32,
    pub days: u32,
    /// Whole elapsed months under the policy; the reference table lookup key.
    pub total_months: u32,
}

impl Age {
    /// Whole years as a lookup key for per-year tables.
    #[must_use]
    pub fn whole_years(&self) -> u32 {
        self.years
    }
}

impl fmt::Display for Age {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} years, {} months, {} days",
            self.years, self.months, self.days
        )
    }
}

/// Compute the age at `reference` of a child born on `birth`.
///
/// Returns `GrowthError::InvalidInput` if `birth` is after `reference`.
pub fn calculate_age(
    birth: NaiveDate,
    reference: NaiveDate,
    policy: AgePolicy,
) -> Result<Age, GrowthError> {
    if birth > reference {
        return Err(GrowthError::InvalidInput(format!(
            "birth date {} is after reference date {}",
            birth, reference
        )));
    }

    match policy {
        AgePolicy::Calendar => calendar_age(birth, reference),
        AgePolicy::DayCount => Ok(day_count_age(birth, reference)),
    }
}

/// Calendar age: whole months up to the last monthly anniversary on or
/// before `reference`, then the remaining days.
///
/// An anniversary that falls on a non-existent day (e.g. the 31st of a
/// 30-day month) is clamped to the last day of that month.
fn calendar_age(birth: NaiveDate, reference: NaiveDate) -> Result<Age, GrowthError> {
    let year_diff = i64::from(reference.year()) - i64::from(birth.year());
    let month_diff = i64::from(reference.month()) - i64::from(birth.month());
    let mut whole_months = year_diff * 12 + month_diff;

    let mut anniversary = add_months(birth, whole_months)?;
    if anniversary > reference {
        whole_months -= 1;
        anniversary = add_months(birth, whole_months)?;
    }

    let days = (reference - anniversary).num_days();
    let total_months = u32::try_from(whole_months)
        .map_err(|_| GrowthError::InvalidInput(format!("age of {} months", whole_months)))?;

    Ok(Age {
        years: total_months / 12,
        months: total_months % 12,
        days: days as u32,
        total_months,
    })
}

fn add_months(date: NaiveDate, months: i64) -> Result<NaiveDate, GrowthError> {
    let months = u32::try_from(months)
        .map_err(|_| GrowthError::InvalidInput(format!("month offset {} out of range", months)))?;
    date.checked_add_months(Months::new(months)).ok_or_else(|| {
        GrowthError::InvalidInput(format!("date {} + {} months overflows", date, months))
    })
}

fn day_count_age(birth: NaiveDate, reference: NaiveDate) -> Age {
    let elapsed = (reference - birth).num_days();
    let years = elapsed / DAY_COUNT_YEAR;
    let rest = elapsed % DAY_COUNT_YEAR;
    let months = rest / DAY_COUNT_MONTH;
    let days = rest % DAY_COUNT_MONTH;

    Age {
        years: years as u32,
        months: months as u32,
        days: days as u32,
        total_months: (elapsed / DAY_COUNT_MONTH) as u32,
    }
}

// =============================================================================
// TESTS
// =============================================================================
