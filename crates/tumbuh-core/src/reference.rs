//! # Reference Tables
//!
//! LMS growth reference data and nearest-row lookup.
//!
//! - One `ReferenceTable` per `(Sex, Indicator)` pair
//! - Rows are sorted by `age_months` and unique per table
//! - Tables are immutable once built; lookups are pure
//!
//! ## Lookup Rule
//!
//! An exact `age_months` match wins. Otherwise the row with the smallest
//! absolute distance is returned, ties going to the lower `age_months`.

use crate::{GrowthError, Indicator, Sex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

// =============================================================================
// REFERENCE ROW
// =============================================================================

/// One row of an LMS reference table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthReferenceRow {
    /// Age in completed months; the lookup key.
    pub age_months: u32,
    /// Box-Cox power (skewness).
    pub l: f64,
    /// Median.
    pub m: f64,
    /// Coefficient of variation.
    pub s: f64,
}

impl GrowthReferenceRow {
    /// Create a validated row.
    ///
    /// Returns `GrowthError::InvalidInput` unless `l` is finite and
    /// `m`, `s` are finite and positive.
    pub fn new(age_months: u32, l: f64, m: f64, s: f64) -> Result<Self, GrowthError> {
        if !l.is_finite() || !m.is_finite() || !s.is_finite() {
            return Err(GrowthError::InvalidInput(format!(
                "non-finite LMS parameters at month {}",
                age_months
            )));
        }
        if m <= 0.0 || s <= 0.0 {
            return Err(GrowthError::InvalidInput(format!(
                "M and S must be positive at month {} (M={}, S={})",
                age_months, m, s
            )));
        }
        Ok(Self { age_months, l, m, s })
    }
}

/// Row layout of the reference CSV files (`Month,L,M,S`).
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Month", alias = "month", alias = "Age", alias = "age")]
    month: u32,
    #[serde(rename = "L", alias = "l")]
    l: f64,
    #[serde(rename = "M", alias = "m")]
    m: f64,
    #[serde(rename = "S", alias = "s")]
    s: f64,
}

// =============================================================================
// LOOKUP
// =============================================================================

/// Select the row for `age_months` from `rows`.
///
/// Exact match first; otherwise the minimum absolute distance, ties broken
/// toward the lower `age_months`. The result does not depend on the order
/// of `rows`.
///
/// Returns `GrowthError::ReferenceDataMissing` if `rows` is empty.
pub fn nearest_row(
    rows: &[GrowthReferenceRow],
    age_months: u32,
) -> Result<&GrowthReferenceRow, GrowthError> {
    if let Some(exact) = rows.iter().find(|r| r.age_months == age_months) {
        return Ok(exact);
    }

    rows.iter()
        .min_by_key(|r| (r.age_months.abs_diff(age_months), r.age_months))
        .ok_or_else(|| GrowthError::ReferenceDataMissing("reference table is empty".to_string()))
}

// =============================================================================
// REFERENCE TABLE
// =============================================================================

/// An immutable, sorted, non-empty sequence of reference rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceTable {
    rows: Vec<GrowthReferenceRow>,
}

impl ReferenceTable {
    /// Build a table from rows in any order.
    ///
    /// # Errors
    /// - `ReferenceDataMissing` if `rows` is empty
    /// - `InvalidInput` if two rows share an `age_months`
    pub fn new(mut rows: Vec<GrowthReferenceRow>) -> Result<Self, GrowthError> {
        if rows.is_empty() {
            return Err(GrowthError::ReferenceDataMissing(
                "reference table has no rows".to_string(),
            ));
        }

        rows.sort_by_key(|r| r.age_months);
        if let Some(pair) = rows.windows(2).find(|w| w[0].age_months == w[1].age_months) {
            return Err(GrowthError::InvalidInput(format!(
                "duplicate reference row for month {}",
                pair[0].age_months
            )));
        }

        Ok(Self { rows })
    }

    /// Parse a `Month,L,M,S` CSV document. Extra columns are ignored.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, GrowthError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rows = Vec::new();
        for (index, record) in csv_reader.deserialize::<CsvRow>().enumerate() {
            let raw = record.map_err(|e| {
                GrowthError::Serialization(format!("reference row {}: {}", index + 1, e))
            })?;
            rows.push(GrowthReferenceRow::new(raw.month, raw.l, raw.m, raw.s)?);
        }

        Self::new(rows)
    }

    /// Load a table from a CSV file.
    pub fn from_csv_path(path: &Path) -> Result<Self, GrowthError> {
        let file = std::fs::File::open(path)
            .map_err(|e| GrowthError::Io(format!("open {}: {}", path.display(), e)))?;
        Self::from_csv_reader(file).map_err(|e| match e {
            GrowthError::ReferenceDataMissing(_) => {
                GrowthError::ReferenceDataMissing(format!("{} has no rows", path.display()))
            }
            other => other,
        })
    }

    /// Rows in ascending `age_months` order.
    #[must_use]
    pub fn rows(&self) -> &[GrowthReferenceRow] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Always false; a table cannot be built empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First and last `age_months` covered by the table.
    #[must_use]
    pub fn age_range(&self) -> (u32, u32) {
        let first = self.rows.first().map_or(0, |r| r.age_months);
        let last = self.rows.last().map_or(0, |r| r.age_months);
        (first, last)
    }

    /// Nearest-row lookup (see [`nearest_row`]).
    pub fn lookup(&self, age_months: u32) -> Result<&GrowthReferenceRow, GrowthError> {
        if let Ok(index) = self.rows.binary_search_by_key(&age_months, |r| r.age_months) {
            return Ok(&self.rows[index]);
        }
        nearest_row(&self.rows, age_months)
    }

    /// Nearest-row lookup that refuses rows more than `max_distance` months
    /// away from the query.
    ///
    /// Returns `GrowthError::LookupUnresolved` when the nearest row is too far.
    pub fn lookup_within(
        &self,
        age_months: u32,
        max_distance: Option<u32>,
    ) -> Result<&GrowthReferenceRow, GrowthError> {
        let row = self.lookup(age_months)?;
        match max_distance {
            Some(limit) if row.age_months.abs_diff(age_months) > limit => {
                Err(GrowthError::LookupUnresolved { age_months })
            }
            _ => Ok(row),
        }
    }
}

// =============================================================================
// GROWTH REFERENCE (ALL TABLES)
// =============================================================================

/// The full reference set, keyed explicitly by `(Sex, Indicator)`.
#[derive(Debug, Clone, Default)]
pub struct GrowthReference {
    tables: BTreeMap<(Sex, Indicator), ReferenceTable>,
}

impl GrowthReference {
    /// Create an empty reference set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the table for `(sex, indicator)`.
    #[must_use]
    pub fn with_table(mut self, sex: Sex, indicator: Indicator, table: ReferenceTable) -> Self {
        self.tables.insert((sex, indicator), table);
        self
    }

    /// The table for `(sex, indicator)`.
    ///
    /// Returns `GrowthError::ReferenceDataMissing` if it was never loaded.
    pub fn table(&self, sex: Sex, indicator: Indicator) -> Result<&ReferenceTable, GrowthError> {
        self.tables.get(&(sex, indicator)).ok_or_else(|| {
            GrowthError::ReferenceDataMissing(format!("no {} table for {}", indicator, sex))
        })
    }

    /// True when all four `(sex, indicator)` tables are present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        [Sex::Male, Sex::Female]
            .iter()
            .all(|sex| Indicator::ALL.iter().all(|ind| self.tables.contains_key(&(*sex, *ind))))
    }

    /// Number of loaded tables.
    #[must_use]
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Iterate over loaded tables in key order.
    pub fn tables(&self) -> impl Iterator<Item = (Sex, Indicator, &ReferenceTable)> {
        self.tables.iter().map(|((sex, ind), t)| (*sex, *ind, t))
    }

    /// File name of the table for `(sex, indicator)` inside a reference
    /// directory, e.g. `hfa_male.csv`.
    #[must_use]
    pub fn file_name(sex: Sex, indicator: Indicator) -> String {
        format!("{}_{}.csv", indicator.code(), sex.code())
    }

    /// Load every table present in `dir`.
    ///
    /// Missing files are skipped (the corresponding lookups later fail with
    /// `ReferenceDataMissing`). A directory with no tables at all is an error.
    pub fn load_dir(dir: &Path) -> Result<Self, GrowthError> {
        if !dir.is_dir() {
            return Err(GrowthError::ReferenceDataMissing(format!(
                "reference directory '{}' does not exist",
                dir.display()
            )));
        }

        let mut reference = Self::new();
        for sex in [Sex::Male, Sex::Female] {
            for indicator in Indicator::ALL {
                let path = dir.join(Self::file_name(sex, indicator));
                if !path.is_file() {
                    tracing::warn!("Reference table {} not found", path.display());
                    continue;
                }
                let table = ReferenceTable::from_csv_path(&path)?;
                let (first, last) = table.age_range();
                tracing::debug!(
                    "Loaded {} {} table: {} rows, months {}..={}",
                    sex,
                    indicator,
                    table.len(),
                    first,
                    last
                );
                reference = reference.with_table(sex, indicator, table);
            }
        }

        if reference.table_count() == 0 {
            return Err(GrowthError::ReferenceDataMissing(format!(
                "no reference tables found in '{}'",
                dir.display()
            )));
        }

        Ok(reference)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn row(age: u32, m: f64) -> GrowthReferenceRow {
        GrowthReferenceRow::new(age, 1.0, m, 0.05).expect("row")
    }

    fn table_24_30_36() -> ReferenceTable {
        ReferenceTable::new(vec![row(36, 96.0), row(24, 87.0), row(30, 92.0)]).expect("table")
    }

    #[test]
    fn rows_are_sorted() {
        let table = table_24_30_36();
        let ages: Vec<u32> = table.rows().iter().map(|r| r.age_months).collect();
        assert_eq!(ages, vec![24, 30, 36]);
        assert_eq!(table.age_range(), (24, 36));
    }

    #[test]
    fn exact_match() {
        let table = table_24_30_36();
        assert_eq!(table.lookup(30).expect("lookup").age_months, 30);
    }

    #[test]
    fn tie_goes_to_lower_month() {
        let table = table_24_30_36();
        assert_eq!(table.lookup(33).expect("lookup").age_months, 30);
        assert_eq!(table.lookup(27).expect("lookup").age_months, 24);
    }

    #[test]
    fn nearest_outside_range() {
        let table = table_24_30_36();
        assert_eq!(table.lookup(0).expect("lookup").age_months, 24);
        assert_eq!(table.lookup(500).expect("lookup").age_months, 36);
    }

    #[test]
    fn slice_lookup_ignores_order() {
        let rows = [row(36, 96.0), row(30, 92.0), row(24, 87.0)];
        assert_eq!(nearest_row(&rows, 33).expect("lookup").age_months, 30);
    }

    #[test]
    fn empty_slice_is_missing_data() {
        assert!(matches!(
            nearest_row(&[], 12),
            Err(GrowthError::ReferenceDataMissing(_))
        ));
    }

    #[test]
    fn empty_table_rejected() {
        assert!(matches!(
            ReferenceTable::new(Vec::new()),
            Err(GrowthError::ReferenceDataMissing(_))
        ));
    }

    #[test]
    fn duplicate_month_rejected() {
        let result = ReferenceTable::new(vec![row(24, 87.0), row(24, 88.0)]);
        assert!(matches!(result, Err(GrowthError::InvalidInput(_))));
    }

    #[test]
    fn lookup_within_distance() {
        let table = table_24_30_36();
        assert_eq!(table.lookup_within(38, Some(2)).expect("lookup").age_months, 36);
        assert!(matches!(
            table.lookup_within(40, Some(2)),
            Err(GrowthError::LookupUnresolved { age_months: 40 })
        ));
        assert!(table.lookup_within(400, None).is_ok());
    }

    #[test]
    fn invalid_parameters_rejected() {
        assert!(GrowthReferenceRow::new(12, 1.0, 0.0, 0.05).is_err());
        assert!(GrowthReferenceRow::new(12, 1.0, 80.0, -0.1).is_err());
        assert!(GrowthReferenceRow::new(12, f64::NAN, 80.0, 0.05).is_err());
    }

    #[test]
    fn csv_parsing_with_extra_columns() {
        let data = "Month,L,M,S,SD2neg\n61,1,110.2647,0.04164,101.1\n62, 1, 110.8006, 0.04172, 101.5\n";
        let table = ReferenceTable::from_csv_reader(data.as_bytes()).expect("parse");
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1].m, 110.8006);
    }

    #[test]
    fn csv_header_only_is_missing_data() {
        let result = ReferenceTable::from_csv_reader("Month,L,M,S\n".as_bytes());
        assert!(matches!(result, Err(GrowthError::ReferenceDataMissing(_))));
    }

    #[test]
    fn csv_bad_row_reports_serialization_error() {
        let result = ReferenceTable::from_csv_reader("Month,L,M,S\nabc,1,2,3\n".as_bytes());
        assert!(matches!(result, Err(GrowthError::Serialization(_))));
    }

    #[test]
    fn reference_keyed_by_sex_and_indicator() {
        let reference =
            GrowthReference::new().with_table(Sex::Male, Indicator::HeightForAge, table_24_30_36());
        assert!(reference.table(Sex::Male, Indicator::HeightForAge).is_ok());
        assert!(matches!(
            reference.table(Sex::Female, Indicator::HeightForAge),
            Err(GrowthError::ReferenceDataMissing(_))
        ));
        assert!(!reference.is_complete());
        assert_eq!(GrowthReference::file_name(Sex::Female, Indicator::WeightForAge), "wfa_female.csv");
    }
}
