//! # Result Store
//!
//! Append-only accumulation of evaluation records.
//!
//! The store is owned by the caller and passed explicitly; evaluation
//! itself never touches it. Appends are serialized through a `Mutex` so a
//! store may be shared between threads.
//!
//! Backends:
//! - `MemoryStore`: volatile, for a single session
//! - `CsvStore`: one CSV row per record, appended to a file

use crate::classify::OverallStatus;
use crate::evaluate::{ClassificationPolicy, ClassificationResult};
use crate::{ChildMeasurement, GrowthError, Sex};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

// =============================================================================
// RECORD
// =============================================================================

/// One logged evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub evaluated_on: NaiveDate,
    pub name: String,
    pub sex: Sex,
    pub school_class: Option<u8>,
    pub age: String,
    pub age_months: u32,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub policy: ClassificationPolicy,
    pub status: OverallStatus,
}

impl EvaluationRecord {
    /// Build a record from an evaluation and its input.
    #[must_use]
    pub fn new(
        measurement: &ChildMeasurement,
        result: &ClassificationResult,
        evaluated_on: NaiveDate,
    ) -> Self {
        Self {
            evaluated_on,
            name: measurement.name.clone(),
            sex: measurement.sex,
            school_class: measurement.school_class,
            age: result.age.to_string(),
            age_months: result.age_months,
            height_cm: measurement.height_cm,
            weight_kg: measurement.weight_kg,
            policy: result.policy,
            status: result.overall,
        }
    }
}

// =============================================================================
// STORE TRAIT
// =============================================================================

/// Append-only sink for evaluation records.
pub trait ResultStore: Send + Sync {
    /// Append one record.
    fn append(&self, record: &EvaluationRecord) -> Result<(), GrowthError>;

    /// All records, in append order.
    fn records(&self) -> Result<Vec<EvaluationRecord>, GrowthError>;
}

fn poisoned() -> GrowthError {
    GrowthError::Io("result store lock poisoned".to_string())
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// Volatile store; records live as long as the value.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<EvaluationRecord>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResultStore for MemoryStore {
    fn append(&self, record: &EvaluationRecord) -> Result<(), GrowthError> {
        self.records
            .lock()
            .map_err(|_| poisoned())?
            .push(record.clone());
        Ok(())
    }

    fn records(&self) -> Result<Vec<EvaluationRecord>, GrowthError> {
        Ok(self.records.lock().map_err(|_| poisoned())?.clone())
    }
}

// =============================================================================
// CSV STORE
// =============================================================================

/// File-backed store writing one CSV row per record.
///
/// The header row is written only when the file is new or empty.
pub struct CsvStore {
    path: PathBuf,
    writer: Mutex<csv::Writer<std::fs::File>>,
}

impl std::fmt::Debug for CsvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvStore").field("path", &self.path).finish()
    }
}

impl CsvStore {
    /// Open (or create) a log file for appending.
    pub fn open(path: &Path) -> Result<Self, GrowthError> {
        let needs_header = std::fs::metadata(path).map_or(true, |m| m.len() == 0);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| GrowthError::Io(format!("open {}: {}", path.display(), e)))?;

        let writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);

        tracing::debug!("Opened result log {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(writer),
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record from a log file without opening it for writing.
    pub fn read_path(path: &Path) -> Result<Vec<EvaluationRecord>, GrowthError> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| GrowthError::Io(format!("open {}: {}", path.display(), e)))?;

        reader
            .deserialize()
            .enumerate()
            .map(|(index, row)| {
                row.map_err(|e| {
                    GrowthError::Serialization(format!("log row {}: {}", index + 1, e))
                })
            })
            .collect()
    }
}

impl ResultStore for CsvStore {
    fn append(&self, record: &EvaluationRecord) -> Result<(), GrowthError> {
        let mut writer = self.writer.lock().map_err(|_| poisoned())?;
        writer
            .serialize(record)
            .map_err(|e| GrowthError::Serialization(format!("append record: {}", e)))?;
        writer
            .flush()
            .map_err(|e| GrowthError::Io(format!("flush {}: {}", self.path.display(), e)))
    }

    fn records(&self) -> Result<Vec<EvaluationRecord>, GrowthError> {
        // Hold the lock so no append interleaves with the read.
        let _guard = self.writer.lock().map_err(|_| poisoned())?;
        Self::read_path(&self.path)
    }
}

// =============================================================================
// RECAP
// =============================================================================

/// Record counts per school class and overall status.
///
/// Records without a class are grouped under `None`.
pub type ClassRecap = BTreeMap<Option<u8>, BTreeMap<OverallStatus, usize>>;

/// Count records per `(school_class, status)`.
#[must_use]
pub fn recap_by_class(records: &[EvaluationRecord]) -> ClassRecap {
    let mut recap = ClassRecap::new();
    for record in records {
        *recap
            .entry(record.school_class)
            .or_default()
            .entry(record.status)
            .or_insert(0) += 1;
    }
    recap
}

// =============================================================================
// TESTS
// =============================================================================
