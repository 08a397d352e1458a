//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::{AppConfig, CliError};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tumbuh_core::{
    AgePolicy, ChildMeasurement, ClassRecap, ClassificationPolicy, ClassificationResult, CsvStore,
    EvaluationRecord, Evaluator, GrowthReference, HeightThresholdTable, Indicator, MedianSdTable,
    OverallStatus, ResultStore, Sex, Strategy, calculate_age, centile_value,
    classify_height_for_age, classify_weight_for_age, indicator_z_score, recap_by_class,
};

/// Print a JSON value the way every command does in `--json-mode`.
fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn reference_dir<'a>(config: &'a AppConfig, flag: Option<&'a Path>) -> &'a Path {
    flag.unwrap_or(config.reference_dir.as_path())
}

// =============================================================================
// EVALUATE COMMAND
// =============================================================================

/// Everything `evaluate` needs beyond the configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluateRequest {
    pub name: String,
    pub sex: Sex,
    pub birth_date: NaiveDate,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub school_class: Option<u8>,
    pub today: NaiveDate,
    /// Overrides `policy` from the configuration.
    pub policy: Option<ClassificationPolicy>,
    /// Overrides `age_policy` from the configuration.
    pub age_policy: Option<AgePolicy>,
    /// Overrides `reference_dir` from the configuration.
    pub reference_dir: Option<PathBuf>,
    /// Overrides `result_log` from the configuration.
    pub log: Option<PathBuf>,
}

impl EvaluateRequest {
    /// The measurement under evaluation.
    #[must_use]
    pub fn measurement(&self) -> ChildMeasurement {
        ChildMeasurement {
            name: self.name.clone(),
            sex: self.sex,
            birth_date: self.birth_date,
            height_cm: self.height_cm,
            weight_kg: self.weight_kg,
            school_class: self.school_class,
        }
    }
}

/// Classify one child under the effective policy.
///
/// Returns the result so callers other than the CLI can reuse it.
pub fn run_evaluation(
    config: &AppConfig,
    request: &EvaluateRequest,
) -> Result<ClassificationResult, CliError> {
    let policy = request.policy.unwrap_or(config.policy);
    let mut options = config.evaluation_options();
    if let Some(age_policy) = request.age_policy {
        options.age_policy = age_policy;
    }

    // Reject bad input before any reference file is read.
    let measurement = request.measurement();
    options.bounds.validate()?;
    measurement.validate(&options.bounds, request.today)?;

    let reference: GrowthReference;
    let thresholds: HeightThresholdTable;
    let median_sd: MedianSdTable;
    let strategy = match policy {
        ClassificationPolicy::Lms => {
            let dir = reference_dir(config, request.reference_dir.as_deref());
            reference = GrowthReference::load_dir(dir)?;
            Strategy::Lms(&reference)
        }
        ClassificationPolicy::HeightThreshold => {
            thresholds = config.height_threshold_table()?;
            Strategy::HeightThreshold(&thresholds)
        }
        ClassificationPolicy::MedianSd => {
            median_sd = config.median_sd_table()?;
            Strategy::MedianSd(&median_sd)
        }
    };

    tracing::debug!(
        "Evaluating {:?} with policy {} ({:?} age)",
        measurement.name,
        policy,
        options.age_policy
    );

    let result = Evaluator::new(strategy, options).evaluate(&measurement, request.today)?;

    if let Some(log) = request.log.as_ref().or(config.result_log.as_ref()) {
        let store = CsvStore::open(log)?;
        store.append(&EvaluationRecord::new(&measurement, &result, request.today))?;
        tracing::info!("Appended result to {}", log.display());
    }

    Ok(result)
}

/// JSON rendering of one evaluation.
#[must_use]
pub fn evaluation_json(
    measurement: &ChildMeasurement,
    result: &ClassificationResult,
) -> serde_json::Value {
    serde_json::json!({
        "name": measurement.name,
        "sex": measurement.sex,
        "school_class": measurement.school_class,
        "policy": result.policy,
        "age": {
            "years": result.age.years,
            "months": result.age.months,
            "days": result.age.days,
            "total_months": result.age_months
        },
        "height_cm": measurement.height_cm,
        "weight_kg": measurement.weight_kg,
        "height_z": result.height_z,
        "weight_z": result.weight_z,
        "height_status": result.height_status.map(|s| s.label()),
        "weight_status": result.weight_status.map(|s| s.label()),
        "overall": {
            "status": result.overall,
            "label": result.overall.label(),
            "color": result.overall.color(),
            "advice": result.overall.advice()
        }
    })
}

/// Classify one child and print the result.
pub fn cmd_evaluate(
    config: &AppConfig,
    json_mode: bool,
    request: &EvaluateRequest,
) -> Result<(), CliError> {
    let result = run_evaluation(config, request)?;
    let measurement = request.measurement();

    if json_mode {
        print_json(&evaluation_json(&measurement, &result));
        return Ok(());
    }

    println!("Tumbuh Evaluation");
    println!("=================");
    if !measurement.name.is_empty() {
        println!("Name:    {}", measurement.name);
    }
    println!("Sex:     {}", measurement.sex);
    if let Some(class) = measurement.school_class {
        println!("Class:   {}", class);
    }
    println!("Age:     {} ({} months)", result.age, result.age_months);
    println!("Policy:  {}", result.policy);
    println!();

    match (result.height_z, result.height_status) {
        (Some(z), Some(status)) => println!("Height-for-age: Z = {:.2} -> {}", z, status.label()),
        (None, Some(status)) => println!("Height-for-age: {}", status.label()),
        _ => println!("Height-for-age: unavailable"),
    }
    match (result.weight_z, result.weight_status) {
        (Some(z), Some(status)) => println!("Weight-for-age: Z = {:.2} -> {}", z, status.label()),
        _ => println!("Weight-for-age: unavailable"),
    }

    println!();
    println!("Overall: {} [{}]", result.overall.label(), result.overall.color());
    if let Some(advice) = result.overall.advice() {
        println!("Advice:  {}", advice);
    }

    Ok(())
}

// =============================================================================
// AGE COMMAND
// =============================================================================

/// Compute and print an age.
pub fn cmd_age(
    config: &AppConfig,
    json_mode: bool,
    birth_date: NaiveDate,
    today: NaiveDate,
    age_policy: Option<AgePolicy>,
) -> Result<(), CliError> {
    let policy = age_policy.unwrap_or(config.age_policy);
    let age = calculate_age(birth_date, today, policy)?;

    if json_mode {
        print_json(&serde_json::json!({
            "birth_date": birth_date,
            "today": today,
            "age_policy": policy,
            "years": age.years,
            "months": age.months,
            "days": age.days,
            "total_months": age.total_months
        }));
        return Ok(());
    }

    println!("Age: {}", age);
    println!("Total months: {}", age.total_months);
    Ok(())
}

// =============================================================================
// ZSCORE COMMAND
// =============================================================================

/// Compute one Z-score against the reference tables.
#[allow(clippy::too_many_arguments)]
pub fn cmd_zscore(
    config: &AppConfig,
    json_mode: bool,
    sex: Sex,
    indicator: Indicator,
    months: u32,
    value: f64,
    reference_dir_flag: Option<&Path>,
) -> Result<(), CliError> {
    let reference = GrowthReference::load_dir(reference_dir(config, reference_dir_flag))?;
    let table = reference.table(sex, indicator)?;
    let row = table.lookup_within(months, config.lookup.max_distance_months)?;

    let z = indicator_z_score(indicator, value, row, config.lms.weight_tail_adjustment)?;
    let status = match indicator {
        Indicator::HeightForAge => classify_height_for_age(z).label(),
        Indicator::WeightForAge => classify_weight_for_age(z).label(),
    };
    let curves: Vec<(i32, Option<f64>)> = (-3..=3)
        .map(|sd| (sd, centile_value(row, f64::from(sd))))
        .collect();

    if json_mode {
        print_json(&serde_json::json!({
            "sex": sex,
            "indicator": indicator,
            "age_months": months,
            "row_months": row.age_months,
            "l": row.l,
            "m": row.m,
            "s": row.s,
            "value": value,
            "z": z,
            "status": status,
            "sd_curves": curves
                .iter()
                .map(|(sd, v)| serde_json::json!({ "sd": sd, "value": v }))
                .collect::<Vec<_>>()
        }));
        return Ok(());
    }

    println!("{} {} at {} months", sex, indicator, months);
    println!(
        "Reference row: month {} (L={}, M={}, S={})",
        row.age_months, row.l, row.m, row.s
    );
    println!("Value: {}  Z = {:.2} -> {}", value, z, status);
    println!();
    println!("SD curves:");
    for (sd, v) in curves {
        match v {
            Some(v) => println!("  {:+} SD: {:.1}", sd, v),
            None => println!("  {:+} SD: undefined", sd),
        }
    }

    Ok(())
}

// =============================================================================
// TABLES COMMAND
// =============================================================================

/// Show the reference data available to each policy.
pub fn cmd_tables(
    config: &AppConfig,
    json_mode: bool,
    reference_dir_flag: Option<&Path>,
) -> Result<(), CliError> {
    let dir = reference_dir(config, reference_dir_flag);
    let reference = GrowthReference::load_dir(dir)?;
    let thresholds = config.height_threshold_table()?;
    let median_sd = config.median_sd_table()?;

    if json_mode {
        let lms: Vec<serde_json::Value> = reference
            .tables()
            .map(|(sex, indicator, table)| {
                let (first, last) = table.age_range();
                serde_json::json!({
                    "sex": sex,
                    "indicator": indicator,
                    "file": GrowthReference::file_name(sex, indicator),
                    "rows": table.len(),
                    "first_month": first,
                    "last_month": last
                })
            })
            .collect();
        print_json(&serde_json::json!({
            "reference_dir": dir.to_string_lossy(),
            "complete": reference.is_complete(),
            "lms": lms,
            "height_thresholds": thresholds.bands(),
            "median_sd": median_sd.rows()
        }));
        return Ok(());
    }

    println!("Reference Tables");
    println!("================");
    println!("Directory: {}", dir.display());
    println!();
    for (sex, indicator, table) in reference.tables() {
        let (first, last) = table.age_range();
        println!(
            "  {:<14} {:<6}  {:>4} rows  months {}..={}",
            indicator.name(),
            sex.code(),
            table.len(),
            first,
            last
        );
    }
    if !reference.is_complete() {
        println!();
        println!("Warning: {} of 4 LMS tables loaded", reference.table_count());
    }

    println!();
    println!("Height thresholds:");
    for band in thresholds.bands() {
        println!(
            "  from {:>2} years: < {:.1} cm",
            band.age_lower_bound, band.threshold_cm
        );
    }

    println!();
    println!("Median / SD:");
    for row in median_sd.rows() {
        println!(
            "  {:>2} years: median {:.1} cm, SD {:.1} cm",
            row.age_years, row.median_cm, row.sd_cm
        );
    }

    Ok(())
}

// =============================================================================
// RECAP COMMAND
// =============================================================================

/// JSON rendering of a recap.
#[must_use]
pub fn recap_json(recap: &ClassRecap) -> serde_json::Value {
    let classes: Vec<serde_json::Value> = recap
        .iter()
        .map(|(class, counts)| {
            let counts: serde_json::Map<String, serde_json::Value> = counts
                .iter()
                .map(|(status, n)| (status_key(*status), serde_json::json!(n)))
                .collect();
            serde_json::json!({
                "school_class": class,
                "total": counts.values().filter_map(serde_json::Value::as_u64).sum::<u64>(),
                "counts": counts
            })
        })
        .collect();
    serde_json::json!({ "classes": classes })
}

fn status_key(status: OverallStatus) -> String {
    serde_json::to_value(status)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| status.label().to_string())
}

/// Summarize a result log per school class.
pub fn cmd_recap(
    config: &AppConfig,
    json_mode: bool,
    log_flag: Option<&Path>,
) -> Result<(), CliError> {
    let log = log_flag
        .or(config.result_log.as_deref())
        .ok_or_else(|| CliError::Config("no result log given (use --log or result_log)".to_string()))?;

    let records = CsvStore::read_path(log)?;
    let recap = recap_by_class(&records);

    if json_mode {
        print_json(&recap_json(&recap));
        return Ok(());
    }

    println!("Recap of {} ({} records)", log.display(), records.len());
    println!();
    for (class, counts) in &recap {
        match class {
            Some(class) => println!("Class {}:", class),
            None => println!("No class:"),
        }
        for (status, n) in counts {
            println!("  {:<24} {}", status.label(), n);
        }
    }

    Ok(())
}

// =============================================================================
// CONFIG COMMAND
// =============================================================================

/// Print the effective configuration.
pub fn cmd_config(config: &AppConfig, json_mode: bool) -> Result<(), CliError> {
    if json_mode {
        let value = serde_json::to_value(config)
            .map_err(|e| CliError::Config(format!("render configuration: {}", e)))?;
        print_json(&value);
        return Ok(());
    }

    print!("{}", config.to_toml_string()?);
    Ok(())
}
