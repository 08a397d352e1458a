//! # Classification Tier Tests (T0-T4)
//!
//! If ANY tier fails, classification results cannot be trusted.
//!
//! ## Tiers
//! - T0: Input Integrity
//! - T1: Age Arithmetic
//! - T2: Reference Lookup
//! - T3: LMS Transform and Bands
//! - T4: End-to-End Evaluation

use chrono::NaiveDate;
use tumbuh_core::{
    AgePolicy, ChildMeasurement, ClassificationPolicy, CsvStore, EvaluationOptions,
    EvaluationRecord, Evaluator, GrowthError, GrowthReference, GrowthReferenceRow, HeightStatus,
    Indicator, MeasurementBounds, MemoryStore, OverallStatus, ReferenceTable, ResultStore, Sex,
    Strategy, WeightStatus, calculate_age, classify_height_for_age, classify_weight_for_age,
    lms_z_score, nearest_row, recap_by_class,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn row(age: u32, l: f64, m: f64, s: f64) -> GrowthReferenceRow {
    GrowthReferenceRow::new(age, l, m, s).expect("row")
}

/// A small, smooth reference set for ages 60-180 months, both sexes.
fn reference() -> GrowthReference {
    let hfa = |offset: f64| {
        ReferenceTable::new(
            (60..=180)
                .map(|m| row(m, 1.0, 80.0 + offset + f64::from(m) * 0.45, 0.043))
                .collect(),
        )
        .expect("hfa")
    };
    let wfa = |offset: f64| {
        ReferenceTable::new(
            (60..=180)
                .map(|m| row(m, -0.35, 6.0 + offset + f64::from(m) * 0.17, 0.14))
                .collect(),
        )
        .expect("wfa")
    };
    GrowthReference::new()
        .with_table(Sex::Male, Indicator::HeightForAge, hfa(0.5))
        .with_table(Sex::Male, Indicator::WeightForAge, wfa(0.2))
        .with_table(Sex::Female, Indicator::HeightForAge, hfa(0.0))
        .with_table(Sex::Female, Indicator::WeightForAge, wfa(0.0))
}

// =============================================================================
// TIER T0: INPUT INTEGRITY
// =============================================================================

mod t0_input_integrity {
    use super::*;

    /// T0.1: A negative height fails before any table is consulted.
    #[test]
    fn negative_height_rejected_before_transform() {
        let empty = GrowthReference::new();
        let evaluator = Evaluator::new(Strategy::Lms(&empty), EvaluationOptions::default());
        let child = ChildMeasurement::new("A", Sex::Male, date(2016, 1, 1), -5.0, 20.0);

        let result = evaluator.evaluate(&child, date(2024, 1, 1));
        assert!(matches!(result, Err(GrowthError::InvalidInput(_))));
    }

    /// T0.2: A birth date in the future is rejected.
    #[test]
    fn future_birth_rejected() {
        let reference = reference();
        let evaluator = Evaluator::new(Strategy::Lms(&reference), EvaluationOptions::default());
        let child = ChildMeasurement::new("A", Sex::Male, date(2025, 1, 1), 120.0, 20.0);

        let result = evaluator.evaluate(&child, date(2024, 1, 1));
        assert!(matches!(result, Err(GrowthError::InvalidInput(_))));
    }

    /// T0.3: Custom bounds are honoured.
    #[test]
    fn custom_bounds_applied() {
        let reference = reference();
        let options = EvaluationOptions {
            bounds: MeasurementBounds {
                height_min_cm: 100.0,
                ..MeasurementBounds::default()
            },
            ..EvaluationOptions::default()
        };
        let evaluator = Evaluator::new(Strategy::Lms(&reference), options);
        let child = ChildMeasurement::new("A", Sex::Female, date(2016, 1, 1), 95.0, 20.0);

        assert!(matches!(
            evaluator.evaluate(&child, date(2024, 1, 1)),
            Err(GrowthError::InvalidInput(_))
        ));
    }

    /// T0.4: An empty table fails with ReferenceDataMissing, never a lookup.
    #[test]
    fn empty_table_is_missing_data() {
        assert!(matches!(
            ReferenceTable::new(Vec::new()),
            Err(GrowthError::ReferenceDataMissing(_))
        ));
        assert!(matches!(
            nearest_row(&[], 60),
            Err(GrowthError::ReferenceDataMissing(_))
        ));
    }
}

// =============================================================================
// TIER T1: AGE ARITHMETIC
// =============================================================================

mod t1_age_arithmetic {
    use super::*;

    /// T1.1: 2015-01-01 to 2024-06-15 is 9y 5m 14d, 113 months.
    #[test]
    fn calendar_reference_case() {
        let age = calculate_age(date(2015, 1, 1), date(2024, 6, 15), AgePolicy::Calendar)
            .expect("age");
        assert_eq!((age.years, age.months, age.days), (9, 5, 14));
        assert_eq!(age.total_months, 113);
    }

    /// T1.2: The day-count policy is an explicit, different convention.
    #[test]
    fn day_count_is_separate_policy() {
        let birth = date(2016, 2, 29);
        let today = date(2024, 2, 28);
        let calendar = calculate_age(birth, today, AgePolicy::Calendar).expect("calendar");
        let approx = calculate_age(birth, today, AgePolicy::DayCount).expect("approx");

        // One day short of the 8th birthday on the calendar.
        assert_eq!((calendar.years, calendar.months, calendar.days), (7, 11, 30));
        // 2921 days = 8 * 365 + 1 under the approximation.
        assert_eq!((approx.years, approx.months, approx.days), (8, 0, 1));
    }
}

// =============================================================================
// TIER T2: REFERENCE LOOKUP
// =============================================================================

mod t2_reference_lookup {
    use super::*;

    fn table() -> ReferenceTable {
        ReferenceTable::new(vec![
            row(24, 1.0, 87.0, 0.04),
            row(30, 1.0, 91.0, 0.04),
            row(36, 1.0, 95.0, 0.04),
        ])
        .expect("table")
    }

    /// T2.1: Equidistant neighbours resolve to the lower month.
    #[test]
    fn tie_breaks_low() {
        assert_eq!(table().lookup(33).expect("lookup").age_months, 30);
    }

    /// T2.2: An exact match is returned as is.
    #[test]
    fn exact_match_short_circuits() {
        let t = table();
        let found = t.lookup(30).expect("lookup");
        assert_eq!(*found, row(30, 1.0, 91.0, 0.04));
    }

    /// T2.3: Lookup is referentially transparent.
    #[test]
    fn lookup_repeatable() {
        let t = table();
        for query in 0..60 {
            assert_eq!(t.lookup(query).expect("a"), t.lookup(query).expect("b"));
        }
    }

    /// T2.4: A reference directory loads the tables it contains; the
    /// missing cohort fails only when it is looked up.
    #[test]
    fn load_dir_partial() {
        let dir = tempfile::tempdir().expect("tempdir");
        let csv = "Month,L,M,S\n60,1,110.0,0.04\n61,1,110.5,0.04\n";
        std::fs::write(dir.path().join("hfa_female.csv"), csv).expect("write");
        std::fs::write(dir.path().join("wfa_female.csv"), csv).expect("write");

        let reference = GrowthReference::load_dir(dir.path()).expect("load");
        assert_eq!(reference.table_count(), 2);
        assert!(!reference.is_complete());
        assert!(reference.table(Sex::Female, Indicator::HeightForAge).is_ok());
        assert!(matches!(
            reference.table(Sex::Male, Indicator::WeightForAge),
            Err(GrowthError::ReferenceDataMissing(_))
        ));

        let evaluator = Evaluator::new(Strategy::Lms(&reference), EvaluationOptions::default());
        let boy = ChildMeasurement::new("B", Sex::Male, date(2019, 1, 1), 110.0, 18.0);
        assert!(matches!(
            evaluator.evaluate(&boy, date(2024, 1, 15)),
            Err(GrowthError::ReferenceDataMissing(_))
        ));
    }

    /// T2.5: An empty directory is not a usable reference.
    #[test]
    fn load_dir_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            GrowthReference::load_dir(dir.path()),
            Err(GrowthError::ReferenceDataMissing(_))
        ));
    }
}

// =============================================================================
// TIER T3: LMS TRANSFORM AND BANDS
// =============================================================================

mod t3_transform_and_bands {
    use super::*;

    /// T3.1: Z(130) > Z(120) = 0 > Z(110) for L=1, M=120, S=0.05.
    #[test]
    fn lms_monotone_example() {
        let z = |x| lms_z_score(x, 1.0, 120.0, 0.05).expect("z");
        assert!(z(130.0) > z(120.0));
        assert_eq!(z(120.0), 0.0);
        assert!(z(120.0) > z(110.0));
    }

    /// T3.2: Height boundary at exactly -2 is Normal.
    #[test]
    fn height_boundary_exact() {
        assert_eq!(classify_height_for_age(-2.0), HeightStatus::Normal);
        assert_eq!(classify_height_for_age(-2.0001), HeightStatus::Stunting);
    }

    /// T3.3: Weight bands around +1 and +2.
    #[test]
    fn weight_band_coverage() {
        assert_eq!(classify_weight_for_age(1.0), WeightStatus::Normal);
        assert_eq!(classify_weight_for_age(1.0001), WeightStatus::OverweightRisk);
        assert_eq!(classify_weight_for_age(2.0), WeightStatus::OverweightRisk);
        assert_eq!(classify_weight_for_age(2.0001), WeightStatus::ObesityRisk);
    }
}

// =============================================================================
// TIER T4: END-TO-END EVALUATION
// =============================================================================

mod t4_end_to_end {
    use super::*;

    /// T4.1: The same child against the same tables gives identical results.
    #[test]
    fn round_trip_idempotent() {
        let reference = reference();
        let evaluator = Evaluator::new(Strategy::Lms(&reference), EvaluationOptions::default());
        let child = ChildMeasurement::new("Ani", Sex::Female, date(2015, 1, 1), 128.0, 24.0)
            .with_class(4);

        let a = evaluator.evaluate(&child, date(2024, 6, 15)).expect("a");
        let b = evaluator.evaluate(&child, date(2024, 6, 15)).expect("b");
        assert_eq!(a, b);
        assert_eq!(a.height_z.map(f64::to_bits), b.height_z.map(f64::to_bits));
    }

    /// T4.2: Female and male tables are kept apart.
    #[test]
    fn sex_selects_table() {
        let reference = reference();
        let evaluator = Evaluator::new(Strategy::Lms(&reference), EvaluationOptions::default());
        let girl = ChildMeasurement::new("G", Sex::Female, date(2015, 1, 1), 130.0, 25.0);
        let boy = ChildMeasurement {
            sex: Sex::Male,
            ..girl.clone()
        };

        let g = evaluator.evaluate(&girl, date(2024, 6, 15)).expect("girl");
        let b = evaluator.evaluate(&boy, date(2024, 6, 15)).expect("boy");
        assert!(g.height_z.expect("g") > b.height_z.expect("b"));
    }

    /// T4.3: Results serialize with stable, snake_case status names.
    #[test]
    fn result_serializes() {
        let reference = reference();
        let evaluator = Evaluator::new(Strategy::Lms(&reference), EvaluationOptions::default());
        let child = ChildMeasurement::new("Ani", Sex::Female, date(2015, 1, 1), 110.0, 25.0);

        let result = evaluator.evaluate(&child, date(2024, 6, 15)).expect("eval");
        let json = serde_json::to_value(&result).expect("json");
        assert_eq!(json["policy"], "lms");
        assert_eq!(json["overall"], "stunting_alert");
        assert_eq!(json["height_status"], "severe_stunting");
        assert_eq!(json["age"]["total_months"], 113);
    }

    /// T4.4: Results accumulate only in a caller-owned store.
    #[test]
    fn accumulation_is_explicit() {
        let reference = reference();
        let evaluator = Evaluator::new(Strategy::Lms(&reference), EvaluationOptions::default());
        let store = MemoryStore::new();
        let today = date(2024, 6, 15);

        for (name, height, class) in [("a", 130.0, 1), ("b", 110.0, 1), ("c", 131.0, 2)] {
            let child = ChildMeasurement::new(name, Sex::Female, date(2015, 1, 1), height, 25.0)
                .with_class(class);
            let result = evaluator.evaluate(&child, today).expect("eval");
            store
                .append(&EvaluationRecord::new(&child, &result, today))
                .expect("append");
        }

        let records = store.records().expect("records");
        assert_eq!(records.len(), 3);
        let recap = recap_by_class(&records);
        assert_eq!(recap[&Some(1)][&OverallStatus::StuntingAlert], 1);
        assert_eq!(recap[&Some(2)].values().sum::<usize>(), 1);
    }

    /// T4.5: Concurrent appends to a CSV log are all persisted.
    #[test]
    fn concurrent_csv_appends() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = CsvStore::open(&dir.path().join("log.csv")).expect("open");
        let reference = reference();
        let evaluator = Evaluator::new(Strategy::Lms(&reference), EvaluationOptions::default());
        let today = date(2024, 6, 15);

        std::thread::scope(|scope| {
            for t in 0..4u8 {
                let store = &store;
                let evaluator = &evaluator;
                scope.spawn(move || {
                    for i in 0..10 {
                        let child = ChildMeasurement::new(
                            format!("child-{}-{}", t, i),
                            Sex::Male,
                            date(2015, 1, 1),
                            120.0 + f64::from(i),
                            25.0,
                        )
                        .with_class(t + 1);
                        let result = evaluator.evaluate(&child, today).expect("eval");
                        store
                            .append(&EvaluationRecord::new(&child, &result, today))
                            .expect("append");
                    }
                });
            }
        });

        let records = store.records().expect("records");
        assert_eq!(records.len(), 40);
        assert!(records.iter().all(|r| r.policy == ClassificationPolicy::Lms));
    }
}
