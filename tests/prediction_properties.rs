//! Property-based tests for single-record inference.
//!
//! One small forest is trained once and shared across cases.

mod common;

use proptest::prelude::*;
use sleep_quality::data::{FieldValue, RawRecord};
use sleep_quality::prelude::*;
use std::sync::OnceLock;

fn predictor() -> &'static Predictor {
    static PREDICTOR: OnceLock<Predictor> = OnceLock::new();
    PREDICTOR.get_or_init(|| {
        let outcome = Trainer::new(TrainConfig::default().with_n_estimators(25))
            .fit_dataset(common::synthetic_dataset(200, 42))
            .expect("training succeeds");
        Predictor::from_parts(outcome.pipeline, outcome.metadata).expect("consistent parts")
    })
}

fn category() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
        Just(FieldValue::Null),
        Just(FieldValue::from("Nurse")),
        Just(FieldValue::from("Engineer")),
        Just(FieldValue::from("Astronaut")),
        "[A-Za-z ]{0,12}".prop_map(FieldValue::from),
    ]
}

fn record_strategy() -> impl Strategy<Value = Vec<(&'static str, FieldValue)>> {
    (
        prop::option::of(3.0f64..10.0),
        prop::option::of(1.0f64..10.0),
        prop::option::of(0.0f64..100.0),
        prop::option::of(18.0f64..80.0),
        prop::option::of(50.0f64..100.0),
        prop::option::of(1000.0f64..12000.0),
        category(),
        category(),
    )
        .prop_map(
            |(duration, stress, activity, age, heart, steps, occupation, disorder)| {
                vec![
                    ("sleep_duration", FieldValue::from(duration)),
                    ("stress_level", FieldValue::from(stress)),
                    ("physical_activity_level", FieldValue::from(activity)),
                    ("age", FieldValue::from(age)),
                    ("heart_rate", FieldValue::from(heart)),
                    ("daily_steps", FieldValue::from(steps)),
                    ("occupation", occupation),
                    ("sleep_disorder", disorder),
                ]
            },
        )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn probability_is_in_unit_interval(fields in record_strategy(), threshold in 0.0f64..=100.0) {
        let record: RawRecord = fields.into_iter().collect();
        let prediction = predictor().predict(&record, threshold).expect("predict");
        prop_assert!((0.0..=1.0).contains(&prediction.probability));
    }

    #[test]
    fn label_follows_threshold_rule(fields in record_strategy(), threshold in 0.0f64..=100.0) {
        let record: RawRecord = fields.into_iter().collect();
        let prediction = predictor().predict(&record, threshold).expect("predict");
        let expected = if prediction.probability * 100.0 >= threshold {
            Label::Good
        } else {
            Label::Poor
        };
        prop_assert_eq!(prediction.label, expected);
    }

    #[test]
    fn prediction_is_idempotent(fields in record_strategy()) {
        let record: RawRecord = fields.into_iter().collect();
        let first = predictor().predict(&record, 50.0).expect("predict");
        let second = predictor().predict(&record, 50.0).expect("predict");
        prop_assert_eq!(first, second);
    }

    #[test]
    fn field_order_is_irrelevant(fields in record_strategy()) {
        let forward: RawRecord = fields.clone().into_iter().collect();
        let reversed: RawRecord = fields.into_iter().rev().collect();
        prop_assert_eq!(
            predictor().probability(&forward).expect("p"),
            predictor().probability(&reversed).expect("p")
        );
    }

    #[test]
    fn dropping_any_field_still_predicts(fields in record_strategy(), drop in 0usize..8) {
        let mut record: RawRecord = fields.into_iter().collect();
        let name = record_field_names()[drop];
        record.remove(name);
        let prediction = predictor().predict(&record, 50.0).expect("predict");
        prop_assert!((0.0..=1.0).contains(&prediction.probability));
    }

    #[test]
    fn raising_threshold_never_upgrades(fields in record_strategy(), low in 0.0f64..=100.0, high in 0.0f64..=100.0) {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        let record: RawRecord = fields.into_iter().collect();
        let at_low = predictor().predict(&record, low).expect("predict");
        let at_high = predictor().predict(&record, high).expect("predict");
        prop_assert!(!(at_low.label == Label::Poor && at_high.label == Label::Good));
    }

    #[test]
    fn unseen_category_matches_missing(fields in record_strategy()) {
        let mut unseen: RawRecord = fields.into_iter().collect();
        let mut missing = unseen.clone();
        unseen.insert("occupation", "Lighthouse Keeper");
        missing.remove("occupation");
        prop_assert_eq!(
            predictor().probability(&unseen).expect("p"),
            predictor().probability(&missing).expect("p")
        );
    }
}

fn record_field_names() -> [&'static str; 8] {
    [
        "sleep_duration",
        "stress_level",
        "physical_activity_level",
        "age",
        "heart_rate",
        "daily_steps",
        "occupation",
        "sleep_disorder",
    ]
}

#[test]
fn importances_are_a_distribution_over_names() {
    let p = predictor();
    let ImportanceReport::Available(all) = p.top_features(usize::MAX) else {
        panic!("forest exposes importances");
    };
    assert_eq!(all.len(), p.metadata().feature_names.len());
    assert!(all.iter().all(|f| f.importance >= 0.0));
    let total: f32 = all.iter().map(|f| f.importance).sum();
    assert!((total - 1.0).abs() < 1e-3);
    assert!(all.windows(2).all(|w| w[0].importance >= w[1].importance));
}
