//! Shared fixtures for integration tests.

#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sleep_quality::data::{Dataset, FieldValue, RawRecord};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

pub const HEADER: &str = "Person ID,Gender,Age,Occupation,Sleep Duration,Quality of Sleep,\
Physical Activity Level,Stress Level,BMI Category,Blood Pressure,Heart Rate,Daily Steps,Sleep Disorder";

const OCCUPATIONS: &[&str] = &[
    "Nurse",
    "Doctor",
    "Engineer",
    "Lawyer",
    "Teacher",
    "Accountant",
    "Sales Representative",
];

/// Synthetic Sleep-Health-shaped CSV with `n` rows.
///
/// Quality of sleep is 7-9 when duration >= 6.5 and stress <= 6, else 4-6.
/// Activity, heart rate and steps correlate with the outcome; gender, age,
/// occupation and BMI category are noise.
pub fn synthetic_csv(n: usize, seed: u64) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut csv = String::from(HEADER);
    csv.push('\n');
    for i in 0..n {
        let duration: f64 = rng.gen_range(4.5..9.0);
        let stress: u32 = rng.gen_range(1..=10);
        let good = duration >= 6.5 && stress <= 6;
        let quality: u32 = if good {
            rng.gen_range(7..=9)
        } else {
            rng.gen_range(4..=6)
        };
        let (activity, heart, steps): (u32, u32, u32) = if good {
            (
                rng.gen_range(45..=90),
                rng.gen_range(60..=72),
                rng.gen_range(6500..=10000),
            )
        } else {
            (
                rng.gen_range(20..=60),
                rng.gen_range(68..=86),
                rng.gen_range(3000..=7000),
            )
        };
        let gender = if rng.gen_bool(0.5) { "Male" } else { "Female" };
        let occupation = OCCUPATIONS[rng.gen_range(0..OCCUPATIONS.len())];
        let bmi = ["Normal", "Normal Weight", "Overweight", "Obese"][rng.gen_range(0..4)];
        let disorder = if good || rng.gen_bool(0.4) {
            "None"
        } else if rng.gen_bool(0.5) {
            "Insomnia"
        } else {
            "Sleep Apnea"
        };
        writeln!(
            csv,
            "{},{gender},{},{occupation},{duration:.1},{quality},{activity},{stress},{bmi},126/83,{heart},{steps},{disorder}",
            i + 1,
            rng.gen_range(27..=59)
        )
        .expect("write to string");
    }
    csv
}

pub fn synthetic_dataset(n: usize, seed: u64) -> Dataset {
    Dataset::from_reader(synthetic_csv(n, seed).as_bytes()).expect("synthetic csv parses")
}

pub fn write_synthetic(dir: &Path, n: usize, seed: u64) -> PathBuf {
    let path = dir.join("datasleep.csv");
    std::fs::write(&path, synthetic_csv(n, seed)).expect("write csv");
    path
}

/// Fully specified well-rested profile.
pub fn good_profile() -> RawRecord {
    [
        ("gender", FieldValue::from("Female")),
        ("age", FieldValue::from(35_i64)),
        ("occupation", FieldValue::from("Engineer")),
        ("sleep_duration", FieldValue::from(8.2)),
        ("physical_activity_level", FieldValue::from(75_i64)),
        ("stress_level", FieldValue::from(2_i64)),
        ("bmi_category", FieldValue::from("Normal")),
        ("heart_rate", FieldValue::from(62_i64)),
        ("daily_steps", FieldValue::from(9500_i64)),
        ("sleep_disorder", FieldValue::Null),
    ]
    .into_iter()
    .collect()
}

/// Fully specified sleep-deprived, stressed profile.
pub fn poor_profile() -> RawRecord {
    [
        ("gender", FieldValue::from("Male")),
        ("age", FieldValue::from(45_i64)),
        ("occupation", FieldValue::from("Sales Representative")),
        ("sleep_duration", FieldValue::from(4.8)),
        ("physical_activity_level", FieldValue::from(25_i64)),
        ("stress_level", FieldValue::from(9_i64)),
        ("bmi_category", FieldValue::from("Overweight")),
        ("heart_rate", FieldValue::from(84_i64)),
        ("daily_steps", FieldValue::from(3500_i64)),
        ("sleep_disorder", FieldValue::from("Insomnia")),
    ]
    .into_iter()
    .collect()
}
