//! Rule-based sleep hygiene tips.
//!
//! Independent of the trained model: each rule reads one raw field and
//! fires on a fixed threshold. A missing or non-numeric field never fires.

use crate::data::RawRecord;
use serde::{Deserialize, Serialize};

/// Which rule produced a tip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TipKind {
    /// Less than 6 hours of sleep
    ShortSleep,
    /// Stress level 7 or higher
    HighStress,
    /// Under 30 minutes of daily activity
    LowActivity,
    /// Resting heart rate above 85 bpm
    HighHeartRate,
    /// Fewer than 5000 daily steps
    LowSteps,
    /// A diagnosed sleep disorder
    SleepDisorder,
}

/// A single recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tip {
    /// Rule that fired
    pub kind: TipKind,
    /// Advice text
    pub message: String,
}

impl Tip {
    fn new(kind: TipKind, message: &str) -> Self {
        Self {
            kind,
            message: message.to_string(),
        }
    }
}

/// Tips for `record`, in rule order.
///
/// # Examples
///
/// ```
/// use sleep_quality::advice::{recommendations, TipKind};
/// use sleep_quality::data::RawRecord;
///
/// let mut record = RawRecord::new();
/// record.insert("sleep_duration", 5.0);
/// record.insert("stress_level", 3.0);
///
/// let kinds: Vec<TipKind> = recommendations(&record).iter().map(|t| t.kind).collect();
/// assert_eq!(kinds, vec![TipKind::ShortSleep]);
/// ```
#[must_use]
pub fn recommendations(record: &RawRecord) -> Vec<Tip> {
    let below = |col: &str, limit: f64| record.number(col) < limit;
    let above = |col: &str, limit: f64| record.number(col) > limit;

    let mut tips = Vec::new();
    if below("sleep_duration", 6.0) {
        tips.push(Tip::new(
            TipKind::ShortSleep,
            "Aim for 7-9 hours of sleep; keep a consistent bedtime and wake time.",
        ));
    }
    if record.number("stress_level") >= 7.0 {
        tips.push(Tip::new(
            TipKind::HighStress,
            "High stress: try relaxation before bed such as breathing exercises or a short walk.",
        ));
    }
    if below("physical_activity_level", 30.0) {
        tips.push(Tip::new(
            TipKind::LowActivity,
            "Get at least 30 minutes of moderate activity a day, ideally not right before bed.",
        ));
    }
    if above("heart_rate", 85.0) {
        tips.push(Tip::new(
            TipKind::HighHeartRate,
            "Elevated resting heart rate: cut back on late caffeine and consider checking with a doctor.",
        ));
    }
    if below("daily_steps", 5000.0) {
        tips.push(Tip::new(
            TipKind::LowSteps,
            "Walk more during the day; 7000+ steps is a good target.",
        ));
    }
    if record.category("sleep_disorder").is_some() {
        tips.push(Tip::new(
            TipKind::SleepDisorder,
            "A sleep disorder was reported; a specialist can help with treatment options.",
        ));
    }
    tips
}
