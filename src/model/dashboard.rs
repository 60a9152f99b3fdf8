use crate::model::Amount;
use serde::{Deserialize, Serialize};

/// The analyzer's dashboard response. Only the `overall` figures are read; the chart series the
/// server sends alongside them are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    #[serde(default)]
    pub overall: Overview,
}

/// The headline figures for the filtered records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    /// All-time collections.
    #[serde(default, rename = "total_total_collection")]
    pub total_collection: Amount,
    /// Average attendance per Sunday over the last twelve months of records.
    #[serde(default)]
    pub avg_weekly_attendance: Option<f64>,
    /// Percentage change in average weekly attendance from the previous quarter to the latest.
    #[serde(default)]
    pub growth_rate: Option<f64>,
    /// Banked money as a percentage of the total collected.
    #[serde(default)]
    pub banked_percentage: Option<f64>,
}

impl Overview {
    /// Average weekly attendance to the nearest whole person, halves rounding up. "0" when
    /// missing.
    pub fn attendance_display(&self) -> String {
        match self.avg_weekly_attendance {
            Some(v) if v.is_finite() => format!("{:.0}", (v + 0.5).floor()),
            _ => "0".to_string(),
        }
    }

    /// e.g. `3.4%`, or `0%` when missing.
    pub fn growth_display(&self) -> String {
        percent(self.growth_rate)
    }

    /// e.g. `85.0%`, or `0%` when missing.
    pub fn banked_display(&self) -> String {
        percent(self.banked_percentage)
    }
}

fn percent(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.1}%"),
        _ => "0%".to_string(),
    }
}
