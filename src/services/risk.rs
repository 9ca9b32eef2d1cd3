/// Driving risk classification from a single forecast sample
use crate::domain::{ForecastSample, RiskAssessment, RiskLevel};

pub const REASON_NO_FORECAST: &str = "no forecast";

fn is_snow(code: i32) -> bool {
    matches!(code, 71..=77 | 85..=86)
}

fn is_freezing_rain(code: i32) -> bool {
    matches!(code, 66..=67)
}

/// Classify conditions. Rules are checked in order and the first one that
/// matches decides; unknown weather codes only take part through the
/// temperature, precipitation and wind rules.
pub fn classify(sample: &ForecastSample) -> RiskAssessment {
    let ForecastSample {
        temperature: t,
        precipitation: p,
        wind_speed: w,
        weather_code: code,
    } = *sample;

    let (level, reason) = if w >= 15.0 {
        (RiskLevel::Red, "high wind")
    } else if p > 0.0 && (-1.0..=1.0).contains(&t) {
        (RiskLevel::Red, "near-freezing precipitation (ice risk)")
    } else if is_freezing_rain(code) {
        (RiskLevel::Red, "freezing rain")
    } else if is_snow(code) && p >= 0.5 {
        (RiskLevel::Red, "heavy snow")
    } else if is_snow(code) || p > 0.0 || w >= 10.0 {
        (RiskLevel::Yellow, "winter conditions")
    } else {
        (RiskLevel::Green, "stable")
    };

    RiskAssessment { level, reason }
}

/// Assessment used where no sample exists
pub fn no_data() -> RiskAssessment {
    RiskAssessment {
        level: RiskLevel::NoData,
        reason: REASON_NO_FORECAST,
    }
}
