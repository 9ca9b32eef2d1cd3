/// Nearest-hour lookup in an hourly forecast series
use crate::domain::HourlySample;
use crate::utils::floor_to_hour;
use chrono::DateTime;
use chrono_tz::Tz;

/// Pick the entry for the hour containing `target`.
///
/// An entry stamped exactly at that hour wins. Otherwise the entry closest in
/// time is returned, the earliest one on ties. `None` for an empty series.
pub fn select_hour<'a>(
    series: &'a [HourlySample],
    target: &DateTime<Tz>,
) -> Option<&'a HourlySample> {
    let hour = floor_to_hour(target);

    if let Some(exact) = series.iter().find(|s| s.time == hour) {
        return Some(exact);
    }

    let mut best: Option<(&HourlySample, i64)> = None;
    for entry in series {
        let diff = (entry.time - hour).num_seconds().abs();
        if best.map_or(true, |(_, d)| diff < d) {
            best = Some((entry, diff));
        }
    }
    best.map(|(entry, _)| entry)
}
