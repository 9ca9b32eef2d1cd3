/// Arrival time planning along a route
use crate::domain::{EtaPoint, Route};
use chrono::{DateTime, TimeDelta};
use chrono_tz::Tz;

/// Cumulative distance and arrival instant for every waypoint, in route order.
/// `None` when an arrival falls outside the representable date range, which
/// only happens for vanishingly small speeds.
pub fn plan(route: &Route, start: DateTime<Tz>, speed_kmh: f64) -> Option<Vec<EtaPoint>> {
    let mut km_from_start = 0.0;
    route
        .waypoints
        .iter()
        .map(|wp| {
            km_from_start += wp.km_from_prev;
            let arrival = start.checked_add_signed(travel_time(km_from_start, speed_kmh)?)?;
            Some(EtaPoint {
                km_from_start,
                arrival,
            })
        })
        .collect()
}

fn travel_time(km: f64, speed_kmh: f64) -> Option<TimeDelta> {
    let millis = (km / speed_kmh * 3_600_000.0).round();
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return None;
    }
    TimeDelta::try_milliseconds(millis as i64)
}
