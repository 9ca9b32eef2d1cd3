/// Utility functions: clocks and lenient parsing of request parameters
use chrono::{DateTime, Duration, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

/// Speed used when the request does not carry a usable one, km/h
pub const DEFAULT_SPEED_KMH: f64 = 85.0;
/// Slowest speed taken from a request, km/h
pub const MIN_SPEED_KMH: f64 = 1.0;

/// Local wall-clock format of hourly forecast timestamps
pub const HOUR_FORMAT: &str = "%Y-%m-%dT%H:%M";
pub const CLOCK_FORMAT: &str = "%H:%M";

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A parsed request value. `defaulted` is set when the caller sent something
/// that could not be used and a fallback was substituted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalized<T> {
    pub value: T,
    pub defaulted: bool,
}

impl<T> Normalized<T> {
    fn given(value: T) -> Self {
        Self {
            value,
            defaulted: false,
        }
    }

    pub(crate) fn fallback(value: T) -> Self {
        Self {
            value,
            defaulted: true,
        }
    }
}

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M%:z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Resolve a user supplied departure time against `now`, in `now`'s timezone.
/// Never fails: anything unusable resolves to `now`.
pub fn parse_start(input: Option<&str>, now: DateTime<Tz>) -> Normalized<DateTime<Tz>> {
    let raw = match input.map(str::trim) {
        Some(s) if !s.is_empty() => s,
        _ => return Normalized::given(now),
    };

    match parse_start_strict(raw, now) {
        Some(at) => Normalized::given(at),
        None => Normalized::fallback(now),
    }
}

fn parse_start_strict(raw: &str, now: DateTime<Tz>) -> Option<DateTime<Tz>> {
    let tz = now.timezone();

    if raw.contains('T') || raw.contains(' ') {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&tz));
        }
        if let Some(dt) = OFFSET_FORMATS
            .iter()
            .find_map(|fmt| DateTime::parse_from_str(raw, fmt).ok())
        {
            return Some(dt.with_timezone(&tz));
        }
        // a local time inside a DST fold resolves to its first occurrence
        return NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .and_then(|naive| tz.from_local_datetime(&naive).earliest());
    }

    if is_wall_clock(raw) {
        let time = NaiveTime::parse_from_str(raw, CLOCK_FORMAT).ok()?;
        let naive = now.date_naive().and_time(time);
        return tz.from_local_datetime(&naive).earliest();
    }

    None
}

/// Exactly `HH:MM`
fn is_wall_clock(raw: &str) -> bool {
    let b = raw.as_bytes();
    b.len() == 5
        && b[2] == b':'
        && [0, 1, 3, 4].iter().all(|&i| b[i].is_ascii_digit())
}

/// Resolve a user supplied speed in km/h; must be finite and at least
/// `MIN_SPEED_KMH`.
pub fn parse_speed(input: Option<&str>) -> Normalized<f64> {
    let raw = match input.map(str::trim) {
        Some(s) if !s.is_empty() => s,
        _ => return Normalized::given(DEFAULT_SPEED_KMH),
    };

    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= MIN_SPEED_KMH => Normalized::given(v),
        _ => Normalized::fallback(DEFAULT_SPEED_KMH),
    }
}

/// Local wall-clock time truncated to the top of the hour
pub fn floor_to_hour(at: &DateTime<Tz>) -> NaiveDateTime {
    let local = at.naive_local();
    let past_hour = Duration::seconds(i64::from(local.minute() * 60 + local.second()))
        + Duration::nanoseconds(i64::from(local.nanosecond()));
    local - past_hour
}

#[cfg(test)]
pub struct ManualClock(std::sync::Mutex<DateTime<Utc>>);

#[cfg(test)]
impl ManualClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(std::sync::Mutex::new(at))
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.0.lock().unwrap();
        *now += by;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}
