/// Domain models for the application
use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A named point on a route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// Road distance from the previous waypoint in km, 0 for the first one.
    pub km_from_prev: f64,
}

impl Waypoint {
    pub fn new(name: impl Into<String>, lat: f64, lon: f64, km_from_prev: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lon,
            km_from_prev,
        }
    }
}

/// An ordered road corridor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    pub label: String,
    pub waypoints: Vec<Waypoint>,
}

/// Weather conditions at a single point in time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastSample {
    /// Air temperature at 2 m, °C
    pub temperature: f64,
    /// Precipitation, mm
    pub precipitation: f64,
    /// Wind speed at 10 m, m/s
    pub wind_speed: f64,
    /// WMO weather code
    pub weather_code: i32,
}

/// Entry of an hourly forecast series, stamped in local wall-clock time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourlySample {
    pub time: NaiveDateTime,
    pub sample: ForecastSample,
}

/// Upstream data for one waypoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointForecast {
    pub current: ForecastSample,
    pub hourly: Vec<HourlySample>,
}

/// Cached upstream data for a whole route, aligned with its waypoints
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSnapshot {
    pub route_id: String,
    pub fetched_at: DateTime<Utc>,
    pub points: Vec<PointForecast>,
}

/// Driving risk level. `NoData` is a sentinel and does not compare with the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Green,
    Yellow,
    Red,
    NoData,
}

impl RiskLevel {
    fn severity(self) -> Option<u8> {
        match self {
            RiskLevel::Green => Some(0),
            RiskLevel::Yellow => Some(1),
            RiskLevel::Red => Some(2),
            RiskLevel::NoData => None,
        }
    }
}

impl PartialOrd for RiskLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self.severity(), other.severity()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ if self == other => Some(Ordering::Equal),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub reason: &'static str,
}

/// Per-waypoint output of the ETA planner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EtaPoint {
    pub km_from_start: f64,
    pub arrival: DateTime<Tz>,
}

/// Entry of the route listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteSummary {
    pub id: String,
    pub label: String,
}

/// Sample values plus their classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionsView {
    pub t: Option<f64>,
    pub p: Option<f64>,
    pub w: Option<f64>,
    pub code: Option<i32>,
    pub risk: RiskLevel,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtaView {
    /// Timestamp of the forecast hour used, local `YYYY-MM-DDTHH:MM`
    pub time: String,
    /// Arrival wall-clock time, `HH:MM`
    pub clock: String,
    #[serde(flatten)]
    pub conditions: ConditionsView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointStatus {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub km_from_start: f64,
    pub now: ConditionsView,
    pub eta: EtaView,
}

/// Response of the status endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    pub route_id: String,
    pub route_label: String,
    pub updated: DateTime<Utc>,
    pub start: String,
    pub speed_kmh: f64,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub stale: bool,
    pub points: Vec<PointStatus>,
}

/// Health check response
#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub now: DateTime<Utc>,
}
