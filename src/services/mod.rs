/// Business logic services layer
pub mod eta;
pub mod hourly;
pub mod risk;

use crate::cache::ForecastCache;
use crate::domain::{
    ConditionsView, EtaPoint, EtaView, ForecastSample, PointForecast, PointStatus, RouteSnapshot,
    RouteSummary, StatusReport, Waypoint,
};
use crate::errors::{ApiError, ApiResult};
use crate::registry::RouteRegistry;
use crate::utils::{
    floor_to_hour, parse_speed, parse_start, Clock, Normalized, CLOCK_FORMAT, DEFAULT_SPEED_KMH,
    HOUR_FORMAT,
};
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::{debug, warn};

/// Route weather status: forecasts now and at each waypoint's arrival time
pub struct StatusService {
    registry: Arc<RouteRegistry>,
    cache: ForecastCache,
    clock: Arc<dyn Clock>,
    timezone: Tz,
}

impl StatusService {
    pub fn new(
        registry: Arc<RouteRegistry>,
        cache: ForecastCache,
        clock: Arc<dyn Clock>,
        timezone: Tz,
    ) -> Self {
        Self {
            registry,
            cache,
            clock,
            timezone,
        }
    }

    /// All registered routes
    pub fn list_routes(&self) -> Vec<RouteSummary> {
        self.registry.summaries()
    }

    /// Build the per-waypoint report. Unknown routes and unusable start or
    /// speed values fall back to their defaults; only an upstream failure with
    /// nothing cached for the route is an error.
    pub async fn status(
        &self,
        route_id: Option<&str>,
        start: Option<&str>,
        speed: Option<&str>,
    ) -> ApiResult<StatusReport> {
        let route = self.registry.resolve(route_id);
        if let Some(requested) = route_id.filter(|id| id.trim() != route.id) {
            debug!(requested, fallback = %route.id, "unknown route, using default");
        }

        let now = self.clock.now().with_timezone(&self.timezone);
        let start_at = parse_start(start, now);
        let mut speed_kmh = parse_speed(speed);
        if start_at.defaulted || speed_kmh.defaulted {
            debug!(?start, ?speed, "unusable input, using defaults");
        }
        let plan = match eta::plan(route, start_at.value, speed_kmh.value) {
            Some(plan) => plan,
            None => {
                warn!(?start, ?speed, "arrival times out of range, using default speed");
                speed_kmh = Normalized::fallback(DEFAULT_SPEED_KMH);
                eta::plan(route, start_at.value, speed_kmh.value).ok_or_else(|| {
                    ApiError::Internal(format!("arrival times out of range for route {}", route.id))
                })?
            }
        };

        let (snapshot, stale) = self.snapshot(&route.id, self.cache.get(route).await).await?;

        let points = route
            .waypoints
            .iter()
            .zip(&plan)
            .zip(&snapshot.points)
            .map(|((wp, eta), forecast)| point_status(wp, eta, forecast))
            .collect();

        Ok(StatusReport {
            route_id: route.id.clone(),
            route_label: route.label.clone(),
            updated: snapshot.fetched_at,
            start: start_at.value.to_rfc3339(),
            speed_kmh: speed_kmh.value,
            stale,
            points,
        })
    }

    /// Fall back to the last committed snapshot when a refresh fails
    async fn snapshot(
        &self,
        route_id: &str,
        refreshed: ApiResult<Arc<RouteSnapshot>>,
    ) -> ApiResult<(Arc<RouteSnapshot>, bool)> {
        match refreshed {
            Ok(snapshot) => Ok((snapshot, false)),
            Err(e) => match self.cache.last_known(route_id).await {
                Some(snapshot) => {
                    warn!(
                        route = %snapshot.route_id,
                        error = %e,
                        fetched_at = %snapshot.fetched_at,
                        "serving stale forecasts"
                    );
                    Ok((snapshot, true))
                }
                None => Err(e),
            },
        }
    }
}

fn conditions(sample: Option<&ForecastSample>) -> ConditionsView {
    let assessment = sample.map_or_else(risk::no_data, risk::classify);
    ConditionsView {
        t: sample.map(|s| s.temperature),
        p: sample.map(|s| s.precipitation),
        w: sample.map(|s| s.wind_speed),
        code: sample.map(|s| s.weather_code),
        risk: assessment.level,
        reason: assessment.reason.to_string(),
    }
}

fn point_status(wp: &Waypoint, eta: &EtaPoint, forecast: &PointForecast) -> PointStatus {
    let matched = hourly::select_hour(&forecast.hourly, &eta.arrival);
    let hour = matched
        .map(|h| h.time)
        .unwrap_or_else(|| floor_to_hour(&eta.arrival));

    PointStatus {
        name: wp.name.clone(),
        lat: wp.lat,
        lon: wp.lon,
        km_from_start: eta.km_from_start,
        now: conditions(Some(&forecast.current)),
        eta: EtaView {
            time: hour.format(HOUR_FORMAT).to_string(),
            clock: eta.arrival.format(CLOCK_FORMAT).to_string(),
            conditions: conditions(matched.map(|h| &h.sample)),
        },
    }
}
