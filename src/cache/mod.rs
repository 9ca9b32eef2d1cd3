/// Per-route forecast cache with a time-to-live
use crate::clients::ForecastSource;
use crate::domain::{Route, RouteSnapshot};
use crate::errors::{ApiError, ApiResult};
use crate::registry::RouteRegistry;
use crate::utils::Clock;
use futures::future::try_join_all;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

/// One route's entry. `refresh` admits a single refresh at a time and holds
/// the last attempt's failure; `attempts` counts finished refreshes so callers
/// that queued behind one can tell it ran. `current` keeps serving the last
/// committed snapshot.
#[derive(Default)]
struct Slot {
    refresh: Mutex<Option<ApiError>>,
    attempts: AtomicU64,
    current: RwLock<Option<Arc<RouteSnapshot>>>,
}

pub struct ForecastCache {
    slots: HashMap<String, Slot>,
    source: Arc<dyn ForecastSource>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl ForecastCache {
    /// One slot per registered route; the set of routes never changes.
    pub fn new(
        registry: &RouteRegistry,
        source: Arc<dyn ForecastSource>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Self {
        let slots = registry
            .routes()
            .map(|r| (r.id.clone(), Slot::default()))
            .collect();
        Self {
            slots,
            source,
            clock,
            ttl,
        }
    }

    /// Snapshot for `route`, refreshed first when missing or older than the TTL.
    /// A failed refresh leaves the previous snapshot in place, and callers that
    /// were waiting on it get the same error instead of fetching again.
    pub async fn get(&self, route: &Route) -> ApiResult<Arc<RouteSnapshot>> {
        let slot = self.slot(&route.id)?;

        if let Some(snapshot) = self.fresh(slot).await {
            return Ok(snapshot);
        }

        let seen = slot.attempts.load(Ordering::SeqCst);
        let mut last_failure = slot.refresh.lock().await;
        // another caller may have refreshed while we waited
        if let Some(snapshot) = self.fresh(slot).await {
            return Ok(snapshot);
        }
        if slot.attempts.load(Ordering::SeqCst) != seen {
            if let Some(e) = last_failure.as_ref() {
                return Err(e.clone());
            }
        }

        let result = self.fetch(route).await;
        slot.attempts.fetch_add(1, Ordering::SeqCst);
        match result {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                *slot.current.write().await = Some(snapshot.clone());
                *last_failure = None;
                Ok(snapshot)
            }
            Err(e) => {
                *last_failure = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Last committed snapshot regardless of age, without refreshing
    pub async fn last_known(&self, route_id: &str) -> Option<Arc<RouteSnapshot>> {
        let slot = self.slots.get(route_id)?;
        slot.current.read().await.clone()
    }

    fn slot(&self, route_id: &str) -> ApiResult<&Slot> {
        self.slots
            .get(route_id)
            .ok_or_else(|| ApiError::Internal(format!("no cache slot for route {route_id}")))
    }

    async fn fresh(&self, slot: &Slot) -> Option<Arc<RouteSnapshot>> {
        let current = slot.current.read().await;
        let snapshot = current.as_ref()?;
        let age = (self.clock.now() - snapshot.fetched_at)
            .to_std()
            .unwrap_or_default();
        if age > self.ttl {
            return None;
        }
        Some(snapshot.clone())
    }

    async fn fetch(&self, route: &Route) -> ApiResult<RouteSnapshot> {
        info!(route = %route.id, points = route.waypoints.len(), "refreshing forecasts");

        let requests = route
            .waypoints
            .iter()
            .map(|wp| self.source.fetch_point(wp.lat, wp.lon));

        match try_join_all(requests).await {
            Ok(points) => {
                let fetched_at = self.clock.now();
                info!(route = %route.id, %fetched_at, "forecasts refreshed");
                Ok(RouteSnapshot {
                    route_id: route.id.clone(),
                    fetched_at,
                    points,
                })
            }
            Err(e) => {
                warn!(route = %route.id, error = %e, "forecast refresh failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::testing::FakeSource;
    use crate::domain::{ForecastSample, PointForecast, Waypoint};
    use crate::utils::ManualClock;
    use chrono::{TimeZone, Utc};

    fn route(id: &str, points: usize) -> Route {
        Route {
            id: id.to_string(),
            label: id.to_string(),
            waypoints: (0..points)
                .map(|i| {
                    let km = if i == 0 { 0.0 } else { 10.0 };
                    Waypoint::new(format!("wp{i}"), 60.0, 17.0, km)
                })
                .collect(),
        }
    }

    fn forecast() -> PointForecast {
        PointForecast {
            current: ForecastSample {
                temperature: -3.0,
                precipitation: 0.0,
                wind_speed: 4.0,
                weather_code: 2,
            },
            hourly: Vec::new(),
        }
    }

    struct Fixture {
        cache: Arc<ForecastCache>,
        source: Arc<FakeSource>,
        clock: Arc<ManualClock>,
        a: Route,
        b: Route,
    }

    fn fixture() -> Fixture {
        let a = route("a", 3);
        let b = route("b", 2);
        let registry = RouteRegistry::new(vec![a.clone(), b.clone()], "a").unwrap();
        let source = Arc::new(FakeSource::new(forecast()));
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 1, 2, 7, 0, 0).unwrap(),
        ));
        let cache = Arc::new(ForecastCache::new(
            &registry,
            source.clone(),
            clock.clone(),
            Duration::from_secs(600),
        ));
        Fixture {
            cache,
            source,
            clock,
            a,
            b,
        }
    }

    #[tokio::test]
    async fn test_first_lookup_fetches_every_waypoint() {
        let f = fixture();
        let snapshot = f.cache.get(&f.a).await.unwrap();
        assert_eq!(snapshot.points.len(), 3);
        assert_eq!(snapshot.route_id, "a");
        assert_eq!(f.source.calls(), 3);
    }

    #[tokio::test]
    async fn test_lookup_within_ttl_is_served_from_cache() {
        let f = fixture();
        let first = f.cache.get(&f.a).await.unwrap();
        f.clock.advance(chrono::Duration::seconds(600));
        let second = f.cache.get(&f.a).await.unwrap();

        assert_eq!(first.fetched_at, second.fetched_at);
        assert_eq!(f.source.calls(), 3);
    }

    #[tokio::test]
    async fn test_expired_entry_is_refreshed_once_under_concurrency() {
        let f = fixture();
        f.cache.get(&f.a).await.unwrap();
        f.clock.advance(chrono::Duration::seconds(601));

        let (x, y, z) = tokio::join!(f.cache.get(&f.a), f.cache.get(&f.a), f.cache.get(&f.a));
        let (x, y, z) = (x.unwrap(), y.unwrap(), z.unwrap());

        assert_eq!(f.source.calls(), 6);
        assert_eq!(x.fetched_at, y.fetched_at);
        assert_eq!(y.fetched_at, z.fetched_at);
        assert!(Arc::ptr_eq(&x, &z));
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_entry() {
        let f = fixture();
        let original = f.cache.get(&f.a).await.unwrap();

        f.clock.advance(chrono::Duration::seconds(900));
        f.source.set_failing(true);
        assert!(f.cache.get(&f.a).await.is_err());

        let kept = f.cache.last_known("a").await.unwrap();
        assert!(Arc::ptr_eq(&original, &kept));

        f.source.set_failing(false);
        let refreshed = f.cache.get(&f.a).await.unwrap();
        assert!(refreshed.fetched_at > original.fetched_at);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_failed_refresh() {
        let f = fixture();
        f.cache.get(&f.a).await.unwrap();
        f.clock.advance(chrono::Duration::seconds(601));
        f.source.set_failing(true);

        let (x, y, z) = tokio::join!(f.cache.get(&f.a), f.cache.get(&f.a), f.cache.get(&f.a));
        assert!(x.is_err() && y.is_err() && z.is_err());
        // 3 waypoints for the initial fill, 3 for the single failed refresh
        assert_eq!(f.source.calls(), 6);
        assert!(matches!(
            y,
            Err(ApiError::UpstreamStatus { status: 503, .. })
        ));

        // a later request is not a waiter and tries again
        assert!(f.cache.get(&f.a).await.is_err());
        assert_eq!(f.source.calls(), 9);

        f.source.set_failing(false);
        assert!(f.cache.get(&f.a).await.is_ok());
        assert_eq!(f.source.calls(), 12);
    }

    #[tokio::test]
    async fn test_failure_without_previous_entry_caches_nothing() {
        let f = fixture();
        f.source.set_failing(true);
        assert!(f.cache.get(&f.b).await.is_err());
        assert!(f.cache.last_known("b").await.is_none());
    }

    #[tokio::test]
    async fn test_routes_are_cached_independently() {
        let f = fixture();
        let a = f.cache.get(&f.a).await.unwrap();
        f.clock.advance(chrono::Duration::seconds(300));
        let b = f.cache.get(&f.b).await.unwrap();

        assert_eq!(f.source.calls(), 5);
        assert_ne!(a.fetched_at, b.fetched_at);
        assert_eq!(f.cache.last_known("a").await.unwrap().route_id, "a");
        assert_eq!(f.cache.last_known("b").await.unwrap().route_id, "b");
    }

    #[tokio::test]
    async fn test_unregistered_route_is_an_error() {
        let f = fixture();
        let stray = route("stray", 1);
        assert!(matches!(
            f.cache.get(&stray).await,
            Err(ApiError::Internal(_))
        ));
    }
}
