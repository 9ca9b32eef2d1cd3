/// Application routes configuration
use crate::handlers::{get_status, health, list_routes, AppState};
use axum::{routing::get, Router};

/// Build the application router with all routes
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health))
        // Route weather
        .route("/api/routes", get(list_routes))
        .route("/api/status", get(get_status))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ForecastCache;
    use crate::clients::testing::FakeSource;
    use crate::domain::{ForecastSample, PointForecast};
    use crate::registry::RouteRegistry;
    use crate::services::StatusService;
    use crate::utils::ManualClock;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::{TimeZone, Utc};
    use serde_json::Value;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn app(source: Arc<FakeSource>) -> Router {
        let registry = Arc::new(RouteRegistry::builtin("e4-north").unwrap());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 1, 2, 7, 0, 0).unwrap(),
        ));
        let cache = ForecastCache::new(&registry, source, clock.clone(), Duration::from_secs(600));
        let service = StatusService::new(registry, cache, clock, chrono_tz::Europe::Stockholm);
        build_router(AppState {
            status_service: Arc::new(service),
        })
    }

    fn source() -> Arc<FakeSource> {
        Arc::new(FakeSource::new(PointForecast {
            current: ForecastSample {
                temperature: -2.0,
                precipitation: 0.0,
                wind_speed: 11.0,
                weather_code: 3,
            },
            hourly: Vec::new(),
        }))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json(app(source()), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_routes_listing() {
        let (status, body) = get_json(app(source()), "/api/routes").await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["e4-north", "e4-south", "stockholm-goteborg"]);
        assert_eq!(body[0]["label"], "E4 Skellefteå – Stockholm");
    }

    #[tokio::test]
    async fn test_status_shape_and_fallbacks() {
        let (status, body) = get_json(
            app(source()),
            "/api/status?route=nowhere&start=later&speed=zoom",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["route_id"], "e4-north");
        assert_eq!(body["speed_kmh"], 85.0);
        assert_eq!(body["start"], "2026-01-02T08:00:00+01:00");
        assert!(body.get("stale").is_none());

        let points = body["points"].as_array().unwrap();
        assert_eq!(points.len(), 8);
        assert_eq!(points[0]["name"], "Skellefteå");
        assert_eq!(points[0]["km_from_start"], 0.0);
        assert_eq!(points[1]["km_from_start"], 137.0);
        assert_eq!(points[0]["now"]["risk"], "YELLOW");
        assert_eq!(points[0]["now"]["reason"], "winter conditions");
        assert_eq!(points[0]["eta"]["risk"], "NO_DATA");
        assert_eq!(points[0]["eta"]["t"], Value::Null);
        assert_eq!(points[0]["eta"]["clock"], "08:00");
        assert_eq!(points[0]["eta"]["time"], "2026-01-02T08:00");
    }

    #[tokio::test]
    async fn test_status_selects_route() {
        let (_, body) = get_json(app(source()), "/api/status?route=e4-south&speed=100").await;
        assert_eq!(body["route_id"], "e4-south");
        assert_eq!(body["points"][0]["name"], "Stockholm");
        assert_eq!(body["points"][1]["km_from_start"], 70.0);
        // 70 km at 100 km/h
        assert_eq!(body["points"][1]["eta"]["clock"], "08:42");
    }

    #[tokio::test]
    async fn test_upstream_failure_without_cache_is_bad_gateway() {
        let source = source();
        source.set_failing(true);
        let (status, body) = get_json(app(source), "/api/status").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"]["code"], "UPSTREAM_5XX");
    }
}
