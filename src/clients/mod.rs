/// External API clients module
use crate::domain::{ForecastSample, HourlySample, PointForecast};
use crate::errors::{ApiError, ApiResult};
use crate::utils::HOUR_FORMAT;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use chrono_tz::Tz;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const VARIABLES: &str = "temperature_2m,precipitation,wind_speed_10m,weather_code";

/// Point-query weather provider: current conditions plus an hourly series
#[async_trait]
pub trait ForecastSource: Send + Sync {
    async fn fetch_point(&self, lat: f64, lon: f64) -> ApiResult<PointForecast>;
}

/// HTTP client wrapper with common configuration
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("route-weather/0.1")
            .build()?;
        Ok(Self { client })
    }

    pub fn get_client(&self) -> &Client {
        &self.client
    }
}

/// Open-Meteo forecast client
pub struct OpenMeteoClient {
    http_client: HttpClient,
    base_url: String,
    timezone: Tz,
}

impl OpenMeteoClient {
    pub fn new(base_url: String, timezone: Tz, timeout: Duration) -> ApiResult<Self> {
        Ok(Self {
            http_client: HttpClient::new(timeout)?,
            base_url,
            timezone,
        })
    }
}

#[async_trait]
impl ForecastSource for OpenMeteoClient {
    async fn fetch_point(&self, lat: f64, lon: f64) -> ApiResult<PointForecast> {
        let resp = self
            .http_client
            .get_client()
            .get(&self.base_url)
            .query(&[
                ("latitude", lat.to_string()),
                ("longitude", lon.to_string()),
                ("current", VARIABLES.to_string()),
                ("hourly", VARIABLES.to_string()),
                ("wind_speed_unit", "ms".to_string()),
                ("timezone", self.timezone.name().to_string()),
                ("past_days", "1".to_string()),
                ("forecast_days", "2".to_string()),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ApiError::UpstreamStatus {
                status: resp.status().as_u16(),
                url: resp.url().to_string(),
            });
        }

        let body: OpenMeteoResponse = resp.json().await?;
        parse_forecast(body)
    }
}

#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    current: CurrentBlock,
    hourly: HourlyBlock,
}

#[derive(Debug, Deserialize)]
struct CurrentBlock {
    temperature_2m: f64,
    precipitation: f64,
    wind_speed_10m: f64,
    weather_code: i32,
}

/// Column-oriented hourly data; any column may hold nulls
#[derive(Debug, Deserialize)]
struct HourlyBlock {
    time: Vec<String>,
    temperature_2m: Vec<Option<f64>>,
    precipitation: Vec<Option<f64>>,
    wind_speed_10m: Vec<Option<f64>>,
    weather_code: Vec<Option<i32>>,
}

fn parse_forecast(body: OpenMeteoResponse) -> ApiResult<PointForecast> {
    let c = body.current;
    let current = ForecastSample {
        temperature: c.temperature_2m,
        precipitation: c.precipitation,
        wind_speed: c.wind_speed_10m,
        weather_code: c.weather_code,
    };

    let h = body.hourly;
    let n = h.time.len();
    let lengths = [
        h.temperature_2m.len(),
        h.precipitation.len(),
        h.wind_speed_10m.len(),
        h.weather_code.len(),
    ];
    if lengths.iter().any(|&len| len != n) {
        return Err(ApiError::Payload(format!(
            "hourly columns differ in length: time={n}, values={lengths:?}"
        )));
    }

    let mut hourly = Vec::with_capacity(n);
    for (i, stamp) in h.time.iter().enumerate() {
        let time = NaiveDateTime::parse_from_str(stamp, HOUR_FORMAT)
            .map_err(|e| ApiError::Payload(format!("hourly time {stamp:?}: {e}")))?;

        let row = (
            h.temperature_2m[i],
            h.precipitation[i],
            h.wind_speed_10m[i],
            h.weather_code[i],
        );
        if let (Some(temperature), Some(precipitation), Some(wind_speed), Some(weather_code)) = row
        {
            hourly.push(HourlySample {
                time,
                sample: ForecastSample {
                    temperature,
                    precipitation,
                    wind_speed,
                    weather_code,
                },
            });
        }
    }

    Ok(PointForecast { current, hourly })
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// In-memory source returning the same forecast for every coordinate
    pub struct FakeSource {
        forecast: PointForecast,
        calls: AtomicUsize,
        failing: AtomicBool,
    }

    impl FakeSource {
        pub fn new(forecast: PointForecast) -> Self {
            Self {
                forecast,
                calls: AtomicUsize::new(0),
                failing: AtomicBool::new(false),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl ForecastSource for FakeSource {
        async fn fetch_point(&self, _lat: f64, _lon: f64) -> ApiResult<PointForecast> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // let concurrent callers interleave
            tokio::task::yield_now().await;
            if self.failing.load(Ordering::SeqCst) {
                return Err(ApiError::UpstreamStatus {
                    status: 503,
                    url: "fake://forecast".into(),
                });
            }
            Ok(self.forecast.clone())
        }
    }
}
