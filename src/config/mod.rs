/// Application configuration module
use chrono_tz::Tz;
use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,
    pub port: u16,
    pub open_meteo_url: String,
    pub reference_tz: Tz,
    pub default_route: String,
    pub cache: CacheSettings,
}

#[derive(Clone, Debug)]
pub struct CacheSettings {
    pub ttl_seconds: u64,
    pub fetch_timeout_seconds: u64,
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_seconds)
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env_parse("PORT", 5000u16);

        let open_meteo_url = env::var("OPEN_METEO_URL")
            .unwrap_or_else(|_| "https://api.open-meteo.com/v1/forecast".to_string());

        let tz_name = env::var("REFERENCE_TZ").unwrap_or_else(|_| "Europe/Stockholm".to_string());
        let reference_tz: Tz = tz_name
            .parse()
            .map_err(|e| anyhow::anyhow!("REFERENCE_TZ {tz_name:?} is not a valid timezone: {e}"))?;

        let default_route = env::var("DEFAULT_ROUTE").unwrap_or_else(|_| "e4-north".to_string());

        let cache = CacheSettings {
            ttl_seconds: env_parse("CACHE_TTL_SECONDS", 600u64),
            fetch_timeout_seconds: env_parse("FETCH_TIMEOUT_SECONDS", 12u64),
        };

        Ok(Self {
            bind_addr,
            port,
            open_meteo_url,
            reference_tz,
            default_route,
            cache,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}
