use std::env;
use std::time::Duration;

use crate::controller::ControllerOptions;
use crate::fixture_fetch::DEFAULT_PAGE_SIZE;
use crate::league::League;
use crate::loading_gate::DEFAULT_SPLASH;

const DEFAULT_API_BASE: &str = "http://127.0.0.1:5000";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base: String,
    pub request_timeout: Duration,
    pub page_size: usize,
    pub splash: Duration,
    pub fetch_parallelism: usize,
    pub league: League,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(10),
            page_size: DEFAULT_PAGE_SIZE,
            splash: DEFAULT_SPLASH,
            fetch_parallelism: 4,
            league: League::LaLiga,
        }
    }
}

impl AppConfig {
    /// Reads `.env.local`, `.env` and the process environment. Bad values
    /// fall back to defaults.
    pub fn load() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_env()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        let api_base = env::var("PREDICTOR_API_BASE")
            .ok()
            .map(|val| val.trim().to_string())
            .filter(|val| !val.is_empty())
            .unwrap_or(defaults.api_base);
        let request_timeout = Duration::from_secs(
            env::var("PREDICTOR_TIMEOUT_SECS")
                .ok()
                .and_then(|val| val.parse::<u64>().ok())
                .unwrap_or(10)
                .clamp(1, 120),
        );
        let page_size = env::var("FIXTURE_PAGE_SIZE")
            .ok()
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, 20);
        let splash = env::var("SPLASH_MS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .map(|ms| Duration::from_millis(ms.min(60_000)))
            .unwrap_or(DEFAULT_SPLASH);
        let fetch_parallelism = env::var("FETCH_PARALLELISM")
            .ok()
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(4)
            .clamp(2, 32);
        let league = env::var("PREDICTOR_LEAGUE")
            .ok()
            .and_then(|val| League::from_slug(&val))
            .unwrap_or(defaults.league);

        Self {
            api_base,
            request_timeout,
            page_size,
            splash,
            fetch_parallelism,
            league,
        }
    }

    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            page_size: self.page_size,
            fetch_parallelism: self.fetch_parallelism,
        }
    }
}
