use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

/// Engine tuning. Every knob has a default, so a session can be built with
/// `EngineConfig::default()` and no environment at all.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Seconds between autosave flushes.
    pub autosave_interval_secs: u64,
    /// Countdown tick period. One second in production; tests shrink it.
    pub timer_tick: Duration,
    /// Timeout applied to every backend HTTP request.
    pub request_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            autosave_interval_secs: 30,
            timer_tick: Duration::from_secs(1),
            request_timeout_secs: 60,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let defaults = Self::default();
        Ok(Self {
            autosave_interval_secs: get_env_parse_or(
                "QUIZ_AUTOSAVE_INTERVAL_SECS",
                defaults.autosave_interval_secs,
            )?,
            timer_tick: Duration::from_millis(get_env_parse_or(
                "QUIZ_TIMER_TICK_MS",
                defaults.timer_tick.as_millis() as u64,
            )?),
            request_timeout_secs: get_env_parse_or(
                "QUIZ_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout_secs,
            )?,
        })
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs)
    }
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}
