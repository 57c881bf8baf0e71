use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context};
use inlands_core::stability::{SampleMetric, StabilityConfig};

/// Agent configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Base URL of the queue service (default: `http://127.0.0.1:8000`).
    pub server_url: String,
    /// Base URL of the automation sidecar (default: `http://127.0.0.1:9333`).
    pub driver_url: String,
    /// Concurrent job slots (default: `3`).
    pub max_concurrent_jobs: usize,
    /// Fixed period of the poll loop (default: 3 s).
    pub poll_interval: Duration,
    /// Bound on one `next-job` request (default: 30 s).
    pub poll_timeout: Duration,
    /// Bound on one `submit` or `log` request (default: 60 s).
    pub submit_timeout: Duration,
    /// Bound on one sidecar request (default: 120 s).
    pub driver_timeout: Duration,
    /// Serialize driver calls because all slots share one context (default: `true`).
    pub driver_shared_context: bool,
    /// Completion detection tuning, a named profile plus overrides.
    pub stability: StabilityConfig,
}

impl AgentConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                 | Default                  |
    /// |-------------------------|--------------------------|
    /// | `SERVER_URL`            | `http://127.0.0.1:8000`  |
    /// | `DRIVER_URL`            | `http://127.0.0.1:9333`  |
    /// | `MAX_CONCURRENT_JOBS`   | `3`                      |
    /// | `POLL_INTERVAL_SECS`    | `3`                      |
    /// | `POLL_TIMEOUT_SECS`     | `30`                     |
    /// | `SUBMIT_TIMEOUT_SECS`   | `60`                     |
    /// | `DRIVER_TIMEOUT_SECS`   | `120`                    |
    /// | `DRIVER_PROFILE`        | `fast_settling`          |
    /// | `DRIVER_SHARED_CONTEXT` | `true`                   |
    /// | `STABILITY_REQUIRED`    | from profile             |
    /// | `STABILITY_MAX_SAMPLES` | from profile             |
    /// | `STABILITY_INTERVAL_MS` | from profile             |
    /// | `STABILITY_MIN_LENGTH`  | from profile             |
    /// | `STABILITY_END_MARKER`  | from profile             |
    /// | `STABILITY_METRIC`      | `length`                 |
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let server_url = lookup("SERVER_URL").unwrap_or_else(|| "http://127.0.0.1:8000".into());
        let driver_url = lookup("DRIVER_URL").unwrap_or_else(|| "http://127.0.0.1:9333".into());

        let max_concurrent_jobs: usize = parse_or(&lookup, "MAX_CONCURRENT_JOBS", 3)?;
        if max_concurrent_jobs == 0 {
            bail!("MAX_CONCURRENT_JOBS must be at least 1");
        }

        let poll_interval = Duration::from_secs(parse_or(&lookup, "POLL_INTERVAL_SECS", 3)?);
        let poll_timeout = timeout_secs(&lookup, "POLL_TIMEOUT_SECS", 30)?;
        let submit_timeout = timeout_secs(&lookup, "SUBMIT_TIMEOUT_SECS", 60)?;
        let driver_timeout = timeout_secs(&lookup, "DRIVER_TIMEOUT_SECS", 120)?;
        let driver_shared_context = parse_or(&lookup, "DRIVER_SHARED_CONTEXT", true)?;

        let profile = lookup("DRIVER_PROFILE").unwrap_or_else(|| "fast_settling".into());
        let mut stability = StabilityConfig::profile(&profile)
            .with_context(|| format!("DRIVER_PROFILE '{profile}' is not a known profile"))?;

        if let Some(required) = parse_opt(&lookup, "STABILITY_REQUIRED")? {
            stability.required_stable = required;
        }
        if let Some(max_samples) = parse_opt(&lookup, "STABILITY_MAX_SAMPLES")? {
            stability.max_samples = max_samples;
        }
        if let Some(ms) = parse_opt(&lookup, "STABILITY_INTERVAL_MS")? {
            stability.interval = Duration::from_millis(ms);
        }
        if let Some(min_length) = parse_opt(&lookup, "STABILITY_MIN_LENGTH")? {
            stability.min_length = min_length;
        }
        if let Some(marker) = lookup("STABILITY_END_MARKER") {
            let marker = marker.trim().to_string();
            stability.end_marker = (!marker.is_empty()).then_some(marker);
        }
        if let Some(metric) = lookup("STABILITY_METRIC") {
            stability.metric = SampleMetric::from_str(&metric)
                .map_err(anyhow::Error::msg)
                .context("STABILITY_METRIC")?;
        }

        Ok(Self {
            server_url,
            driver_url,
            max_concurrent_jobs,
            poll_interval,
            poll_timeout,
            submit_timeout,
            driver_timeout,
            driver_shared_context,
            stability,
        })
    }
}

fn parse_opt<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("{key} has an invalid value '{raw}'"))
        })
        .transpose()
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    Ok(parse_opt(lookup, key)?.unwrap_or(default))
}

fn timeout_secs(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> anyhow::Result<Duration> {
    let secs: u64 = parse_or(lookup, key, default)?;
    if secs == 0 {
        bail!("{key} must be at least 1");
    }
    Ok(Duration::from_secs(secs))
}
