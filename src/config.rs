use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::model::UserId;

/// Runtime settings, read from `RENTBOOK_*` environment variables.
/// Unset or unparsable values fall back to the defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub metrics_port: Option<u16>,
    /// Compact the WAL once this many events were appended since the last compaction.
    pub compact_threshold: u64,
    pub compact_interval: Duration,
    /// Sessions opened at startup, as `(token, user_id)`.
    pub sessions: Vec<(String, UserId)>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            metrics_port: None,
            compact_threshold: 1000,
            compact_interval: Duration::from_secs(30),
            sessions: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            bind: lookup("RENTBOOK_BIND").unwrap_or(defaults.bind),
            port: parse_var(&lookup, "RENTBOOK_PORT").unwrap_or(defaults.port),
            data_dir: lookup("RENTBOOK_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            metrics_port: parse_var(&lookup, "RENTBOOK_METRICS_PORT"),
            compact_threshold: parse_var(&lookup, "RENTBOOK_COMPACT_THRESHOLD")
                .unwrap_or(defaults.compact_threshold),
            // A zero period would stall the compactor; fall back instead.
            compact_interval: parse_var::<u64>(&lookup, "RENTBOOK_COMPACT_INTERVAL_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.compact_interval),
            sessions: lookup("RENTBOOK_SESSIONS")
                .map(|s| parse_sessions(&s))
                .unwrap_or_default(),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn wal_path(&self) -> PathBuf {
        self.data_dir.join("bookings.wal")
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|s| s.trim().parse().ok())
}

/// Parse `token:user_id` pairs separated by commas. Malformed entries are skipped.
pub fn parse_sessions(raw: &str) -> Vec<(String, UserId)> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| {
            let parsed = entry
                .split_once(':')
                .and_then(|(token, user)| Some((token.trim(), user.trim().parse::<UserId>().ok()?)))
                .filter(|(token, _)| !token.is_empty());
            if parsed.is_none() {
                tracing::warn!("ignoring malformed session entry {entry:?}");
            }
            parsed.map(|(token, user)| (token.to_string(), user))
        })
        .collect()
}
