//! Configuration for the fixture loader.
//!
//! - FixtureConfig::from_env() reads SNAPFIX_* variables;
//! - Default does not touch the environment;
//! - with_* setters override single fields (builder-style).
//!
//! Variables:
//! - SNAPFIX_EVICT_STALE = 0|1|true|false|on|off|yes|no (default false)
//! - SNAPFIX_LOG_HITS    = same (default true)

use std::fmt;

#[derive(Clone, Debug)]
pub struct FixtureConfig {
    /// Evict the cached entry when its snapshot turns out to be stale
    /// on restore. The next call with the same key then re-runs the fixture.
    /// When false the entry stays and every later hit fails the same way.
    /// Env: SNAPFIX_EVICT_STALE (default false)
    pub evict_stale: bool,

    /// Log cache hits at debug level.
    /// Env: SNAPFIX_LOG_HITS (default true)
    pub log_hits: bool,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            evict_stale: false,
            log_hits: true,
        }
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

impl FixtureConfig {
    /// Defaults overridden by whatever SNAPFIX_* variables are set.
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Some(on) = std::env::var("SNAPFIX_EVICT_STALE").ok().as_deref().and_then(parse_bool) {
            cfg.evict_stale = on;
        }
        if let Some(on) = std::env::var("SNAPFIX_LOG_HITS").ok().as_deref().and_then(parse_bool) {
            cfg.log_hits = on;
        }

        cfg
    }

    pub fn with_evict_stale(mut self, on: bool) -> Self {
        self.evict_stale = on;
        self
    }

    pub fn with_log_hits(mut self, on: bool) -> Self {
        self.log_hits = on;
        self
    }

    /// Finish the builder and obtain the configuration.
    pub fn build(self) -> Self {
        self
    }
}

impl fmt::Display for FixtureConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FixtureConfig {{ evict_stale: {}, log_hits: {} }}",
            self.evict_stale, self.log_hits
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bool_variants() {
        for s in ["1", "true", "ON", " yes "] {
            assert_eq!(parse_bool(s), Some(true), "{s}");
        }
        for s in ["0", "false", "Off", "no"] {
            assert_eq!(parse_bool(s), Some(false), "{s}");
        }
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn builder_overrides_defaults() {
        let cfg = FixtureConfig::default()
            .with_evict_stale(true)
            .with_log_hits(false)
            .build();
        assert!(cfg.evict_stale);
        assert!(!cfg.log_hits);
        assert_eq!(
            cfg.to_string(),
            "FixtureConfig { evict_stale: true, log_hits: false }"
        );
    }
}
