use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// How many faculty groups each course must receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CoveragePolicy {
    /// Every course is taught by exactly one faculty member.
    ExactlyOne,
    /// Every course gets between its `min_groups` and `max_groups` faculty.
    BoundedGroups,
}

/// Workload and coverage settings for one exact solve.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AllocationConfig {
    /// Credit cap per faculty member within a single period.
    pub trimester_limit: i64,
    pub annual_min: i64,
    pub annual_max: i64,
    pub coverage_policy: CoveragePolicy,
    /// Forbid a faculty member from ending up with no course at all.
    pub require_min_faculty_load: bool,
    /// Let HiGHS write its own log to the console.
    pub solver_log: bool,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            trimester_limit: 6,
            annual_min: 10,
            annual_max: 16,
            coverage_policy: CoveragePolicy::BoundedGroups,
            require_min_faculty_load: true,
            solver_log: false,
        }
    }
}

impl AllocationConfig {
    pub fn new(trimester_limit: i64, annual_min: i64, annual_max: i64) -> Self {
        Self {
            trimester_limit,
            annual_min,
            annual_max,
            ..Self::default()
        }
    }

    pub fn with_coverage(mut self, policy: CoveragePolicy) -> Self {
        self.coverage_policy = policy;
        self
    }

    pub fn with_min_faculty_load(mut self, required: bool) -> Self {
        self.require_min_faculty_load = required;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("trimester_limit", self.trimester_limit),
            ("annual_min", self.annual_min),
            ("annual_max", self.annual_max),
        ] {
            if value < 0 {
                return Err(ConfigError::NegativeLimit { name, value });
            }
        }
        if self.annual_min > self.annual_max {
            return Err(ConfigError::AnnualBandInverted {
                min: self.annual_min,
                max: self.annual_max,
            });
        }
        Ok(())
    }
}

/// Settings for the Monte Carlo baseline.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeuristicConfig {
    pub trials: usize,
    /// Fixed seed for reproducible runs; entropy when absent.
    pub seed: Option<u64>,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            trials: 1000,
            seed: None,
        }
    }
}

impl HeuristicConfig {
    pub fn seeded(trials: usize, seed: u64) -> Self {
        Self {
            trials,
            seed: Some(seed),
        }
    }
}

/// Settings of the HTTP front end, taken from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Wall-clock bound on one exact solve.
    pub solve_timeout: Duration,
}

pub const ADDR_VAR: &str = "ALLOCATOR_ADDR";
pub const TIMEOUT_VAR: &str = "ALLOCATOR_SOLVE_TIMEOUT_SECS";

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            solve_timeout: Duration::from_secs(60),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unparseable values fall back to the defaults with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let addr = match lookup(ADDR_VAR) {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                log::warn!("ignoring {}={:?}: {}", ADDR_VAR, raw, e);
                defaults.addr
            }),
            None => defaults.addr,
        };

        let solve_timeout = match lookup(TIMEOUT_VAR) {
            Some(raw) => raw
                .parse::<u64>()
                .map(Duration::from_secs)
                .unwrap_or_else(|e| {
                    log::warn!("ignoring {}={:?}: {}", TIMEOUT_VAR, raw, e);
                    defaults.solve_timeout
                }),
            None => defaults.solve_timeout,
        };

        Self {
            addr,
            solve_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_dashboard_limits() {
        let config = AllocationConfig::default();
        assert_eq!(config.trimester_limit, 6);
        assert_eq!(config.annual_min, 10);
        assert_eq!(config.annual_max, 16);
        assert!(config.require_min_faculty_load);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_inverted_band_and_negative_limits() {
        assert_eq!(
            AllocationConfig::new(6, 12, 10).validate(),
            Err(ConfigError::AnnualBandInverted { min: 12, max: 10 })
        );
        assert_eq!(
            AllocationConfig::new(-1, 0, 10).validate(),
            Err(ConfigError::NegativeLimit {
                name: "trimester_limit",
                value: -1
            })
        );
    }

    #[test]
    fn deserializes_partial_config() {
        let config: AllocationConfig =
            serde_json::from_str(r#"{"trimesterLimit": 8, "coveragePolicy": "exactlyOne"}"#)
                .unwrap();
        assert_eq!(config.trimester_limit, 8);
        assert_eq!(config.annual_max, 16);
        assert_eq!(config.coverage_policy, CoveragePolicy::ExactlyOne);
    }

    #[test]
    fn server_config_from_lookup() {
        let config = ServerConfig::from_lookup(|key| match key {
            ADDR_VAR => Some("0.0.0.0:9000".to_string()),
            TIMEOUT_VAR => Some("5".to_string()),
            _ => None,
        });
        assert_eq!(config.addr, SocketAddr::from(([0, 0, 0, 0], 9000)));
        assert_eq!(config.solve_timeout, Duration::from_secs(5));

        let fallback = ServerConfig::from_lookup(|_| Some("nonsense".to_string()));
        assert_eq!(fallback, ServerConfig::default());
    }
}
