//! Property-test run profile driven by environment overrides.
//!
//! Suites across the workspace read the same variables so CI can raise case
//! counts or enable forking without touching individual tests.

use std::env;

/// Environment variable overriding the number of proptest cases.
pub const SITEGRAPH_PBT_CASES_ENV_KEY: &str = "SITEGRAPH_PBT_CASES";
/// Environment variable toggling forked proptest execution.
pub const SITEGRAPH_PBT_FORK_ENV_KEY: &str = "SITEGRAPH_PBT_FORK";

/// Resolved proptest settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProptestRunProfile {
    cases: u32,
    fork: bool,
}

impl ProptestRunProfile {
    /// Loads the profile, falling back to the given defaults for absent or
    /// malformed overrides.
    ///
    /// # Examples
    ///
    /// ```
    /// use sitegraph_test_support::ci::property_test_profile::ProptestRunProfile;
    ///
    /// let profile = ProptestRunProfile::load(32, false);
    /// assert!(profile.cases() > 0);
    /// ```
    #[must_use]
    pub fn load(default_cases: u32, default_fork: bool) -> Self {
        Self {
            cases: override_or(SITEGRAPH_PBT_CASES_ENV_KEY, default_cases, parse_cases),
            fork: override_or(SITEGRAPH_PBT_FORK_ENV_KEY, default_fork, parse_flag),
        }
    }

    /// Returns the number of cases each property runs.
    #[must_use]
    pub fn cases(&self) -> u32 {
        self.cases
    }

    /// Returns whether each case runs in a forked process.
    #[must_use]
    pub fn fork(&self) -> bool {
        self.fork
    }
}

fn override_or<T: Copy>(key: &'static str, default: T, parse: fn(&str) -> Result<T, String>) -> T {
    let Ok(raw) = env::var(key) else {
        return default;
    };
    parse(&raw).unwrap_or_else(|reason| {
        tracing::warn!(
            env = key,
            raw = %raw,
            reason = %reason,
            "ignoring malformed property-test override",
        );
        default
    })
}

fn parse_cases(raw: &str) -> Result<u32, String> {
    match raw.trim().parse::<u32>() {
        Ok(0) => Err("cases must be positive".to_owned()),
        Ok(cases) => Ok(cases),
        Err(error) => Err(format!("not a case count: {error}")),
    }
}

fn parse_flag(raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(format!("`{other}` is not a boolean flag")),
    }
}
