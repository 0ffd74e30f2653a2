//! Window sizing policy.

use core::fmt::{self, Display, Formatter};
use std::{env, fs, str::FromStr, sync::OnceLock};

use serde::{Deserialize, Serialize};

/// Inputs that decide how long each mapped window is.
///
/// The analysis pass is bounded by a fraction of system memory so one large
/// file cannot starve the process; every window is bounded by the largest
/// length a single mapping may have.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sizing {
    /// Memory available to the process, in bytes.
    pub system_memory: u64,

    /// The analysis budget is `system_memory / budget_divisor`.
    pub budget_divisor: u64,

    /// Largest length of a single window, in bytes.
    pub max_window: u64,

    /// Forced window length, overriding the memory budget.
    pub window_len: Option<u64>,
}

impl Default for Sizing {
    fn default() -> Self {
        Self {
            system_memory: Self::detect_system_memory(),
            budget_divisor: Self::BUDGET_DIVISOR,
            max_window: Self::MAX_WINDOW,
            window_len: None,
        }
    }
}

impl Sizing {
    /// A quarter of system memory goes to the analysis window.
    pub const BUDGET_DIVISOR: u64 = 4;
    /// A single view is addressed with a signed 32-bit length.
    pub const MAX_WINDOW: u64 = i32::MAX as u64;
    /// Assumed memory when it cannot be detected: 4GB.
    pub const FALLBACK_SYSTEM_MEMORY: u64 = 4 * 1024 * 1024 * 1024;

    // Environment variable names for configuration.
    const ENV_SYSTEM_MEMORY: &str = "DELIMPORT_SYSTEM_MEMORY";
    const ENV_BUDGET_DIVISOR: &str = "DELIMPORT_BUDGET_DIVISOR";
    const ENV_MAX_WINDOW: &str = "DELIMPORT_MAX_WINDOW";
    const ENV_WINDOW_SIZE: &str = "DELIMPORT_WINDOW_SIZE";

    /// Creates a policy from explicit inputs.
    #[must_use]
    pub const fn new(system_memory: u64, max_window: u64) -> Self {
        Self {
            system_memory,
            budget_divisor: Self::BUDGET_DIVISOR,
            max_window,
            window_len: None,
        }
    }

    /// Create sizing configuration from environment variables if present.
    pub fn from_env() -> Self {
        // Parse environment variables only once and cache the result
        static CONFIG: OnceLock<Sizing> = OnceLock::new();

        *CONFIG.get_or_init(|| {
            let system_memory = Self::parse_env_var(Self::ENV_SYSTEM_MEMORY)
                .unwrap_or_else(Self::detect_system_memory);

            Self {
                system_memory,
                budget_divisor: Self::parse_env_var(Self::ENV_BUDGET_DIVISOR)
                    .unwrap_or(Self::BUDGET_DIVISOR),
                max_window: Self::parse_env_var(Self::ENV_MAX_WINDOW).unwrap_or(Self::MAX_WINDOW),
                window_len: Self::parse_env_var(Self::ENV_WINDOW_SIZE),
            }
        })
    }

    /// Set the system memory figure.
    #[must_use]
    pub const fn with_system_memory(mut self, bytes: u64) -> Self {
        self.system_memory = bytes;
        self
    }

    /// Set the divisor applied to system memory for the analysis budget.
    #[must_use]
    pub const fn with_budget_divisor(mut self, divisor: u64) -> Self {
        self.budget_divisor = divisor;
        self
    }

    /// Set the largest single window.
    #[must_use]
    pub const fn with_max_window(mut self, bytes: u64) -> Self {
        self.max_window = bytes;
        self
    }

    /// Force a window length regardless of the memory budget.
    #[must_use]
    pub const fn with_window_len(mut self, bytes: u64) -> Self {
        self.window_len = Some(bytes);
        self
    }

    /// Bytes of memory the analysis window may take.
    #[must_use]
    pub const fn memory_budget(&self) -> u64 {
        if self.budget_divisor == 0 {
            self.system_memory
        } else {
            self.system_memory / self.budget_divisor
        }
    }

    /// Window length for an import that starts with the analysis pass.
    ///
    /// The same length is kept for every later window of that import.
    #[must_use]
    pub fn analysis_window_len(&self, size: u64) -> u64 {
        self.clamp(size, size.min(self.memory_budget()))
    }

    /// Window length for an ingest-only import.
    #[must_use]
    pub fn ingest_window_len(&self, size: u64) -> u64 {
        self.clamp(size, size)
    }

    fn clamp(&self, size: u64, len: u64) -> u64 {
        if size == 0 {
            return 0;
        }

        let len = len.min(self.max_window);
        self.window_len.map_or(len, |forced| len.min(forced)).max(1)
    }

    /// Reads available memory from `/proc/meminfo`, or falls back to 4GB.
    #[must_use]
    pub fn detect_system_memory() -> u64 {
        fs::read_to_string("/proc/meminfo")
            .ok()
            .and_then(|meminfo| {
                Self::meminfo_kb(&meminfo, "MemAvailable:")
                    .or_else(|| Self::meminfo_kb(&meminfo, "MemTotal:"))
            })
            .map_or(Self::FALLBACK_SYSTEM_MEMORY, |kb| kb.saturating_mul(1024))
    }

    fn meminfo_kb(meminfo: &str, key: &str) -> Option<u64> {
        meminfo
            .lines()
            .find_map(|line| line.strip_prefix(key))
            .and_then(|rest| rest.split_whitespace().next())
            .and_then(|kb| kb.parse().ok())
    }

    /// Parse numeric environment variable.
    fn parse_env_var<T: FromStr>(name: &str) -> Option<T> {
        env::var(name).ok().and_then(|value| value.parse().ok())
    }
}

impl Display for Sizing {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sizing {{ system_memory: {}, budget: {}, max_window: {}, window_len: {} }}",
            self.system_memory,
            self.memory_budget(),
            self.max_window,
            self.window_len
                .map_or_else(|| "auto".to_string(), |len| len.to_string())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_window_bounded_by_budget() {
        let sizing = Sizing::new(400, 1000);
        assert_eq!(sizing.analysis_window_len(10), 10);
        assert_eq!(sizing.analysis_window_len(150), 100);
        assert_eq!(sizing.ingest_window_len(150), 150);
    }

    #[test]
    fn test_window_bounded_by_max_window() {
        let sizing = Sizing::new(u64::MAX, 64);
        assert_eq!(sizing.analysis_window_len(1000), 64);
        assert_eq!(sizing.ingest_window_len(1000), 64);
    }

    #[test]
    fn test_forced_window_len() {
        let sizing = Sizing::new(1 << 30, 1 << 20).with_window_len(5);
        assert_eq!(sizing.analysis_window_len(17), 5);
        assert_eq!(sizing.analysis_window_len(3), 3);
        assert_eq!(sizing.analysis_window_len(0), 0);
    }

    #[test]
    fn test_meminfo_parsing() {
        let meminfo = "MemTotal:       16318976 kB\nMemFree:         1000 kB\n";
        assert_eq!(Sizing::meminfo_kb(meminfo, "MemTotal:"), Some(16_318_976));
        assert_eq!(Sizing::meminfo_kb(meminfo, "MemAvailable:"), None);
    }

    #[test]
    fn test_tiny_budget_still_maps_a_byte() {
        let sizing = Sizing::new(0, 1000);
        assert_eq!(sizing.analysis_window_len(10), 1);
    }
}
