//! Harness settings that come from the test runner's environment.
//!
//! The library functions never read the environment themselves; callers
//! build a `HarnessConfig` (usually with `from_env`) and pass values down.

use std::env;
use std::path::PathBuf;

use crate::ports::find_unique_port;

/// Unique per running test; used as the fallback port identity.
pub const SANDBOX_VAR: &str = "TEXTTEST_SANDBOX";
/// Root of the test suite, where server entry points usually live.
pub const HOME_VAR: &str = "TEXTTEST_HOME";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    pub sandbox: Option<String>,
    pub home: PathBuf,
}

impl HarnessConfig {
    /// Read `TEXTTEST_SANDBOX` and `TEXTTEST_HOME`. Home falls back to the
    /// current directory, then to `.`.
    pub fn from_env() -> Self {
        Self::resolve(
            env::var(SANDBOX_VAR).ok(),
            env::var_os(HOME_VAR).map(PathBuf::from),
            env::current_dir().ok(),
        )
    }

    fn resolve(sandbox: Option<String>, home: Option<PathBuf>, cwd: Option<PathBuf>) -> Self {
        Self {
            sandbox: sandbox.filter(|s| !s.is_empty()),
            home: home.or(cwd).unwrap_or_else(|| PathBuf::from(".")),
        }
    }

    /// Port for `identity`, or for the sandbox when no identity is given.
    pub fn unique_port(&self, identity: Option<&str>, minimum_port: u16) -> u16 {
        find_unique_port(identity.or(self.sandbox.as_deref()), minimum_port)
    }
}
