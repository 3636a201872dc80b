//! Injector configuration.
//!
//! Options can be set in code, read from the environment, or (with the
//! `config` feature) deserialized with serde.

use std::env;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

/// Environment variable prefix read by [`InjectorOptions::from_env`].
pub const ENV_PREFIX: &str = "FERROUS_INJECT";

/// Options applied while an injector is built.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::InjectorOptions;
///
/// let options = InjectorOptions::new().detect_cycles(false);
/// assert!(!options.detects_cycles());
/// assert!(options.resolves_eager());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct InjectorOptions {
    /// Search the graph for cycles at construction time
    pub detect_cycles: bool,
    /// Resolve the modules' eager keys at construction time
    pub resolve_eager: bool,
}

impl Default for InjectorOptions {
    fn default() -> Self {
        Self {
            detect_cycles: true,
            resolve_eager: true,
        }
    }
}

impl InjectorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn detect_cycles(mut self, enabled: bool) -> Self {
        self.detect_cycles = enabled;
        self
    }

    pub fn resolve_eager(mut self, enabled: bool) -> Self {
        self.resolve_eager = enabled;
        self
    }

    pub fn detects_cycles(&self) -> bool {
        self.detect_cycles
    }

    pub fn resolves_eager(&self) -> bool {
        self.resolve_eager
    }

    /// Defaults overridden by `FERROUS_INJECT_DETECT_CYCLES` and
    /// `FERROUS_INJECT_RESOLVE_EAGER`.
    ///
    /// Accepts `true/false`, `1/0`, `yes/no` and `on/off`; anything else is
    /// ignored with a warning.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            detect_cycles: env_flag("DETECT_CYCLES").unwrap_or(defaults.detect_cycles),
            resolve_eager: env_flag("RESOLVE_EAGER").unwrap_or(defaults.resolve_eager),
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let var = format!("{}_{}", ENV_PREFIX, name);
    let value = env::var(&var).ok()?;
    match parse_flag(&value) {
        Some(flag) => Some(flag),
        None => {
            tracing::warn!(variable = %var, value = %value, "ignoring unrecognized flag value");
            None
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_enable_everything() {
        let options = InjectorOptions::default();
        assert!(options.detect_cycles);
        assert!(options.resolve_eager);
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag(" On "), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("NO"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
