//! Engine configuration consumed from the environment
//!
//! The only configurable switch is whether the custom-transform extension
//! point of the filter engine is reachable at all; it defaults to disabled.

use serde::{Deserialize, Serialize};

/// Environment variable gating the custom-transform extension point
pub const CUSTOM_TRANSFORMS_ENV: &str = "SQA_ENABLE_CUSTOM_TRANSFORMS";

/// Configuration for the filter engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Whether named custom transforms may be registered and dispatched
    pub allow_custom_transforms: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            allow_custom_transforms: false,
        }
    }
}

impl EngineConfig {
    /// Read the configuration from the process environment
    pub fn from_env() -> Self {
        let flag = std::env::var(CUSTOM_TRANSFORMS_ENV).ok();
        EngineConfig {
            allow_custom_transforms: parse_flag(flag.as_deref()),
        }
    }
}

fn parse_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1") | Some("true") | Some("yes") | Some("on")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_disabled() {
        assert!(!EngineConfig::default().allow_custom_transforms);
    }

    #[test]
    fn test_flag_parsing() {
        assert!(parse_flag(Some("true")));
        assert!(parse_flag(Some("1")));
        assert!(parse_flag(Some(" TRUE ")));
        assert!(parse_flag(Some("on")));
        assert!(!parse_flag(Some("false")));
        assert!(!parse_flag(Some("0")));
        assert!(!parse_flag(Some("")));
        assert!(!parse_flag(None));
    }
}
