use crate::errors::RobotError;
use crate::types::Pos;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

// Default bound on waiting for a single UI action
const DEFAULT_ACTION_TIMEOUT: Duration = Duration::from_secs(5);

pub const ENV_ACTION_TIMEOUT_MS: &str = "SCENEBOT_ACTION_TIMEOUT_MS";
pub const ENV_POS: &str = "SCENEBOT_POS";

/// Robot settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    /// How long to wait for the UI thread to finish one scheduled action
    pub action_timeout_ms: u64,
    /// Anchor used when a target resolves to a region
    pub pos: Pos,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            action_timeout_ms: DEFAULT_ACTION_TIMEOUT.as_millis() as u64,
            pos: Pos::Center,
        }
    }
}

impl RobotConfig {
    pub fn action_timeout(&self) -> Duration {
        Duration::from_millis(self.action_timeout_ms)
    }

    pub fn with_action_timeout(mut self, timeout: Duration) -> Self {
        self.action_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_pos(mut self, pos: Pos) -> Self {
        self.pos = pos;
        self
    }

    pub fn from_json(json: &str) -> Result<Self, RobotError> {
        serde_json::from_str(json)
            .map_err(|e| RobotError::InvalidArgument(format!("Invalid robot config: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self, RobotError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            RobotError::InvalidArgument(format!("Cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    /// Defaults overridden by `SCENEBOT_ACTION_TIMEOUT_MS` and `SCENEBOT_POS`.
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        Self::default().apply_overrides(|name| std::env::var(name).ok())
    }

    fn apply_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_ACTION_TIMEOUT_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => self.action_timeout_ms = ms,
                Err(e) => warn!("Ignoring {}={:?}: {}", ENV_ACTION_TIMEOUT_MS, raw, e),
            }
        }
        if let Some(raw) = lookup(ENV_POS) {
            match raw.parse::<Pos>() {
                Ok(pos) => self.pos = pos,
                Err(e) => warn!("Ignoring {}={:?}: {}", ENV_POS, raw, e),
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = RobotConfig::from_json(r#"{ "pos": "TopLeft" }"#).unwrap();
        assert_eq!(config.pos, Pos::TopLeft);
        assert_eq!(config.action_timeout(), DEFAULT_ACTION_TIMEOUT);
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        let err = RobotConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, RobotError::InvalidArgument(_)));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_ACTION_TIMEOUT_MS, "250"),
            (ENV_POS, "bottom-right"),
        ]
        .into_iter()
        .collect();
        let config = RobotConfig::default()
            .apply_overrides(|name| vars.get(name).map(|v| v.to_string()));
        assert_eq!(config.action_timeout(), Duration::from_millis(250));
        assert_eq!(config.pos, Pos::BottomRight);
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join("scenebot-no-such-config.json");
        let err = RobotConfig::load(&path).unwrap_err();
        assert!(matches!(err, RobotError::InvalidArgument(_)));
        assert!(err.to_string().contains("scenebot-no-such-config.json"));
    }

    #[test]
    fn test_from_env_without_overrides() {
        if std::env::var(ENV_ACTION_TIMEOUT_MS).is_err() && std::env::var(ENV_POS).is_err() {
            assert_eq!(RobotConfig::from_env(), RobotConfig::default());
        }
    }

    #[test]
    fn test_bad_overrides_are_ignored() {
        let config = RobotConfig::default().apply_overrides(|name| match name {
            ENV_ACTION_TIMEOUT_MS => Some("soon".to_string()),
            _ => Some("nowhere".to_string()),
        });
        assert_eq!(config, RobotConfig::default());
    }
}
