//! Runtime configuration loaded from the process environment.
//!
//! TODO: Validate that the bind address parses before the artifacts are loaded.

use std::env;

/// Default artifact locations, relative to the working directory.
pub const DEFAULT_MODEL_PATH: &str = "water_potability_model.json";
pub const DEFAULT_SCALER_PATH: &str = "scaler.json";
pub const DEFAULT_BIND: &str = "127.0.0.1:5000";

/// Snapshot of configuration values consumed by the service.
#[derive(Clone, Debug)]
pub struct AppCfg {
    pub model_path: String,
    pub scaler_path: String,
    pub bind_addr: String,
    /// `tracing_subscriber::EnvFilter` directive, e.g. `info` or `potability=debug`.
    pub log_filter: String,
}

impl AppCfg {
    /// Create a configuration snapshot from the process environment.
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a snapshot from an arbitrary key lookup; unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_or = |key: &str, default: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            model_path: env_or("POTABILITY_MODEL_PATH", DEFAULT_MODEL_PATH),
            scaler_path: env_or("POTABILITY_SCALER_PATH", DEFAULT_SCALER_PATH),
            bind_addr: env_or("POTABILITY_BIND", DEFAULT_BIND),
            log_filter: env_or("POTABILITY_LOG", "info"),
        }
    }
}

impl Default for AppCfg {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_use_fixed_relative_paths() {
        let cfg = AppCfg::default();
        assert_eq!(cfg.model_path, "water_potability_model.json");
        assert_eq!(cfg.scaler_path, "scaler.json");
        assert_eq!(cfg.bind_addr, "127.0.0.1:5000");
        assert_eq!(cfg.log_filter, "info");
    }

    #[test]
    fn environment_overrides_defaults() {
        let vars: HashMap<&str, &str> = [
            ("POTABILITY_MODEL_PATH", "/srv/models/rf.json"),
            ("POTABILITY_BIND", "0.0.0.0:8080"),
            ("POTABILITY_LOG", "  "),
        ]
        .into_iter()
        .collect();

        let cfg = AppCfg::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(cfg.model_path, "/srv/models/rf.json");
        assert_eq!(cfg.scaler_path, DEFAULT_SCALER_PATH);
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080");
        // blank values count as unset
        assert_eq!(cfg.log_filter, "info");
    }
}
