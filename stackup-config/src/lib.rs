//! Stack configuration: a TOML file describing the project root, the
//! services to launch, and how readiness is checked between spawns.

use serde::{Deserialize, Serialize};
use stackup_core::{Result, ServiceSpec, StackupError};
use std::path::{Path, PathBuf};

/// Environment variable that overrides `project_root` from the file
pub const PROJECT_ROOT_ENV: &str = "STACKUP_PROJECT_ROOT";

/// Default config file name, looked up in the current directory
pub const DEFAULT_CONFIG_FILE: &str = "stackup.toml";

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_startup_delay_secs() -> u64 {
    5
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_poll_interval_ms() -> u64 {
    250
}

/// Readiness probe settings, shared by all services that declare a port
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReadinessConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: default_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StackConfig {
    /// Directory every service runs from
    pub project_root: PathBuf,

    /// Log directory, relative to the project root
    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    /// Inter-spawn delay used when a service has no port to probe
    #[serde(default = "default_startup_delay_secs")]
    pub startup_delay_secs: u64,

    #[serde(default)]
    pub readiness: ReadinessConfig,

    /// URL opened in the default browser after all services are up
    #[serde(default)]
    pub browser_url: Option<String>,

    #[serde(default, rename = "service")]
    pub services: Vec<ServiceSpec>,
}

impl StackConfig {
    /// Parse a config from TOML text and validate it
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: StackConfig = toml::from_str(input)
            .map_err(|e| StackupError::InvalidConfiguration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file, apply the environment override, validate
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            StackupError::InvalidConfiguration(format!(
                "Failed to read config at {}: {}",
                path.display(),
                e
            ))
        })?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_root_override(std::env::var(PROJECT_ROOT_ENV).ok());
        Ok(config)
    }

    /// Replace `project_root` when an override is present
    pub fn apply_root_override(&mut self, root: Option<String>) {
        if let Some(root) = root {
            if !root.is_empty() {
                self.project_root = PathBuf::from(root);
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.project_root.as_os_str().is_empty() {
            return Err(StackupError::InvalidConfiguration(
                "project_root must not be empty".to_string(),
            ));
        }
        if self.services.is_empty() {
            return Err(StackupError::InvalidConfiguration(
                "at least one [[service]] must be defined".to_string(),
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for service in &self.services {
            if service.name.is_empty() {
                return Err(StackupError::InvalidConfiguration(
                    "service name must not be empty".to_string(),
                ));
            }
            if service.command.trim().is_empty() {
                return Err(StackupError::InvalidConfiguration(format!(
                    "service '{}' has an empty command",
                    service.name
                )));
            }
            if !seen.insert(service.name.clone()) {
                return Err(StackupError::InvalidConfiguration(format!(
                    "duplicate service name '{}'",
                    service.name
                )));
            }
        }
        Ok(())
    }
}

/// Template written by `stackup init`
pub const CONFIG_TEMPLATE: &str = r#"# stackup.toml - local assistant stack definition

# Directory all services run from. Override with STACKUP_PROJECT_ROOT.
project_root = "."

# Log directory, relative to project_root. Created if missing.
log_dir = "logs"

# Delay between spawns for services without a port to probe.
startup_delay_secs = 5

# Opened in the default browser once everything is started.
browser_url = "http://localhost:8501"

[readiness]
enabled = true
timeout_secs = 30
poll_interval_ms = 250

[[service]]
name = "proxy"
command = "litellm --config litellm_config.yaml --port 8000"
port = 8000
# Polled instead of the bare port when set:
# health_url = "http://localhost:8000/health"

[[service]]
name = "gui"
command = "streamlit run gui/app.py --server.port 8501"
port = 8501
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_parses() {
        let config = StackConfig::from_toml_str(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.services.len(), 2);
        assert_eq!(config.services[0].name, "proxy");
        assert_eq!(config.services[1].name, "gui");
        assert_eq!(config.services[0].port, Some(8000));
        assert_eq!(config.services[1].port, Some(8501));
        assert_eq!(config.browser_url.as_deref(), Some("http://localhost:8501"));
    }

    #[test]
    fn test_defaults_applied() {
        let config = StackConfig::from_toml_str(
            r#"
project_root = "/opt/assistant"

[[service]]
name = "proxy"
command = "litellm --port 8000"
"#,
        )
        .unwrap();
        assert_eq!(config.log_dir, "logs");
        assert_eq!(config.startup_delay_secs, 5);
        assert!(config.readiness.enabled);
        assert_eq!(config.readiness.timeout_secs, 30);
        assert!(config.browser_url.is_none());
    }

    #[test]
    fn test_health_url_parsed() {
        let config = StackConfig::from_toml_str(
            r#"
project_root = "/opt/assistant"

[[service]]
name = "proxy"
command = "litellm --port 8000"
port = 8000
health_url = "http://localhost:8000/health"
"#,
        )
        .unwrap();
        assert_eq!(
            config.services[0].health_url.as_deref(),
            Some("http://localhost:8000/health")
        );
    }

    #[test]
    fn test_invalid_toml_rejected() {
        let err = StackConfig::from_toml_str("project_root = [broken").unwrap_err();
        assert!(matches!(err, StackupError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_no_services_rejected() {
        let err = StackConfig::from_toml_str(r#"project_root = "/tmp""#).unwrap_err();
        assert!(matches!(err, StackupError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_duplicate_service_names_rejected() {
        let err = StackConfig::from_toml_str(
            r#"
project_root = "/tmp"

[[service]]
name = "proxy"
command = "a"

[[service]]
name = "proxy"
command = "b"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, StackupError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_empty_command_rejected() {
        let err = StackConfig::from_toml_str(
            r#"
project_root = "/tmp"

[[service]]
name = "proxy"
command = "  "
"#,
        )
        .unwrap_err();
        assert!(matches!(err, StackupError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_root_override() {
        let mut config = StackConfig::from_toml_str(CONFIG_TEMPLATE).unwrap();
        config.apply_root_override(Some("/srv/stack".to_string()));
        assert_eq!(config.project_root, PathBuf::from("/srv/stack"));

        config.apply_root_override(None);
        assert_eq!(config.project_root, PathBuf::from("/srv/stack"));

        config.apply_root_override(Some(String::new()));
        assert_eq!(config.project_root, PathBuf::from("/srv/stack"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stackup.toml");
        std::fs::write(&path, CONFIG_TEMPLATE).unwrap();
        let config = StackConfig::load(&path).unwrap();
        assert_eq!(config.services.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let err = StackConfig::load("/no/such/stackup.toml").unwrap_err();
        assert!(matches!(err, StackupError::InvalidConfiguration(_)));
    }
}
