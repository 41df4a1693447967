use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Definition of one service the launcher starts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceSpec {
    pub name: String,
    /// Full shell command line, executed via the platform shell
    pub command: String,
    /// TCP port the service listens on once ready (enables readiness probing)
    #[serde(default)]
    pub port: Option<u16>,
    /// Health endpoint polled for readiness; takes precedence over `port`
    #[serde(default)]
    pub health_url: Option<String>,
    /// Log file path relative to the project root; defaults to logs/<name>.log
    #[serde(default)]
    pub log_file: Option<String>,
}

impl ServiceSpec {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            port: None,
            health_url: None,
            log_file: None,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_health_url(mut self, url: impl Into<String>) -> Self {
        self.health_url = Some(url.into());
        self
    }

    /// Log file path relative to the project root
    pub fn log_path(&self, log_dir: &str) -> String {
        self.log_file
            .clone()
            .unwrap_or_else(|| format!("{}/{}.log", log_dir, self.name))
    }

    /// Local endpoint URL, if the service declares a port
    pub fn endpoint(&self) -> Option<String> {
        self.port.map(|p| format!("http://localhost:{}", p))
    }
}

/// Outcome of the readiness step that follows a spawn
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReadinessOutcome {
    /// Probe succeeded within the timeout
    Ready,
    /// Probe never saw the port accept a connection
    TimedOut,
    /// No port declared or probing disabled; a fixed delay was used instead
    NotProbed,
}

/// Result of launching a single service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchOutcome {
    pub service: String,
    pub pid: u32,
    pub log_file: String,
    pub readiness: ReadinessOutcome,
}

/// A spawned process as recorded in the state file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LaunchRecord {
    pub service: String,
    pub pid: u32,
    pub log_file: String,
    pub started_at: DateTime<Utc>,
}

/// Everything one `up` run started, persisted so `down` and `status`
/// can find the processes later
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StackState {
    pub launch_id: Uuid,
    pub project_root: String,
    pub started_at: DateTime<Utc>,
    pub records: Vec<LaunchRecord>,
}

impl StackState {
    pub fn new(project_root: impl Into<String>) -> Self {
        Self {
            launch_id: Uuid::new_v4(),
            project_root: project_root.into(),
            started_at: Utc::now(),
            records: Vec::new(),
        }
    }
}

/// Liveness of a recorded service, as reported by `status`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ServiceStatus {
    Running,
    Stopped,
    Unknown,
}

/// Summary of a full launch sequence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchReport {
    pub launch_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub outcomes: Vec<LaunchOutcome>,
}
