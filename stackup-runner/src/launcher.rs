use crate::{process, readiness, spawn, state::StateFile};
use stackup_config::StackConfig;
use stackup_core::{
    LaunchOutcome, LaunchRecord, LaunchReport, ReadinessOutcome, Result, ServiceStatus,
    StackState, StackupError,
};
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// Runs the launch sequence for a configured stack
#[derive(Clone)]
pub struct StackLauncher {
    config: StackConfig,
}

impl StackLauncher {
    pub fn new(config: StackConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    /// Launch every service in declaration order.
    ///
    /// The sequence is strictly linear: verify the project root, create
    /// the log directory, then for each service spawn it detached and
    /// either probe its readiness or sleep the configured delay. Spawned
    /// processes are recorded in the state file and outlive the launcher,
    /// including the ones already started when a later spawn fails.
    pub async fn launch(&self) -> Result<LaunchReport> {
        let root = &self.config.project_root;
        if !root.is_dir() {
            return Err(StackupError::DirectoryAccess {
                path: root.display().to_string(),
            });
        }

        let launch_id = Uuid::new_v4();
        info!(
            launch_id = %launch_id,
            project_root = %root.display(),
            services = self.config.services.len(),
            "Starting stack launch"
        );

        spawn::ensure_log_dir(root, &self.config.log_dir)?;

        let mut state = StackState::new(root.display().to_string());
        state.launch_id = launch_id;
        let mut outcomes = Vec::new();

        for service in &self.config.services {
            info!(service = %service.name, "Launching service");
            let record = match spawn::spawn_detached(service, root, &self.config.log_dir) {
                Ok(record) => record,
                Err(e) => {
                    // Anything already spawned keeps running; record it so
                    // `down` can still find and stop it.
                    if !state.records.is_empty() {
                        if let Err(save_err) = StateFile::for_project(root).save(&state) {
                            warn!(error = %save_err, "Could not persist partial launch state");
                        }
                    }
                    return Err(e);
                }
            };

            let readiness_outcome = self.await_service(service).await;
            outcomes.push(LaunchOutcome {
                service: record.service.clone(),
                pid: record.pid,
                log_file: record.log_file.clone(),
                readiness: readiness_outcome,
            });
            state.records.push(record);
        }

        StateFile::for_project(root).save(&state)?;

        info!(launch_id = %launch_id, "Stack launch completed");
        Ok(LaunchReport {
            launch_id,
            started_at: state.started_at,
            outcomes,
        })
    }

    /// Wait for a freshly spawned service: poll its health URL when it
    /// has one, else its port, otherwise fall back to the fixed delay.
    /// A probe timeout is loud but never aborts the remaining launches.
    async fn await_service(&self, service: &stackup_core::ServiceSpec) -> ReadinessOutcome {
        if self.config.readiness.enabled {
            let probed = if let Some(url) = &service.health_url {
                Some(readiness::wait_for_http(&service.name, url, &self.config.readiness).await)
            } else if let Some(port) = service.port {
                Some(readiness::wait_for_port(&service.name, port, &self.config.readiness).await)
            } else {
                None
            };

            if let Some(result) = probed {
                return match result {
                    Ok(()) => ReadinessOutcome::Ready,
                    Err(e) => {
                        warn!(
                            service = %service.name,
                            error = %e,
                            "Service never became ready; continuing anyway, check its log"
                        );
                        ReadinessOutcome::TimedOut
                    }
                };
            }
        }

        if self.config.startup_delay_secs > 0 {
            tokio::time::sleep(Duration::from_secs(self.config.startup_delay_secs)).await;
        }
        ReadinessOutcome::NotProbed
    }
}

/// Liveness of a single recorded service
pub fn service_status(record: &LaunchRecord) -> ServiceStatus {
    match process::process_exists(record.pid) {
        Ok(true) => ServiceStatus::Running,
        Ok(false) => ServiceStatus::Stopped,
        Err(_) => ServiceStatus::Unknown,
    }
}

/// Stop whatever the last launch recorded and clear the state file once
/// everything is down. A missing state file means nothing was launched:
/// that is a no-op success, not an error.
pub fn stop_stack(project_root: &std::path::Path) -> Result<Vec<(String, Result<()>)>> {
    let state_file = StateFile::for_project(project_root);
    if !state_file.exists() {
        info!(project_root = %project_root.display(), "No recorded launch, nothing to stop");
        return Ok(Vec::new());
    }

    let state = state_file.load()?;
    let results = stop_recorded(&state);
    if results.iter().all(|(_, result)| result.is_ok()) {
        state_file.clear()?;
    }
    Ok(results)
}

/// Stop every process recorded in the state, in reverse launch order.
/// Already-exited processes count as stopped.
pub fn stop_recorded(state: &StackState) -> Vec<(String, Result<()>)> {
    let mut results = Vec::new();
    for record in state.records.iter().rev() {
        let result = match process::process_exists(record.pid) {
            Ok(false) => {
                info!(service = %record.service, pid = record.pid, "Already stopped");
                Ok(())
            }
            _ => {
                info!(service = %record.service, pid = record.pid, "Stopping");
                process::terminate(record.pid)
            }
        };
        results.push((record.service.clone(), result));
    }
    results
}
