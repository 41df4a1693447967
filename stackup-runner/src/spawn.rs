//! Detached process spawning with per-service log redirection.

use stackup_core::{LaunchRecord, Result, ServiceSpec, StackupError};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

/// Create the log directory under the project root. Creating an
/// already-existing directory is not an error.
pub fn ensure_log_dir(project_root: &Path, log_dir: &str) -> Result<PathBuf> {
    let path = project_root.join(log_dir);
    std::fs::create_dir_all(&path)?;
    debug!(path = %path.display(), "Log directory ready");
    Ok(path)
}

/// Build the platform shell invocation for a full command line
fn shell_command(command_line: &str) -> Command {
    if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(command_line);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command_line);
        cmd
    }
}

/// First token of a command line, honoring a quoted program path that
/// contains spaces.
fn first_program(command_line: &str) -> Option<String> {
    let trimmed = command_line.trim_start();
    match trimmed.chars().next()? {
        quote @ ('"' | '\'') => {
            let rest = &trimmed[1..];
            rest.find(quote).map(|end| rest[..end].to_string())
        }
        _ => trimmed.split_whitespace().next().map(|s| s.to_string()),
    }
}

/// Warn when the command's executable cannot be found on PATH. The spawn
/// still proceeds; any failure then lands in the service's log file.
fn preflight_executable(spec: &ServiceSpec) {
    let Some(program) = first_program(&spec.command) else {
        return;
    };
    if which::which(&program).is_err() {
        warn!(
            service = %spec.name,
            program = %program,
            "Executable not found on PATH; the service will likely fail to start"
        );
    }
}

/// Spawn a service as a detached process. The child is not waited on and
/// keeps running after the launcher exits; merged stdout/stderr goes to
/// the service's log file, created fresh for each run.
pub fn spawn_detached(spec: &ServiceSpec, project_root: &Path, log_dir: &str) -> Result<LaunchRecord> {
    preflight_executable(spec);

    let log_rel = spec.log_path(log_dir);
    let log_path = project_root.join(&log_rel);
    let stdout_log = File::create(&log_path).map_err(|e| StackupError::Spawn {
        service: spec.name.clone(),
        reason: format!("cannot create log file {}: {}", log_path.display(), e),
    })?;
    let stderr_log = stdout_log.try_clone().map_err(|e| StackupError::Spawn {
        service: spec.name.clone(),
        reason: format!("cannot duplicate log handle: {}", e),
    })?;

    let child = shell_command(&spec.command)
        .current_dir(project_root)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout_log))
        .stderr(Stdio::from(stderr_log))
        .spawn()
        .map_err(|e| StackupError::Spawn {
            service: spec.name.clone(),
            reason: e.to_string(),
        })?;

    let pid = child.id();
    info!(service = %spec.name, pid, log = %log_rel, "Service spawned");

    Ok(LaunchRecord {
        service: spec.name.clone(),
        pid,
        log_file: log_rel,
        started_at: chrono::Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn wait_for_log(path: &Path) -> String {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Ok(content) = std::fs::read_to_string(path) {
                if !content.is_empty() {
                    return content;
                }
            }
            if Instant::now() > deadline {
                panic!("log file {} never got content", path.display());
            }
            std::thread::sleep(Duration::from_millis(20));
        }
    }

    #[test]
    fn test_first_program_plain() {
        assert_eq!(
            first_program("litellm --port 8000").as_deref(),
            Some("litellm")
        );
    }

    #[test]
    fn test_first_program_quoted_path_with_spaces() {
        assert_eq!(
            first_program(r#""C:\Program Files\litellm\litellm.exe" --port 8000"#).as_deref(),
            Some(r"C:\Program Files\litellm\litellm.exe")
        );
        assert_eq!(
            first_program("'/opt/my tools/run' --flag").as_deref(),
            Some("/opt/my tools/run")
        );
    }

    #[test]
    fn test_first_program_empty() {
        assert_eq!(first_program(""), None);
        assert_eq!(first_program("   "), None);
    }

    #[test]
    fn test_ensure_log_dir_creates() {
        let dir = tempfile::tempdir().unwrap();
        let path = ensure_log_dir(dir.path(), "logs").unwrap();
        assert!(path.is_dir());
    }

    #[test]
    fn test_ensure_log_dir_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let first = ensure_log_dir(dir.path(), "logs").unwrap();
        let second = ensure_log_dir(dir.path(), "logs").unwrap();
        assert_eq!(first, second);
        assert!(second.is_dir());
    }

    #[test]
    fn test_spawn_writes_merged_output_to_log() {
        let dir = tempfile::tempdir().unwrap();
        ensure_log_dir(dir.path(), "logs").unwrap();

        let spec = ServiceSpec::new("echoer", "echo out; echo err 1>&2");
        let record = spawn_detached(&spec, dir.path(), "logs").unwrap();
        assert_eq!(record.service, "echoer");
        assert_eq!(record.log_file, "logs/echoer.log");

        let content = wait_for_log(&dir.path().join("logs/echoer.log"));
        assert!(content.contains("out"));
        assert!(content.contains("err"));
    }

    #[test]
    fn test_spawn_missing_command_is_fire_and_forget() {
        let dir = tempfile::tempdir().unwrap();
        ensure_log_dir(dir.path(), "logs").unwrap();

        // The shell starts fine; the failure lands in the log, not here.
        let spec = ServiceSpec::new("ghost", "definitely-not-a-real-command-xyz");
        let record = spawn_detached(&spec, dir.path(), "logs").unwrap();
        assert!(record.pid > 0);
    }

    #[test]
    fn test_spawn_runs_in_project_root() {
        let dir = tempfile::tempdir().unwrap();
        ensure_log_dir(dir.path(), "logs").unwrap();

        let spec = ServiceSpec::new("pwd", "pwd");
        spawn_detached(&spec, dir.path(), "logs").unwrap();

        let content = wait_for_log(&dir.path().join("logs/pwd.log"));
        let reported = PathBuf::from(content.trim());
        assert_eq!(
            reported.canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }
}
