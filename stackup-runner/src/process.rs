//! Cross-platform liveness checks and termination for recorded PIDs.

use stackup_core::{Result, StackupError};

/// Check whether a process with the given PID is still running.
pub fn process_exists(pid: u32) -> Result<bool> {
    #[cfg(unix)]
    {
        use nix::errno::Errno;
        use nix::sys::signal::kill;
        use nix::unistd::Pid;

        match kill(Pid::from_raw(pid as i32), None) {
            Ok(_) => Ok(true),
            Err(Errno::ESRCH) => Ok(false),
            // Alive but owned by someone else
            Err(Errno::EPERM) => Ok(true),
            Err(e) => Err(StackupError::State(format!(
                "cannot check process {}: {}",
                pid, e
            ))),
        }
    }

    #[cfg(windows)]
    {
        use windows::Win32::Foundation::CloseHandle;
        use windows::Win32::System::Threading::{OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION};

        unsafe {
            match OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid) {
                Ok(handle) => {
                    let _ = CloseHandle(handle);
                    Ok(true)
                }
                Err(_) => Ok(false),
            }
        }
    }
}

/// Terminate a process: SIGTERM on Unix, TerminateProcess on Windows.
pub fn terminate(pid: u32) -> Result<()> {
    #[cfg(unix)]
    {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        kill(Pid::from_raw(pid as i32), Signal::SIGTERM).map_err(|e| {
            StackupError::State(format!("failed to stop process {}: {}", pid, e))
        })
    }

    #[cfg(windows)]
    {
        use windows::Win32::Foundation::CloseHandle;
        use windows::Win32::System::Threading::{OpenProcess, TerminateProcess, PROCESS_TERMINATE};

        unsafe {
            let handle = OpenProcess(PROCESS_TERMINATE, false, pid).map_err(|e| {
                StackupError::State(format!("failed to open process {}: {}", pid, e))
            })?;
            let result = TerminateProcess(handle, 1);
            let _ = CloseHandle(handle);
            result.map_err(|e| {
                StackupError::State(format!("failed to stop process {}: {}", pid, e))
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_process_exists() {
        assert!(process_exists(std::process::id()).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_exited_process_gone() {
        use std::process::Command;

        let mut child = Command::new("true").spawn().unwrap();
        let pid = child.id();
        child.wait().unwrap();
        assert!(!process_exists(pid).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_terminate_sleeping_child() {
        use std::process::Command;
        use std::time::{Duration, Instant};

        let mut child = Command::new("sleep").arg("30").spawn().unwrap();
        let pid = child.id();
        terminate(pid).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if child.try_wait().unwrap().is_some() {
                break;
            }
            if Instant::now() > deadline {
                panic!("child did not exit after SIGTERM");
            }
            std::thread::sleep(Duration::from_millis(20));
        }
    }
}
