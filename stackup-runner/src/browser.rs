//! Best-effort opening of the default browser. Failure here never stops
//! the launch; the services are already up and the URL is printed anyway.

use std::process::{Command, Stdio};
use tracing::{info, warn};

/// Platform command used to open a URL in the default browser
pub fn open_command(url: &str) -> (&'static str, Vec<String>) {
    if cfg!(target_os = "windows") {
        // Empty first argument is the window title slot of `start`.
        (
            "cmd",
            vec![
                "/C".to_string(),
                "start".to_string(),
                String::new(),
                url.to_string(),
            ],
        )
    } else if cfg!(target_os = "macos") {
        ("open", vec![url.to_string()])
    } else {
        ("xdg-open", vec![url.to_string()])
    }
}

/// Open the URL in the default browser, fire-and-forget.
pub fn open(url: &str) {
    let (program, args) = open_command(url);
    match Command::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(_) => info!(url, "Opened browser"),
        Err(e) => warn!(url, error = %e, "Could not open browser; open the URL manually"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_command_carries_url() {
        let (program, args) = open_command("http://localhost:8501");
        assert!(!program.is_empty());
        assert_eq!(args.last().unwrap(), "http://localhost:8501");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_open_command_linux() {
        let (program, args) = open_command("http://localhost:8501");
        assert_eq!(program, "xdg-open");
        assert_eq!(args, vec!["http://localhost:8501".to_string()]);
    }
}
