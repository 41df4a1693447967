//! Bounded-retry readiness probes. A fixed post-spawn delay only guesses
//! at readiness; these poll the service's port or health endpoint until
//! it actually accepts connections, or a deadline passes.

use stackup_config::ReadinessConfig;
use stackup_core::{Result, StackupError};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info};

const MAX_POLL_INTERVAL: Duration = Duration::from_secs(2);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

fn backoff(base: Duration, attempt: u32) -> Duration {
    (base * attempt.min(8)).min(MAX_POLL_INTERVAL)
}

/// Poll a local TCP port until it accepts a connection
pub async fn wait_for_port(service: &str, port: u16, config: &ReadinessConfig) -> Result<()> {
    let addr = format!("127.0.0.1:{}", port);
    let deadline = Instant::now() + Duration::from_secs(config.timeout_secs);
    let base = Duration::from_millis(config.poll_interval_ms);
    let mut attempt: u32 = 1;

    loop {
        match timeout(CONNECT_TIMEOUT, TcpStream::connect(&addr)).await {
            Ok(Ok(_)) => {
                info!(service, addr = %addr, attempt, "Service is accepting connections");
                return Ok(());
            }
            Ok(Err(e)) => {
                debug!(service, addr = %addr, attempt, error = %e, "Port not ready yet");
            }
            Err(_) => {
                debug!(service, addr = %addr, attempt, "Connect attempt timed out");
            }
        }

        if Instant::now() >= deadline {
            return Err(StackupError::ReadinessTimeout {
                service: service.to_string(),
                endpoint: addr,
            });
        }
        sleep(backoff(base, attempt)).await;
        attempt += 1;
    }
}

/// Poll an HTTP endpoint until it answers with a success status
pub async fn wait_for_http(service: &str, url: &str, config: &ReadinessConfig) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|e| StackupError::ReadinessTimeout {
            service: service.to_string(),
            endpoint: format!("{} ({})", url, e),
        })?;

    let deadline = Instant::now() + Duration::from_secs(config.timeout_secs);
    let base = Duration::from_millis(config.poll_interval_ms);
    let mut attempt: u32 = 1;

    loop {
        match client.get(url).send().await {
            Ok(response) if response.status().is_success() => {
                info!(service, url, attempt, "Health endpoint is up");
                return Ok(());
            }
            Ok(response) => {
                debug!(service, url, attempt, status = %response.status(), "Health endpoint not ready");
            }
            Err(e) => {
                debug!(service, url, attempt, error = %e, "Health request failed");
            }
        }

        if Instant::now() >= deadline {
            return Err(StackupError::ReadinessTimeout {
                service: service.to_string(),
                endpoint: url.to_string(),
            });
        }
        sleep(backoff(base, attempt)).await;
        attempt += 1;
    }
}
