//! Preflight checks against the remote system under test
//!
//! The web UI and API are hosted elsewhere; before spending minutes on
//! browser runs the harness makes sure both origins answer at all.

use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{E2eError, E2eResult};

/// Configuration for the preflight check
#[derive(Debug, Clone)]
pub struct TargetConfig {
    /// Give up after this long
    pub startup_timeout: Duration,

    /// Pause between attempts
    pub poll_interval: Duration,

    /// Per-attempt request timeout
    pub request_timeout: Duration,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            startup_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(500),
            request_timeout: Duration::from_secs(5),
        }
    }
}

/// Wait until `url` gives any non-5xx answer.
///
/// The hosted app cold-starts slowly, so connection errors and 5xx replies
/// are retried until `startup_timeout` runs out.
pub async fn wait_until_reachable(url: &str, config: &TargetConfig) -> E2eResult<()> {
    let client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()?;

    let start = Instant::now();
    let mut attempts = 0;

    while start.elapsed() < config.startup_timeout {
        attempts += 1;

        match client.get(url).send().await {
            Ok(resp) if !resp.status().is_server_error() => {
                info!("{} is reachable ({})", url, resp.status());
                return Ok(());
            }
            Ok(resp) => {
                warn!("Preflight {} returned {}", url, resp.status());
            }
            Err(e) => {
                if attempts == 1 {
                    info!("Waiting for {} to answer...", url);
                }
                if !e.is_connect() && !e.is_timeout() {
                    warn!("Preflight error: {}", e);
                }
            }
        }

        sleep(config.poll_interval).await;
    }

    Err(E2eError::TargetUnreachable {
        url: url.to_string(),
        attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_target_times_out() {
        let config = TargetConfig {
            startup_timeout: Duration::from_millis(300),
            poll_interval: Duration::from_millis(50),
            request_timeout: Duration::from_millis(100),
        };
        // port 9 (discard) is closed on any sane test host
        let err = wait_until_reachable("http://127.0.0.1:9/", &config)
            .await
            .unwrap_err();
        match err {
            E2eError::TargetUnreachable { attempts, .. } => assert!(attempts >= 1),
            other => panic!("expected TargetUnreachable, got {:?}", other),
        }
    }
}
