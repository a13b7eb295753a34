//! Server reachability probe
//!
//! Interactive runs give the server one chance. CI runs retry with a fixed
//! pause, since the server is usually started right before the executor.

use std::time::Duration;

use async_trait::async_trait;

use crate::common::config::RetryPolicy;
use crate::common::{Error, Result};

/// "Is the server up" check
#[async_trait]
pub trait ServerProbe: Send + Sync {
    /// URL being probed, for diagnostics
    fn url(&self) -> &str;

    /// A single attempt
    async fn check(&self) -> Result<()>;
}

/// Probe issuing an HTTP GET; any response counts as reachable
pub struct HttpProbe {
    url: String,
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.to_string(),
            client,
        })
    }
}

#[async_trait]
impl ServerProbe for HttpProbe {
    fn url(&self) -> &str {
        &self.url
    }

    async fn check(&self) -> Result<()> {
        let response = self.client.get(&self.url).send().await?;
        tracing::debug!(status = %response.status(), url = %self.url, "Server answered");
        Ok(())
    }
}

/// Outcome of a successful wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// Attempts made, including the successful one
    pub attempts: u32,
}

/// Probe until the server answers or the policy's attempts run out
///
/// Sleeps `policy.interval` between attempts. Dropping the returned future
/// cancels a pending sleep.
pub async fn wait_for_server<P: ServerProbe + ?Sized>(
    probe: &P,
    policy: RetryPolicy,
) -> Result<ProbeOutcome> {
    let attempts = policy.attempts.max(1);

    for attempt in 1..=attempts {
        match probe.check().await {
            Ok(()) => {
                tracing::info!(url = probe.url(), attempt, "Server found");
                return Ok(ProbeOutcome { attempts: attempt });
            }
            Err(e) if attempt < attempts => {
                tracing::warn!(
                    url = probe.url(),
                    attempt,
                    max_attempts = attempts,
                    error = %e,
                    "Server not reachable, retrying in {:?}",
                    policy.interval
                );
                tokio::time::sleep(policy.interval).await;
            }
            Err(e) => {
                tracing::debug!(url = probe.url(), error = %e, "Last probe attempt failed");
            }
        }
    }

    Err(Error::ServerUnreachable {
        url: probe.url().to_string(),
        attempts,
    })
}
