use async_trait::async_trait;
use std::time::Duration;

/// What the operator needs to approve a device/PIN authorization out of band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceAuthorization {
    pub service: &'static str,
    pub verification_url: String,
    pub user_code: String,
    /// Seconds until the code stops being accepted by the service
    pub expires_in: u64,
}

/// Presents a pending authorization to whoever can approve it.
///
/// `present` returns once the caller may start polling: an interactive prompt
/// waits for the operator to confirm, a non-interactive one returns right away
/// and leaves the waiting to the poll loop.
#[async_trait]
pub trait AuthorizationPrompt: Send + Sync {
    async fn present(&self, authorization: &DeviceAuthorization) -> anyhow::Result<()>;
}

/// Non-interactive prompt: logs the code and URL and lets polling begin.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoticePrompt;

#[async_trait]
impl AuthorizationPrompt for NoticePrompt {
    async fn present(&self, authorization: &DeviceAuthorization) -> anyhow::Result<()> {
        tracing::warn!(
            "{} authorization required: visit {} and enter code {} (expires in {}s)",
            authorization.service,
            authorization.verification_url,
            authorization.user_code,
            authorization.expires_in
        );
        Ok(())
    }
}

/// Cadence and bound for device authorization polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_wait: Duration,
}

impl PollSettings {
    pub fn new(interval: Duration, max_wait: Duration) -> Self {
        Self { interval, max_wait }
    }

    /// The effective bound: whichever ends first of the code's own lifetime and `max_wait`.
    pub fn deadline_for(&self, code_expires_in: u64) -> Duration {
        if code_expires_in == 0 {
            return self.max_wait;
        }
        self.max_wait.min(Duration::from_secs(code_expires_in))
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            max_wait: Duration::from_secs(600),
        }
    }
}
