use crate::error::SourceError;
use crate::prompt::{AuthorizationPrompt, DeviceAuthorization, PollSettings};
use crate::trakt::client::TraktClient;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Instant};
use watchrelay_models::TokenRecord;

pub const DEFAULT_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

/// Create a reqwest Client identifying this tool; Trakt rejects requests without a User-Agent
pub fn create_trakt_client() -> Client {
    Client::builder()
        .user_agent(concat!("watchrelay/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Token payload returned by both the device-token and refresh endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: u64,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
}

impl TokenResponse {
    /// Expiry is computed from `issued_at`, never from the service's `created_at`.
    pub fn into_record(self, issued_at: DateTime<Utc>) -> TokenRecord {
        let mut record =
            TokenRecord::issued(self.access_token, self.refresh_token, self.expires_in, issued_at);
        record.token_type = self.token_type;
        record.scope = self.scope;
        record.created_at = self.created_at;
        record
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceCode {
    pub device_code: String,
    pub user_code: String,
    pub verification_url: String,
    #[serde(default = "default_device_expires_in")]
    pub expires_in: u64,
    #[serde(default = "default_device_interval")]
    pub interval: u64,
}

fn default_device_expires_in() -> u64 {
    600
}

fn default_device_interval() -> u64 {
    5
}

/// Outcome of a single poll of the device-token endpoint.
#[derive(Debug)]
pub enum DevicePoll {
    Approved(TokenResponse),
    Pending,
    SlowDown,
    Rejected { status: u16, body: String },
}

pub async fn request_device_code(
    client: &Client,
    base_url: &str,
    client_id: &str,
) -> Result<DeviceCode, SourceError> {
    let payload = serde_json::json!({ "client_id": client_id });

    let response = client
        .post(format!("{}/oauth/device/code", base_url))
        .json(&payload)
        .header("Accept", "application/json")
        .header("Content-Type", "application/json")
        .send()
        .await?;

    if response.status() != StatusCode::OK {
        return Err(SourceError::from_response("Device code request", response).await);
    }

    let response_text = response.text().await?;
    serde_json::from_str(&response_text).map_err(|e| {
        tracing::error!("Failed to parse device code response: {}. Raw response: {}", e, response_text);
        SourceError::from(e)
    })
}

pub async fn poll_device_token(
    client: &Client,
    base_url: &str,
    device_code: &str,
    client_id: &str,
    client_secret: &str,
) -> Result<DevicePoll, SourceError> {
    let payload = serde_json::json!({
        "code": device_code,
        "client_id": client_id,
        "client_secret": client_secret
    });

    let response = client
        .post(format!("{}/oauth/device/token", base_url))
        .json(&payload)
        .header("Accept", "application/json")
        .header("Content-Type", "application/json")
        .send()
        .await?;

    match response.status() {
        StatusCode::OK => Ok(DevicePoll::Approved(response.json().await?)),
        StatusCode::BAD_REQUEST => Ok(DevicePoll::Pending),
        StatusCode::TOO_MANY_REQUESTS => Ok(DevicePoll::SlowDown),
        status => {
            let body = response.text().await.unwrap_or_default();
            Ok(DevicePoll::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}

pub async fn refresh_access_token(
    client: &Client,
    base_url: &str,
    client_id: &str,
    client_secret: &str,
    redirect_uri: &str,
    refresh_token: &str,
) -> Result<TokenResponse, SourceError> {
    let payload = serde_json::json!({
        "refresh_token": refresh_token,
        "client_id": client_id,
        "client_secret": client_secret,
        "redirect_uri": redirect_uri,
        "grant_type": "refresh_token"
    });

    let response = client
        .post(format!("{}/oauth/token", base_url))
        .json(&payload)
        .header("Accept", "application/json")
        .header("Content-Type", "application/json")
        .send()
        .await?;

    if response.status() != StatusCode::OK {
        return Err(SourceError::from_response("Token refresh", response).await);
    }

    Ok(response.json().await?)
}

/// Run the device-code flow to completion: request a code, hand it to the prompt,
/// then poll until Trakt approves, refuses, or the poll bound runs out.
pub async fn authorize_with_device_code(
    trakt: &TraktClient,
    prompt: &dyn AuthorizationPrompt,
    poll: &PollSettings,
) -> Result<TokenRecord, SourceError> {
    let device = trakt.request_device_code().await?;

    prompt
        .present(&DeviceAuthorization {
            service: "Trakt",
            verification_url: device.verification_url.clone(),
            user_code: device.user_code.clone(),
            expires_in: device.expires_in,
        })
        .await
        .map_err(|e| SourceError::Prompt(format!("{:#}", e)))?;

    let deadline = poll.deadline_for(device.expires_in);
    let started = Instant::now();
    let mut interval = poll.interval;
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        match trakt.poll_device_token(&device.device_code).await? {
            DevicePoll::Approved(token) => {
                tracing::info!("Trakt device authorization approved after {} poll(s)", attempts);
                return Ok(token.into_record(Utc::now()));
            }
            DevicePoll::Pending => {
                tracing::debug!("Trakt authorization pending (attempt {})", attempts);
            }
            DevicePoll::SlowDown => {
                interval = (interval * 2).min(deadline);
                tracing::debug!("Trakt asked to slow down, polling every {:?}", interval);
            }
            DevicePoll::Rejected { status, body } => {
                return Err(SourceError::AuthorizationDenied {
                    service: "Trakt",
                    reason: format!("{} ({}) {}", describe_rejection(status), status, body)
                        .trim_end()
                        .to_string(),
                });
            }
        }

        if started.elapsed() + interval > deadline {
            return Err(SourceError::AuthorizationTimedOut {
                service: "Trakt",
                waited_secs: started.elapsed().as_secs(),
            });
        }
        sleep(interval).await;
    }
}

fn describe_rejection(status: u16) -> &'static str {
    match status {
        404 => "invalid device code",
        409 => "device code already used",
        410 => "device code expired",
        418 => "authorization denied by user",
        _ => "unexpected status",
    }
}
