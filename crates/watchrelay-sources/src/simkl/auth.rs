use crate::error::SourceError;
use crate::prompt::{AuthorizationPrompt, DeviceAuthorization, PollSettings};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Instant};
use watchrelay_models::TokenRecord;

/// Create a reqwest Client identifying this tool
pub fn create_simkl_client() -> Client {
    Client::builder()
        .user_agent(concat!("watchrelay/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| Client::new())
}

#[derive(Debug, Serialize, Deserialize)]
struct PinCodeResponse {
    user_code: String,
    verification_url: String,
    #[serde(default = "default_pin_expires_in")]
    expires_in: u64,
}

fn default_pin_expires_in() -> u64 {
    900
}

#[derive(Debug, Serialize, Deserialize)]
struct PinStatusResponse {
    result: String,
    message: Option<String>,
    access_token: Option<String>,
}

/// Obtain a Simkl access token through the PIN flow.
///
/// Simkl access tokens do not expire and come without a refresh token, so the
/// returned record carries no expiry.
pub async fn authorize_with_pin(
    client: &Client,
    base_url: &str,
    client_id: &str,
    prompt: &dyn AuthorizationPrompt,
    poll: &PollSettings,
) -> Result<TokenRecord, SourceError> {
    // Step 1: Request a PIN (GET /oauth/pin?client_id=...)
    let response = client
        .get(format!("{}/oauth/pin", base_url))
        .query(&[("client_id", client_id)])
        .header("Accept", "application/json")
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(SourceError::from_response("Simkl PIN request", response).await);
    }

    let response_text = response.text().await?;
    let pin: PinCodeResponse = serde_json::from_str(&response_text).map_err(|e| {
        tracing::error!("Failed to parse PIN response: {}. Raw response: {}", e, response_text);
        SourceError::from(e)
    })?;

    // Step 2: Show the PIN and verification URL
    prompt
        .present(&DeviceAuthorization {
            service: "Simkl",
            verification_url: pin.verification_url.clone(),
            user_code: pin.user_code.clone(),
            expires_in: pin.expires_in,
        })
        .await
        .map_err(|e| SourceError::Prompt(format!("{:#}", e)))?;

    // Step 3: Poll GET /oauth/pin/{USER_CODE}?client_id=...
    // Responses: {"result": "KO", "message": "Authorization pending"} or {"result": "OK", "access_token": "..."}
    let deadline = poll.deadline_for(pin.expires_in);
    let started = Instant::now();
    let mut interval = poll.interval;
    let status_url = format!("{}/oauth/pin/{}", base_url, urlencoding::encode(&pin.user_code));

    loop {
        let response = client
            .get(&status_url)
            .query(&[("client_id", client_id)])
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SourceError::from_response("Simkl PIN status", response).await);
        }

        let response_text = response.text().await?;
        let status: PinStatusResponse = serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!("Failed to parse PIN status response: {}. Raw response: {}", e, response_text);
            SourceError::from(e)
        })?;

        match status.result.as_str() {
            "OK" => {
                let access_token = status.access_token.filter(|t| !t.is_empty()).ok_or_else(|| {
                    SourceError::UnexpectedResponse("authorization succeeded but no access_token was returned".to_string())
                })?;
                tracing::info!("Simkl PIN authorization approved");
                return Ok(TokenRecord::without_expiry(access_token));
            }
            "KO" => match status.message.as_deref() {
                Some("Authorization pending") => {}
                Some("Slow down") => {
                    interval = (interval * 2).min(deadline);
                }
                Some(msg) => {
                    return Err(SourceError::AuthorizationDenied {
                        service: "Simkl",
                        reason: msg.to_string(),
                    });
                }
                None => {
                    return Err(SourceError::AuthorizationDenied {
                        service: "Simkl",
                        reason: "unknown error".to_string(),
                    });
                }
            },
            other => {
                return Err(SourceError::UnexpectedResponse(format!(
                    "unexpected result in PIN status response: {}",
                    other
                )));
            }
        }

        if started.elapsed() + interval > deadline {
            return Err(SourceError::AuthorizationTimedOut {
                service: "Simkl",
                waited_secs: started.elapsed().as_secs(),
            });
        }
        sleep(interval).await;
    }
}
