use super::config::{load_config, output_paths};
use super::prompts::authorization_prompt;
use crate::output::Output;
use crate::AuthCommands;
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use watchrelay_config::{Config, FileTokenStore, OutputPaths, TokenStore, SIMKL_SERVICE};
use watchrelay_core::{Authenticator, DebugLog};
use watchrelay_sources::{PollSettings, SimklClient};

pub async fn run_auth(config_path: Option<PathBuf>, service: AuthCommands, output: &Output) -> Result<()> {
    let config = load_config(config_path.as_deref())?;
    let paths = output_paths(&config);

    match service {
        AuthCommands::Trakt { force } => authorize_trakt(&config, &paths, force, output).await,
        AuthCommands::Simkl => authorize_simkl(&config, &paths, output).await,
    }
}

async fn authorize_trakt(config: &Config, paths: &OutputPaths, force: bool, output: &Output) -> Result<()> {
    let store = Arc::new(FileTokenStore::new(paths.token_dir.clone()));
    let authenticator = Authenticator::from_config(config, store, authorization_prompt(output))
        .with_debug_log(DebugLog::new(paths.debug_log_file.clone()));

    let access_token = if force {
        authenticator.force_authorize().await
    } else {
        authenticator.ensure_valid_token().await
    }
    .wrap_err("Trakt authorization failed")?;

    // Confirms the token is accepted, not only issued
    match authenticator.trakt().current_user(&access_token).await {
        Ok(user) => {
            if output.is_human() {
                output.success(format!("Authenticated to Trakt as {}", user.username));
            } else {
                output.json(&json!({ "service": "trakt", "authenticated": true, "username": user.username }));
            }
            Ok(())
        }
        Err(e) => {
            output.warn(format!("Token saved but verification against Trakt failed: {}", e));
            Err(eyre!("Token verification failed: {}", e))
        }
    }
}

async fn authorize_simkl(config: &Config, paths: &OutputPaths, output: &Output) -> Result<()> {
    let store = FileTokenStore::new(paths.token_dir.clone());
    let simkl = SimklClient::new(config.simkl.client_id.clone()).with_base_url(config.simkl.api_url.clone());
    let poll = PollSettings::new(config.auth.poll_interval(), config.auth.max_poll());

    let prompt = authorization_prompt(output);
    let record = simkl
        .authorize_with_pin(prompt.as_ref(), &poll)
        .await
        .wrap_err("Simkl authorization failed")?;

    store
        .save(SIMKL_SERVICE, &record)
        .map_err(|e| eyre!("Failed to save Simkl token: {:#}", e))?;

    if output.is_human() {
        output.success(format!(
            "Authenticated to Simkl, token saved to {}",
            store.path_for(SIMKL_SERVICE).display()
        ));
    } else {
        output.json(&json!({ "service": "simkl", "authenticated": true }));
    }
    Ok(())
}
