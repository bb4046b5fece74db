use crate::output::{Output, OutputFormat};
use async_trait::async_trait;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use dialoguer::{Input, Password};
use owo_colors::OwoColorize;
use serde_json::json;
use std::io::{self, IsTerminal};
use std::sync::Arc;
use watchrelay_sources::{AuthorizationPrompt, DeviceAuthorization, NoticePrompt};

/// Prompt for a non-empty string
pub fn prompt_required(prompt: &str) -> Result<String> {
    Input::<String>::new()
        .with_prompt(prompt)
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Value cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()
        .map(|s| s.trim().to_string())
        .map_err(|e| eyre!("Failed to read input: {}", e))
}

/// Prompt for a password (masked input)
pub fn prompt_password(prompt: &str) -> Result<String> {
    Password::new()
        .with_prompt(prompt)
        .interact()
        .map_err(|e| eyre!("Failed to read password: {}", e))
}

/// Prompt for a positive number with optional default
pub fn prompt_number(prompt: &str, default: Option<u32>) -> Result<u32> {
    let mut input = Input::<u32>::new()
        .with_prompt(prompt)
        .validate_with(|n: &u32| -> Result<(), &str> {
            if *n == 0 {
                Err("Enter a number greater than zero")
            } else {
                Ok(())
            }
        });
    if let Some(default) = default {
        input = input.default(default);
    }
    input.interact_text().map_err(|e| eyre!("Failed to read input: {}", e))
}

/// Shows the verification URL and code, then waits for the operator to press Enter.
pub struct ConsolePrompt {
    output: Output,
}

impl ConsolePrompt {
    pub fn new(output: Output) -> Self {
        Self { output }
    }
}

#[async_trait]
impl AuthorizationPrompt for ConsolePrompt {
    async fn present(&self, authorization: &DeviceAuthorization) -> anyhow::Result<()> {
        match self.output.format() {
            OutputFormat::Human => {
                println!();
                println!("{}", format!("{} authorization", authorization.service).bright_cyan().bold());
                println!("  1. Visit:      {}", authorization.verification_url.underline());
                println!("  2. Enter code: {}", authorization.user_code.bright_yellow().bold());
                println!(
                    "  The code expires in {} minute(s).",
                    authorization.expires_in.div_ceil(60)
                );
                println!();
            }
            _ => self.output.json(&json!({
                "type": "authorization_required",
                "service": authorization.service,
                "verification_url": authorization.verification_url,
                "user_code": authorization.user_code,
                "expires_in": authorization.expires_in,
            })),
        }

        tokio::task::spawn_blocking(|| {
            Input::<String>::new()
                .with_prompt("Press Enter after you have authorized the app")
                .allow_empty(true)
                .interact_text()
        })
        .await??;

        Ok(())
    }
}

/// Console prompt when a person is attached to stdin, otherwise log-and-poll.
pub fn authorization_prompt(output: &Output) -> Arc<dyn AuthorizationPrompt> {
    if io::stdin().is_terminal() {
        Arc::new(ConsolePrompt::new(*output))
    } else {
        tracing::debug!("stdin is not a terminal, authorization codes will only be logged");
        Arc::new(NoticePrompt)
    }
}
