use super::prompts;
use crate::output::Output;
use crate::ConfigCommands;
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use owo_colors::OwoColorize;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use watchrelay_config::{Config, OutputPaths, PathManager};

pub async fn run_config(config_path: Option<PathBuf>, cmd: ConfigCommands, output: &Output) -> Result<()> {
    let path = config_file(config_path.as_deref());
    match cmd {
        ConfigCommands::Show { full } => show_config(&path, full, output),
        ConfigCommands::Init { force } => init_config(&path, force, output),
    }
}

/// Explicit `--config` path, or `config.toml` in the platform config directory.
pub fn config_file(override_path: Option<&Path>) -> PathBuf {
    match override_path {
        Some(path) => path.to_path_buf(),
        None => PathManager::default().config_file(),
    }
}

/// Log file named in `[files]`, read before logging is up so failures stay silent.
pub fn configured_log_file(override_path: Option<&Path>) -> Option<PathBuf> {
    Config::load_from_file(&config_file(override_path))
        .ok()
        .and_then(|config| config.files.log_file)
}

/// Load and validate the config a command needs to talk to the services.
pub fn load_config(override_path: Option<&Path>) -> Result<Config> {
    let path = config_file(override_path);
    if !path.exists() {
        return Err(eyre!(
            "Configuration file not found at {}. Run 'watchrelay config init' first.",
            path.display()
        ));
    }

    let config = Config::load_from_file(&path)
        .map_err(|e| eyre!("Failed to load config from {}: {}", path.display(), e))?;
    config
        .validate()
        .map_err(|e| eyre!("Invalid configuration in {}: {}", path.display(), e))?;

    tracing::debug!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Token, audit and debug-log locations after applying `[files]` overrides.
pub fn output_paths(config: &Config) -> OutputPaths {
    PathManager::default().resolve(&config.files)
}

fn show_config(path: &Path, full: bool, output: &Output) -> Result<()> {
    if !path.exists() {
        output.warn(format!("Configuration file not found at: {}", path.display()));
        output.info("Create one with 'watchrelay config init'.");
        return Ok(());
    }

    let config = Config::load_from_file(path)
        .map_err(|e| eyre!("Failed to load config from {}: {}", path.display(), e))?;
    let paths = output_paths(&config);
    let secret = |value: &str| if full { value.to_string() } else { mask_string(value) };

    if !output.is_human() {
        output.json(&serde_json::json!({
            "config_file": path.display().to_string(),
            "simkl": {
                "client_id": secret(&config.simkl.client_id),
                "api_url": config.simkl.api_url,
            },
            "trakt": {
                "client_id": secret(&config.trakt.client_id),
                "client_secret": secret(&config.trakt.client_secret),
                "api_url": config.trakt.api_url,
                "redirect_uri": config.trakt.redirect_uri,
            },
            "sync": { "lookback_hours": config.sync.lookback_hours },
            "auth": {
                "poll_interval_secs": config.auth.poll_interval_secs,
                "max_poll_secs": config.auth.max_poll_secs,
            },
            "files": {
                "token_dir": paths.token_dir.display().to_string(),
                "raw_history_file": paths.raw_history_file.display().to_string(),
                "filtered_output_file": paths.filtered_output_file.display().to_string(),
                "debug_log_file": paths.debug_log_file.display().to_string(),
                "log_file": config.files.log_file.as_ref().map(|p| p.display().to_string()),
            },
        }));
        return Ok(());
    }

    if output.is_quiet() {
        return Ok(());
    }

    println!("\n{}", "Configuration".bright_cyan().bold());
    output.field("Config file", path.display());

    println!("\n{}", "Simkl".cyan().bold());
    output.field("Client ID", secret(&config.simkl.client_id));
    output.field("API URL", &config.simkl.api_url);

    println!("\n{}", "Trakt".cyan().bold());
    output.field("Client ID", secret(&config.trakt.client_id));
    output.field("Client Secret", secret(&config.trakt.client_secret));
    output.field("API URL", &config.trakt.api_url);

    println!("\n{}", "Sync".cyan().bold());
    output.field("Lookback", format!("{}h", config.sync.lookback_hours));
    output.field(
        "Auth polling",
        format!("every {}s, at most {}s", config.auth.poll_interval_secs, config.auth.max_poll_secs),
    );

    println!("\n{}", "Files".cyan().bold());
    output.field("Tokens", paths.token_dir.display());
    output.field("Raw history", paths.raw_history_file.display());
    output.field("Filtered output", paths.filtered_output_file.display());
    output.field("Debug log", paths.debug_log_file.display());
    if let Some(log_file) = &config.files.log_file {
        output.field("Log file", log_file.display());
    }
    println!();

    if let Err(e) = config.validate() {
        output.warn(format!("Configuration is incomplete: {}", e));
    }

    Ok(())
}

fn init_config(path: &Path, force: bool, output: &Output) -> Result<()> {
    if path.exists() && !force {
        return Err(eyre!(
            "Configuration file already exists at {}. Use --force to overwrite it.",
            path.display()
        ));
    }

    let mut config = Config::template();

    if io::stdin().is_terminal() && output.is_human() {
        output.info("Create API applications at https://simkl.com/settings/developer/ and https://trakt.tv/oauth/applications");
        config.simkl.client_id = prompts::prompt_required("Simkl Client ID")?;
        config.trakt.client_id = prompts::prompt_required("Trakt Client ID")?;
        config.trakt.client_secret = prompts::prompt_password("Trakt Client Secret")?;
        config.sync.lookback_hours = i64::from(prompts::prompt_number(
            "Lookback window (hours)",
            Some(watchrelay_models::DEFAULT_LOOKBACK_HOURS as u32),
        )?);
    }

    write_config(path, &config)?;

    if config.validate().is_ok() {
        output.success(format!("Configuration saved to {}", path.display()));
        output.info("Next: 'watchrelay auth simkl' then 'watchrelay auth trakt'.");
    } else {
        output.success(format!("Template written to {}", path.display()));
        output.info("Fill in the Simkl and Trakt client credentials before running a sync.");
    }
    Ok(())
}

fn write_config(path: &Path, config: &Config) -> Result<()> {
    config
        .save_to_file(path)
        .map_err(|e| eyre!("{}", e))
        .wrap_err_with(|| format!("Failed to write config to {}", path.display()))
}

fn mask_string(s: &str) -> String {
    if s.is_empty() || s == "YOUR_CLIENT_ID" || s == "YOUR_CLIENT_SECRET" {
        return "<not set>".to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}
