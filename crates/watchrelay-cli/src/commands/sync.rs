use super::config::{load_config, output_paths};
use super::prompts::authorization_prompt;
use crate::output::Output;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use std::path::PathBuf;
use std::sync::Arc;
use watchrelay_config::FileTokenStore;
use watchrelay_core::{SubmitOutcome, SyncJob, SyncOptions, SyncReport};

pub async fn run_sync(
    config_path: Option<PathBuf>,
    dry_run: bool,
    window_hours: Option<i64>,
    output: &Output,
) -> Result<()> {
    tracing::debug!("Sync command started");

    let config = load_config(config_path.as_deref())?;
    let paths = output_paths(&config);
    let store = Arc::new(FileTokenStore::new(paths.token_dir.clone()));

    let mut options = SyncOptions::from_config(&config);
    options.dry_run = dry_run;
    if let Some(hours) = window_hours {
        options.lookback = chrono::Duration::hours(hours);
    }

    let job = SyncJob::new(&config, paths.clone(), store, authorization_prompt(output)).with_options(options);
    let report = job.run().await.wrap_err("Sync failed")?;

    if output.is_human() {
        print_report(&report, output);
        if dry_run {
            output.info(format!(
                "Dry run: filtered batch written to {}",
                paths.filtered_output_file.display()
            ));
        }
    } else {
        output.json(&serde_json::to_value(&report)?);
    }

    Ok(())
}

fn print_report(report: &SyncReport, output: &Output) {
    output.field("Window start", report.cutoff);
    output.field("Movies", report.movies);
    output.field("Episodes", report.episodes);
    if report.dropped_episodes > 0 {
        output.field("Unresolved", format!("{} episode(s)", report.dropped_episodes));
    }

    match &report.outcome {
        SubmitOutcome::Skipped => output.success("Nothing new to sync"),
        SubmitOutcome::DryRun => output.success("Dry run complete, Trakt history left untouched"),
        SubmitOutcome::Submitted {
            added_movies,
            added_episodes,
        } => output.success(format!(
            "Synced to Trakt: {} movie(s), {} episode(s) added",
            added_movies, added_episodes
        )),
        SubmitOutcome::Failed { reason } => output.error(format!("Failed to sync to Trakt: {}", reason)),
    }
}
