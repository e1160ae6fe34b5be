//! Sample host application for `nudge-core`: runs a check, shows the outcome
//! in the terminal and, on request, opens the update target.

mod cli;
mod logging;
mod present;
mod settings;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::error;
use nudge_core::{
    CheckError, CurrentProperties, JsonFileRecordStore, NavigationError, Outcome, RecordStore,
    RecordStoreError, SystemNavigator, UpdateChecker, open_message_link,
};
use nudge_platform::{AppPaths, DeviceInfo};
use thiserror::Error;

use crate::cli::{Cli, Command};
use crate::settings::Settings;

const APP_NAME: &str = "nudge";

#[derive(Debug, Error)]
enum AppError {
    #[error("no endpoint configured; pass --endpoint or set it in the settings file")]
    MissingEndpoint,
    #[error(transparent)]
    Check(#[from] CheckError),
    #[error(transparent)]
    Records(#[from] RecordStoreError),
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("update check ended without an outcome")]
    OutcomeLost,
    #[error("failed to encode properties: {0}")]
    Encode(#[from] serde_json::Error),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let paths = AppPaths::new(APP_NAME).ok();

    let mut settings = match (&cli.settings, &paths) {
        (Some(path), _) => Settings::load_from_path(path),
        (None, Some(paths)) => Settings::load_from_path(&paths.settings_file()),
        (None, None) => Settings::default(),
    };
    settings.apply_overrides(&cli);

    let log_path = paths.as_ref().map(AppPaths::log_file);
    if let Err(error) = logging::init_logging(
        log_path.as_deref(),
        settings.debug_logging,
        settings.max_log_size_bytes,
    ) {
        eprintln!("nudge: log file unavailable: {error}");
    }

    match run(&cli.command, &settings) {
        Ok(status) => ExitCode::from(status),
        Err(error) => {
            error!("{error}");
            eprintln!("nudge: {error}");
            ExitCode::from(present::EXIT_FAILED)
        }
    }
}

fn run(command: &Command, settings: &Settings) -> Result<u8, AppError> {
    let properties = settings.current_properties(&DeviceInfo::detect());

    match command {
        Command::Properties => {
            println!("{}", serde_json::to_string_pretty(&properties)?);
            Ok(present::EXIT_OK)
        }
        Command::Records => {
            let store = JsonFileRecordStore::for_app(&settings.package_name)?;
            for record in store.records()? {
                println!("{}\t{}", record.shown_at.to_rfc3339(), record.identifier);
            }
            Ok(present::EXIT_OK)
        }
        Command::Check { no_record } => {
            let checker = build_checker(settings, properties)?;
            let outcome = check_blocking(&checker)?;
            print!("{}", present::render(&outcome));

            if !no_record {
                record_shown(&checker, &outcome)?;
            }
            Ok(present::exit_status(&outcome))
        }
        Command::Apply => {
            let checker = build_checker(settings, properties)?;
            let outcome = check_blocking(&checker)?;
            print!("{}", present::render(&outcome));

            match &outcome {
                Outcome::UpdateFound(update) if !update.force_exit => {
                    checker.record_update_displayed(update)?;
                    let opened = checker.apply_update(update, &SystemNavigator)?;
                    println!("Opened {opened}");
                }
                Outcome::MessageFound(message) => {
                    checker.record_message_displayed(message)?;
                    if let Some(opened) = open_message_link(&SystemNavigator, message)? {
                        println!("Opened {opened}");
                    }
                }
                _ => {}
            }
            Ok(present::exit_status(&outcome))
        }
    }
}

/// Records what the user has just been shown so optional updates and
/// display-once messages are not offered again.
fn record_shown(checker: &UpdateChecker, outcome: &Outcome) -> Result<(), AppError> {
    match outcome {
        Outcome::UpdateFound(update) => {
            checker.record_update_displayed(update)?;
        }
        Outcome::MessageFound(message) => checker.record_message_displayed(message)?,
        Outcome::NoChange | Outcome::Failed(_) => {}
    }
    Ok(())
}

fn build_checker(
    settings: &Settings,
    properties: CurrentProperties,
) -> Result<UpdateChecker, AppError> {
    let config = settings.checker_config().ok_or(AppError::MissingEndpoint)?;
    let records = JsonFileRecordStore::for_app(&settings.package_name)?;
    UpdateChecker::with_reqwest(config, properties, Arc::new(records)).map_err(AppError::from)
}

/// Runs the check on a background runtime and waits for the outcome on this
/// thread, the way a UI thread would receive it.
fn check_blocking(checker: &UpdateChecker) -> Result<Outcome, AppError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .map_err(AppError::Runtime)?;

    let receiver = checker.spawn_check(runtime.handle())?;
    receiver.recv().map_err(|_| AppError::OutcomeLost)
}
