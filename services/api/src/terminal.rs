use crate::infra::{build_rating_service, TerminalPromptPresenter, TerminalRatePresenter};
use clap::{Args, Subcommand};
use rating_prompt::config::AppConfig;
use rating_prompt::error::AppError;
use rating_prompt::rating::{
    JsonFileRecordStore, PromptRequest, RatingService, RatingServiceError, RatingStatus,
    ResetScope, TrackOutcome, UsageRecord,
};
use rating_prompt::telemetry;
use std::io::{BufReader, Stdin, Stdout};
use std::sync::Arc;

#[derive(Subcommand, Debug)]
pub(crate) enum TrackCommand {
    /// Count an app launch
    Launch,
    /// Count a significant event
    Event(EventArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct EventArgs {
    /// Only count the event, never prompt
    #[arg(long)]
    pub(crate) no_prompt: bool,
}

#[derive(Subcommand, Debug)]
pub(crate) enum PromptCommand {
    /// Ask the request-to-rate question now
    Request,
    /// Start the native store review flow now
    Native,
}

struct TerminalSession {
    presenter: Arc<TerminalPromptPresenter<BufReader<Stdin>, Stdout>>,
    service: RatingService<JsonFileRecordStore>,
}

impl TerminalSession {
    fn open() -> Result<Self, AppError> {
        let config = AppConfig::load()?;
        telemetry::init(&config.telemetry)?;

        let presenter = Arc::new(TerminalPromptPresenter::stdio());
        let service =
            build_rating_service(&config, presenter.clone(), Arc::new(TerminalRatePresenter));
        Ok(Self { presenter, service })
    }

    /// Surfaces a store failure hit while recording a terminal answer.
    fn finish(self) -> Result<(), AppError> {
        match self.presenter.take_failure() {
            Some(error) => Err(RatingServiceError::from(error).into()),
            None => Ok(()),
        }
    }
}

pub(crate) fn run_track(command: TrackCommand) -> Result<(), AppError> {
    let session = TerminalSession::open()?;
    let outcome = match command {
        TrackCommand::Launch => session.service.track_app_launch()?,
        TrackCommand::Event(args) => session.service.track_significant_event(!args.no_prompt)?,
    };

    println!("{}", describe_track(&outcome));
    session.finish()
}

pub(crate) fn run_status() -> Result<(), AppError> {
    let session = TerminalSession::open()?;
    let status = session.service.status()?;

    println!("{}", describe_status(&status));
    match serde_json::to_string_pretty(&status.record) {
        Ok(json) => println!("Stored record:\n{json}"),
        Err(err) => println!("Stored record unavailable: {err}"),
    }
    session.finish()
}

pub(crate) fn run_reset(scope: ResetScope) -> Result<(), AppError> {
    let session = TerminalSession::open()?;
    let record = session.service.reset(scope)?;

    println!("Reset {scope:?}: {}", describe_record(&record));
    session.finish()
}

pub(crate) fn run_prompt(command: PromptCommand) -> Result<(), AppError> {
    let session = TerminalSession::open()?;
    match command {
        PromptCommand::Request => {
            let prompt = session.service.show_request_prompt();
            println!("{}", describe_prompt(Some(prompt)));
        }
        PromptCommand::Native => session.service.show_native_rating_flow(),
    }
    session.finish()
}

fn describe_record(record: &UsageRecord) -> String {
    let first_use = record
        .first_use_date
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "never".to_string());
    format!(
        "first use {first_use}, {} launches, {} significant events, {} rated, {} declined, {} reminders",
        record.app_sessions_count,
        record.significant_event_count,
        record.rated_actions.len(),
        record.declined_actions.len(),
        record.opted_in_for_reminder_actions.len(),
    )
}

fn describe_prompt(prompt: Option<PromptRequest>) -> &'static str {
    match prompt {
        None => "Prompting skipped for this event.",
        Some(PromptRequest::Shown) => "Rating prompt shown.",
        Some(PromptRequest::AlreadyShowing) => "A rating prompt is already showing.",
        Some(PromptRequest::ConditionsNotMet) => "Not eligible for a rating prompt yet.",
    }
}

fn describe_track(outcome: &TrackOutcome) -> String {
    let mut lines = vec![format!(
        "Tracked {}: {}",
        outcome.event.label(),
        describe_record(&outcome.record)
    )];
    if outcome.reset {
        lines.push("Trackers were reset for the new app version.".to_string());
    }
    lines.push(describe_prompt(outcome.prompt).to_string());
    lines.join("\n")
}

fn describe_status(status: &RatingStatus) -> String {
    let mut lines = vec![
        format!("App version: {}", status.app_version),
        format!("Record: {}", describe_record(&status.record)),
    ];
    if status.evaluation.satisfied {
        lines.push("Eligible for a rating prompt.".to_string());
    } else {
        lines.push(format!(
            "Not eligible, unmet: {}",
            status.evaluation.unmet.join(", ")
        ));
    }
    lines.join("\n")
}
