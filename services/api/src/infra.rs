use metrics_exporter_prometheus::PrometheusHandle;
use rating_prompt::config::AppConfig;
use rating_prompt::rating::{
    JsonFileRecordStore, PromptDetails, PromptOutcome, PromptResponder, RatePromptPresenter,
    RatingService, RequestToRatePromptPresenter, StaticVersionProvider, StoreError,
};
use std::io::{self, BufRead, BufReader, Stdin, Stdout, Write};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Engine over the configured JSON file, answering through `presenter`.
pub(crate) fn build_rating_service(
    config: &AppConfig,
    presenter: Arc<dyn RequestToRatePromptPresenter>,
    rate_presenter: Arc<dyn RatePromptPresenter>,
) -> RatingService<JsonFileRecordStore> {
    let store = Arc::new(JsonFileRecordStore::new(&config.storage.path));
    let rating = &config.rating;

    RatingService::builder(store)
        .app_version_provider(Arc::new(StaticVersionProvider::new(
            rating.app_version.clone(),
        )))
        .policy(rating.policy.clone())
        .reset_policy(rating.reset_policy())
        .prompt_on_launch(rating.prompt_on_launch)
        .debug_enabled(rating.debug_enabled)
        .request_to_rate_presenter(presenter)
        .rate_presenter(rate_presenter)
        .on_agreed_to_rate(|| info!("user agreed to rate"))
        .on_opted_in_for_reminder(|| info!("user asked to be reminded later"))
        .on_declined_to_rate(|| info!("user declined to rate"))
        .build()
}

/// Maps a typed answer to an outcome. An empty answer closes the prompt, which counts as a
/// decline. `None` means the input was not understood.
pub(crate) fn parse_choice(raw: &str, can_opt_in_for_reminder: bool) -> Option<PromptOutcome> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "r" | "rate" | "y" | "yes" => Some(PromptOutcome::AgreeToRate),
        "l" | "later" if can_opt_in_for_reminder => Some(PromptOutcome::RemindLater),
        "" | "n" | "no" | "never" => Some(PromptOutcome::Decline),
        _ => None,
    }
}

/// Asks the request-to-rate question on a terminal and answers synchronously.
pub(crate) struct TerminalPromptPresenter<R, W> {
    input: Mutex<R>,
    output: Mutex<W>,
    failure: Mutex<Option<StoreError>>,
}

impl TerminalPromptPresenter<BufReader<Stdin>, Stdout> {
    pub(crate) fn stdio() -> Self {
        Self::new(BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R, W> TerminalPromptPresenter<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    pub(crate) fn new(input: R, output: W) -> Self {
        Self {
            input: Mutex::new(input),
            output: Mutex::new(output),
            failure: Mutex::new(None),
        }
    }

    /// Store error raised while recording the last answer, if any.
    pub(crate) fn take_failure(&self) -> Option<StoreError> {
        self.failure.lock().expect("failure mutex poisoned").take()
    }

    /// Asks until the answer is understood. Closed input counts as a decline.
    fn ask(&self, details: &PromptDetails) -> io::Result<PromptOutcome> {
        let app_name = details.app_name.as_deref().unwrap_or("this app");
        let choices = if details.can_opt_in_for_reminder {
            "[r]ate now, remind me [l]ater, [n]o thanks: "
        } else {
            "[r]ate now, [n]o thanks: "
        };
        self.write_line(&format!("Enjoying {app_name}? Would you mind rating it?"))?;

        loop {
            self.write_prompt(choices)?;

            let mut line = String::new();
            let read = self
                .input
                .lock()
                .expect("input mutex poisoned")
                .read_line(&mut line)?;
            if read == 0 {
                return Ok(PromptOutcome::Decline);
            }

            match parse_choice(&line, details.can_opt_in_for_reminder) {
                Some(outcome) => return Ok(outcome),
                None => self.write_line(&format!("Unrecognised answer '{}'.", line.trim()))?,
            }
        }
    }

    fn write_line(&self, text: &str) -> io::Result<()> {
        let mut output = self.output.lock().expect("output mutex poisoned");
        writeln!(output, "{text}")
    }

    fn write_prompt(&self, text: &str) -> io::Result<()> {
        let mut output = self.output.lock().expect("output mutex poisoned");
        write!(output, "{text}")?;
        output.flush()
    }
}

impl<R, W> RequestToRatePromptPresenter for TerminalPromptPresenter<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    fn show(&self, details: &PromptDetails, responder: PromptResponder) {
        let outcome = match self.ask(details) {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(%error, "terminal prompt could not be shown, dismissing it");
                responder.dismiss();
                return;
            }
        };

        if let Err(error) = responder.respond(outcome) {
            warn!(%error, "failed to record rating answer");
            *self.failure.lock().expect("failure mutex poisoned") = Some(error);
        }
    }
}

/// Stands in for the store's in-app review sheet.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct TerminalRatePresenter;

impl RatePromptPresenter for TerminalRatePresenter {
    fn show(&self) {
        println!("Opening the store listing so you can leave a review.");
    }
}
