use crate::server;
use crate::terminal::{run_prompt, run_reset, run_status, run_track, PromptCommand, TrackCommand};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rating_prompt::error::AppError;
use rating_prompt::rating::ResetScope;

#[derive(Parser, Debug)]
#[command(
    name = "rating-prompt",
    about = "Track app usage and decide when to ask the user for a store rating",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Record a usage signal and prompt on the terminal when eligible
    Track {
        #[command(subcommand)]
        command: TrackCommand,
    },
    /// Print the stored record and which conditions are unmet
    Status,
    /// Clear part or all of the stored record
    Reset {
        #[arg(value_enum)]
        scope: ResetScopeArg,
    },
    /// Show a prompt directly, skipping the condition checks
    Prompt {
        #[command(subcommand)]
        command: PromptCommand,
    },
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResetScopeArg {
    /// First use date and counters
    Usage,
    /// Recorded prompt answers
    Actions,
    /// Everything
    All,
}

impl From<ResetScopeArg> for ResetScope {
    fn from(value: ResetScopeArg) -> Self {
        match value {
            ResetScopeArg::Usage => ResetScope::Usage,
            ResetScopeArg::Actions => ResetScope::Actions,
            ResetScopeArg::All => ResetScope::All,
        }
    }
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Track { command } => run_track(command),
        Command::Status => run_status(),
        Command::Reset { scope } => run_reset(scope.into()),
        Command::Prompt { command } => run_prompt(command),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["rating-prompt"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn track_event_accepts_no_prompt() {
        let cli = Cli::try_parse_from(["rating-prompt", "track", "event", "--no-prompt"])
            .expect("parses");
        match cli.command {
            Some(Command::Track {
                command: TrackCommand::Event(args),
            }) => assert!(args.no_prompt),
            other => panic!("expected track event, got {other:?}"),
        }
    }

    #[test]
    fn reset_scope_maps_onto_the_engine() {
        let cli = Cli::try_parse_from(["rating-prompt", "reset", "actions"]).expect("parses");
        match cli.command {
            Some(Command::Reset { scope }) => {
                assert_eq!(ResetScope::from(scope), ResetScope::Actions)
            }
            other => panic!("expected reset, got {other:?}"),
        }
        assert!(Cli::try_parse_from(["rating-prompt", "reset", "everything"]).is_err());
    }
}
