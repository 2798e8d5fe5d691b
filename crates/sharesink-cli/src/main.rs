// SPDX-License-Identifier: AGPL-3.0
// Sharesink CLI - Command-line host

mod commands;
mod fs_provider;
mod picker;

use clap::{Args, Parser, Subcommand};
use commands::{SaveTarget, SettingsChange};
use sharesink_core::{AppError, SessionOutcome, SettingsStore, ShareAction};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "sharesink", version, about = "Save shared files and text to storage")]
struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true)]
    settings_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone)]
struct TargetArgs {
    /// Destination file or directory; prompts when omitted
    #[arg(long)]
    to: Option<PathBuf>,

    /// Never prompt; a missing destination counts as cancelled
    #[arg(long)]
    no_input: bool,

    /// Write the decoded preview here when details are shown
    #[arg(long)]
    preview_out: Option<PathBuf>,
}

impl From<TargetArgs> for SaveTarget {
    fn from(args: TargetArgs) -> Self {
        SaveTarget {
            to: args.to,
            interactive: !args.no_input,
            preview_out: args.preview_out,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Save a shared file (path or URI)
    Send {
        source: String,
        /// MIME type announced by the sharer
        #[arg(long = "type")]
        mime_type: Option<String>,
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Save a file opened with "view"
    View {
        source: String,
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Save shared text as a text file
    Text {
        text: String,
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Show metadata for a file without saving it
    Info {
        source: String,
        /// Decode an image preview
        #[arg(long)]
        preview: bool,
        #[arg(long)]
        preview_out: Option<PathBuf>,
    },
    /// Show or change settings
    Settings {
        #[arg(long)]
        skip_file_picker: Option<bool>,
        #[arg(long)]
        skip_file_details: Option<bool>,
        #[arg(long)]
        show_file_preview: Option<bool>,
        #[arg(long)]
        intercept_view_intents: Option<bool>,
        /// Remember a default save directory
        #[arg(long, conflicts_with = "clear_save_location")]
        save_location: Option<PathBuf>,
        #[arg(long)]
        clear_save_location: bool,
    },
}

fn open_store(path: Option<PathBuf>) -> Result<SettingsStore, AppError> {
    match path {
        Some(path) => SettingsStore::open(path),
        None => SettingsStore::new(),
    }
}

async fn run(cli: Cli) -> Result<ExitCode, AppError> {
    let store = open_store(cli.settings_file)?;

    let (intent, target) = match cli.command {
        Command::Send {
            source,
            mime_type,
            target,
        } => (
            commands::file_intent(ShareAction::Send, commands::parse_source(&source), mime_type),
            target,
        ),
        Command::View { source, target } => (
            commands::file_intent(ShareAction::View, commands::parse_source(&source), None),
            target,
        ),
        Command::Text { text, target } => (commands::text_intent(text), target),
        Command::Info {
            source,
            preview,
            preview_out,
        } => {
            let with_preview = preview || preview_out.is_some();
            commands::handle_info(commands::parse_source(&source), with_preview, preview_out).await?;
            return Ok(ExitCode::SUCCESS);
        }
        Command::Settings {
            skip_file_picker,
            skip_file_details,
            show_file_preview,
            intercept_view_intents,
            save_location,
            clear_save_location,
        } => {
            commands::apply_settings(
                &store,
                SettingsChange {
                    skip_file_picker,
                    skip_file_details,
                    show_file_preview,
                    intercept_view_intents,
                    default_save_location: save_location,
                    clear_default_save_location: clear_save_location,
                },
            )?;
            commands::show_settings(&store)?;
            return Ok(ExitCode::SUCCESS);
        }
    };

    let outcome = commands::handle_share(intent, store.get(), target.into()).await?;
    Ok(match outcome {
        SessionOutcome::Saved(_) | SessionOutcome::Cancelled => ExitCode::SUCCESS,
        SessionOutcome::Failed(_) | SessionOutcome::NothingToSave => ExitCode::FAILURE,
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sharesink_cli=info".parse().unwrap())
                .add_directive("sharesink_core=info".parse().unwrap()),
        )
        .init();

    tracing::info!("Starting Sharesink v{}", env!("CARGO_PKG_VERSION"));

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
