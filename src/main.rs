// Entrypoint for the CLI application.
// - Parses arguments, loads `.env`, sets up logging, builds the client.
// - With no subcommand and no `--to`, hands off to the interactive menu.
// - Command failures are printed to stderr and mapped to an exit code.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::io;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use moltphone_cli::api::{ApiClient, ListQuery};
use moltphone_cli::commands;
use moltphone_cli::config::{AssistantOverrides, CallDefaults, ClientConfig};
use moltphone_cli::error::ClientError;
use moltphone_cli::ui::main_menu;

#[derive(Parser)]
#[command(name = "moltphone")]
#[command(about = "MoltPhone AI call tool - place calls and read transcripts", long_about = None)]
#[command(version)]
struct Cli {
    /// Phone number (E.164); shortcut for `call --to`
    #[arg(long)]
    to: Option<String>,

    #[command(flatten)]
    assistant: AssistantArgs,

    /// API base URL (defaults to MOLTPHONE_API_BASE or the public API)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// More logging on stderr (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Per-call overrides; anything left out uses the built-in defaults.
#[derive(Args, Debug, Default)]
struct AssistantArgs {
    /// Custom system prompt
    #[arg(long, requires = "to")]
    system_prompt: Option<String>,
    /// Custom first message
    #[arg(long, requires = "to")]
    first_message: Option<String>,
    /// Custom error message
    #[arg(long, requires = "to")]
    error_message: Option<String>,
    /// LLM model
    #[arg(long, requires = "to")]
    model: Option<String>,
    /// TTS voice
    #[arg(long, requires = "to")]
    voice: Option<String>,
    /// Task for webapp mode (used when no API key is set)
    #[arg(long, requires = "to")]
    task: Option<String>,
    /// Agent name for webapp mode
    #[arg(long, requires = "to")]
    agent_name: Option<String>,
}

impl AssistantArgs {
    fn overrides(&self) -> AssistantOverrides {
        AssistantOverrides {
            system_prompt: self.system_prompt.clone(),
            first_message: self.first_message.clone(),
            error_message: self.error_message.clone(),
            model: self.model.clone(),
            voice: self.voice.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Place a call
    Call {
        /// Phone number (E.164)
        #[arg(long)]
        to: String,
        #[command(flatten)]
        assistant: AssistantArgs,
    },
    /// Show a call's details and transcript (default: latest call)
    Transcript {
        /// Call ID
        #[arg(long)]
        id: Option<String>,
    },
    /// List recent calls
    Calls {
        /// Max results
        #[arg(long, default_value_t = 5)]
        limit: u32,
        /// Only calls with this status (e.g. completed, in_progress)
        #[arg(long)]
        status: Option<String>,
        /// Skip this many calls
        #[arg(long)]
        offset: Option<u32>,
    },
    /// Health check
    Health,
    /// End an active call
    End {
        /// Call ID
        #[arg(long)]
        id: String,
    },
    /// Show token balance
    Balance,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "moltphone_cli=debug",
        _ => "moltphone_cli=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    // A missing .env file is normal.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = ClientConfig::from_env().with_base_url(cli.base_url.clone());
    let api = match ApiClient::http(config, CallDefaults::default()) {
        Ok(api) => api,
        Err(err) => return report(err),
    };

    // `--to` without a subcommand is treated as `call`.
    let command = match (cli.command, cli.to) {
        (Some(command), _) => command,
        (None, Some(to)) => Commands::Call {
            to,
            assistant: cli.assistant,
        },
        (None, None) => {
            return match main_menu(api) {
                Ok(()) => ExitCode::SUCCESS,
                Err(err) => {
                    eprintln!("❌ {:#}", err);
                    ExitCode::FAILURE
                }
            };
        }
    };

    match run(command, &api) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(err),
    }
}

fn report(err: ClientError) -> ExitCode {
    tracing::debug!(error = ?err, "command failed");
    eprintln!("❌ {}", err);
    ExitCode::from(err.exit_code())
}

fn run(command: Commands, api: &ApiClient) -> Result<(), ClientError> {
    let mut out = io::stdout().lock();

    match command {
        Commands::Call { to, assistant } => {
            let call = api.call_request(
                &to,
                &assistant.overrides(),
                assistant.task.as_deref(),
                assistant.agent_name.as_deref(),
            );
            commands::place_call(api, &call, &mut out).map(|_| ())
        }
        Commands::Transcript { id } => commands::transcript(api, id.as_deref(), &mut out),
        Commands::Calls {
            limit,
            status,
            offset,
        } => {
            let query = ListQuery {
                limit,
                status,
                offset,
            };
            commands::list_calls(api, &query, &mut out)
        }
        Commands::Health => commands::health(api, &mut out),
        Commands::End { id } => commands::end_call(api, &id, &mut out),
        Commands::Balance => commands::balance(api, &mut out),
    }
}
