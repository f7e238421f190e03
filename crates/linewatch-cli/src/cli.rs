//! Argument parsing and command dispatch.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use reqwest::Url;
use uuid::Uuid;

use crate::client::{AppContext, CliDependencies, CliResult, parse_url};
use crate::commands::lines::{handle_alerts, handle_events, handle_lines, handle_machines};
use crate::commands::monitor::handle_monitor;
use crate::commands::publish::handle_publish;
use crate::commands::reload::handle_reload;

pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub(crate) const DEFAULT_API_URL: &str = "http://127.0.0.1:3001";
pub(crate) const DEFAULT_PUBLISH_TOPIC: &str = "cfx/mock";

/// Parses CLI arguments and executes the requested command. Returns the
/// process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let trace_id = Uuid::new_v4().to_string();
    let result = match CliDependencies::from_cli(&cli, &trace_id) {
        Ok(deps) => dispatch(cli, &deps).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

pub(crate) async fn dispatch(cli: Cli, deps: &CliDependencies) -> CliResult<()> {
    let ctx = AppContext {
        client: deps.client.clone(),
        base_url: cli.api_url,
    };
    let output = cli.output;

    match cli.command {
        Command::Lines => handle_lines(&ctx, output).await,
        Command::Machines(args) => handle_machines(&ctx, args, output).await,
        Command::Events(args) => handle_events(&ctx, args, output).await,
        Command::Alerts(args) => handle_alerts(&ctx, args, output).await,
        Command::Reload(args) => handle_reload(&ctx, args, output).await,
        Command::Monitor(args) => handle_monitor(&ctx, args, output).await,
        Command::Publish(args) => handle_publish(args).await,
    }
}

#[derive(Parser)]
#[command(name = "linewatch", about = "Inspect and drive a running line monitor")]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "LINEWATCH_API_URL",
        value_parser = parse_url,
        default_value = DEFAULT_API_URL
    )]
    pub(crate) api_url: Url,
    #[arg(
        long,
        global = true,
        env = "LINEWATCH_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS
    )]
    pub(crate) timeout: u64,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// List configured lines.
    Lines,
    /// Show machine statuses of a line.
    Machines(LineArgs),
    /// Show the recent event history of a line.
    Events(EventsArgs),
    /// Show the alert feed of a line.
    Alerts(LineArgs),
    /// Re-read the current CFX batch on the server.
    Reload(ReloadArgs),
    /// Derive line state locally from the server's raw CFX batch.
    Monitor(MonitorArgs),
    /// Publish mock CFX files to a broker.
    Publish(PublishArgs),
}

#[derive(Args)]
pub(crate) struct LineArgs {
    #[arg(help = "Line identifier")]
    pub(crate) line: String,
}

#[derive(Args)]
pub(crate) struct EventsArgs {
    #[arg(help = "Line identifier")]
    pub(crate) line: String,
    #[arg(long, help = "Show at most this many events")]
    pub(crate) limit: Option<usize>,
}

#[derive(Args, Default)]
pub(crate) struct ReloadArgs {
    #[arg(long, help = "Clear all derived state before reloading")]
    pub(crate) reset: bool,
}

#[derive(Args, Default)]
pub(crate) struct MonitorArgs {
    #[arg(long, help = "Topology JSON file; defaults to the server's lines")]
    pub(crate) topology: Option<PathBuf>,
    #[arg(long, help = "Only render this line")]
    pub(crate) line: Option<String>,
    #[arg(long, help = "Poll again every N seconds instead of exiting")]
    pub(crate) watch: Option<u64>,
}

#[derive(Args)]
pub(crate) struct PublishArgs {
    #[arg(help = "Directory of *.json CFX files")]
    pub(crate) dir: PathBuf,
    #[arg(long, env = "LINEWATCH_MQTT_URL", help = "Broker URL (mqtt://host:port)")]
    pub(crate) broker: String,
    #[arg(long, default_value = DEFAULT_PUBLISH_TOPIC)]
    pub(crate) topic: String,
    #[arg(long, default_value = "linewatch-publisher")]
    pub(crate) client_id: String,
    #[arg(long, default_value_t = 10, help = "Seconds to wait for broker acknowledgements")]
    pub(crate) ack_timeout_secs: u64,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}
