use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use wayfinder_cli::commands::locations::handle_locations_command;
use wayfinder_cli::commands::route::{handle_route_command, RouteCommandArgs};
use wayfinder_cli::commands::validate::handle_validate_command;
use wayfinder_cli::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(author, version, about = "Indoor wayfinding over a building graph database")]
struct Cli {
    /// Path to the building database.
    #[arg(long, global = true, env = "WAYFINDER_DATA_PATH")]
    data: Option<PathBuf>,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute the cheapest route between two labelled locations.
    Route(RouteCommandArgs),
    /// List selectable locations grouped by category.
    Locations,
    /// Load the database and report its contents and problems.
    Validate {
        /// Exit with an error when any location is unreachable.
        #[arg(long)]
        strict: bool,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let data = cli.data.as_deref();

    match &cli.command {
        Command::Route(args) => handle_route_command(data, cli.format, args),
        Command::Locations => handle_locations_command(data, cli.format),
        Command::Validate { strict } => handle_validate_command(data, cli.format, *strict),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
