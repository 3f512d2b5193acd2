mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::outcome::OutcomeArgs;
use commands::reference::ReferenceArgs;
use commands::scenarios::ScenariosArgs;
use commands::workbook::WorkbookArgs;

/// Forward-hedge outcomes for grain producers
#[derive(Parser)]
#[command(
    name = "agrohedge",
    version,
    about = "Forward-hedge outcomes, scenario comparison and live-formula workbook export",
    long_about = "A CLI for pricing a soybean harvest hedged with soy and FX NDFs. Splits \
                  production into a protected and an exposed leg, compares saved market \
                  scenarios, and exports the same computation as a spreadsheet of formulas."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log debug output to stderr (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the protected/exposed outcome of the current position
    Outcome(OutcomeArgs),
    /// Evaluate saved scenarios and rank them
    Scenarios(ScenariosArgs),
    /// Compile the position into a workbook of live formulas
    Workbook(WorkbookArgs),
    /// Print the reference dataset as an editable input file
    Reference(ReferenceArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Outcome(args) => commands::outcome::run_outcome(args),
        Commands::Scenarios(args) => commands::scenarios::run_scenarios(args),
        Commands::Workbook(args) => commands::workbook::run_workbook(args),
        Commands::Reference(args) => commands::reference::run_reference(args),
        Commands::Version => {
            println!("agrohedge {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
