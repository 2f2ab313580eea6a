mod commands;
mod report;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{check::CheckArgs, print::PrintArgs};

#[derive(Parser)]
#[command(name = "idlcheck", about = "Check OMG IDL files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report diagnostics for IDL files
    Check(CheckArgs),
    /// Print the syntax tree or the type model of an IDL file
    Print(PrintArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check(args) => args.run(),
        Commands::Print(args) => args.run(),
    }
}
