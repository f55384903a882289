use std::io::Write;

use clap::{Parser, Subcommand};

use crate::commands::{
    ControlsArgs, ResolveArgs, SchemaArgs, TriggerArgs, run_controls, run_paths, run_resolve,
    run_trigger,
};
use crate::error::Result;

#[derive(Debug, Parser)]
#[command(
    name = "dialkit",
    about = "Inspect, resolve and exercise DialKit panel schemas",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print every leaf path of a schema, one per line.
    Paths(SchemaArgs),

    /// Describe the controls a renderer would draw for a schema.
    Controls(ControlsArgs),

    /// Mount a schema, apply overrides and print the resolved snapshot.
    Resolve(ResolveArgs),

    /// Fire an action leaf and report the listeners it reached.
    Trigger(TriggerArgs),
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run(cli, &mut out)
}

pub fn run(cli: Cli, out: &mut dyn Write) -> Result<()> {
    match cli.command {
        Commands::Paths(args) => run_paths(&args, out),
        Commands::Controls(args) => run_controls(&args, out),
        Commands::Resolve(args) => run_resolve(&args, out),
        Commands::Trigger(args) => run_trigger(&args, out),
    }
}
