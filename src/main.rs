use anyhow::Result;
use clap::{Parser, Subcommand};

use tiledoc::{
    instrumentation,
    render::{expand, list_macros, ExpandArgs},
};

#[derive(Parser)]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    #[clap(long)]
    #[clap(help = "Enable chrome tracing")]
    #[clap(long_help = "Enable chrome tracing which on program exit will generate
a json file to be opened with a chrome tracing compatible
viewer.")]
    trace: bool,
    #[clap(short, long)]
    #[clap(help = "Log every macro and image decision")]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[clap(about = "Expand the macros in a text file")]
    #[clap(aliases = &["e", "x"])]
    Expand(ExpandArgs),
    #[clap(about = "List the supported macros")]
    #[clap(aliases = &["m"])]
    Macros,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _trace_guard = instrumentation::init(cli.trace, cli.verbose);

    match &cli.command {
        Command::Expand(args) => expand(args),
        Command::Macros => list_macros(),
    }
}
