mod cmd;
mod completions;
mod logging;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "vpk", version, about = "Pack linked markdown notes into a portable directory")]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Export a note or folder together with everything it links to
    Export(ExportArgs),

    /// Validate configuration and print resolved paths
    Doctor,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Seed note or folder to export
    pub input: PathBuf,

    /// Output directory (defaults to the seed's name in the current directory)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Use this directory as the store root instead of detecting one
    #[arg(long)]
    pub vault: Option<PathBuf>,

    /// Print the export summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Export(args) => {
            cmd::export::run(cli.config.as_deref(), cli.profile.as_deref(), args);
        }
        Commands::Doctor => {
            cmd::doctor::run(cli.config.as_deref(), cli.profile.as_deref());
        }
        Commands::Completions(args) => completions::run(args.shell),
    }
}
