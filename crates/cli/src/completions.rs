//! Shell completion generation for the vpk binary.

use clap::CommandFactory;
use clap_complete::{Shell, generate};

pub fn run(shell: Shell) {
    let mut cmd = crate::Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut std::io::stdout());
}
