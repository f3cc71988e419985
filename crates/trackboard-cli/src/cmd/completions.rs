//! `tb completions`: shell completion scripts.

use anyhow::{Context as _, Result};
use clap::Args;
use clap_complete::{Shell, generate};
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum)]
    pub shell: Shell,

    /// Write the script to this file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Emit the completion script for the binary described by `command`.
///
/// # Errors
///
/// Returns an error if the output file cannot be created or written.
pub fn run_completions(args: &CompletionsArgs, command: &mut clap::Command) -> Result<()> {
    match &args.output {
        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            write_script(args.shell, command, &mut file)?;
            info!(shell = %args.shell, path = %path.display(), "wrote completions");
        }
        None => write_script(args.shell, command, &mut io::stdout().lock())?,
    }
    Ok(())
}

fn write_script(shell: Shell, command: &mut clap::Command, out: &mut dyn Write) -> Result<()> {
    let bin = command.get_name().to_string();
    generate(shell, command, bin, out);
    out.flush().context("failed to flush completion script")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> clap::Command {
        clap::Command::new("tb").subcommand(clap::Command::new("summary"))
    }

    #[test]
    fn script_names_the_binary_and_subcommands() {
        let mut buf = Vec::new();
        write_script(Shell::Bash, &mut command(), &mut buf).expect("generate");
        let script = String::from_utf8(buf).expect("utf8");
        assert!(script.contains("_tb"));
        assert!(script.contains("summary"));
    }

    #[test]
    fn output_flag_writes_a_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tb.fish");
        let args = CompletionsArgs {
            shell: Shell::Fish,
            output: Some(path.clone()),
        };
        run_completions(&args, &mut command()).expect("completions");
        let script = std::fs::read_to_string(path).expect("read");
        assert!(script.contains("complete -c tb"));
    }
}
