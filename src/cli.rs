use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Command line of `actor-clippy`. Without a subcommand the top-level flags lint.
#[derive(Debug, Parser)]
#[command(
    name = "actor-clippy",
    version,
    about = "Find actor message handlers that can stash the same message twice",
    long_about = "Scans C# actor classes that implement a stash interface and reports \
                  every `Stash()` call that can run more than once while one message \
                  is being handled.",
    args_conflicts_with_subcommands = true,
    subcommand_precedence_over_arg = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub lint: LintArgs,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check `.cs` sources; directories are searched recursively, skipping bin/obj.
    Lint(LintArgs),

    /// Print each rule's code, name, default level and summary.
    ListRules,

    /// Print the long explanation of one rule.
    Explain {
        /// Either form works: `duplicate_stash_call` or `AK1008`.
        rule: String,
    },
}

#[derive(Debug, Clone, ClapArgs)]
pub struct LintArgs {
    /// C# sources or project directories. Reads one source from stdin if none are given.
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
    pub format: OutputFormat,

    /// Restrict the run to these rules (`AK1008,...` or rule names).
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,

    /// Rules left out of this run, same forms as `--only`.
    #[arg(long, value_delimiter = ',')]
    pub skip: Vec<String>,

    /// Settings file. When absent, `actor-clippy.toml` is looked up from the first
    /// PATH towards the filesystem root.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Fail the run on warn-level findings too, not just errors.
    #[arg(long)]
    pub deny_warnings: bool,

    /// Files linted in parallel; one engine is shared by all workers.
    #[arg(long, short = 'j')]
    pub jobs: Option<usize>,
}

/// How findings are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `file:row:col: level: name[code]: message` plus a help line.
    Pretty,
    /// One JSON document with every file's findings.
    Json,
    /// GitHub Actions `::error`/`::warning` workflow commands.
    Github,
}
