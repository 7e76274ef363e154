//! Strand CLI, the command-line front end of the strand netlist toolchain.
//!
//! Provides `strand check` to run the design rule check on a project's top
//! circuit, `strand nets` to list the nets of a circuit, and `strand clocks`
//! to list clock sources and the nets each clock reaches.

#![warn(missing_docs)]

mod check;
mod clocks;
mod nets;
mod pipeline;

use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Strand: hierarchical netlist builder and clock-domain analyzer.
#[derive(Parser, Debug)]
#[command(name = "strand", version, about = "Strand netlist checker")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a `strand.toml` file or the directory holding it.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the design rule check on the project's top circuit.
    Check(CheckArgs),
    /// List the nets of a circuit.
    Nets(NetsArgs),
    /// List clock sources and the nets each clock reaches.
    Clocks(ClocksArgs),
}

/// Arguments for the `strand check` subcommand.
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Warning codes to suppress (e.g., `--allow W207`).
    #[arg(long, num_args = 1..)]
    pub allow: Vec<String>,

    /// Warning codes to promote to errors (e.g., `--deny W208`).
    #[arg(long, num_args = 1..)]
    pub deny: Vec<String>,

    /// Fail on severe warnings.
    #[arg(long)]
    pub strict: bool,

    /// Output format for diagnostics.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Top circuit to check instead of the configured one.
    #[arg(short, long)]
    pub top: Option<String>,
}

/// Arguments for the `strand nets` subcommand.
#[derive(Parser, Debug)]
pub struct NetsArgs {
    /// Circuit whose nets are listed (default: the top circuit).
    pub circuit: Option<String>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Also list the child nets of busses.
    #[arg(long)]
    pub all: bool,
}

/// Arguments for the `strand clocks` subcommand.
#[derive(Parser, Debug)]
pub struct ClocksArgs {
    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from the environment.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Report output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::env::var_os("NO_COLOR").is_none() && std::env::var_os("TERM").is_some(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };
    init_tracing(&global);

    let result = match cli.command {
        Command::Check(ref args) => check::run(args, &global),
        Command::Nets(ref args) => nets::run(args, &global),
        Command::Clocks(ref args) => clocks::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(2);
        }
    }
}

/// Log filter for the global flags; `RUST_LOG` wins when set.
fn log_filter(global: &GlobalArgs) -> &'static str {
    if global.quiet {
        "error"
    } else if global.verbose {
        "debug"
    } else {
        "warn"
    }
}

fn init_tracing(global: &GlobalArgs) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_filter(global)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(global.color)
        .without_time()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn global(quiet: bool, verbose: bool) -> GlobalArgs {
        GlobalArgs {
            quiet,
            verbose,
            color: false,
            config: None,
        }
    }

    #[test]
    fn parse_check_default() {
        let cli = Cli::parse_from(["strand", "check"]);
        match cli.command {
            Command::Check(ref args) => {
                assert!(args.allow.is_empty());
                assert!(args.deny.is_empty());
                assert!(!args.strict);
                assert_eq!(args.format, ReportFormat::Text);
                assert!(args.top.is_none());
            }
            _ => panic!("expected Check command"),
        }
    }

    #[test]
    fn parse_check_with_args() {
        let cli = Cli::parse_from([
            "strand", "check", "--allow", "W207", "W209", "--deny", "W208", "--strict", "--format", "json",
            "--top", "alu",
        ]);
        match cli.command {
            Command::Check(ref args) => {
                assert_eq!(args.allow, vec!["W207", "W209"]);
                assert_eq!(args.deny, vec!["W208"]);
                assert!(args.strict);
                assert_eq!(args.format, ReportFormat::Json);
                assert_eq!(args.top.as_deref(), Some("alu"));
            }
            _ => panic!("expected Check command"),
        }
    }

    #[test]
    fn parse_nets_with_circuit() {
        let cli = Cli::parse_from(["strand", "nets", "alu", "--all"]);
        match cli.command {
            Command::Nets(ref args) => {
                assert_eq!(args.circuit.as_deref(), Some("alu"));
                assert!(args.all);
            }
            _ => panic!("expected Nets command"),
        }
    }

    #[test]
    fn parse_clocks_json() {
        let cli = Cli::parse_from(["strand", "clocks", "-f", "json"]);
        match cli.command {
            Command::Clocks(ref args) => assert_eq!(args.format, ReportFormat::Json),
            _ => panic!("expected Clocks command"),
        }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from(["strand", "--quiet", "--color", "never", "--config", "proj", "check"]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert_eq!(cli.color, ColorChoice::Never);
        assert_eq!(cli.config.as_deref(), Some("proj"));
    }

    #[test]
    fn log_filter_follows_flags() {
        assert_eq!(log_filter(&global(true, true)), "error");
        assert_eq!(log_filter(&global(false, true)), "debug");
        assert_eq!(log_filter(&global(false, false)), "warn");
    }
}
