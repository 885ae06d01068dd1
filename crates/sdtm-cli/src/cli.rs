//! CLI argument definitions for the double-programming pipeline.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use sdtm_model::Phase;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "sdtm-dual.toml";

#[derive(Parser)]
#[command(
    name = "sdtm-dual",
    version,
    about = "SDTM double programming - independent production and QC with comparison",
    long_about = "Build a mapping specification for an SDTM domain, generate and run\n\
                  independent production and QC programs, compare their datasets with\n\
                  a bounded retry, then validate the production dataset.\n\n\
                  Pipeline state is saved after every phase so a run can be resumed."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Pipeline configuration file.
    #[arg(
        long = "config",
        value_name = "PATH",
        default_value = DEFAULT_CONFIG_FILE,
        global = true
    )]
    pub config: PathBuf,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the pipeline for one domain, or a single stage of it.
    Run(RunArgs),

    /// Show the saved pipeline state for a domain.
    Status(StatusArgs),

    /// List the pipeline phases and their transitions.
    Phases,
}

#[derive(Parser)]
pub struct RunArgs {
    /// SDTM domain code (for example DM).
    #[arg(long = "domain", value_name = "DOMAIN")]
    pub domain: String,

    /// Run only this stage against the saved state.
    ///
    /// Accepts phase names (spec_building, spec_review, human_review,
    /// production, qc, comparison, validation) and the aliases spec_build,
    /// compare and validate.
    #[arg(long = "stage", value_name = "STAGE", value_parser = parse_phase)]
    pub stage: Option<Phase>,

    /// Continue from the saved state instead of starting over.
    #[arg(long = "resume", conflicts_with = "stage")]
    pub resume: bool,

    /// Continue past a failed specification review.
    #[arg(long = "force")]
    pub force: bool,
}

#[derive(Parser)]
pub struct StatusArgs {
    /// SDTM domain code (for example DM).
    #[arg(long = "domain", value_name = "DOMAIN")]
    pub domain: String,
}

fn parse_phase(value: &str) -> Result<Phase, String> {
    value.parse::<Phase>().map_err(|error| error.to_string())
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn stage_accepts_aliases() {
        let cli = Cli::try_parse_from(["sdtm-dual", "run", "--domain", "DM", "--stage", "compare"])
            .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.stage, Some(Phase::Comparison));
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_FILE));
    }

    #[test]
    fn stage_and_resume_conflict() {
        let parsed = Cli::try_parse_from([
            "sdtm-dual", "run", "--domain", "DM", "--stage", "qc", "--resume",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn unknown_stage_is_rejected() {
        let parsed = Cli::try_parse_from(["sdtm-dual", "run", "--domain", "DM", "--stage", "deploy"]);
        assert!(parsed.is_err());
    }
}
