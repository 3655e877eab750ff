use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "meetlens")]
#[command(about = "Transcribe, analyze and search meeting recordings", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Upload a recording and show its transcript, summary and tags
    Analyze(AnalyzeCliArgs),
    /// List and search past meetings
    History(HistoryCliArgs),
    /// Inspect the configuration
    Config(ConfigCliArgs),
    /// Print version information
    Version,
}

#[derive(ClapArgs, Debug)]
pub struct AnalyzeCliArgs {
    /// Recording to analyze (.wav, .mp3 or .mp4)
    pub file: PathBuf,
    /// Override the analysis endpoint from the config file
    #[arg(long)]
    pub endpoint: Option<String>,
    /// Save a report (meeting-analysis.txt), optionally into DIR
    #[arg(long, value_name = "DIR", num_args = 0..=1)]
    pub export: Option<Option<PathBuf>>,
    /// Print the raw result as JSON instead of the formatted view
    #[arg(long)]
    pub json: bool,
    /// Copy part of the result to the clipboard
    #[arg(long, value_enum)]
    pub copy: Option<CopyTarget>,
    /// Hide the stage spinner
    #[arg(long)]
    pub no_progress: bool,
    /// Disable colored tags
    #[arg(long)]
    pub no_color: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CopyTarget {
    Summary,
    Transcript,
}

impl CopyTarget {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Summary => "Summary",
            Self::Transcript => "Transcript",
        }
    }
}

#[derive(ClapArgs, Debug)]
pub struct HistoryCliArgs {
    /// Only show meetings whose title or summary contains this text
    #[arg(short, long)]
    pub query: Option<String>,
    /// Print matches as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(ClapArgs, Debug)]
pub struct ConfigCliArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,
    /// Print the config file location
    Path,
}
