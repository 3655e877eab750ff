pub mod analyze;
pub mod args;
pub mod config;
pub mod history;

pub use analyze::handle_analyze_command;
pub use args::{
    AnalyzeCliArgs, Cli, CliCommand, ConfigCliArgs, ConfigCommand, CopyTarget, HistoryCliArgs,
};
pub use config::handle_config_command;
pub use history::handle_history_command;
