use anyhow::{Context, Result};

use crate::cli::args::{ConfigCliArgs, ConfigCommand};
use crate::config::Config;

pub fn handle_config_command(args: ConfigCliArgs) -> Result<()> {
    match args.command {
        ConfigCommand::Show => {
            let config = Config::load()?;
            let rendered =
                toml::to_string_pretty(&config).context("Failed to serialize config")?;
            println!("# {}", Config::config_path()?.display());
            print!("{rendered}");
        }
        ConfigCommand::Path => {
            println!("{}", Config::config_path()?.display());
        }
    }
    Ok(())
}
