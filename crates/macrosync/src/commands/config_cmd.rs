//! Config subcommand handlers.

use macrosync_config::{self as config, Config};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;

pub fn handle(args: &ConfigArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            print!("{}", cfg.redacted().to_toml()?);
            Ok(())
        }
        ConfigCommand::Path => {
            let path = global.config.clone().unwrap_or_else(config::config_path);
            println!("{}", path.display());
            Ok(())
        }
    }
}
