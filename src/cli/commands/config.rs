//! Config command - show settings

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{ConfigManager, Settings};
use crate::error::FreezerResult;

/// Execute the config command
pub async fn execute(
    args: ConfigArgs,
    settings: &Settings,
    manager: &ConfigManager,
) -> FreezerResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => println!("{}", render_settings(settings)?),
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
    }

    Ok(())
}

fn render_settings(settings: &Settings) -> FreezerResult<String> {
    Ok(toml::to_string_pretty(settings)?)
}
