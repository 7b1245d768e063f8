//! tiered-config
//!
//! Inspect layered configuration: resolve paths against environment
//! variables, overrides, a JSON/YAML file and defaults.

use anyhow::Result;
use clap::Parser;
use tiered_config::cli::{Cli, Command};
use tiered_config::config::Config;
use tiered_config::logging::{self, LogTarget};
use tracing::debug;

fn run(cli: &Cli, config: &Config) -> Result<()> {
    match &cli.command {
        Command::Get { path, kind } => {
            println!("{}", kind.render(config, path));
        }
        Command::Dump { flat: true, path } => {
            let scope = path.as_deref().map(|p| format!("{}.", p));
            for (key, value) in config.flatten() {
                if scope.as_deref().is_none_or(|s| key.starts_with(s)) {
                    println!("{} = {}", key, value);
                }
            }
        }
        Command::Dump { flat: false, path } => {
            let tree: serde_json::Value = config.unmarshal(path.as_deref().unwrap_or(""))?;
            println!("{}", serde_json::to_string_pretty(&tree)?);
        }
        Command::EnvName { path } => {
            println!("{}", config.env_name(path));
        }
        Command::Expand { template } => {
            println!("{}", config.expand(template));
        }
        Command::Each { path, key } => {
            config.for_each(path, |element| -> Result<()> {
                println!("{}", element.get_string(key));
                Ok(())
            })?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    let config = cli.build_config()?;
    debug!(
        file = %config.config_name().display(),
        prefix = %config.env_prefix(),
        "Config ready"
    );

    run(&cli, &config)
}
