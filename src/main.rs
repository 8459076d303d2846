use std::thread;
use std::time::Duration;

use clap::Parser;

use magic_pad::config::{Cli, Command, Config};
use magic_pad::{dump, forward};

fn load_config(cli: &Cli) -> Config {
    let config = Config::load(cli);
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    }
    config
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    if let Some(Command::Dump) = cli.command {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
        return dump::run_dump(&load_config(&cli));
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = load_config(&cli);
    log::info!(
        "magic-pad starting (device={}, class={}, config={})",
        config.device.display(),
        config.class.map_or_else(|| "auto".to_string(), |c| c.to_string()),
        config
            .source
            .as_ref()
            .map_or_else(|| "none".to_string(), |p| p.display().to_string())
    );

    let mut config = config;
    loop {
        if let Err(e) = forward::run(&config) {
            log::error!("{}", e);
        }
        log::warn!("Disconnected, reconnecting in 2s…");
        thread::sleep(Duration::from_secs(2));

        // Pick up file changes that need a fresh device.
        let reloaded = Config::load(&cli);
        match reloaded.validate() {
            Ok(()) => config = reloaded,
            Err(e) => log::warn!("Keeping previous configuration: {}", e),
        }
    }
}
