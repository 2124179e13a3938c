mod config;
mod download;
mod extract;
mod table;
mod validate;

use std::path::{Path, PathBuf};

use config::Config;
use extract::{Extractor, Sources};

const USAGE: &str = "Usage: odi-process <download|extract|validate|run|cleanup> [--config config.json]";

fn get_arg(flag: &str) -> Option<String> {
    std::env::args().skip_while(|a| a != flag).nth(1)
}

/// First argument that is neither a flag nor a flag's value.
fn get_action() -> Option<String> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg.starts_with("--") {
            args.next();
            continue;
        }
        return Some(arg);
    }
    None
}

fn extract(config: &Config) -> Result<(), String> {
    let sources = Sources::load(&config.tmp_path)?;
    let extracted =
        Extractor::new(sources, config.current_year.clone(), config.years.clone()).run();
    extracted.save(&config.data_path)
}

fn cleanup(tmp_path: &Path) -> Result<(), String> {
    if !tmp_path.exists() {
        return Ok(());
    }
    std::fs::remove_dir_all(tmp_path)
        .map_err(|e| format!("Failed to remove {}: {}", tmp_path.display(), e))
}

fn run(action: &str, config: &Config) -> Result<(), String> {
    match action {
        "download" => download::download(&config.database, &config.tmp_path),
        "extract" => extract(config),
        "validate" => validate::validate(&config.data_path),
        // tmp is kept so extract can be rerun without downloading again
        "run" => {
            download::download(&config.database, &config.tmp_path)?;
            extract(config)?;
            validate::validate(&config.data_path)
        }
        "cleanup" => cleanup(&config.tmp_path),
        other => Err(format!("Unknown action: {other}. {USAGE}")),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let action = get_action().unwrap_or_else(|| {
        eprintln!("{USAGE}");
        std::process::exit(1);
    });
    let config_path = get_arg("--config")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.json"));

    let result = Config::load(&config_path).and_then(|config| {
        tracing::info!(%action, config = %config_path.display(), "starting");
        run(&action, &config)
    });
    if let Err(e) = result {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
