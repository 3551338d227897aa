//! Fetch the configured detection model ahead of a run

use std::env;
use std::path::PathBuf;
use whisker_core::{WhiskerConfig, WhiskerError};
use whisker_eye::ModelManager;

#[tokio::main]
async fn main() -> Result<(), WhiskerError> {
    let config_path = env::args().nth(1).map(PathBuf::from);
    if matches!(config_path.as_deref().and_then(|p| p.to_str()), Some("-h" | "--help")) {
        eprintln!("Usage: download_model [config.toml]");
        eprintln!("Model name, directory, URL and checksum come from the [model] section");
        eprintln!("or WHISKER__MODEL__* environment variables.");
        std::process::exit(1);
    }

    let config = WhiskerConfig::load(config_path.as_deref())?;
    let manager = ModelManager::new(config.model);

    println!("Ensuring model {}...", manager.config().name);
    let path = manager.ensure_model().await?;
    println!("Model ready at: {:?}", path);
    Ok(())
}
