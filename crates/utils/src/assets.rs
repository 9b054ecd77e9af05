use std::{env, io, path::PathBuf};

use directories::ProjectDirs;

const PROJECT_ROOT: &str = env!("CARGO_MANIFEST_DIR");
const ASSET_DIR_ENV: &str = "EXCHANGE_ASSET_DIR";

/// Directory holding the local SQLite database.
///
/// `EXCHANGE_ASSET_DIR` wins when set. Debug builds fall back to
/// `dev_assets/` at the workspace root, release builds to the platform
/// data directory. The directory is created if it does not exist.
pub fn asset_dir() -> io::Result<PathBuf> {
    let path = if let Ok(custom_dir) = env::var(ASSET_DIR_ENV) {
        PathBuf::from(custom_dir)
    } else if cfg!(debug_assertions) {
        PathBuf::from(PROJECT_ROOT).join("../../dev_assets")
    } else {
        ProjectDirs::from("com", "exchange", "exchange-admin")
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no home directory"))?
            .data_dir()
            .to_path_buf()
    };

    if !path.exists() {
        std::fs::create_dir_all(&path)?;
        tracing::info!("Created asset directory: {}", path.display());
    }

    Ok(path)
}

pub fn database_path() -> io::Result<PathBuf> {
    Ok(asset_dir()?.join("exchange.sqlite"))
}
