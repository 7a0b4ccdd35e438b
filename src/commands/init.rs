//! Init command implementation

use crate::config::Config;
use crate::error::Result;
use crate::meta::MetaDb;
use std::path::PathBuf;
use tracing::info;

/// Initialize curator: write the default config and create the database
pub async fn cmd_init(base_dir: Option<PathBuf>, force: bool) -> Result<Config> {
    let mut config = Config::default();

    let base = base_dir.unwrap_or_else(Config::default_base_dir);
    config.paths.base_dir = base.clone();
    config.paths.config_file = base.join("config.toml");
    config.paths.db_file = base.join("curator.db");
    config.paths.index_file = base.join("index.bin");

    if config.paths.config_file.exists() && !force {
        return Err(crate::error::Error::Config(format!(
            "Already initialized at {} (use --force to overwrite)",
            config.paths.config_file.display()
        )));
    }

    std::fs::create_dir_all(&base)?;
    config.save()?;

    // Creating the handle bootstraps the schema
    let _db = MetaDb::new(&config.paths.db_file).await?;

    info!("Initialized curator at {:?}", base);
    Ok(config)
}
