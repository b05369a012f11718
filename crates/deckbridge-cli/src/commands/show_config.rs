use std::path::Path;

use anyhow::Result;

use crate::Overrides;
use crate::config;

pub fn run(config_path: &Path, overrides: &Overrides) -> Result<()> {
    let config = config::resolve(config_path, overrides)?;
    print!("{}", config::to_toml(&config)?);
    Ok(())
}
