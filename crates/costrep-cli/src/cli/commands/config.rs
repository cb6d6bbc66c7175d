//! `costrep config` – print where the config lives and what is in effect.

use anyhow::Result;
use costrep_core::config::{self, CostrepConfig};

pub fn show_config(cfg: &CostrepConfig) -> Result<()> {
    let path = config::config_path()?;
    println!("# {}", path.display());
    print!("{}", cfg.redacted().to_toml()?);
    if cfg.delivery.channel().is_none() {
        println!("# delivery: no channel configured (uploads are skipped)");
    }
    Ok(())
}
