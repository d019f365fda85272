//! `splitcap manifest` — rebuild events.json from captured event
//! directories.

use crate::manifest;
use anyhow::Result;
use std::path::Path;

pub async fn run(out_dir: &Path) -> Result<()> {
    let events = manifest::from_store(out_dir)?;
    let path = manifest::write(out_dir, &events)?;
    println!("wrote {} ({} events)", path.display(), events.len());
    Ok(())
}
