use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::error::Result;

pub fn save_json(data: &serde_json::Value, path: &Path) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(serde_json::to_string_pretty(data)?.as_bytes())?;
    info!("wrote {}", path.display());
    Ok(())
}

pub fn save_text(content: &str, path: &Path) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    info!("wrote {}", path.display());
    Ok(())
}
