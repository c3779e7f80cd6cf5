//! File-backed logging setup for host applications

use std::fs::File;
use std::path::Path;

use simplelog::{Config, LevelFilter, WriteLogger};

/// Initialize a file logger at the given path. Call once at startup;
/// subsequent calls fail because the global logger is already set.
pub fn init(path: impl AsRef<Path>, level: LevelFilter) -> anyhow::Result<()> {
    let file = File::create(path.as_ref())?;
    WriteLogger::init(level, Config::default(), file)?;
    Ok(())
}
