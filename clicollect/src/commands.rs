//! Loading the command list.
//!
//! One command per line. Blank lines and lines whose first non-whitespace
//! character is `#` are skipped.

use std::fs;
use std::path::Path;

use log::debug;

use crate::error::ConfigError;

/// Extract commands from the contents of a commands file.
pub fn parse(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Read and parse a commands file. An empty command list is an error.
pub fn load(path: impl AsRef<Path>) -> Result<Vec<String>, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::CommandsFileNotFound {
        path: path.to_path_buf(),
        source,
    })?;

    let commands = parse(&contents);
    if commands.is_empty() {
        return Err(ConfigError::NoCommands {
            path: path.to_path_buf(),
        });
    }
    debug!("loaded {} commands from {}", commands.len(), path.display());
    Ok(commands)
}
