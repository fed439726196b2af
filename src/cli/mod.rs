//! Command-line interface module
//!
//! This module contains the implementations for the CLI subcommands.

pub mod replay;
pub mod switches;

/// Common CLI utilities
pub mod utils {
    use crate::error::{Error, Result};
    use std::path::Path;

    /// Write output to file or stdout
    pub fn write_output(content: &str, output_path: Option<&Path>) -> Result<()> {
        match output_path {
            Some(path) => std::fs::write(path, content)
                .map_err(|e| Error::Io(format!("{}: {}", path.display(), e))),
            None => {
                println!("{}", content);
                Ok(())
            }
        }
    }
}
