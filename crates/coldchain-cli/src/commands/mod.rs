use anyhow::{Context as _, Result};
use coldchain_config::AppConfig;
use coldchain_store::Store;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

pub mod alerts;
pub mod calls;
pub mod shipments;

pub struct Context<'a> {
    pub store: &'a Store,
    pub json: bool,
    pub config: &'a AppConfig,
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

/// Writes `contents` to `output`, or to stdout when no path is given.
pub fn write_output(output: Option<&Path>, contents: &str) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, contents).with_context(|| format!("write {}", path.display()))
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(contents.as_bytes())?;
            Ok(())
        }
    }
}
