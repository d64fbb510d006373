use crate::error::{Result, StoreError};
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "coldchain";
const DB_FILENAME: &str = "coldchain.sqlite3";

/// `$XDG_DATA_HOME/coldchain`, falling back to `~/.local/share/coldchain`.
pub fn data_dir() -> Result<PathBuf> {
    data_dir_from(env::var_os("XDG_DATA_HOME"), dirs::home_dir())
}

fn data_dir_from(xdg_data_home: Option<OsString>, home: Option<PathBuf>) -> Result<PathBuf> {
    match xdg_data_home.map(PathBuf::from) {
        Some(base) if base.as_os_str().is_empty() => Err(StoreError::InvalidDataPath(base)),
        Some(base) => Ok(base.join(APP_DIR)),
        None => {
            let home = home.ok_or(StoreError::MissingHomeDir)?;
            Ok(home.join(".local").join("share").join(APP_DIR))
        }
    }
}

/// Database location: an explicit path as given, otherwise the default file
/// inside a private data directory.
pub fn resolve_db_path(custom: Option<PathBuf>) -> Result<PathBuf> {
    match custom {
        Some(path) if path.as_os_str().is_empty() => Err(StoreError::InvalidDataPath(path)),
        Some(path) => Ok(path),
        None => {
            let dir = data_dir()?;
            fs::create_dir_all(&dir)?;
            restrict_dir_permissions(&dir)?;
            Ok(dir.join(DB_FILENAME))
        }
    }
}

/// Creates the parent directory of an explicit database path.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            fs::create_dir_all(parent)?;
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(unix)]
fn restrict_dir_permissions(dir: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(dir, fs::Permissions::from_mode(0o700))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_dir_permissions(_dir: &Path) -> Result<()> {
    Ok(())
}
