//! File helpers.
//!
//! All paths go through [`abspath`] first, so `~/rules.txt` and relative
//! paths behave the same way everywhere in the crate. Failures are reported
//! as [`Error::FatalIo`] carrying the resolved path.

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, IoOp, Result};

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
}

fn expand_user(path: &Path) -> PathBuf {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => match home_dir() {
            Some(home) => home.join(components.as_path()),
            None => path.to_path_buf(),
        },
        _ => path.to_path_buf(),
    }
}

/// Lexical `.`/`..` cleanup; symlinks are not resolved.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root
                if !out.pop() && !out.has_root() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

fn current_dir() -> PathBuf {
    env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Resolve a user supplied path to an absolute, normalized path.
///
/// A leading `~` expands to the home directory. An empty path resolves to
/// the current working directory.
pub fn abspath(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return current_dir();
    }

    let expanded = expand_user(path);
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        current_dir().join(expanded)
    };
    normalize(&absolute)
}

/// Open a file for reading.
pub fn open_file(path: impl AsRef<Path>) -> Result<File> {
    let path = abspath(path);
    File::open(&path).map_err(|e| Error::io(IoOp::Read, path, e))
}

/// Create (or truncate) a file for writing.
pub fn create_file(path: impl AsRef<Path>) -> Result<File> {
    let path = abspath(path);
    File::create(&path).map_err(|e| Error::io(IoOp::Write, path, e))
}

/// Read a whole UTF-8 text file.
pub fn read_file(path: impl AsRef<Path>) -> Result<String> {
    let path = abspath(path);
    let text = fs::read_to_string(&path).map_err(|e| Error::io(IoOp::Read, &path, e))?;
    tracing::debug!(path = %path.display(), bytes = text.len(), "read file");
    Ok(text)
}

/// Write UTF-8 text to a file, replacing its previous content.
///
/// Byte content must be valid UTF-8; anything else is rejected before the
/// file is touched.
pub fn write_file(path: impl AsRef<Path>, content: impl AsRef<[u8]>) -> Result<()> {
    let path = abspath(path);
    let content = content.as_ref();
    let text = std::str::from_utf8(content).map_err(|e| {
        Error::io(
            IoOp::Write,
            &path,
            std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        )
    })?;

    let mut file = File::create(&path).map_err(|e| Error::io(IoOp::Write, &path, e))?;
    file.write_all(text.as_bytes())
        .and_then(|_| file.flush())
        .map_err(|e| Error::io(IoOp::Write, &path, e))?;
    tracing::debug!(path = %path.display(), bytes = text.len(), "wrote file");
    Ok(())
}
