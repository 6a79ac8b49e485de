//! Bundled resource lookup.
//!
//! Resources (PAC templates, the public suffix list snapshot) are looked up
//! in the first of:
//! 1. the directory named by [`RESOURCE_DIR_ENV`]
//! 2. a `resources/` directory next to the running executable
//! 3. [`DEFAULT_RESOURCE_DIR`], the crate's source tree at build time
//!
//! The last one only exists on the machine that built the crate. Installed
//! binaries must set [`RESOURCE_DIR_ENV`] or ship `resources/` beside the
//! executable. Suffix resolution does not depend on any of this: the list
//! snapshot is compiled in.

use std::env;
use std::ffi::OsString;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::file::{abspath, open_file, read_file};

/// Environment variable overriding the resource directory.
pub const RESOURCE_DIR_ENV: &str = "GENPAC_RESOURCE_DIR";

/// Resource directory of the source tree the crate was built from.
pub const DEFAULT_RESOURCE_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/resources");

/// Name of the resource directory looked up next to the executable.
const EXE_RESOURCE_DIR: &str = "resources";

fn pick_resource_dir(env_dir: Option<OsString>, exe_dir: Option<&Path>) -> PathBuf {
    if let Some(dir) = env_dir.filter(|d| !d.is_empty()) {
        return abspath(dir);
    }
    if let Some(dir) = exe_dir.map(|d| d.join(EXE_RESOURCE_DIR)).filter(|d| d.is_dir()) {
        return dir;
    }
    PathBuf::from(DEFAULT_RESOURCE_DIR)
}

/// Directory resources are resolved against.
pub fn resource_dir() -> PathBuf {
    let exe = env::current_exe().ok();
    let dir = pick_resource_dir(env::var_os(RESOURCE_DIR_ENV), exe.as_deref().and_then(Path::parent));
    tracing::trace!(dir = %dir.display(), "resource dir");
    dir
}

/// Resolve a resource name to its path.
pub fn resource_path(path: impl AsRef<Path>) -> PathBuf {
    resource_dir().join(path)
}

/// Open a resource for reading.
pub fn open_resource(path: impl AsRef<Path>) -> Result<File> {
    open_file(resource_path(path))
}

/// Read a resource as UTF-8 text.
pub fn resource_data(path: impl AsRef<Path>) -> Result<String> {
    read_file(resource_path(path))
}
