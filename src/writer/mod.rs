//! Output side: the CMake build script and the C++ embed artifacts, plus the
//! small file helpers both emitters share.

pub mod cmake;
pub mod embed;

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Read a whole file, returning empty on any failure. `may_not_exist`
/// suppresses the diagnostic for the expected-absent case.
pub fn read_binary_file(path: &Path, may_not_exist: bool) -> Vec<u8> {
    match fs::read(path) {
        Ok(data) => data,
        Err(err) => {
            if !may_not_exist {
                eprintln!("Error reading file: {} ({err})", path.display());
            }
            Vec::new()
        }
    }
}

/// Write `content` only when it differs from what is already on disk, so an
/// unchanged artifact keeps its mtime and downstream rules stay satisfied.
pub fn write_file_if_changed(path: &Path, content: &str) -> Result<()> {
    let existing = read_binary_file(path, true);
    if existing != content.as_bytes() {
        fs::write(path, content).with_context(|| format!("Writing {}", path.display()))?;
    }
    Ok(())
}

/// Escape a value for use inside a double-quoted CMake argument.
pub fn cmake_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Double-quoted, escaped form of a path for script output.
pub fn cmake_path(path: &Path) -> String {
    format!("\"{}\"", cmake_escape(&path.display().to_string()))
}
