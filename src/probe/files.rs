//! File existence probing within directory lists.
//!
//! Toolchain validation reduces to "does file X exist in any directory of
//! this PATH/INCLUDE/LIB list". Lists are semicolon-delimited strings as
//! captured from the environment; empty segments and nonexistent
//! directories simply fail to match. No probe ever raises an error.

use std::path::{Path, PathBuf};

/// Split a semicolon-delimited directory list, skipping empty segments.
pub fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(';').map(str::trim).filter(|s| !s.is_empty())
}

/// Whether `file` exists in any directory of `list`.
pub fn find_in_dirs(list: &str, file: &str) -> bool {
    find_dir_containing(list, file).is_some()
}

/// The first directory of `list` that contains `file`.
pub fn find_dir_containing(list: &str, file: &str) -> Option<PathBuf> {
    for dir in split_list(list) {
        let dir = Path::new(dir);
        if dir.join(file).is_file() {
            return Some(dir.to_path_buf());
        }
    }
    None
}

/// Resolve a tool's full path by iterating over PATH entries.
///
/// Returns the first match that exists. Does NOT use the `where` command;
/// its behavior varies across systems and its error handling is
/// inconsistent.
pub fn resolve_on_path(file: &str, path_list: &str) -> Option<PathBuf> {
    find_dir_containing(path_list, file).map(|dir| dir.join(file))
}
