//! Shared addon-directory discovery, used by scan/resolve/load.

use std::path::{Path, PathBuf};

const MANIFEST_NAMES: [&str; 3] = ["package.json", "package.xml", "package.yaml"];

/// Returns every immediate subdirectory of `root` that carries a manifest
/// file, in directory-read order.
pub fn addon_dirs(root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(root)?.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        if MANIFEST_NAMES.iter().any(|name| path.join(name).is_file()) {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}
