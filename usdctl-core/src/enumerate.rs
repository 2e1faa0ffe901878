//! Recursive discovery of convertible files under a scan root.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Result, UsdError};
use crate::format::UsdFormat;

/// Collect every file of `format` under `root`, recursing into all
/// subdirectories.
///
/// The extension match is exact and case-sensitive. Returned paths are
/// absolute, in the filesystem's listing order. Zero matches is an empty
/// list, not an error; a missing or unreadable root (or any unreadable
/// directory below it) is an error with no partial results.
///
/// Symlinked directories are not followed, which bounds the traversal
/// without cycle detection.
pub fn enumerate(root: &Path, format: UsdFormat) -> Result<Vec<PathBuf>> {
    let root = root
        .canonicalize()
        .map_err(|err| UsdError::enumeration(root, err.to_string()))?;
    if !root.is_dir() {
        return Err(UsdError::enumeration(&root, "not a directory"));
    }

    let wanted = format.extension();
    let mut files = Vec::new();
    for entry in WalkDir::new(&root) {
        let entry = entry.map_err(|err| UsdError::enumeration(&root, err.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|ext| ext.to_str()) == Some(wanted) {
            files.push(entry.into_path());
        }
    }

    debug!(
        root = %root.display(),
        count = files.len(),
        "enumerated .{wanted} files"
    );
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::write(path, b"#usda 1.0\n").unwrap();
    }

    #[test]
    fn finds_matches_recursively() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("props/vehicles");
        fs::create_dir_all(&nested).unwrap();

        touch(&dir.path().join("root.usdc"));
        touch(&nested.join("car.usdc"));
        touch(&nested.join("car.usda"));
        touch(&nested.join("notes.txt"));

        let found = enumerate(dir.path(), UsdFormat::Binary).unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|p| p.is_absolute()));
        assert!(found.iter().all(|p| p.extension().unwrap() == "usdc"));
    }

    #[test]
    fn zero_matches_is_empty_not_error() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("readme.txt"));

        let found = enumerate(dir.path(), UsdFormat::Text).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn extension_match_is_case_sensitive() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("shouty.USDC"));
        touch(&dir.path().join("quiet.usdc"));

        let found = enumerate(dir.path(), UsdFormat::Binary).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("quiet.usdc"));
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("nope");

        let err = enumerate(&gone, UsdFormat::Binary).unwrap_err();
        assert!(matches!(err, UsdError::Enumeration { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directories_are_not_followed() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real");
        fs::create_dir(&real).unwrap();
        touch(&real.join("model.usdc"));
        std::os::unix::fs::symlink(&real, dir.path().join("loop")).unwrap();

        let found = enumerate(dir.path(), UsdFormat::Binary).unwrap();
        assert_eq!(found.len(), 1);
    }
}
