//! The two on-disk representations of a USD stage and the extension
//! mapping between them.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{Result, UsdError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UsdFormat {
    /// Binary crate format, `.usdc`
    Binary,
    /// Plain-text format, `.usda`
    Text,
}

impl UsdFormat {
    pub fn extension(self) -> &'static str {
        match self {
            UsdFormat::Binary => "usdc",
            UsdFormat::Text => "usda",
        }
    }

    /// The other half of the strict two-way swap.
    pub fn counterpart(self) -> UsdFormat {
        match self {
            UsdFormat::Binary => UsdFormat::Text,
            UsdFormat::Text => UsdFormat::Binary,
        }
    }

    /// Classify a path by exact, case-sensitive extension match.
    pub fn from_path(path: &Path) -> Result<UsdFormat> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("usdc") => Ok(UsdFormat::Binary),
            Some("usda") => Ok(UsdFormat::Text),
            _ => Err(UsdError::unknown_format(path)),
        }
    }
}

/// Sibling path with the counterpart extension:
/// `/a/b/model.usdc` becomes `/a/b/model.usda`.
pub fn counterpart_path(input: &Path) -> Result<PathBuf> {
    let format = UsdFormat::from_path(input)?;
    Ok(input.with_extension(format.counterpart().extension()))
}

/// Output path under `dir` for a preview copy of `input`: the input's file
/// stem with the counterpart extension.
pub fn preview_path(input: &Path, dir: &Path) -> Result<PathBuf> {
    let format = UsdFormat::from_path(input)?;
    let stem = input
        .file_stem()
        .ok_or_else(|| UsdError::unknown_format(input))?;

    // Built by hand so a dotted stem like "a.b" survives intact.
    let mut name = OsString::from(stem);
    name.push(".");
    name.push(format.counterpart().extension());
    Ok(dir.join(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counterpart_round_trips() {
        assert_eq!(UsdFormat::Binary.counterpart().counterpart(), UsdFormat::Binary);
        assert_eq!(UsdFormat::Text.counterpart().counterpart(), UsdFormat::Text);
        assert_eq!(UsdFormat::Binary.counterpart(), UsdFormat::Text);
    }

    #[test]
    fn from_path_is_case_sensitive() {
        assert!(UsdFormat::from_path(Path::new("/a/model.usdc")).is_ok());
        assert!(UsdFormat::from_path(Path::new("/a/model.USDC")).is_err());
        assert!(UsdFormat::from_path(Path::new("/a/model.obj")).is_err());
        assert!(UsdFormat::from_path(Path::new("/a/model")).is_err());
    }

    #[test]
    fn sibling_output_swaps_extension() {
        let out = counterpart_path(Path::new("/a/b/model.usdc")).unwrap();
        assert_eq!(out, PathBuf::from("/a/b/model.usda"));

        let back = counterpart_path(&out).unwrap();
        assert_eq!(back, PathBuf::from("/a/b/model.usdc"));
    }

    #[test]
    fn preview_output_lands_in_dir() {
        let out = preview_path(Path::new("/deep/tree/model.usdc"), Path::new("/tmp/preview")).unwrap();
        assert_eq!(out, PathBuf::from("/tmp/preview/model.usda"));
    }

    #[test]
    fn preview_keeps_dotted_stems() {
        let out = preview_path(Path::new("/a/set.v2.usda"), Path::new("/tmp")).unwrap();
        assert_eq!(out, PathBuf::from("/tmp/set.v2.usdc"));
    }
}
