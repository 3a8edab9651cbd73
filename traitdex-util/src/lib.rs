//! Utility items shared between traitdex crates.

use anyhow::{Context, Result};
use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};
use traitdex_types::constants::IMPLEMENTORS_DIR_NAME;
use walkdir::WalkDir;

pub const DEFAULT_OUTPUT_DIRECTORY: &str = "out";
pub const CORPUS_FILE_NAME: &str = "traitdex-corpus.json";

/// Continually go up in the file tree until a specified file is found.
pub fn find_parent_dir_with_file(starter_path: &Path, file_name: &str) -> Option<PathBuf> {
    let path = fs::canonicalize(starter_path).ok()?;
    path.ancestors()
        .find(|dir| dir.join(file_name).is_file())
        .map(Path::to_path_buf)
}

/// Continually go up in the file tree until a corpus file is found.
pub fn find_corpus_dir(starter_path: &Path) -> Option<PathBuf> {
    find_parent_dir_with_file(starter_path, CORPUS_FILE_NAME)
}

pub fn default_output_directory(corpus_dir: &Path) -> PathBuf {
    corpus_dir.join(DEFAULT_OUTPUT_DIRECTORY)
}

/// The directory data units are written to, inside `out_dir`.
pub fn implementors_directory(out_dir: &Path) -> PathBuf {
    out_dir.join(IMPLEMENTORS_DIR_NAME)
}

/// Every file below `dir`, relative to it. A missing `dir` yields an empty set.
pub fn relative_file_paths(dir: &Path) -> Result<BTreeSet<PathBuf>> {
    if !dir.exists() {
        return Ok(BTreeSet::new());
    }
    let mut paths = BTreeSet::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.with_context(|| format!("failed to walk {}", dir.display()))?;
        if entry.file_type().is_file() {
            let relative = entry.path().strip_prefix(dir)?.to_path_buf();
            paths.insert(relative);
        }
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_corpus_in_ancestor() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("docs").join("api");
        fs::create_dir_all(&nested).unwrap();
        fs::write(root.path().join(CORPUS_FILE_NAME), "{}").unwrap();

        let found = find_corpus_dir(&nested).unwrap();
        assert_eq!(found, fs::canonicalize(root.path()).unwrap());
    }

    #[test]
    fn missing_corpus_is_none() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("empty");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(
            find_parent_dir_with_file(&nested, "no-such-file-anywhere.json"),
            None
        );
    }

    #[test]
    fn lists_relative_files() {
        let root = tempfile::tempdir().unwrap();
        let units = implementors_directory(root.path());
        fs::create_dir_all(units.join("core").join("ops")).unwrap();
        fs::write(units.join("core/ops/trait.Shr.js"), "").unwrap();
        fs::write(units.join("trait.Handler.js"), "").unwrap();

        let paths: Vec<PathBuf> = relative_file_paths(&units).unwrap().into_iter().collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("core/ops/trait.Shr.js"),
                PathBuf::from("trait.Handler.js")
            ]
        );
        assert!(relative_file_paths(&root.path().join("absent"))
            .unwrap()
            .is_empty());
    }
}
