//! Errors raised while building the implementor index and while reading data units back.

use std::path::PathBuf;
use thiserror::Error;
use traitdex_types::{LibraryName, LibraryNameError, TraitPath, TraitPathError};

/// A corpus entry violating the index invariants. Fatal to the generation run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CorpusError {
    #[error("library `{raw}` has a malformed name: {reason}")]
    MalformedLibraryName {
        raw: String,
        reason: LibraryNameError,
    },
    #[error("library `{library}` is listed more than once in the corpus")]
    DuplicateLibrary { library: LibraryName },
    #[error("trait declaration `{raw}` has a malformed path: {reason}")]
    MalformedTraitPath { raw: String, reason: TraitPathError },
    #[error("trait `{trait_path}` is declared more than once in the corpus")]
    DuplicateTrait { trait_path: TraitPath },
    #[error(
        "trait `{trait_path}` maps to the same data unit as `{existing}` on a case-insensitive filesystem"
    )]
    UnitPathCollision {
        trait_path: TraitPath,
        existing: TraitPath,
    },
    #[error(
        "implementor #{position} of trait `{trait_path}` references unknown library `{library}`"
    )]
    UnknownLibrary {
        trait_path: TraitPath,
        library: String,
        position: usize,
    },
    #[error(
        "implementor #{position} of trait `{trait_path}` in library `{library}` has an empty descriptor"
    )]
    EmptyDescriptor {
        trait_path: TraitPath,
        library: LibraryName,
        position: usize,
    },
}

impl CorpusError {
    /// The trait declaration the error was raised for, if it concerns a single trait.
    pub fn trait_path(&self) -> Option<&TraitPath> {
        match self {
            CorpusError::DuplicateTrait { trait_path }
            | CorpusError::UnitPathCollision { trait_path, .. }
            | CorpusError::UnknownLibrary { trait_path, .. }
            | CorpusError::EmptyDescriptor { trait_path, .. } => Some(trait_path),
            CorpusError::MalformedLibraryName { .. }
            | CorpusError::DuplicateLibrary { .. }
            | CorpusError::MalformedTraitPath { .. } => None,
        }
    }
}

/// A data unit whose contents cannot be evaluated back into its implementors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitError {
    #[error("`{}` is not a data unit path: {reason}", path.display())]
    UnitPath { path: PathBuf, reason: TraitPathError },
    #[error("data unit for `{trait_path}` does not start with the implementors preamble")]
    MissingPreamble { trait_path: TraitPath },
    #[error("data unit for `{trait_path}` does not end with the registration shim")]
    MissingShim { trait_path: TraitPath },
    #[error("data unit for `{trait_path}`, line {line}: {reason}")]
    MalformedEntry {
        trait_path: TraitPath,
        line: usize,
        reason: String,
    },
    #[error("data unit for `{trait_path}` assigns library `{library}` more than once")]
    DuplicateLibrary {
        trait_path: TraitPath,
        library: LibraryName,
    },
}
