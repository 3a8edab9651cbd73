use crate::{
    constants::{PATH_SEPARATOR, UNIT_FILE_EXTENSION, UNIT_FILE_PREFIX},
    ident::first_invalid_char,
};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    path::{Component, Path, PathBuf},
    str::FromStr,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TraitPathError {
    #[error("the path is empty")]
    Empty,
    #[error("segment {position} of the path is empty")]
    EmptySegment { position: usize },
    #[error("invalid character `{ch}` in segment `{segment}`")]
    InvalidChar { segment: String, ch: char },
    #[error("`{}` is not a data unit path", path.display())]
    NotAUnitPath { path: PathBuf },
}

/// The fully-qualified identity of one trait definition, e.g. `core::ops::Shr`.
///
/// Segments compare lexicographically, so an ordered collection of paths iterates
/// module by module.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TraitPath {
    module_prefixes: Vec<String>,
    name: String,
}

impl TraitPath {
    pub fn new<I, S>(module_prefixes: I, name: S) -> Result<Self, TraitPathError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
        S: Into<String>,
    {
        let module_prefixes: Vec<String> = module_prefixes.into_iter().map(Into::into).collect();
        let name = name.into();
        for (position, segment) in module_prefixes.iter().chain(Some(&name)).enumerate() {
            check_segment(position, segment)?;
        }
        Ok(Self {
            module_prefixes,
            name,
        })
    }

    /// The module path the trait is declared in, outermost first.
    pub fn module_prefixes(&self) -> &[String] {
        &self.module_prefixes
    }

    /// The trait's own name, without its module path.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The path of this trait's data unit relative to the implementors directory:
    /// one directory per module segment and `trait.<Name>.js` as the file name.
    pub fn unit_path(&self) -> PathBuf {
        let mut path: PathBuf = self.module_prefixes.iter().collect();
        path.push(format!(
            "{UNIT_FILE_PREFIX}{}.{UNIT_FILE_EXTENSION}",
            self.name
        ));
        path
    }

    /// Recovers the trait identity from a path produced by [TraitPath::unit_path].
    pub fn from_unit_path(path: &Path) -> Result<Self, TraitPathError> {
        let not_a_unit = || TraitPathError::NotAUnitPath {
            path: path.to_path_buf(),
        };
        let mut segments = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(segment) => {
                    segments.push(segment.to_str().ok_or_else(not_a_unit)?.to_owned())
                }
                _ => return Err(not_a_unit()),
            }
        }
        let file_name = segments.pop().ok_or_else(not_a_unit)?;
        let name = file_name
            .strip_prefix(UNIT_FILE_PREFIX)
            .and_then(|rest| rest.strip_suffix(UNIT_FILE_EXTENSION))
            .and_then(|rest| rest.strip_suffix('.'))
            .ok_or_else(not_a_unit)?;
        TraitPath::new(segments, name)
    }
}

fn check_segment(position: usize, segment: &str) -> Result<(), TraitPathError> {
    if segment.is_empty() {
        return Err(TraitPathError::EmptySegment { position });
    }
    match first_invalid_char(segment, &[]) {
        Some(ch) => Err(TraitPathError::InvalidChar {
            segment: segment.to_owned(),
            ch,
        }),
        None => Ok(()),
    }
}

impl FromStr for TraitPath {
    type Err = TraitPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(TraitPathError::Empty);
        }
        let mut segments: Vec<&str> = s.split(PATH_SEPARATOR).collect();
        // `split` always yields at least one item
        let name = segments.pop().unwrap_or_default();
        TraitPath::new(segments, name)
    }
}

impl TryFrom<String> for TraitPath {
    type Error = TraitPathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TraitPath> for String {
    fn from(value: TraitPath) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TraitPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for prefix in &self.module_prefixes {
            write!(f, "{prefix}{PATH_SEPARATOR}")?;
        }
        f.write_str(&self.name)
    }
}
