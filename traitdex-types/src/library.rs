use crate::ident::first_invalid_char;
use serde::{Deserialize, Serialize};
use std::{borrow::Borrow, fmt, str::FromStr};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LibraryNameError {
    #[error("the name is empty")]
    Empty,
    #[error("invalid character `{ch}`, library names are made of identifier characters and `-`")]
    InvalidChar { ch: char },
}

/// The name of a distributable unit of code, e.g. `hyper_native_tls`.
///
/// Ordering is plain lexicographic byte order, which is the order libraries are emitted in.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LibraryName(String);

impl LibraryName {
    pub fn new(name: impl Into<String>) -> Result<Self, LibraryNameError> {
        let name = name.into();
        if name.is_empty() {
            return Err(LibraryNameError::Empty);
        }
        if let Some(ch) = first_invalid_char(&name, &['-']) {
            return Err(LibraryNameError::InvalidChar { ch });
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for LibraryName {
    type Err = LibraryNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LibraryName::new(s)
    }
}

impl TryFrom<String> for LibraryName {
    type Error = LibraryNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        LibraryName::new(value)
    }
}

impl From<LibraryName> for String {
    fn from(value: LibraryName) -> Self {
        value.0
    }
}

impl Borrow<str> for LibraryName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for LibraryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LibraryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
