//! Identities and names shared between traitdex crates.

pub mod constants;
mod ident;
mod library;
mod trait_path;

pub use library::{LibraryName, LibraryNameError};
pub use trait_path::{TraitPath, TraitPathError};

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

/// A rendered description of one type, or blanket condition, satisfying a trait.
///
/// Includes generic parameters and `where` constraints exactly as the documentation shows them.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Implementor(String);

impl Implementor {
    pub fn new(descriptor: impl Into<String>) -> Self {
        Self(descriptor.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Implementor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Library name to the implementors it contributes, in discovery order.
///
/// Keys iterate in lexicographic order.
pub type LibraryMap = BTreeMap<LibraryName, Vec<Implementor>>;
