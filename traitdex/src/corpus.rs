//! The parsed declarations a documentation run starts from, as handed over by the extractor.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Every library known to the run and every trait declaration with its implementors.
///
/// Names are kept as raw strings; [crate::index::TraitImplementorIndex::build] validates
/// them so errors can point at the offending declaration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Corpus {
    #[serde(default)]
    pub libraries: Vec<String>,
    #[serde(default)]
    pub traits: Vec<TraitDecl>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TraitDecl {
    /// Fully-qualified path, e.g. `core::ops::Shr`.
    pub path: String,
    /// Implementors in discovery order.
    #[serde(default)]
    pub implementors: Vec<ImplementorDecl>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImplementorDecl {
    /// The library the implementing type is owned by.
    pub library: String,
    /// The rendered implementor, e.g. `impl Shr<i32> for BigNum`.
    pub descriptor: String,
}

impl Corpus {
    pub fn new<I>(libraries: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            libraries: libraries.into_iter().map(Into::into).collect(),
            traits: Vec::new(),
        }
    }

    /// Appends a trait declaration with `(library, descriptor)` implementors.
    pub fn with_trait(mut self, path: &str, implementors: &[(&str, &str)]) -> Self {
        self.traits.push(TraitDecl {
            path: path.to_owned(),
            implementors: implementors
                .iter()
                .map(|&(library, descriptor)| ImplementorDecl {
                    library: library.to_owned(),
                    descriptor: descriptor.to_owned(),
                })
                .collect(),
        });
        self
    }

    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read corpus file {}", path.display()))?;
        Self::from_json_str(&json)
            .with_context(|| format!("failed to parse corpus file {}", path.display()))
    }
}
