//! The trait implementor index: every trait of the corpus, and for each of them every known
//! library with the implementors it contributes.
use crate::corpus::Corpus;
use std::collections::{btree_map::Entry, BTreeMap, BTreeSet};
use traitdex_error::CorpusError;
use traitdex_types::{Implementor, LibraryMap, LibraryName, TraitPath};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TraitImplementorIndex {
    libraries: BTreeSet<LibraryName>,
    traits: BTreeMap<TraitPath, LibraryMap>,
}

impl TraitImplementorIndex {
    /// Builds the index from `corpus` in one pass.
    ///
    /// Every trait maps every known library, with an empty list where the library contributes
    /// nothing. Implementors keep the order the corpus lists them in. The first malformed entry
    /// aborts the build.
    pub fn build(corpus: &Corpus) -> Result<Self, CorpusError> {
        let libraries = known_libraries(&corpus.libraries)?;
        let all_empty: LibraryMap = libraries
            .iter()
            .map(|library| (library.clone(), Vec::new()))
            .collect();

        let mut traits = BTreeMap::new();
        // Unit paths already claimed, compared case-insensitively.
        let mut unit_paths: BTreeMap<String, TraitPath> = BTreeMap::new();
        for decl in &corpus.traits {
            let trait_path: TraitPath = decl.path.parse().map_err(|reason| {
                CorpusError::MalformedTraitPath {
                    raw: decl.path.clone(),
                    reason,
                }
            })?;

            let mut implementors = all_empty.clone();
            for (ix, implementor) in decl.implementors.iter().enumerate() {
                let position = ix + 1;
                let Some(library) = libraries.get(implementor.library.as_str()) else {
                    return Err(CorpusError::UnknownLibrary {
                        trait_path,
                        library: implementor.library.clone(),
                        position,
                    });
                };
                if implementor.descriptor.trim().is_empty() {
                    return Err(CorpusError::EmptyDescriptor {
                        trait_path,
                        library: library.clone(),
                        position,
                    });
                }
                implementors
                    .entry(library.clone())
                    .or_default()
                    .push(Implementor::new(implementor.descriptor.as_str()));
            }

            tracing::debug!(
                "indexed {} with {} implementors",
                trait_path,
                decl.implementors.len()
            );
            let unit_key = trait_path.unit_path().to_string_lossy().to_lowercase();
            match unit_paths.entry(unit_key) {
                Entry::Occupied(entry) if entry.get() == &trait_path => {
                    return Err(CorpusError::DuplicateTrait { trait_path });
                }
                Entry::Occupied(entry) => {
                    return Err(CorpusError::UnitPathCollision {
                        trait_path,
                        existing: entry.get().clone(),
                    });
                }
                Entry::Vacant(entry) => {
                    entry.insert(trait_path.clone());
                }
            }
            traits.insert(trait_path, implementors);
        }

        Ok(Self { libraries, traits })
    }

    /// The implementors of `trait_path`, grouped by library.
    pub fn get(&self, trait_path: &TraitPath) -> Option<&LibraryMap> {
        self.traits.get(trait_path)
    }

    /// Every indexed trait with its library map, in trait path order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&TraitPath, &LibraryMap)> {
        self.traits.iter()
    }

    /// The library set fixed for this run.
    pub fn libraries(&self) -> &BTreeSet<LibraryName> {
        &self.libraries
    }

    pub fn len(&self) -> usize {
        self.traits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traits.is_empty()
    }
}

fn known_libraries(raw_names: &[String]) -> Result<BTreeSet<LibraryName>, CorpusError> {
    let mut libraries = BTreeSet::new();
    for raw in raw_names {
        let library =
            LibraryName::new(raw.as_str()).map_err(|reason| CorpusError::MalformedLibraryName {
                raw: raw.clone(),
                reason,
            })?;
        if libraries.contains(&library) {
            return Err(CorpusError::DuplicateLibrary { library });
        }
        libraries.insert(library);
    }
    Ok(libraries)
}
