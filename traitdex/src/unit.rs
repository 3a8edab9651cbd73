//! Data units: one generated, independently loadable file per trait, and their evaluation back
//! into the library map they carry.
use anyhow::{Context, Result};
use std::{fs, path::Path, path::PathBuf};
use traitdex_error::UnitError;
use traitdex_types::{Implementor, LibraryMap, LibraryName, TraitPath};
use traitdex_util::relative_file_paths;

pub(crate) const PREAMBLE: &str = "(function() {var implementors = {};";
pub(crate) const ENTRY_PREFIX: &str = "implementors[";
const ENTRY_ASSIGN: &str = "] = [";
const ENTRY_END: &str = "];";
pub(crate) const REGISTRATION_SHIM: &str = r#"if (window.register_implementors) {
    window.register_implementors(implementors);
} else {
    window.pending_implementors = window.pending_implementors || [];
    window.pending_implementors.push(implementors);
}
})()
"#;

/// One trait's emitted file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataUnit {
    trait_path: TraitPath,
    contents: String,
}

/// What loading a data unit yields: the trait and its library map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadedImplementors {
    pub trait_path: TraitPath,
    pub implementors: LibraryMap,
}

impl DataUnit {
    pub fn new(trait_path: TraitPath, contents: String) -> Self {
        Self {
            trait_path,
            contents,
        }
    }

    pub fn trait_path(&self) -> &TraitPath {
        &self.trait_path
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// Where the unit lives relative to the implementors directory.
    pub fn relative_path(&self) -> PathBuf {
        self.trait_path.unit_path()
    }

    /// Evaluates the unit's payload, reconstructing the library map it was emitted from.
    pub fn evaluate(&self) -> Result<LoadedImplementors, UnitError> {
        let mut lines = self.contents.lines().enumerate();
        if !matches!(lines.next(), Some((_, PREAMBLE))) {
            return Err(UnitError::MissingPreamble {
                trait_path: self.trait_path.clone(),
            });
        }

        let mut implementors = LibraryMap::new();
        let mut shim = Vec::new();
        for (ix, line) in lines {
            if !shim.is_empty() || !line.starts_with(ENTRY_PREFIX) {
                shim.push(line);
                continue;
            }
            let (library, descriptors) =
                parse_entry(line).map_err(|reason| UnitError::MalformedEntry {
                    trait_path: self.trait_path.clone(),
                    line: ix + 1,
                    reason,
                })?;
            if implementors.contains_key(&library) {
                return Err(UnitError::DuplicateLibrary {
                    trait_path: self.trait_path.clone(),
                    library,
                });
            }
            implementors.insert(library, descriptors);
        }

        if !shim.iter().copied().eq(REGISTRATION_SHIM.lines()) {
            return Err(UnitError::MissingShim {
                trait_path: self.trait_path.clone(),
            });
        }

        Ok(LoadedImplementors {
            trait_path: self.trait_path.clone(),
            implementors,
        })
    }
}

/// Parses `implementors["lib"] = ["a","b",];`.
fn parse_entry(line: &str) -> Result<(LibraryName, Vec<Implementor>), String> {
    let rest = line
        .strip_prefix(ENTRY_PREFIX)
        .ok_or_else(|| format!("expected `{ENTRY_PREFIX}`"))?;
    let (key, rest) = parse_string_literal(rest)?;
    let library = LibraryName::new(key).map_err(|err| format!("library key: {err}"))?;
    let mut rest = rest
        .strip_prefix(ENTRY_ASSIGN)
        .ok_or_else(|| format!("expected `{ENTRY_ASSIGN}` after library key"))?;

    let mut descriptors = Vec::new();
    loop {
        if let Some(trailing) = rest.strip_prefix(ENTRY_END) {
            if !trailing.is_empty() {
                return Err(format!("unexpected `{trailing}` after `{ENTRY_END}`"));
            }
            return Ok((library, descriptors));
        }
        let (descriptor, tail) = parse_string_literal(rest)?;
        descriptors.push(Implementor::new(descriptor));
        rest = tail
            .strip_prefix(',')
            .ok_or_else(|| "expected `,` after implementor".to_owned())?;
    }
}

/// Splits a leading double-quoted string literal off `input` and decodes it.
fn parse_string_literal(input: &str) -> Result<(String, &str), String> {
    if !input.starts_with('"') {
        return Err("expected a string literal".to_owned());
    }
    let mut escaped = false;
    for (ix, byte) in input.bytes().enumerate().skip(1) {
        match byte {
            _ if escaped => escaped = false,
            b'\\' => escaped = true,
            b'"' => {
                let value = serde_json::from_str(&input[..=ix]).map_err(|err| err.to_string())?;
                return Ok((value, &input[ix + 1..]));
            }
            _ => {}
        }
    }
    Err("unterminated string literal".to_owned())
}

/// Reads every data unit below `implementors_dir`, in path order.
pub fn read_units(implementors_dir: &Path) -> Result<Vec<DataUnit>> {
    let mut units = Vec::new();
    for relative in relative_file_paths(implementors_dir)? {
        let trait_path = TraitPath::from_unit_path(&relative).map_err(|reason| {
            UnitError::UnitPath {
                path: relative.clone(),
                reason,
            }
        })?;
        let path = implementors_dir.join(&relative);
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read data unit {}", path.display()))?;
        units.push(DataUnit::new(trait_path, contents));
    }
    Ok(units)
}
