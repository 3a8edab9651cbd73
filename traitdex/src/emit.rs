//! Renders each trait's library map into a self-contained data unit and writes the units out.
use crate::{
    index::TraitImplementorIndex,
    unit::{DataUnit, ENTRY_PREFIX, PREAMBLE, REGISTRATION_SHIM},
};
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::{fmt::Write, fs, path::Path};
use traitdex_types::{LibraryMap, TraitPath};

/// Emits the data unit for one trait.
///
/// One `implementors[..] = [..];` line per library in lexicographic order, each descriptor a
/// string literal followed by a comma, then the registration shim. The same input always
/// renders the same bytes.
pub fn emit(trait_path: &TraitPath, implementors: &LibraryMap) -> DataUnit {
    let mut contents = String::new();
    contents.push_str(PREAMBLE);
    contents.push('\n');
    for (library, descriptors) in implementors {
        let _ = write!(contents, "{ENTRY_PREFIX}{}] = [", string_literal(library.as_str()));
        for descriptor in descriptors {
            contents.push_str(&string_literal(descriptor.as_str()));
            contents.push(',');
        }
        contents.push_str("];\n");
    }
    contents.push_str(REGISTRATION_SHIM);
    DataUnit::new(trait_path.clone(), contents)
}

/// Emits one data unit per indexed trait, in trait path order.
pub fn emit_all(index: &TraitImplementorIndex) -> Vec<DataUnit> {
    let entries: Vec<_> = index.iter().collect();
    entries
        .par_iter()
        .map(|(trait_path, implementors)| emit(trait_path, implementors))
        .collect()
}

/// Writes every unit below `implementors_dir`, one directory per module segment.
pub fn write_units(implementors_dir: &Path, units: &[DataUnit]) -> Result<()> {
    units.par_iter().try_for_each(|unit| {
        let path = implementors_dir.join(unit.relative_path());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&path, unit.contents())
            .with_context(|| format!("failed to write data unit {}", path.display()))
    })
}

/// A JavaScript string literal for `value`. JSON string syntax is valid JavaScript once the
/// line and paragraph separators, which JSON leaves raw, are escaped.
fn string_literal(value: &str) -> String {
    serde_json::Value::from(value)
        .to_string()
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Corpus;
    use expect_test::expect;
    use traitdex_types::LibraryName;

    #[test]
    fn renders_shr_unit() {
        let corpus = Corpus::new(["openssl", "antidote", "void"]).with_trait(
            "core::ops::Shr",
            &[
                ("openssl", "impl&lt;'a&gt; Shr&lt;i32&gt; for &amp;'a BigNumRef"),
                ("openssl", "impl&lt;'a&gt; Shr&lt;i32&gt; for &amp;'a BigNum"),
            ],
        );
        let index = TraitImplementorIndex::build(&corpus).unwrap();
        let units = emit_all(&index);
        assert_eq!(units.len(), 1);
        assert_eq!(
            units[0].relative_path(),
            Path::new("core/ops/trait.Shr.js")
        );
        expect![[r#"
            (function() {var implementors = {};
            implementors["antidote"] = [];
            implementors["openssl"] = ["impl&lt;'a&gt; Shr&lt;i32&gt; for &amp;'a BigNumRef","impl&lt;'a&gt; Shr&lt;i32&gt; for &amp;'a BigNum",];
            implementors["void"] = [];
            if (window.register_implementors) {
                window.register_implementors(implementors);
            } else {
                window.pending_implementors = window.pending_implementors || [];
                window.pending_implementors.push(implementors);
            }
            })()
        "#]]
        .assert_eq(units[0].contents());
    }

    #[test]
    fn escapes_descriptors() {
        let corpus = Corpus::new(["hyper_native_tls"]).with_trait(
            "hyper::net::SslServer",
            &[(
                "hyper_native_tls",
                "impl<T> SslServer<T> for \"NativeTlsServer\"\n<span class='where'>\\</span>",
            )],
        );
        let index = TraitImplementorIndex::build(&corpus).unwrap();
        let unit = &emit_all(&index)[0];
        expect![[r#"implementors["hyper_native_tls"] = ["impl<T> SslServer<T> for \"NativeTlsServer\"\n<span class='where'>\\</span>",];"#]]
            .assert_eq(unit.contents().lines().nth(1).unwrap());
    }

    #[test]
    fn escapes_line_and_paragraph_separators() {
        let descriptor = "impl Display for Line\u{2028}Break\u{2029}";
        let corpus = Corpus::new(["libfoo"]).with_trait("fmt::Display", &[("libfoo", descriptor)]);
        let unit = &emit_all(&TraitImplementorIndex::build(&corpus).unwrap())[0];
        assert!(!unit
            .contents()
            .contains(|c: char| c == '\u{2028}' || c == '\u{2029}'));
        expect![[r#"implementors["libfoo"] = ["impl Display for Line\u2028Break\u2029",];"#]]
            .assert_eq(unit.contents().lines().nth(1).unwrap());

        let loaded = unit.evaluate().unwrap();
        let libfoo: LibraryName = "libfoo".parse().unwrap();
        assert_eq!(loaded.implementors[&libfoo][0].as_str(), descriptor);
    }

    #[test]
    fn emission_is_deterministic() {
        let corpus = Corpus::new(["z", "a", "m"])
            .with_trait("m::T2", &[("m", "M"), ("a", "A")])
            .with_trait("m::T1", &[("z", "Z")]);
        let first = emit_all(&TraitImplementorIndex::build(&corpus).unwrap());
        let second = emit_all(&TraitImplementorIndex::build(&corpus).unwrap());
        assert_eq!(first, second);
        let paths: Vec<_> = first.iter().map(|unit| unit.trait_path().to_string()).collect();
        assert_eq!(paths, ["m::T1", "m::T2"]);
    }

    #[test]
    fn writes_module_directories() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = Corpus::new(["libfoo"])
            .with_trait("std::sys::imp::ext::fs::FileTypeExt", &[])
            .with_trait("Handler", &[("libfoo", "impl Handler for Mux")]);
        let units = emit_all(&TraitImplementorIndex::build(&corpus).unwrap());
        write_units(dir.path(), &units).unwrap();

        for unit in &units {
            let written = fs::read_to_string(dir.path().join(unit.relative_path())).unwrap();
            assert_eq!(written, unit.contents());
        }
        assert!(dir
            .path()
            .join("std/sys/imp/ext/fs/trait.FileTypeExt.js")
            .is_file());
        assert!(dir.path().join("trait.Handler.js").is_file());
    }
}
