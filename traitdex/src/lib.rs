pub mod check;
pub mod cli;
pub mod corpus;
pub mod emit;
pub mod index;
pub mod registry;
pub mod unit;

use anyhow::{bail, Context, Result};
use check::check_units;
use cli::Command;
use corpus::Corpus;
use emit::{emit_all, write_units};
use index::TraitImplementorIndex;
use std::{
    fs,
    path::{Path, PathBuf},
};
use traitdex_tracing::{println_action_green, println_action_red, println_error, println_warning};
use traitdex_util::{
    default_output_directory, find_corpus_dir, implementors_directory, CORPUS_FILE_NAME,
};

/// Builds the implementor index from the corpus named by `command` and writes one data unit per
/// trait, or in check mode verifies the units already on disk.
///
/// The whole index is built before the output directory is touched, so a malformed corpus
/// leaves previous output in place. Returns the implementors directory.
pub fn generate(command: &Command) -> Result<PathBuf> {
    let corpus_path = corpus_path(command)?;
    let corpus = Corpus::from_file(&corpus_path)?;

    println_action_green(
        "Indexing",
        &format!(
            "{} traits across {} libraries ({})",
            corpus.traits.len(),
            corpus.libraries.len(),
            corpus_path.display()
        ),
    );
    let index = TraitImplementorIndex::build(&corpus)
        .with_context(|| format!("failed to index corpus {}", corpus_path.display()))?;
    if index.is_empty() {
        println_warning("the corpus declares no traits, no data units will be emitted");
    }
    let units = emit_all(&index);

    let out_dir = match &command.out_dir {
        Some(dir) => PathBuf::from(dir),
        None => default_output_directory(corpus_path.parent().unwrap_or(Path::new("."))),
    };
    let implementors_dir = implementors_directory(&out_dir);

    if command.check {
        let stale = check_units(&implementors_dir, &units)?;
        if !stale.is_empty() {
            for unit in &stale {
                println_error(&unit.to_string());
            }
            bail!(
                "{} data units in {} are out of date",
                stale.len(),
                implementors_dir.display()
            );
        }
        println_action_green(
            "Checked",
            &format!("{} data units ({})", units.len(), implementors_dir.display()),
        );
        return Ok(implementors_dir);
    }

    if implementors_dir.exists() {
        println_action_red("Removing", &implementors_dir.display().to_string());
        fs::remove_dir_all(&implementors_dir)
            .with_context(|| format!("failed to remove {}", implementors_dir.display()))?;
    }
    fs::create_dir_all(&implementors_dir)
        .with_context(|| format!("failed to create {}", implementors_dir.display()))?;
    println_action_green(
        "Emitting",
        &format!("{} data units ({})", units.len(), implementors_dir.display()),
    );
    write_units(&implementors_dir, &units)?;
    println_action_green("Finished", &implementors_dir.display().to_string());

    Ok(implementors_dir)
}

fn corpus_path(command: &Command) -> Result<PathBuf> {
    if let Some(path) = &command.corpus {
        return Ok(PathBuf::from(path));
    }
    let current_dir = std::env::current_dir()?;
    match find_corpus_dir(&current_dir) {
        Some(dir) => Ok(dir.join(CORPUS_FILE_NAME)),
        None => bail!(
            "could not find `{CORPUS_FILE_NAME}` in `{}` or any parent directory",
            current_dir.display()
        ),
    }
}
