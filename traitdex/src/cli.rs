//! The command line interface for `traitdex`.
use clap::Parser;

#[derive(Debug, Parser, Default)]
#[clap(
    name = "traitdex",
    about = "Builds the trait implementor index of a documentation corpus and emits one data unit per trait",
    version
)]
pub struct Command {
    /// Path to the corpus file. By default, traitdex searches for `traitdex-corpus.json`
    /// in the current directory or any parent directory.
    #[clap(long)]
    pub corpus: Option<String>,
    /// Directory the `implementors` directory is written to. Defaults to `out` next to the
    /// corpus file.
    #[clap(long)]
    pub out_dir: Option<String>,
    /// Run in 'check' mode.
    ///
    /// - Exits with `0` if the emitted data units on disk are up to date.
    /// - Exits with `1` and lists every missing, outdated or extraneous data unit otherwise.
    #[clap(long)]
    pub check: bool,
    /// Silent mode. Don't output any warnings or errors to the command line.
    #[clap(long = "silent", short = 's')]
    pub silent: bool,
    /// Use verbose output, `-vv` for very verbose.
    #[clap(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
