//! Emits the trait implementor data units of a documentation corpus.

use clap::Parser;
use tracing::error;

use traitdex::cli::Command;
use traitdex_tracing::{init_tracing_subscriber, TracingSubscriberOptions};

fn main() {
    let command = Command::parse();
    init_tracing_subscriber(TracingSubscriberOptions {
        verbosity: Some(command.verbose),
        silent: Some(command.silent),
        ..Default::default()
    });
    if let Err(err) = traitdex::generate(&command) {
        error!("Error: {:?}", err);
        std::process::exit(1);
    }
}
