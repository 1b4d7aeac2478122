//! Offline vocabulary builder.
//!
//! Usage: `build-vocab <corpus.json> <out.json> [token_cap]`
//!
//! The corpus is a JSON array of `{"text": ..., "category": ...}` rows.

use mentor_match::core::artifact::{self, ArtifactError};
use mentor_match::core::{LabeledText, VocabularyBuilder};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

fn run(corpus: PathBuf, out: PathBuf, builder: VocabularyBuilder) -> Result<(), ArtifactError> {
    let rows: Vec<LabeledText> = artifact::read_json(&corpus)?.ok_or_else(|| {
        ArtifactError::Invalid(format!("corpus {} does not exist", corpus.display()))
    })?;
    info!("Read {} labeled rows from {}", rows.len(), corpus.display());

    let vocabulary = builder.build(&rows);
    vocabulary.save(&out)?;
    info!("Wrote {} categories to {}", vocabulary.len(), out.display());
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_target(false).init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("usage: {} <corpus.json> <out.json> [token_cap]", args[0]);
        return ExitCode::from(2);
    }

    let mut builder = VocabularyBuilder::default();
    if let Some(cap) = args.get(3) {
        match cap.parse() {
            Ok(cap) => builder.token_cap = cap,
            Err(e) => {
                eprintln!("invalid token cap {:?}: {}", cap, e);
                return ExitCode::from(2);
            }
        }
    }

    match run(PathBuf::from(&args[1]), PathBuf::from(&args[2]), builder) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Vocabulary build failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
