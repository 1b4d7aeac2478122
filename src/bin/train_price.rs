//! Offline price model trainer.
//!
//! Usage: `train-price <samples.json> <out.json>`
//!
//! Samples are a JSON array of
//! `{"text", "category", "length", "complexity", "demand", "price"}` rows.

use mentor_match::core::artifact::{self, ArtifactError};
use mentor_match::core::{PriceModel, PriceSample};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

fn run(samples: PathBuf, out: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let rows: Vec<PriceSample> = artifact::read_json(&samples)?.ok_or_else(|| {
        ArtifactError::Invalid(format!("samples {} do not exist", samples.display()))
    })?;
    info!("Read {} training samples from {}", rows.len(), samples.display());

    let model = PriceModel::fit(&rows)?;
    info!("Fitted regressor: {:?}", model.regressor);
    model.save(&out)?;
    info!("Wrote price model to {}", out.display());
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_target(false).init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        eprintln!("usage: {} <samples.json> <out.json>", args[0]);
        return ExitCode::from(2);
    }

    match run(PathBuf::from(&args[1]), PathBuf::from(&args[2])) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Training failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
