use log::{error, info};
use std::env;

use recipe_normalizer::model::Outcome;
use recipe_normalizer::profiles::GENERIC_SOURCE;
use recipe_normalizer::{Engine, MemoryStore, RawSource};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Usage: recipe-normalizer <file> [source_id] [url]
    let args: Vec<String> = env::args().collect();
    let path = args
        .get(1)
        .ok_or("Please provide a file with page HTML or recipe text as an argument")?;
    let source_id = args.get(2).map_or(GENERIC_SOURCE, String::as_str);

    let mut source = RawSource::from_file(source_id, path)?;
    if let Some(url) = args.get(3) {
        source = source.with_url(url.as_str());
    }

    let engine = Engine::from_env()?;
    let store = MemoryStore::new();
    let outcome = engine.ingest(&source, &store)?;

    match &outcome {
        Outcome::Accepted(accepted) => info!("Accepted '{}'", accepted.recipe.title),
        Outcome::Rejected(rejected) => {
            error!("Rejected: {} ({})", rejected.reason, rejected.detail)
        }
    }
    println!("{}", outcome.to_json()?);

    Ok(())
}
