pub mod classify;
pub mod config;
pub mod dedup;
pub mod duration;
pub mod error;
pub mod extractors;
pub mod ingredients;
pub mod model;
pub mod normalize;
pub mod nutrition;
pub mod pipeline;
pub mod profiles;
pub mod tables;

use log::debug;

pub use crate::config::EngineConfig;
pub use crate::dedup::{DedupGate, MemoryStore, RecipeStore};
pub use crate::error::EngineError;
pub use crate::model::{
    AcceptedRecipe, ExtractionReport, Outcome, RawSource, Recipe, RejectedCandidate,
};
pub use crate::normalize::Normalizer;
pub use crate::pipeline::ExtractionPipeline;
pub use crate::profiles::ProfileRegistry;

use crate::classify::Classifier;

/// Extraction, normalization and duplicate gating wired together from one
/// [`EngineConfig`].
pub struct Engine {
    profiles: ProfileRegistry,
    pipeline: ExtractionPipeline,
    normalizer: Normalizer,
    gate: DedupGate,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            profiles: ProfileRegistry::with_overrides(&config.profiles),
            pipeline: ExtractionPipeline::new(),
            normalizer: Normalizer::new(
                Classifier::new(config.complexity, config.diet),
                config.nutrition.default_servings,
            ),
            gate: DedupGate::new(config.dedup),
        }
    }

    /// Builds an engine from `recipe_engine.toml` and `RECIPE_ENGINE__*`
    /// environment variables.
    pub fn from_env() -> Result<Self, EngineError> {
        Ok(Self::new(EngineConfig::load()?))
    }

    /// Extracts and normalizes one source without touching any store.
    pub fn normalize(
        &self,
        source: &RawSource,
    ) -> Result<(Recipe, ExtractionReport), RejectedCandidate> {
        let profile = self.profiles.get(&source.source_id);
        debug!(
            "Normalizing {} source '{}' with profile '{}'",
            source.content_type,
            source.source_id,
            profile.source_id
        );
        let extraction = self.pipeline.run(source, profile)?;
        self.normalizer.normalize(source, extraction, &self.profiles)
    }

    /// Normalizes one source and commits the result through `store`.
    ///
    /// Rejections are an [`Outcome`], not an error; only store failures are.
    pub fn ingest(
        &self,
        source: &RawSource,
        store: &dyn RecipeStore,
    ) -> Result<Outcome, EngineError> {
        let (recipe, report) = match self.normalize(source) {
            Ok(normalized) => normalized,
            Err(rejected) => return Ok(Outcome::Rejected(rejected)),
        };
        let committed = store.commit(&recipe, &self.gate)?;
        Ok(Outcome::Accepted(AcceptedRecipe {
            recipe,
            decision: committed.decision,
            record_id: committed.record_id,
            report,
        }))
    }
}
