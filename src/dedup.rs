//! Duplicate detection against the recipe store.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};

use crate::error::EngineError;
use crate::model::{BackfillField, DedupAction, DedupDecision, Recipe};

/// Which fields identify a recipe as already stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    #[default]
    TitleAndSource,
    TitleOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    pub policy: DedupPolicy,
    /// Whether a duplicate may fill fields the stored record lacks.
    pub backfill: bool,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            policy: DedupPolicy::TitleAndSource,
            backfill: true,
        }
    }
}

/// Normalised lookup key: collapsed, trimmed, case-folded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub title: String,
    /// Absent under [`DedupPolicy::TitleOnly`].
    pub source: Option<String>,
}

impl DedupKey {
    pub fn matches(&self, record: &StoredRecipe) -> bool {
        normalize_key(&record.title) == self.title
            && self
                .source
                .as_ref()
                .map_or(true, |source| normalize_key(&record.source) == *source)
    }
}

pub fn normalize_key(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// The slice of a stored record the gate needs to decide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecipe {
    pub id: u64,
    pub title: String,
    pub source: String,
    pub source_url: Option<String>,
    pub image_url: Option<String>,
    pub prep_time_min: Option<u32>,
    pub cook_time_min: Option<u32>,
    pub servings: Option<u32>,
}

impl StoredRecipe {
    pub fn from_recipe(id: u64, recipe: &Recipe) -> Self {
        Self {
            id,
            title: recipe.title.clone(),
            source: recipe.source.clone(),
            source_url: recipe.source_url.clone(),
            image_url: recipe.image_url.clone(),
            prep_time_min: recipe.metadata.prep_time_min,
            cook_time_min: recipe.metadata.cook_time_min,
            servings: recipe.metadata.servings,
        }
    }
}

/// Outcome of committing one recipe.
#[derive(Debug, Clone, PartialEq)]
pub struct Committed {
    pub decision: DedupDecision,
    /// Id of the inserted or matched record.
    pub record_id: Option<u64>,
}

/// The storage collaborator.
pub trait RecipeStore {
    fn lookup(&self, key: &DedupKey) -> Result<Option<StoredRecipe>, EngineError>;

    fn insert(&self, recipe: &Recipe) -> Result<u64, EngineError>;

    /// Fills `fields` on record `id` from `recipe`; other fields are untouched.
    fn backfill(&self, id: u64, recipe: &Recipe, fields: &[BackfillField])
        -> Result<(), EngineError>;

    /// Decides and applies the decision.
    ///
    /// The default runs lookup and write as separate calls. Stores that can
    /// should override it to do both under one lock or transaction.
    fn commit(&self, recipe: &Recipe, gate: &DedupGate) -> Result<Committed, EngineError> {
        let existing = self.lookup(&gate.key(recipe))?;
        let decision = gate.decide(recipe, existing.as_ref());
        let record_id = match decision.action {
            DedupAction::Insert => Some(self.insert(recipe)?),
            DedupAction::UpdateExisting => {
                let id = decision.existing_id;
                if let Some(id) = id {
                    self.backfill(id, recipe, &decision.backfill)?;
                }
                id
            }
            DedupAction::SkipExisting => decision.existing_id,
        };
        Ok(Committed {
            decision,
            record_id,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct DedupGate {
    config: DedupConfig,
}

impl DedupGate {
    pub fn new(config: DedupConfig) -> Self {
        Self { config }
    }

    pub fn key(&self, recipe: &Recipe) -> DedupKey {
        DedupKey {
            title: normalize_key(&recipe.title),
            source: match self.config.policy {
                DedupPolicy::TitleAndSource => Some(normalize_key(&recipe.source)),
                DedupPolicy::TitleOnly => None,
            },
        }
    }

    /// Insert when nothing matches; otherwise skip, or update when backfill
    /// is enabled and the stored record lacks fields the candidate has.
    pub fn decide(&self, recipe: &Recipe, existing: Option<&StoredRecipe>) -> DedupDecision {
        let Some(existing) = existing else {
            return DedupDecision::insert();
        };

        let backfill = if self.config.backfill {
            missing_fields(existing, recipe)
        } else {
            Vec::new()
        };

        let action = if backfill.is_empty() {
            DedupAction::SkipExisting
        } else {
            DedupAction::UpdateExisting
        };
        debug!(
            "Duplicate of record {} for '{}': {:?} {:?}",
            existing.id, recipe.title, action, backfill
        );

        DedupDecision {
            action,
            existing_id: Some(existing.id),
            backfill,
        }
    }

    /// Read-only decision against `store`.
    pub fn check(
        &self,
        recipe: &Recipe,
        store: &dyn RecipeStore,
    ) -> Result<DedupDecision, EngineError> {
        let existing = store.lookup(&self.key(recipe))?;
        Ok(self.decide(recipe, existing.as_ref()))
    }
}

fn missing_fields(existing: &StoredRecipe, recipe: &Recipe) -> Vec<BackfillField> {
    let candidates = [
        (
            BackfillField::SourceUrl,
            existing.source_url.is_none() && recipe.source_url.is_some(),
        ),
        (
            BackfillField::ImageUrl,
            existing.image_url.is_none() && recipe.image_url.is_some(),
        ),
        (
            BackfillField::PrepTime,
            existing.prep_time_min.is_none() && recipe.metadata.prep_time_min.is_some(),
        ),
        (
            BackfillField::CookTime,
            existing.cook_time_min.is_none() && recipe.metadata.cook_time_min.is_some(),
        ),
        (
            BackfillField::Servings,
            existing.servings.is_none() && recipe.metadata.servings.is_some(),
        ),
    ];
    candidates
        .into_iter()
        .filter_map(|(field, missing)| missing.then_some(field))
        .collect()
}

/// Thread-safe in-process store. `commit` holds one lock across the check
/// and the write.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<(u64, Recipe)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> Result<MutexGuard<'_, Vec<(u64, Recipe)>>, EngineError> {
        self.records
            .lock()
            .map_err(|_| EngineError::StoreError("memory store lock poisoned".to_string()))
    }

    pub fn get(&self, id: u64) -> Result<Option<Recipe>, EngineError> {
        Ok(self
            .records()?
            .iter()
            .find(|(record_id, _)| *record_id == id)
            .map(|(_, recipe)| recipe.clone()))
    }

    pub fn len(&self) -> Result<usize, EngineError> {
        Ok(self.records()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, EngineError> {
        Ok(self.records()?.is_empty())
    }
}

fn find_in(records: &[(u64, Recipe)], key: &DedupKey) -> Option<StoredRecipe> {
    records
        .iter()
        .map(|(id, recipe)| StoredRecipe::from_recipe(*id, recipe))
        .find(|stored| key.matches(stored))
}

fn insert_into(records: &mut Vec<(u64, Recipe)>, recipe: &Recipe) -> u64 {
    let id = records.last().map_or(1, |(id, _)| id + 1);
    records.push((id, recipe.clone()));
    id
}

fn backfill_into(target: &mut Recipe, source: &Recipe, fields: &[BackfillField]) {
    for field in fields {
        match field {
            BackfillField::SourceUrl => {
                target.source_url = target.source_url.take().or(source.source_url.clone())
            }
            BackfillField::ImageUrl => {
                target.image_url = target.image_url.take().or(source.image_url.clone())
            }
            BackfillField::PrepTime => {
                target.metadata.prep_time_min =
                    target.metadata.prep_time_min.or(source.metadata.prep_time_min)
            }
            BackfillField::CookTime => {
                target.metadata.cook_time_min =
                    target.metadata.cook_time_min.or(source.metadata.cook_time_min)
            }
            BackfillField::Servings => {
                target.metadata.servings = target.metadata.servings.or(source.metadata.servings)
            }
        }
    }
}

impl RecipeStore for MemoryStore {
    fn lookup(&self, key: &DedupKey) -> Result<Option<StoredRecipe>, EngineError> {
        let records = self.records()?;
        Ok(find_in(&records, key))
    }

    fn insert(&self, recipe: &Recipe) -> Result<u64, EngineError> {
        let mut records = self.records()?;
        Ok(insert_into(&mut records, recipe))
    }

    fn backfill(
        &self,
        id: u64,
        recipe: &Recipe,
        fields: &[BackfillField],
    ) -> Result<(), EngineError> {
        let mut records = self.records()?;
        let (_, target) = records
            .iter_mut()
            .find(|(record_id, _)| *record_id == id)
            .ok_or_else(|| EngineError::StoreError(format!("no record with id {}", id)))?;
        backfill_into(target, recipe, fields);
        Ok(())
    }

    fn commit(&self, recipe: &Recipe, gate: &DedupGate) -> Result<Committed, EngineError> {
        let mut records = self.records()?;
        let existing = find_in(&records, &gate.key(recipe));
        let decision = gate.decide(recipe, existing.as_ref());

        let record_id = match decision.action {
            DedupAction::Insert => Some(insert_into(&mut records, recipe)),
            DedupAction::UpdateExisting => {
                if let Some((_, target)) = records
                    .iter_mut()
                    .find(|(id, _)| Some(*id) == decision.existing_id)
                {
                    backfill_into(target, recipe, &decision.backfill);
                }
                decision.existing_id
            }
            DedupAction::SkipExisting => decision.existing_id,
        };

        info!(
            "Committed '{}' from {}: {:?} (record {:?})",
            recipe.title, recipe.source, decision.action, record_id
        );
        Ok(Committed {
            decision,
            record_id,
        })
    }
}
