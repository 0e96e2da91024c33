//! Turns an extraction candidate into a storable [`Recipe`] or a rejection.

use log::info;
use regex::Regex;
use std::sync::LazyLock;

use crate::classify::{Classifier, ClassifyInput};
use crate::duration::derive_total_time;
use crate::extractors::collapse_whitespace;
use crate::ingredients::parse_ingredients;
use crate::model::{
    ExtractionReport, RawSource, Recipe, RecipeMetadata, RejectReason, RejectedCandidate,
    MAX_TITLE_CHARS,
};
use crate::nutrition::{normalize_nutrition, DEFAULT_SERVINGS};
use crate::pipeline::{truncate_chars, Extraction};
use crate::profiles::ProfileRegistry;
use crate::tables;

/// A usable recipe needs at least this many ingredients and instructions.
pub const MIN_LIST_ITEMS: usize = 2;

static RECIPE_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\brecipes?\b").expect("valid recipe word regex"));

static STEP_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:step\s*\d+\s*[:.)-]?\s*|\d+\s*[.)](?:\s+|$))").expect("valid step prefix regex")
});

#[derive(Debug, Clone)]
pub struct Normalizer {
    classifier: Classifier,
    default_servings: u32,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(Classifier::default(), DEFAULT_SERVINGS)
    }
}

impl Normalizer {
    pub fn new(classifier: Classifier, default_servings: u32) -> Self {
        Self {
            classifier,
            default_servings,
        }
    }

    pub fn normalize(
        &self,
        source: &RawSource,
        extraction: Extraction,
        profiles: &ProfileRegistry,
    ) -> Result<(Recipe, ExtractionReport), RejectedCandidate> {
        let Extraction {
            candidate,
            report,
            excerpt,
        } = extraction;

        let reject = |reason: RejectReason, detail: String, report: ExtractionReport| {
            info!(
                "Rejected candidate from {}: {} ({})",
                source.source_id, reason, detail
            );
            RejectedCandidate {
                source_id: source.source_id.clone(),
                reason,
                detail,
                report,
            }
        };

        let ingredients = parse_ingredients(candidate.ingredient_lines());
        let instructions: Vec<String> = candidate
            .instruction_lines()
            .iter()
            .filter_map(|line| clean_instruction(line))
            .collect();

        if ingredients.len() < MIN_LIST_ITEMS || instructions.len() < MIN_LIST_ITEMS {
            let detail = format!(
                "{} ingredients and {} instructions, need at least {} of each",
                ingredients.len(),
                instructions.len(),
                MIN_LIST_ITEMS
            );
            return Err(reject(RejectReason::InsufficientData, detail, report));
        }

        let raw_title = candidate.title.as_ref().map(|t| t.value.as_str());
        let title = match raw_title.and_then(clean_title) {
            Some(title) => title,
            None => {
                let detail = format!("unusable title {:?}", raw_title.unwrap_or_default());
                return Err(reject(RejectReason::InvalidTitle, detail, report));
            }
        };

        let prep = candidate.prep_time_min.as_ref().map(|s| s.value);
        let cook = candidate.cook_time_min.as_ref().map(|s| s.value);
        let metadata = RecipeMetadata {
            prep_time_min: prep,
            cook_time_min: cook,
            total_time_min: candidate
                .total_time_min
                .as_ref()
                .map(|s| s.value)
                .or_else(|| derive_total_time(prep, cook)),
            servings: candidate.servings.as_ref().map(|s| s.value),
        };

        let classification = self.classifier.classify(&ClassifyInput {
            title: &title,
            ingredients: &ingredients,
            instructions: &instructions,
            categories: candidate.category_list(),
            cuisine: candidate.cuisine.as_ref().map(|s| s.value.as_str()),
            metadata: &metadata,
        });

        let nutrition = candidate.nutrition.as_ref().map(|raw| {
            normalize_nutrition(&raw.value, metadata.servings, &title, self.default_servings)
        });

        let notes = candidate
            .notes
            .as_ref()
            .map(|n| {
                n.value
                    .iter()
                    .map(|note| collapse_whitespace(note))
                    .filter(|note| !note.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let recipe = Recipe {
            title,
            source: profiles.display_name(&source.source_id),
            source_url: source.url.clone(),
            ingredients,
            instructions,
            complexity: classification.complexity,
            cuisine: classification.cuisine,
            tags: classification.tags,
            metadata,
            nutrition,
            image_url: candidate.image_url.map(|s| s.value),
            notes,
            raw_excerpt: excerpt,
        };

        info!(
            "Accepted '{}' from {}: {} ingredients, {} instructions, {}",
            recipe.title,
            recipe.source,
            recipe.ingredients.len(),
            recipe.instructions.len(),
            recipe.complexity
        );
        Ok((recipe, report))
    }
}

/// Drops the word "recipe", stray separators and extra whitespace, then
/// title-cases each word. `None` when nothing usable remains.
pub fn clean_title(raw: &str) -> Option<String> {
    let without_word = RECIPE_WORD.replace_all(raw, " ");
    let collapsed = collapse_whitespace(&without_word);
    let trimmed = collapsed.trim_matches(|c: char| c.is_whitespace() || "-|:,".contains(c));
    if trimmed.is_empty() || is_header_keyword(trimmed) {
        return None;
    }

    let titled = trimmed
        .split(' ')
        .map(capitalize_first)
        .collect::<Vec<_>>()
        .join(" ");
    Some(truncate_chars(&titled, MAX_TITLE_CHARS).trim_end().to_string())
}

fn is_header_keyword(text: &str) -> bool {
    let lower = text.to_lowercase();
    tables::INGREDIENT_HEADERS
        .iter()
        .chain(tables::INSTRUCTION_HEADERS)
        .chain(tables::NOTE_HEADERS)
        .any(|header| *header == lower)
}

fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Strips step numbering, collapses whitespace, capitalizes and terminates
/// the sentence. `None` for lines that are empty once cleaned.
pub fn clean_instruction(line: &str) -> Option<String> {
    let stripped = STEP_PREFIX.replace(line, "");
    let collapsed = collapse_whitespace(&stripped);
    if collapsed.is_empty() {
        return None;
    }
    let mut sentence = capitalize_first(&collapsed);
    if !sentence.ends_with(['.', '!', '?']) {
        sentence.push('.');
    }
    Some(sentence)
}
