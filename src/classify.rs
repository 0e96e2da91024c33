//! Complexity rating and tag derivation.

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::model::{Complexity, ParsedIngredient, RecipeMetadata};
use crate::tables;

/// Ingredient and instruction counts that bound each complexity level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplexityThresholds {
    pub easy_max_ingredients: usize,
    pub easy_max_instructions: usize,
    pub complex_min_ingredients: usize,
    pub complex_min_instructions: usize,
}

impl Default for ComplexityThresholds {
    fn default() -> Self {
        Self {
            easy_max_ingredients: 5,
            easy_max_instructions: 5,
            complex_min_ingredients: 12,
            complex_min_instructions: 7,
        }
    }
}

impl ComplexityThresholds {
    pub fn rate(&self, ingredients: usize, instructions: usize) -> Complexity {
        if ingredients >= self.complex_min_ingredients
            || instructions >= self.complex_min_instructions
        {
            Complexity::Complex
        } else if ingredients <= self.easy_max_ingredients
            && instructions <= self.easy_max_instructions
        {
            Complexity::Easy
        } else {
            Complexity::Medium
        }
    }
}

/// Diet tag tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DietRules {
    /// Most high-carb keyword matches a recipe may have and still be low-carb.
    pub low_carb_max: usize,
    /// Prep time at or under which a recipe counts as quick.
    pub quick_prep_max_min: u32,
    /// Total time at or under which a recipe counts as quick.
    pub quick_total_max_min: u32,
}

impl Default for DietRules {
    fn default() -> Self {
        Self {
            low_carb_max: 1,
            quick_prep_max_min: 15,
            quick_total_max_min: 30,
        }
    }
}

/// Everything the classifier derives for one recipe.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub complexity: Complexity,
    pub cuisine: Option<String>,
    pub tags: BTreeSet<String>,
}

/// Inputs to one classification, borrowed from the recipe under assembly.
pub struct ClassifyInput<'a> {
    pub title: &'a str,
    pub ingredients: &'a [ParsedIngredient],
    pub instructions: &'a [String],
    pub categories: &'a [String],
    pub cuisine: Option<&'a str>,
    pub metadata: &'a RecipeMetadata,
}

#[derive(Debug, Clone, Default)]
pub struct Classifier {
    pub thresholds: ComplexityThresholds,
    pub diet: DietRules,
}

impl Classifier {
    pub fn new(thresholds: ComplexityThresholds, diet: DietRules) -> Self {
        Self { thresholds, diet }
    }

    pub fn classify(&self, input: &ClassifyInput<'_>) -> Classification {
        let complexity = self
            .thresholds
            .rate(input.ingredients.len(), input.instructions.len());

        let mut tags: BTreeSet<String> = input
            .categories
            .iter()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .collect();

        tags.extend(diet_tags(input.ingredients, self.diet.low_carb_max).map(String::from));
        tags.extend(meal_tags(input.title, input.instructions).iter().map(|t| t.to_string()));
        tags.extend(
            dish_tags(input.title, input.ingredients, input.instructions).map(String::from),
        );

        if is_quick(input.metadata, &self.diet) {
            tags.insert("quick".to_string());
            tags.extend(tables::QUICK_COMPANIONS.iter().map(|t| t.to_string()));
            if input
                .metadata
                .total_time_min
                .is_some_and(|t| t > 0 && t <= self.diet.quick_total_max_min)
            {
                tags.insert(tables::THIRTY_MINUTE_TAG.to_string());
            }
        }

        let cuisine = detect_cuisine(input);
        if let Some(cuisine) = &cuisine {
            tags.insert(cuisine.clone());
        }

        debug!(
            "Classified '{}': complexity={} cuisine={:?} tags={:?}",
            input.title, complexity, cuisine, tags
        );

        Classification {
            complexity,
            cuisine,
            tags,
        }
    }
}

/// Diet tags over the lower-cased ingredient names.
pub fn diet_tags(ingredients: &[ParsedIngredient], low_carb_max: usize) -> impl Iterator<Item = &'static str> {
    let corpus = ingredients
        .iter()
        .map(|i| i.name.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");
    let has_any = |words: &[&str]| words.iter().any(|w| corpus.contains(w));

    let mut tags = Vec::new();
    if !has_any(tables::MEAT) {
        tags.push("vegetarian");
        if !has_any(tables::DAIRY) {
            tags.push("vegan");
        }
    }
    if !has_any(tables::GLUTEN) {
        tags.push("gluten-free");
    }
    let carb_hits = tables::HIGH_CARB
        .iter()
        .filter(|w| corpus.contains(*w))
        .count();
    if carb_hits <= low_carb_max {
        tags.push("low-carb");
        if has_any(tables::HIGH_FAT) {
            tags.push("keto");
        }
    }
    tags.into_iter()
}

/// Meal type from the title, then the instruction text; lunch, dinner and
/// main-dish otherwise.
pub fn meal_tags(title: &str, instructions: &[String]) -> Vec<&'static str> {
    let title = title.to_lowercase();
    let body = instructions.join(" ").to_lowercase();

    let meal = tables::first_keyword_match(tables::MEAL_TYPES, &title)
        .or_else(|| tables::first_keyword_match(tables::TITLE_MEAL_TYPES, &title))
        .or_else(|| tables::first_keyword_match(tables::MEAL_TYPES, &body));
    match meal {
        Some(meal) => std::iter::once(meal)
            .chain(
                tables::MEAL_TYPE_COMPANIONS
                    .iter()
                    .filter(|(name, _)| *name == meal)
                    .map(|(_, companion)| *companion),
            )
            .collect(),
        None => tables::DEFAULT_MEAL_TAGS.to_vec(),
    }
}

/// Dish type from the title, main ingredients from the title and ingredient
/// names, cooking methods from the title and instructions.
pub fn dish_tags(
    title: &str,
    ingredients: &[ParsedIngredient],
    instructions: &[String],
) -> impl Iterator<Item = &'static str> {
    let title = title.to_lowercase();
    let mut with_ingredients = title.clone();
    for ingredient in ingredients {
        with_ingredients.push(' ');
        with_ingredients.push_str(&ingredient.name.to_lowercase());
    }
    let mut with_instructions = title.clone();
    for step in instructions {
        with_instructions.push(' ');
        with_instructions.push_str(&step.to_lowercase());
    }

    let mut tags: Vec<&'static str> =
        tables::all_keyword_matches(tables::DISH_TYPES, &title).collect();
    tags.extend(tables::all_keyword_matches(tables::MAIN_INGREDIENTS, &with_ingredients));
    tags.extend(tables::all_keyword_matches(tables::COOKING_METHODS, &with_instructions));
    tags.into_iter()
}

fn is_quick(metadata: &RecipeMetadata, rules: &DietRules) -> bool {
    metadata
        .prep_time_min
        .is_some_and(|p| p > 0 && p <= rules.quick_prep_max_min)
        || metadata
            .total_time_min
            .is_some_and(|t| t > 0 && t <= rules.quick_total_max_min)
}

/// Extracted cuisine, else a category naming a cuisine, else the keyword table
/// over title, ingredients and instructions.
fn detect_cuisine(input: &ClassifyInput<'_>) -> Option<String> {
    if let Some(cuisine) = input.cuisine.map(str::trim).filter(|c| !c.is_empty()) {
        return Some(cuisine.to_lowercase());
    }

    if let Some(category) = input.categories.iter().find_map(|c| {
        let lower = c.trim().to_lowercase();
        tables::CUISINES.contains(&lower.as_str()).then_some(lower)
    }) {
        return Some(category);
    }

    let mut corpus = input.title.to_lowercase();
    for ingredient in input.ingredients {
        corpus.push(' ');
        corpus.push_str(&ingredient.name.to_lowercase());
    }
    for step in input.instructions {
        corpus.push(' ');
        corpus.push_str(&step.to_lowercase());
    }
    tables::first_keyword_match(tables::CUISINE_KEYWORDS, &corpus).map(String::from)
}
