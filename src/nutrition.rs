//! Per-serving and per-meal nutrition derivation.

use log::warn;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use crate::model::RawNutrition;
use crate::tables;

/// Servings assumed when a recipe does not state any.
pub const DEFAULT_SERVINGS: u32 = 4;

/// Relative calorie mismatch tolerated between stated calories and the macro estimate.
const CALORIE_MARGIN: f64 = 0.3;

/// Realistic per-serving ranges: (key, min, max).
const PLAUSIBLE_RANGES: &[(&str, f64, f64)] = &[
    ("calories", 20.0, 1500.0),
    ("protein", 0.0, 100.0),
    ("carbs", 0.0, 150.0),
    ("fat", 0.0, 100.0),
    ("fiber", 0.0, 30.0),
    ("sugar", 0.0, 100.0),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipeType {
    Main,
    Side,
    Dessert,
    Snack,
    Breakfast,
}

impl RecipeType {
    /// Infers the type from title keywords, defaulting to a main dish.
    pub fn from_title(title: &str) -> Self {
        let lower = title.to_lowercase();
        match tables::first_keyword_match(tables::RECIPE_TYPE_KEYWORDS, &lower) {
            Some("dessert") => RecipeType::Dessert,
            Some("side") => RecipeType::Side,
            Some("snack") => RecipeType::Snack,
            Some("breakfast") => RecipeType::Breakfast,
            _ => RecipeType::Main,
        }
    }

    /// Share of a meal one serving of this type represents.
    pub fn meal_multiplier(&self) -> f64 {
        match self {
            RecipeType::Main | RecipeType::Breakfast => 1.0,
            RecipeType::Side | RecipeType::Dessert => 0.5,
            RecipeType::Snack => 0.25,
        }
    }
}

impl fmt::Display for RecipeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecipeType::Main => "main",
            RecipeType::Side => "side",
            RecipeType::Dessert => "dessert",
            RecipeType::Snack => "snack",
            RecipeType::Breakfast => "breakfast",
        };
        f.write_str(name)
    }
}

/// Nutrition as stored on a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionFacts {
    pub raw: RawNutrition,
    pub servings: u32,
    pub recipe_type: RecipeType,
    pub per_serving: RawNutrition,
    pub per_meal: RawNutrition,
}

/// Rounds to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Scales raw whole-recipe nutrition to per-serving and per-meal values.
///
/// Zero or missing servings fall back to `default_servings`.
pub fn normalize_nutrition(
    raw: &RawNutrition,
    servings: Option<u32>,
    title: &str,
    default_servings: u32,
) -> NutritionFacts {
    let servings = servings
        .filter(|s| *s > 0)
        .unwrap_or_else(|| default_servings.max(1));
    let recipe_type = RecipeType::from_title(title);

    let per_serving = raw.map(|v| round1(v / servings as f64));
    let multiplier = recipe_type.meal_multiplier();
    let per_meal = per_serving.map(|v| round1(v * multiplier));

    for issue in check_plausibility(&per_serving) {
        warn!("Implausible nutrition for '{}': {}", title, issue);
    }

    NutritionFacts {
        raw: raw.clone(),
        servings,
        recipe_type,
        per_serving,
        per_meal,
    }
}

/// Lists per-serving values outside realistic ranges and a stated calorie
/// count that disagrees with the macro estimate by more than 30%.
pub fn check_plausibility(per_serving: &RawNutrition) -> Vec<String> {
    let mut issues = Vec::new();

    for (key, value) in per_serving.entries() {
        let Some(value) = value else { continue };
        if let Some((_, min, max)) = PLAUSIBLE_RANGES.iter().find(|(k, _, _)| *k == key) {
            if value < *min || value > *max {
                issues.push(format!(
                    "{} value {} is outside realistic range ({}-{})",
                    key, value, min, max
                ));
            }
        }
    }

    if let (Some(calories), Some(protein), Some(carbs), Some(fat)) = (
        per_serving.calories,
        per_serving.protein,
        per_serving.carbs,
        per_serving.fat,
    ) {
        let estimated = protein * 4.0 + carbs * 4.0 + fat * 9.0;
        if calories > 0.0 && (estimated - calories).abs() / calories > CALORIE_MARGIN {
            issues.push(format!(
                "macros don't add up: estimated {} vs stated {} calories",
                round1(estimated),
                calories
            ));
        }
    }

    issues
}

static CALORIES_LABELLED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:calories|kcal|cal)\s*:?\s*(\d+(?:\.\d+)?)").expect("valid calories regex")
});

static CALORIES_TRAILING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:kcal|calories|calorie|cal)\b")
        .expect("valid calories regex")
});

static PROTEIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bprotein\s*:?\s*(\d+(?:\.\d+)?)").expect("valid protein regex")
});

static CARBS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(net\s+)?\bcarb(?:ohydrate)?s?\s*:?\s*(\d+(?:\.\d+)?)")
        .expect("valid carbs regex")
});

static FAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(saturated\s+|unsaturated\s+|trans\s+)?\bfat\s*:?\s*(\d+(?:\.\d+)?)")
        .expect("valid fat regex")
});

static FIBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bfib(?:er|re)\s*:?\s*(\d+(?:\.\d+)?)").expect("valid fiber regex")
});

static SUGAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bsugars?\s*:?\s*(\d+(?:\.\d+)?)").expect("valid sugar regex")
});

static SODIUM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bsodium\s*:?\s*(\d+(?:\.\d+)?)").expect("valid sodium regex")
});

/// Reads nutrition values out of free text such as
/// "Calories: 320 | Fat: 12g | Carbohydrates: 40g | Protein: 18g".
pub fn parse_nutrition_text(text: &str) -> RawNutrition {
    RawNutrition {
        calories: first_number(&CALORIES_LABELLED, text, 1)
            .or_else(|| first_number(&CALORIES_TRAILING, text, 1)),
        protein: first_number(&PROTEIN, text, 1),
        carbs: first_unqualified(&CARBS, text),
        fat: first_unqualified(&FAT, text),
        fiber: first_number(&FIBER, text, 1),
        sugar: first_number(&SUGAR, text, 1),
        sodium: first_number(&SODIUM, text, 1),
    }
}

fn first_number(re: &Regex, text: &str, group: usize) -> Option<f64> {
    re.captures(text)
        .and_then(|c| c.get(group))
        .and_then(|m| m.as_str().parse().ok())
}

// Skips qualified variants like "Saturated Fat" or "Net Carbs".
fn first_unqualified(re: &Regex, text: &str) -> Option<f64> {
    re.captures_iter(text)
        .find(|c: &Captures| c.get(1).is_none())
        .and_then(|c| c.get(2))
        .and_then(|m| m.as_str().parse().ok())
}
