//! Per-source selector tables.
//!
//! Every profile lists, per field, the CSS selectors the DOM strategy tries in
//! order: configured extras first, then the site's own layout, then the
//! shared fallback covering recipe-card plugins and schema.org microdata.

use log::{debug, warn};
use serde::Deserialize;
use std::collections::HashMap;

use crate::model::Field;

/// Profile used for source ids with no entry of their own.
pub const GENERIC_SOURCE: &str = "generic";

/// Extra selectors for one source, as read from configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    pub display_name: Option<String>,
    /// Field key (e.g. "ingredients", "prep_time") to selectors tried first.
    pub selectors: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct SourceProfile {
    pub source_id: String,
    pub display_name: String,
    selectors: HashMap<Field, Vec<String>>,
}

impl SourceProfile {
    fn new(source_id: &str, display_name: &str) -> Self {
        Self {
            source_id: source_id.to_string(),
            display_name: display_name.to_string(),
            selectors: HashMap::new(),
        }
    }

    fn with(mut self, field: Field, selectors: &[&str]) -> Self {
        let list = self.selectors.entry(field).or_default();
        for selector in selectors {
            if !list.iter().any(|s| s == selector) {
                list.push(selector.to_string());
            }
        }
        self
    }

    /// Appends the shared fallback after the site's own selectors.
    fn with_fallback(mut self) -> Self {
        for (field, selectors) in FALLBACK_SELECTORS {
            self = self.with(*field, selectors);
        }
        self
    }

    /// Selectors for `field`, in the order they should be tried.
    pub fn selectors(&self, field: Field) -> &[String] {
        self.selectors.get(&field).map_or(&[], Vec::as_slice)
    }

    fn apply(&mut self, config: &ProfileConfig) {
        if let Some(name) = &config.display_name {
            self.display_name = name.clone();
        }
        for (key, extra) in &config.selectors {
            let Some(field) = Field::from_key(key) else {
                warn!(
                    "Ignoring selectors for unknown field '{}' in profile '{}'",
                    key, self.source_id
                );
                continue;
            };
            let list = self.selectors.entry(field).or_default();
            let mut merged = extra.clone();
            merged.extend(list.drain(..).filter(|s| !extra.contains(s)));
            *list = merged;
        }
    }
}

const FALLBACK_SELECTORS: &[(Field, &[&str])] = &[
    (
        Field::Title,
        &[
            ".wprm-recipe-name",
            ".tasty-recipes-title",
            ".mv-create-title",
            "[itemtype*='schema.org/Recipe'] [itemprop='name']",
            ".recipe-title",
            "h1",
        ],
    ),
    (
        Field::Ingredients,
        &[
            ".wprm-recipe-ingredient",
            "li[data-tr-ingredient-checkbox]",
            ".tasty-recipes-ingredients li",
            ".mv-create-ingredients li",
            "[itemprop='recipeIngredient']",
            "[itemprop='ingredients']",
            ".recipe-ingredients li",
            ".ingredients li",
        ],
    ),
    (
        Field::Instructions,
        &[
            ".wprm-recipe-instruction-text",
            ".tasty-recipes-instructions li",
            ".mv-create-instructions li",
            "[itemprop='recipeInstructions'] li",
            "[itemprop='recipeInstructions']",
            ".recipe-instructions li",
            ".instructions li",
            ".directions li",
        ],
    ),
    (
        Field::Image,
        &[
            ".wprm-recipe-image img",
            ".tasty-recipes-image img",
            ".mv-create-image",
            "[itemtype*='schema.org/Recipe'] [itemprop='image']",
            "meta[property='og:image']",
        ],
    ),
    (
        Field::Categories,
        &[
            ".wprm-recipe-course",
            ".tasty-recipes-category",
            "[itemprop='recipeCategory']",
        ],
    ),
    (
        Field::Cuisine,
        &[
            ".wprm-recipe-cuisine",
            ".tasty-recipes-cuisine",
            "[itemprop='recipeCuisine']",
        ],
    ),
    (
        Field::PrepTime,
        &[
            ".wprm-recipe-prep_time-container",
            ".tasty-recipes-prep-time",
            ".mv-create-time-prep",
            "[itemprop='prepTime']",
            ".recipe-prep-time",
            ".prep-time",
        ],
    ),
    (
        Field::CookTime,
        &[
            ".wprm-recipe-cook_time-container",
            ".tasty-recipes-cook-time",
            ".mv-create-time-active",
            "[itemprop='cookTime']",
            ".recipe-cook-time",
            ".cook-time",
        ],
    ),
    (
        Field::TotalTime,
        &[
            ".wprm-recipe-total_time-container",
            ".tasty-recipes-total-time",
            ".mv-create-time-total",
            "[itemprop='totalTime']",
            ".recipe-total-time",
            ".total-time",
        ],
    ),
    (
        Field::Servings,
        &[
            ".wprm-recipe-servings",
            ".tasty-recipes-yield",
            ".mv-create-yield",
            "[itemprop='recipeYield']",
            ".recipe-yield",
            ".recipe-servings",
        ],
    ),
    (
        Field::Nutrition,
        &[
            ".wprm-nutrition-label-container",
            ".tasty-recipes-nutrition",
            ".mv-create-nutrition",
            "[itemprop='nutrition']",
            ".nutrition-info",
        ],
    ),
    (
        Field::Notes,
        &[
            ".wprm-recipe-notes",
            ".tasty-recipes-notes p",
            ".tasty-recipes-notes li",
            ".mv-create-notes li",
            ".recipe-notes p",
            ".recipe-notes li",
        ],
    ),
];

// Sites built on the Tasty Recipes card share one layout.
const TASTY_SITES: &[(&str, &str)] = &[
    ("pinchofyum", "Pinch of Yum"),
    ("hostthetoast", "Host the Toast"),
    ("fitfabfodmap", "Fit Fab FODMAP"),
    ("pickledplum", "Pickled Plum"),
];

fn tasty_profile(source_id: &str, display_name: &str) -> SourceProfile {
    SourceProfile::new(source_id, display_name)
        .with(Field::Title, &[".tasty-recipes-title", "h1.entry-title"])
        .with(
            Field::Ingredients,
            &["li[data-tr-ingredient-checkbox]", ".tasty-recipes-ingredients li"],
        )
        .with(Field::Instructions, &[".tasty-recipes-instructions li"])
        .with(Field::Notes, &[".tasty-recipes-notes p", ".tasty-recipes-notes li"])
        .with(Field::PrepTime, &[".tasty-recipes-prep-time"])
        .with(Field::CookTime, &[".tasty-recipes-cook-time"])
        .with(Field::TotalTime, &[".tasty-recipes-total-time"])
        .with(Field::Servings, &[".tasty-recipes-yield"])
        .with(Field::Nutrition, &[".tasty-recipes-nutrition"])
        .with(
            Field::Image,
            &[".tasty-recipes-image img", "meta[property='og:image']"],
        )
        .with_fallback()
}

fn builtin_profiles() -> Vec<SourceProfile> {
    let mut profiles = vec![
        SourceProfile::new("allrecipes", "AllRecipes")
            .with(Field::Title, &["h1.recipe-title", "h1.headline", "h1.article-heading"])
            .with(
                Field::Ingredients,
                &[
                    ".mm-recipes-structured-ingredients__list-item",
                    ".ingredients-item-name",
                    ".ingredients-list li",
                ],
            )
            .with(
                Field::Instructions,
                &[
                    ".mm-recipes-steps .mntl-sc-block-group--LI p",
                    ".instructions-section .section-body p",
                    ".recipe-directions__list--item",
                    ".instructions-section li",
                ],
            )
            .with(Field::Image, &[".primary-image__image", "meta[property='og:image']"])
            .with_fallback(),
        SourceProfile::new("simplyrecipes", "Simply Recipes")
            .with(Field::Title, &["h1.article-heading", "h1.heading__title"])
            .with(Field::Ingredients, &[".structured-ingredients__list-item"])
            .with(
                Field::Instructions,
                &[
                    ".structured-project__steps .mntl-sc-block-group--LI p",
                    ".structured-project__steps .mntl-sc-block-group--LI",
                ],
            )
            .with(Field::PrepTime, &[".prep-time .meta-text__data"])
            .with(Field::CookTime, &[".cook-time .meta-text__data"])
            .with(Field::TotalTime, &[".total-time .meta-text__data"])
            .with(Field::Servings, &[".recipe-serving .meta-text__data"])
            .with(Field::Image, &[".primary-image img", "meta[property='og:image']"])
            .with_fallback(),
        SourceProfile::new("eatingwell", "EatingWell")
            .with(Field::Title, &["h1.article-heading"])
            .with(Field::Ingredients, &[".mm-recipes-structured-ingredients__list-item"])
            .with(Field::Instructions, &[".mm-recipes-steps .mntl-sc-block-group--LI p"])
            .with(Field::Image, &["meta[property='og:image']"])
            .with_fallback(),
        SourceProfile::new("foodnetwork", "Food Network")
            .with(Field::Title, &["h1.o-AssetTitle__a-Headline"])
            .with(Field::Ingredients, &[".o-Ingredients__a-Ingredient--CheckboxLabel"])
            .with(Field::Instructions, &[".o-Method__m-Step"])
            .with(Field::Image, &[".m-MediaBlock__a-Image", "meta[property='og:image']"])
            .with(Field::TotalTime, &[".o-RecipeInfo__a-Description.m-RecipeInfo__a-Description--Total"])
            .with_fallback(),
        SourceProfile::new("epicurious", "Epicurious")
            .with(Field::Title, &["h1[data-testid='ContentHeaderHed']", "h1"])
            .with(Field::Ingredients, &[".ingredients-section .ingredient"])
            .with(Field::Instructions, &[".preparation-step"])
            .with(Field::Image, &[".recipe-image img", "meta[property='og:image']"])
            .with_fallback(),
        // Pasted social posts carry no markup; the text strategy does the work.
        SourceProfile::new("facebook", "Facebook"),
    ];
    profiles.extend(
        TASTY_SITES
            .iter()
            .map(|(id, name)| tasty_profile(id, name)),
    );
    profiles
}

/// All known source profiles, keyed by source id.
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    profiles: HashMap<String, SourceProfile>,
    generic: SourceProfile,
}

impl ProfileRegistry {
    pub fn builtin() -> Self {
        let profiles = builtin_profiles()
            .into_iter()
            .map(|p| (p.source_id.clone(), p))
            .collect();
        Self {
            profiles,
            generic: SourceProfile::new(GENERIC_SOURCE, "Web").with_fallback(),
        }
    }

    /// Built-in profiles with configured selectors layered on top. A configured
    /// source id with no built-in profile starts from the generic one.
    pub fn with_overrides(overrides: &HashMap<String, ProfileConfig>) -> Self {
        let mut registry = Self::builtin();
        for (source_id, config) in overrides {
            let profile = if source_id == GENERIC_SOURCE {
                &mut registry.generic
            } else {
                registry
                    .profiles
                    .entry(source_id.clone())
                    .or_insert_with(|| SourceProfile::new(source_id, source_id).with_fallback())
            };
            profile.apply(config);
            debug!("Applied configured selectors to profile '{}'", source_id);
        }
        registry
    }

    /// The profile for `source_id`, or the generic profile when unknown.
    pub fn get(&self, source_id: &str) -> &SourceProfile {
        self.profiles.get(source_id).unwrap_or(&self.generic)
    }

    /// Human-readable source name; unknown ids are returned as given.
    pub fn display_name(&self, source_id: &str) -> String {
        match self.profiles.get(source_id) {
            Some(profile) => profile.display_name.clone(),
            None if source_id == GENERIC_SOURCE => self.generic.display_name.clone(),
            None => source_id.to_string(),
        }
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
