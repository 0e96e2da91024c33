use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;

use crate::classify::{ComplexityThresholds, DietRules};
use crate::dedup::DedupConfig;
use crate::nutrition::DEFAULT_SERVINGS;
use crate::profiles::ProfileConfig;

/// Engine configuration
///
/// Every section is optional; a missing section keeps its built-in defaults.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct EngineConfig {
    /// Ingredient/instruction counts bounding each complexity level
    #[serde(default)]
    pub complexity: ComplexityThresholds,
    /// Diet and "quick" tag tuning
    #[serde(default)]
    pub diet: DietRules,
    /// Nutrition scaling settings
    #[serde(default)]
    pub nutrition: NutritionConfig,
    /// Duplicate detection policy
    #[serde(default)]
    pub dedup: DedupConfig,
    /// Per-source selector overrides, keyed by source id
    #[serde(default)]
    pub profiles: HashMap<String, ProfileConfig>,
}

/// Configuration for nutrition scaling
#[derive(Debug, Deserialize, Clone)]
pub struct NutritionConfig {
    /// Servings assumed when a recipe states none
    #[serde(default = "default_servings")]
    pub default_servings: u32,
}

impl Default for NutritionConfig {
    fn default() -> Self {
        Self {
            default_servings: default_servings(),
        }
    }
}

fn default_servings() -> u32 {
    DEFAULT_SERVINGS
}

impl EngineConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with RECIPE_ENGINE__ prefix
    /// 2. recipe_engine.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: RECIPE_ENGINE__DEDUP__POLICY=title_only
    pub fn load() -> Result<Self, ConfigError> {
        load_config()
    }
}

/// Load configuration from file and environment variables
///
/// See [`EngineConfig::load`] for the source priority.
pub fn load_config() -> Result<EngineConfig, ConfigError> {
    let settings = Config::builder()
        .add_source(File::with_name("recipe_engine").required(false))
        // nested keys use a double underscore: RECIPE_ENGINE__NUTRITION__DEFAULT_SERVINGS
        .add_source(
            Environment::with_prefix("RECIPE_ENGINE")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::DedupPolicy;
    use config::FileFormat;

    fn from_toml(toml: &str) -> EngineConfig {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_default_values() {
        let config = EngineConfig::default();
        assert_eq!(config.nutrition.default_servings, 4);
        assert_eq!(config.complexity.easy_max_ingredients, 5);
        assert_eq!(config.complexity.complex_min_instructions, 7);
        assert_eq!(config.dedup.policy, DedupPolicy::TitleAndSource);
        assert!(config.dedup.backfill);
        assert!(config.profiles.is_empty());
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = from_toml("");
        assert_eq!(config.nutrition.default_servings, 4);
        assert_eq!(config.diet.low_carb_max, 1);
    }

    #[test]
    fn test_partial_sections() {
        let config = from_toml(
            r#"
            [complexity]
            easy_max_ingredients = 3

            [dedup]
            policy = "title_only"

            [profiles.myblog]
            display_name = "My Blog"
            selectors.ingredients = [".my-ingredients li"]
            "#,
        );
        assert_eq!(config.complexity.easy_max_ingredients, 3);
        assert_eq!(config.complexity.easy_max_instructions, 5);
        assert_eq!(config.dedup.policy, DedupPolicy::TitleOnly);
        assert!(config.dedup.backfill);

        let blog = &config.profiles["myblog"];
        assert_eq!(blog.display_name.as_deref(), Some("My Blog"));
        assert_eq!(blog.selectors["ingredients"], vec![".my-ingredients li"]);
    }
}
