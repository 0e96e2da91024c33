use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::EngineError;
use crate::nutrition::NutritionFacts;

/// Maximum stored title length, in characters.
pub const MAX_TITLE_CHARS: usize = 255;
/// Maximum stored raw excerpt length, in characters.
pub const MAX_EXCERPT_CHARS: usize = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Html,
    Text,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Html => "html",
            ContentType::Text => "text",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Already-fetched content handed to the engine by the fetch collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSource {
    pub source_id: String,
    pub url: Option<String>,
    pub content: String,
    pub content_type: ContentType,
}

impl RawSource {
    pub fn html(source_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            url: None,
            content: content.into(),
            content_type: ContentType::Html,
        }
    }

    pub fn text(source_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            url: None,
            content: content.into(),
            content_type: ContentType::Text,
        }
    }

    /// Picks the content type by looking for common markup.
    pub fn detect(source_id: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        let lower = content.to_lowercase();
        let is_html = ["<html", "<body", "<div", "<script", "<!doctype", "<p>", "<li"]
            .iter()
            .any(|tag| lower.contains(tag));
        if is_html {
            Self::html(source_id, content)
        } else {
            Self::text(source_id, content)
        }
    }

    /// Reads a saved page or pasted post from disk.
    pub fn from_file(
        source_id: impl Into<String>,
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::detect(source_id, content))
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// The three extraction approaches, in their fixed priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    StructuredData,
    DomHeuristic,
    TextHeuristic,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyKind::StructuredData => "structured_data",
            StrategyKind::DomHeuristic => "dom_heuristic",
            StrategyKind::TextHeuristic => "text_heuristic",
        };
        f.write_str(name)
    }
}

/// Every field the pipeline asks the strategies for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Title,
    Ingredients,
    Instructions,
    Image,
    Categories,
    Cuisine,
    PrepTime,
    CookTime,
    TotalTime,
    Servings,
    Nutrition,
    Notes,
}

impl Field {
    pub const ALL: [Field; 12] = [
        Field::Title,
        Field::Ingredients,
        Field::Instructions,
        Field::Image,
        Field::Categories,
        Field::Cuisine,
        Field::PrepTime,
        Field::CookTime,
        Field::TotalTime,
        Field::Servings,
        Field::Nutrition,
        Field::Notes,
    ];

    /// Key used for this field in selector tables and configuration files.
    pub fn key(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Ingredients => "ingredients",
            Field::Instructions => "instructions",
            Field::Image => "image",
            Field::Categories => "categories",
            Field::Cuisine => "cuisine",
            Field::PrepTime => "prep_time",
            Field::CookTime => "cook_time",
            Field::TotalTime => "total_time",
            Field::Servings => "servings",
            Field::Nutrition => "nutrition",
            Field::Notes => "notes",
        }
    }

    pub fn from_key(key: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.key() == key)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A value together with the strategy that supplied it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sourced<T> {
    pub value: T,
    pub strategy: StrategyKind,
}

impl<T> Sourced<T> {
    pub fn new(value: T, strategy: StrategyKind) -> Self {
        Self { value, strategy }
    }
}

/// Nutrition values as found in the source, before any scaling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawNutrition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protein: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carbs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fiber: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sugar: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sodium: Option<f64>,
}

impl RawNutrition {
    pub fn is_empty(&self) -> bool {
        self.entries().iter().all(|(_, v)| v.is_none())
    }

    pub fn entries(&self) -> [(&'static str, Option<f64>); 7] {
        [
            ("calories", self.calories),
            ("protein", self.protein),
            ("carbs", self.carbs),
            ("fat", self.fat),
            ("fiber", self.fiber),
            ("sugar", self.sugar),
            ("sodium", self.sodium),
        ]
    }

    /// Applies `f` to every present value, leaving absent ones absent.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> RawNutrition {
        RawNutrition {
            calories: self.calories.map(&f),
            protein: self.protein.map(&f),
            carbs: self.carbs.map(&f),
            fat: self.fat.map(&f),
            fiber: self.fiber.map(&f),
            sugar: self.sugar.map(&f),
            sodium: self.sodium.map(&f),
        }
    }
}

/// Per-field values gathered during one extraction run, each with provenance.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractionCandidate {
    pub title: Option<Sourced<String>>,
    pub ingredients: Option<Sourced<Vec<String>>>,
    pub instructions: Option<Sourced<Vec<String>>>,
    pub image_url: Option<Sourced<String>>,
    pub categories: Option<Sourced<Vec<String>>>,
    pub cuisine: Option<Sourced<String>>,
    pub prep_time_min: Option<Sourced<u32>>,
    pub cook_time_min: Option<Sourced<u32>>,
    pub total_time_min: Option<Sourced<u32>>,
    pub servings: Option<Sourced<u32>>,
    pub nutrition: Option<Sourced<RawNutrition>>,
    pub notes: Option<Sourced<Vec<String>>>,
}

impl ExtractionCandidate {
    pub fn ingredient_lines(&self) -> &[String] {
        self.ingredients.as_ref().map_or(&[], |s| s.value.as_slice())
    }

    pub fn instruction_lines(&self) -> &[String] {
        self.instructions.as_ref().map_or(&[], |s| s.value.as_slice())
    }

    pub fn category_list(&self) -> &[String] {
        self.categories.as_ref().map_or(&[], |s| s.value.as_slice())
    }

    /// Which strategy supplied `field`, if any did.
    pub fn provenance(&self, field: Field) -> Option<StrategyKind> {
        match field {
            Field::Title => self.title.as_ref().map(|s| s.strategy),
            Field::Ingredients => self.ingredients.as_ref().map(|s| s.strategy),
            Field::Instructions => self.instructions.as_ref().map(|s| s.strategy),
            Field::Image => self.image_url.as_ref().map(|s| s.strategy),
            Field::Categories => self.categories.as_ref().map(|s| s.strategy),
            Field::Cuisine => self.cuisine.as_ref().map(|s| s.strategy),
            Field::PrepTime => self.prep_time_min.as_ref().map(|s| s.strategy),
            Field::CookTime => self.cook_time_min.as_ref().map(|s| s.strategy),
            Field::TotalTime => self.total_time_min.as_ref().map(|s| s.strategy),
            Field::Servings => self.servings.as_ref().map(|s| s.strategy),
            Field::Nutrition => self.nutrition.as_ref().map(|s| s.strategy),
            Field::Notes => self.notes.as_ref().map(|s| s.strategy),
        }
    }
}

/// One ingredient line decomposed into its parts.
///
/// `amount` is only present when a quantity token was consumed from the line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedIngredient {
    pub name: String,
    pub amount: Option<f64>,
    pub unit: Option<String>,
    pub notes: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Easy,
    Medium,
    Complex,
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Easy => "easy",
            Complexity::Medium => "medium",
            Complexity::Complex => "complex",
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeMetadata {
    pub prep_time_min: Option<u32>,
    pub cook_time_min: Option<u32>,
    pub total_time_min: Option<u32>,
    pub servings: Option<u32>,
}

/// The final, storable record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub title: String,
    pub source: String,
    pub source_url: Option<String>,
    pub ingredients: Vec<ParsedIngredient>,
    pub instructions: Vec<String>,
    pub complexity: Complexity,
    pub cuisine: Option<String>,
    pub tags: BTreeSet<String>,
    pub metadata: RecipeMetadata,
    pub nutrition: Option<NutritionFacts>,
    pub image_url: Option<String>,
    pub notes: Vec<String>,
    pub raw_excerpt: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    InsufficientData,
    InvalidTitle,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::InsufficientData => f.write_str("insufficient data"),
            RejectReason::InvalidTitle => f.write_str("invalid title"),
        }
    }
}

/// One strategy attempt at one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub field: Field,
    pub strategy: StrategyKind,
    pub found: bool,
}

/// Coverage diagnostics for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub source_id: String,
    pub attempts: Vec<Attempt>,
}

impl ExtractionReport {
    /// The strategy whose attempt at `field` succeeded, if any.
    pub fn supplier(&self, field: Field) -> Option<StrategyKind> {
        self.attempts
            .iter()
            .find(|a| a.field == field && a.found)
            .map(|a| a.strategy)
    }

    /// Strategies tried for `field`, in the order they ran.
    pub fn tried(&self, field: Field) -> Vec<StrategyKind> {
        self.attempts
            .iter()
            .filter(|a| a.field == field)
            .map(|a| a.strategy)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedCandidate {
    pub source_id: String,
    pub reason: RejectReason,
    pub detail: String,
    pub report: ExtractionReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupAction {
    Insert,
    SkipExisting,
    UpdateExisting,
}

/// Fields an update pass may fill on an existing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackfillField {
    SourceUrl,
    ImageUrl,
    PrepTime,
    CookTime,
    Servings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DedupDecision {
    pub action: DedupAction,
    pub existing_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub backfill: Vec<BackfillField>,
}

impl DedupDecision {
    pub fn insert() -> Self {
        Self {
            action: DedupAction::Insert,
            existing_id: None,
            backfill: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptedRecipe {
    pub recipe: Recipe,
    pub decision: DedupDecision,
    /// Store id of the inserted or matched record.
    pub record_id: Option<u64>,
    pub report: ExtractionReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Accepted(AcceptedRecipe),
    Rejected(RejectedCandidate),
}

impl Outcome {
    pub fn to_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
