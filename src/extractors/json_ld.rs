use log::debug;
use regex::Regex;
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::Value;
use std::sync::LazyLock;

use super::{clean_text, first_integer, FieldValue, ParsingContext, Strategy};
use crate::duration;
use crate::model::{Field, RawNutrition, StrategyKind};

/// Reads the first embedded schema.org `Recipe` object.
pub struct JsonLdStrategy;

static LD_JSON: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("script[type='application/ld+json']").expect("valid ld+json selector")
});

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid number regex"));

// A sentence end followed by the start of the next one.
static SENTENCE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+[A-Z]").expect("valid sentence regex"));

impl Strategy for JsonLdStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::StructuredData
    }

    fn try_extract(&self, field: Field, context: &ParsingContext) -> Option<FieldValue> {
        let recipe = context.structured_recipe()?;
        let value = match field {
            Field::Title => recipe.name.as_ref().and_then(TextValue::first).map(FieldValue::Text),
            Field::Ingredients => recipe.ingredient_lines().map(FieldValue::List),
            Field::Instructions => recipe.instruction_lines().map(FieldValue::List),
            Field::Image => recipe.image.as_ref().and_then(ImageValue::first_url).map(FieldValue::Text),
            Field::Categories => recipe.category_list().map(FieldValue::List),
            Field::Cuisine => recipe
                .recipe_cuisine
                .as_ref()
                .and_then(TextValue::first)
                .map(FieldValue::Text),
            Field::PrepTime => minutes(recipe.prep_time.as_ref()),
            Field::CookTime => minutes(recipe.cook_time.as_ref()),
            Field::TotalTime => minutes(recipe.total_time.as_ref()),
            Field::Servings => recipe
                .recipe_yield
                .as_ref()
                .and_then(YieldValue::servings)
                .map(FieldValue::Count),
            Field::Nutrition => recipe
                .nutrition
                .as_ref()
                .map(nutrition_from_value)
                .filter(|n| !n.is_empty())
                .map(FieldValue::Nutrition),
            // schema.org has no notes property
            Field::Notes => None,
        };
        value.filter(|v| !v.is_empty())
    }
}

fn minutes(value: Option<&TextValue>) -> Option<FieldValue> {
    let raw = value?.first()?;
    duration::parse_any(&raw).map(FieldValue::Minutes)
}

/// First `Recipe` node across all ld+json blocks of the page, in document order.
pub(super) fn first_recipe(document: &Html) -> Option<JsonLdRecipe> {
    let nodes = collect_recipe_nodes(document);
    debug!("JsonLdStrategy: Found {} Recipe nodes", nodes.len());

    let node = nodes.into_iter().next()?;
    match serde_json::from_value::<JsonLdRecipe>(node) {
        Ok(recipe) => Some(recipe),
        Err(e) => {
            debug!("JsonLdStrategy: Failed to read Recipe node: {}", e);
            None
        }
    }
}

fn collect_recipe_nodes(document: &Html) -> Vec<Value> {
    let mut recipes = Vec::new();

    for (index, script) in document.select(&LD_JSON).enumerate() {
        let raw_json = script.text().collect::<String>();
        let parsed = serde_json::from_str::<Value>(raw_json.trim()).or_else(|e| {
            debug!(
                "JsonLdStrategy: Script {} is malformed ({}), retrying sanitized",
                index, e
            );
            serde_json::from_str::<Value>(&sanitize_json(&raw_json))
        });

        match parsed {
            Ok(json_ld) => flatten_recipes(&json_ld, &mut recipes),
            Err(e) => debug!("JsonLdStrategy: Skipping script {}: {}", index, e),
        }
    }

    recipes
}

/// The container shapes linked data arrives in.
enum StructuredNode<'a> {
    Single(&'a Value),
    Array(&'a [Value]),
    Graph(&'a [Value]),
}

impl<'a> StructuredNode<'a> {
    fn classify(value: &'a Value) -> Self {
        if let Some(items) = value.as_array() {
            return StructuredNode::Array(items);
        }
        match value.get("@graph").and_then(Value::as_array) {
            Some(items) if !is_recipe_type(value) => StructuredNode::Graph(items),
            _ => StructuredNode::Single(value),
        }
    }
}

fn flatten_recipes(value: &Value, out: &mut Vec<Value>) {
    match StructuredNode::classify(value) {
        StructuredNode::Array(items) | StructuredNode::Graph(items) => {
            for item in items {
                flatten_recipes(item, out);
            }
        }
        StructuredNode::Single(node) if is_recipe_type(node) => out.push(node.clone()),
        StructuredNode::Single(node) => {
            // e.g. a WebPage whose mainEntity is the Recipe
            if let Some(object) = node.as_object() {
                for nested in object.values().filter(|v| v.is_object() || v.is_array()) {
                    flatten_recipes(nested, out);
                }
            }
        }
    }
}

fn is_recipe_type(value: &Value) -> bool {
    let matches = |t: &str| {
        let t = t.trim();
        t.eq_ignore_ascii_case("recipe")
            || t.to_ascii_lowercase().ends_with("/recipe")
            || t.to_ascii_lowercase().ends_with(":recipe")
    };
    match value.get("@type") {
        Some(Value::String(t)) => matches(t),
        Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).any(matches),
        _ => false,
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct JsonLdRecipe {
    name: Option<TextValue>,
    image: Option<ImageValue>,
    #[serde(rename = "recipeIngredient")]
    recipe_ingredient: Option<IngredientList>,
    #[serde(rename = "recipeInstructions")]
    recipe_instructions: Option<InstructionEntry>,
    #[serde(rename = "recipeYield")]
    recipe_yield: Option<YieldValue>,
    #[serde(rename = "prepTime")]
    prep_time: Option<TextValue>,
    #[serde(rename = "cookTime")]
    cook_time: Option<TextValue>,
    #[serde(rename = "totalTime")]
    total_time: Option<TextValue>,
    #[serde(rename = "recipeCategory")]
    recipe_category: Option<TextValue>,
    #[serde(rename = "recipeCuisine")]
    recipe_cuisine: Option<TextValue>,
    keywords: Option<TextValue>,
    nutrition: Option<Value>,
}

impl JsonLdRecipe {
    fn ingredient_lines(&self) -> Option<Vec<String>> {
        let lines: Vec<String> = match self.recipe_ingredient.as_ref()? {
            IngredientList::Many(entries) => entries.iter().filter_map(IngredientEntry::line).collect(),
            IngredientList::One(text) => text.lines().map(clean_text).collect(),
            IngredientList::Other(_) => Vec::new(),
        };
        non_empty(lines)
    }

    fn instruction_lines(&self) -> Option<Vec<String>> {
        let mut lines = Vec::new();
        self.recipe_instructions.as_ref()?.collect_into(&mut lines);
        non_empty(lines)
    }

    /// `recipeCategory` followed by `keywords`, split on commas, first occurrence kept.
    fn category_list(&self) -> Option<Vec<String>> {
        let mut categories: Vec<String> = Vec::new();
        for value in [&self.recipe_category, &self.keywords].into_iter().flatten() {
            for item in value.all() {
                for part in item.split(',').map(clean_text) {
                    if !part.is_empty()
                        && !categories.iter().any(|c| c.eq_ignore_ascii_case(&part))
                    {
                        categories.push(part);
                    }
                }
            }
        }
        non_empty(categories)
    }
}

fn non_empty(lines: Vec<String>) -> Option<Vec<String>> {
    let lines: Vec<String> = lines.into_iter().filter(|l| !l.is_empty()).collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TextValue {
    Text(String),
    Number(f64),
    Many(Vec<TextValue>),
    Other(Value),
}

impl TextValue {
    fn all(&self) -> Vec<String> {
        match self {
            TextValue::Text(s) => vec![s.clone()],
            TextValue::Number(n) => vec![n.to_string()],
            TextValue::Many(items) => items.iter().flat_map(TextValue::all).collect(),
            TextValue::Other(_) => Vec::new(),
        }
    }

    fn first(&self) -> Option<String> {
        self.all()
            .iter()
            .map(|s| clean_text(s))
            .find(|s| !s.is_empty())
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ImageValue {
    Url(String),
    Many(Vec<ImageValue>),
    Object(ImageObject),
    Other(Value),
}

#[derive(Debug, Deserialize)]
struct ImageObject {
    #[serde(alias = "contentUrl")]
    url: Option<String>,
}

impl ImageValue {
    fn first_url(&self) -> Option<String> {
        match self {
            ImageValue::Url(url) => Some(clean_text(url)).filter(|u| !u.is_empty()),
            ImageValue::Object(object) => object
                .url
                .as_deref()
                .map(clean_text)
                .filter(|u| !u.is_empty()),
            ImageValue::Many(items) => items.iter().find_map(ImageValue::first_url),
            ImageValue::Other(_) => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IngredientList {
    Many(Vec<IngredientEntry>),
    One(String),
    Other(Value),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IngredientEntry {
    Text(String),
    Object(IngredientObject),
    Other(Value),
}

#[derive(Debug, Deserialize)]
struct IngredientObject {
    name: String,
    amount: Option<Value>,
}

impl IngredientEntry {
    fn line(&self) -> Option<String> {
        let line = match self {
            IngredientEntry::Text(text) => clean_text(text),
            IngredientEntry::Object(object) => {
                let name = clean_text(&object.name);
                let amount = match &object.amount {
                    Some(Value::String(s)) => clean_text(s),
                    Some(Value::Number(n)) => n.to_string(),
                    _ => String::new(),
                };
                if amount.is_empty() {
                    name
                } else {
                    format!("{amount} {name}")
                }
            }
            IngredientEntry::Other(_) => return None,
        };
        Some(line).filter(|l| !l.is_empty())
    }
}

/// One node of `recipeInstructions`: text, a step or section object, or a
/// nested list of either.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InstructionEntry {
    Text(String),
    Many(Vec<InstructionEntry>),
    Step(StepObject),
    Other(Value),
}

#[derive(Debug, Deserialize)]
struct StepObject {
    text: Option<String>,
    name: Option<String>,
    #[serde(rename = "itemListElement")]
    item_list_element: Option<Vec<InstructionEntry>>,
}

impl InstructionEntry {
    fn collect_into(&self, out: &mut Vec<String>) {
        match self {
            InstructionEntry::Text(text) => out.extend(split_instruction_text(text)),
            InstructionEntry::Step(step) => {
                if let Some(items) = &step.item_list_element {
                    // HowToSection: the name is a section heading, not a step
                    for item in items {
                        item.collect_into(out);
                    }
                } else if let Some(text) = step.text.as_ref().or(step.name.as_ref()) {
                    let text = clean_text(text);
                    if !text.is_empty() {
                        out.push(text);
                    }
                }
            }
            InstructionEntry::Many(items) => {
                for item in items {
                    item.collect_into(out);
                }
            }
            InstructionEntry::Other(_) => {}
        }
    }
}

/// A bare instruction string: one step per line, or per sentence when the
/// whole method is a single paragraph.
fn split_instruction_text(text: &str) -> Vec<String> {
    let lines: Vec<String> = text
        .lines()
        .map(clean_text)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.len() != 1 {
        return lines;
    }

    let paragraph = &lines[0];
    let mut steps = Vec::new();
    let mut start = 0;
    for m in SENTENCE_BREAK.find_iter(paragraph) {
        // keep the punctuation, split before the capital letter
        let end = m.end() - 1;
        steps.push(paragraph[start..end].trim().to_string());
        start = end;
    }
    steps.push(paragraph[start..].trim().to_string());
    steps.retain(|s| !s.is_empty());
    steps
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum YieldValue {
    Number(f64),
    Text(String),
    Many(Vec<YieldValue>),
    Other(Value),
}

impl YieldValue {
    fn servings(&self) -> Option<u32> {
        match self {
            YieldValue::Number(n) if *n >= 1.0 => Some(n.trunc() as u32),
            YieldValue::Number(_) => None,
            YieldValue::Text(text) => first_integer(text),
            YieldValue::Many(items) => items.iter().find_map(YieldValue::servings),
            YieldValue::Other(_) => None,
        }
    }
}

/// Reads the leading number of each `*Content` key (plus `calories`).
fn nutrition_from_value(value: &Value) -> RawNutrition {
    let read = |key: &str| -> Option<f64> {
        match value.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => NUMBER.find(s).and_then(|m| m.as_str().parse().ok()),
            _ => None,
        }
    };
    RawNutrition {
        calories: read("calories"),
        protein: read("proteinContent"),
        carbs: read("carbohydrateContent"),
        fat: read("fatContent"),
        fiber: read("fiberContent"),
        sugar: read("sugarContent"),
        sodium: read("sodiumContent"),
    }
}

/// Repairs common JSON-LD breakage: missing commas between values, duplicate
/// commas and trailing commas.
pub fn sanitize_json(json_str: &str) -> String {
    let mut minified = String::with_capacity(json_str.len());
    let mut in_string = false;
    let mut prev_char = None;
    let mut depth = 0i32;
    let chars: Vec<char> = json_str.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        match c {
            '"' if prev_char != Some('\\') => {
                in_string = !in_string;
                if !in_string {
                    let next_char = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                    if matches!(next_char, Some('"' | '[' | '{')) {
                        minified.push('"');
                        minified.push(',');
                        prev_char = Some(',');
                        continue;
                    }
                }
                minified.push(c);
            }
            '[' | '{' if !in_string => {
                depth += 1;
                minified.push(c);
            }
            ']' | '}' if !in_string => {
                depth -= 1;
                minified.push(c);
                let next_char = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                if depth > 0 && matches!(next_char, Some('"' | '{' | '[')) {
                    minified.push(',');
                    prev_char = Some(',');
                    continue;
                }
            }
            ',' if !in_string => {
                if prev_char != Some(',') {
                    minified.push(c);
                }
            }
            ':' if !in_string => {
                if prev_char == Some(',') {
                    minified.pop();
                }
                minified.push(c);
            }
            _ => {
                if in_string || !c.is_whitespace() {
                    minified.push(c);
                }
            }
        }
        if in_string || !c.is_whitespace() {
            prev_char = Some(c);
        }
    }

    let cleaned = minified
        .replace(",]", "]")
        .replace(",}", "}")
        .replace(",,", ",");
    debug!("JsonLdStrategy: Sanitized JSON: {}", cleaned);
    cleaned
}
