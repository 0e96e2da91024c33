//! Static lookup data shared by the parsers and the classifier.
//!
//! Tables are ordered slices rather than maps: wherever a lookup says
//! "first match wins", the order here is the order of precedence.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Canonical unit name and the aliases that spell it.
pub const UNITS: &[(&str, &[&str])] = &[
    ("cup", &["cup", "cups", "c", "c."]),
    (
        "tablespoon",
        &["tablespoon", "tablespoons", "tbsp", "tbsp.", "tbs", "tbs.", "tbl", "tbsps"],
    ),
    ("teaspoon", &["teaspoon", "teaspoons", "tsp", "tsp.", "tsps"]),
    ("pound", &["pound", "pounds", "lb", "lb.", "lbs", "lbs."]),
    ("ounce", &["ounce", "ounces", "oz", "oz."]),
    ("gram", &["gram", "grams", "g", "g.", "gr"]),
    ("kilogram", &["kilogram", "kilograms", "kg", "kg.", "kgs"]),
    ("liter", &["liter", "liters", "litre", "litres", "l", "l."]),
    ("milliliter", &["milliliter", "milliliters", "millilitre", "millilitres", "ml", "ml."]),
    ("clove", &["clove", "cloves"]),
    ("piece", &["piece", "pieces"]),
    ("pinch", &["pinch", "pinches"]),
    ("slice", &["slice", "slices"]),
    ("can", &["can", "cans"]),
    ("package", &["package", "packages", "pkg", "pkg."]),
];

/// Single-letter aliases whose meaning depends on case.
pub const CASE_SENSITIVE_UNITS: &[(&str, &str)] = &[("T", "tablespoon"), ("t", "teaspoon")];

static UNIT_LOOKUP: LazyLock<HashMap<String, &'static str>> = LazyLock::new(|| {
    UNITS
        .iter()
        .flat_map(|(canonical, aliases)| {
            aliases
                .iter()
                .map(move |alias| (alias.to_lowercase(), *canonical))
        })
        .collect()
});

/// Resolves one whole token to its canonical unit name.
pub fn lookup_unit(token: &str) -> Option<&'static str> {
    if let Some((_, unit)) = CASE_SENSITIVE_UNITS.iter().find(|(alias, _)| *alias == token) {
        return Some(unit);
    }
    let lower = token.to_lowercase();
    UNIT_LOOKUP
        .get(&lower)
        .or_else(|| UNIT_LOOKUP.get(lower.trim_end_matches('.')))
        .copied()
}

/// Food category and the name fragments that place an ingredient in it.
pub const FOOD_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "PROTEIN",
        &["chicken", "beef", "pork", "turkey", "fish", "tofu", "eggs", "beans", "lentils"],
    ),
    (
        "VEGETABLE",
        &["spinach", "broccoli", "carrots", "onions", "garlic", "bell pepper", "tomato"],
    ),
    (
        "FRUIT",
        &["apple", "banana", "orange", "lemon", "lime", "berries", "grapes"],
    ),
    ("GRAIN", &["rice", "pasta", "bread", "oats", "quinoa", "barley"]),
    ("DAIRY", &["milk", "cheese", "yogurt", "cream", "butter"]),
    (
        "SPICE",
        &["salt", "pepper", "cumin", "cinnamon", "oregano", "basil", "thyme"],
    ),
    (
        "OIL",
        &["olive oil", "vegetable oil", "coconut oil", "sesame oil"],
    ),
    ("SWEETENER", &["sugar", "honey", "maple syrup", "agave"]),
    ("NUTS", &["almonds", "walnuts", "peanuts", "cashews"]),
    ("CONDIMENT", &["ketchup", "mustard", "soy sauce", "vinegar"]),
];

pub const MEAT: &[&str] = &[
    "chicken", "beef", "pork", "lamb", "turkey", "fish", "salmon", "tuna", "shrimp", "crab",
    "lobster", "bacon", "ham", "sausage", "meat", "steak",
];

pub const DAIRY: &[&str] = &[
    "milk", "cheese", "cream", "yogurt", "butter", "sour cream", "ice cream",
];

pub const GLUTEN: &[&str] = &[
    "flour", "wheat", "barley", "rye", "pasta", "bread", "couscous", "soy sauce", "beer",
];

pub const HIGH_CARB: &[&str] = &[
    "sugar", "flour", "rice", "potato", "bread", "pasta", "corn", "oats",
];

pub const HIGH_FAT: &[&str] = &["cream", "butter", "cheese", "avocado"];

/// Meal-type tags, checked in order against the title and then the text.
pub const MEAL_TYPES: &[(&str, &[&str])] = &[
    (
        "breakfast",
        &["breakfast", "brunch", "pancake", "waffle", "omelette", "omelet"],
    ),
    ("soup", &["soup", "stew", "chili"]),
    ("salad", &["salad"]),
    ("dessert", &["dessert", "cake", "cookie", "pie", "pudding", "brownie"]),
];

/// Meal types matched against the title only, after [`MEAL_TYPES`].
pub const TITLE_MEAL_TYPES: &[(&str, &[&str])] = &[
    ("appetizer", &["appetizer", "snack", "dip", "bites"]),
    ("side-dish", &["side", "side dish"]),
];

/// Extra tags that travel with a matched meal type.
pub const MEAL_TYPE_COMPANIONS: &[(&str, &str)] = &[("appetizer", "snack")];

/// Tags applied when no meal type matches.
pub const DEFAULT_MEAL_TAGS: &[&str] = &["lunch", "dinner", "main-dish"];

/// Dish shapes, read from the title. Every match is a tag.
pub const DISH_TYPES: &[(&str, &[&str])] = &[
    ("soup", &["soup"]),
    ("salad", &["salad"]),
    ("sandwich", &["sandwich", "sub", "panini"]),
    ("pizza", &["pizza", "flatbread"]),
    ("pasta", &["pasta", "spaghetti", "penne", "fettuccine", "linguine", "lasagna"]),
    ("stir-fry", &["stir-fry", "stir fry"]),
    ("casserole", &["casserole", "bake"]),
    ("stew", &["stew"]),
    ("curry", &["curry"]),
    ("bowl", &["bowl"]),
    ("wrap", &["wrap"]),
    ("burger", &["burger", "cheeseburger"]),
    ("taco", &["taco"]),
    ("pie", &["pie", "pot pie"]),
    ("bread", &["bread", "loaf"]),
    ("cake", &["cake", "cupcake"]),
    ("cookie", &["cookie"]),
    ("rice", &["rice", "risotto", "pilaf"]),
];

/// Main ingredients, read from the title and the ingredient names.
pub const MAIN_INGREDIENTS: &[(&str, &[&str])] = &[
    ("chicken", &["chicken"]),
    ("beef", &["beef", "steak"]),
    ("pork", &["pork", "bacon", "ham", "sausage"]),
    ("fish", &["fish fillet", "salmon", "tuna", "cod", "tilapia", "halibut"]),
    ("seafood", &["seafood", "shrimp", "prawn", "scallop", "crab", "lobster", "mussel"]),
    ("tofu", &["tofu"]),
    ("lentils", &["lentil"]),
    ("beans", &["bean", "chickpea"]),
    ("rice", &["rice"]),
    ("potato", &["potato"]),
    ("pasta", &["pasta", "spaghetti", "penne", "fettuccine", "linguine", "macaroni", "noodle"]),
    ("vegetables", &["vegetable", "veggie"]),
    ("mushroom", &["mushroom"]),
];

/// Cooking methods, read from the title and the instructions.
pub const COOKING_METHODS: &[(&str, &[&str])] = &[
    ("baked", &["baked", "bake", "baking", "roasted", "roast"]),
    ("grilled", &["grilled", "grill", "grilling"]),
    ("fried", &["fried", "deep fry", "deep-fry", "pan fry", "pan-fry"]),
    ("slow-cooker", &["slow cooker", "slow-cooker", "crockpot", "crock pot"]),
    ("instant-pot", &["instant pot", "instant-pot"]),
    ("air-fryer", &["air fryer", "air-fryer"]),
    ("steamed", &["steamed", "steam"]),
    ("sauteed", &["sauteed", "sautéed", "saute", "sauté"]),
    ("pressure-cooker", &["pressure cooker", "pressure-cooker"]),
    ("one-pot", &["one pot", "one-pot"]),
    ("sheet-pan", &["sheet pan", "sheet-pan"]),
];

/// Tags that travel with `quick`.
pub const QUICK_COMPANIONS: &[&str] = &["weeknight"];

/// Tag for recipes whose total time is within the quick total limit.
pub const THIRTY_MINUTE_TAG: &str = "30-minute";

/// Cuisine names recognised directly in categories.
pub const CUISINES: &[&str] = &[
    "italian", "mexican", "chinese", "indian", "japanese", "thai", "french", "greek", "spanish",
    "korean", "vietnamese", "american", "cajun", "caribbean", "mediterranean", "middle eastern",
    "southern", "german", "british", "irish", "lebanese", "moroccan", "turkish",
];

/// Cuisine and the words that suggest it in a recipe body.
pub const CUISINE_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "italian",
        &["italian", "pasta", "pizza", "risotto", "parmesan", "mozzarella", "pecorino", "alfredo"],
    ),
    (
        "mexican",
        &["mexican", "taco", "burrito", "enchilada", "quesadilla", "tortilla", "salsa", "chipotle"],
    ),
    ("chinese", &["chinese", "stir fry", "stir-fry", "wok", "dumpling"]),
    ("indian", &["indian", "curry", "masala", "tikka", "turmeric", "garam masala"]),
    ("thai", &["thai", "pad thai", "lemongrass", "fish sauce"]),
    ("japanese", &["japanese", "sushi", "ramen", "udon", "miso", "teriyaki"]),
    ("french", &["french", "croissant", "baguette"]),
    (
        "mediterranean",
        &["mediterranean", "greek", "hummus", "falafel", "feta"],
    ),
    ("cajun", &["cajun", "creole", "gumbo"]),
];

/// Recipe type for nutrition scaling, matched against the title in order.
pub const RECIPE_TYPE_KEYWORDS: &[(&str, &[&str])] = &[
    ("dessert", &["dessert", "cake", "cookie", "pie", "pudding"]),
    ("side", &["salad", "side", "vegetable"]),
    ("snack", &["snack", "appetizer", "dip"]),
    ("breakfast", &["breakfast", "brunch", "morning"]),
];

pub const INGREDIENT_HEADERS: &[&str] = &[
    "ingredients",
    "ingredient list",
    "what you'll need",
    "what you need",
    "you'll need",
    "you will need",
];

pub const INSTRUCTION_HEADERS: &[&str] = &[
    "instructions",
    "directions",
    "method",
    "steps",
    "preparation",
    "how to make it",
    "how to make",
];

pub const NOTE_HEADERS: &[&str] = &["notes", "recipe notes", "tips", "note"];

/// Line prefixes that mark metadata rather than recipe content.
pub const METADATA_LABELS: &[&str] = &[
    "prep time",
    "cook time",
    "cooking time",
    "baking time",
    "total time",
    "servings",
    "serves",
    "yield",
    "calories",
];

/// First category whose keyword occurs in `name`, case-insensitively.
pub fn categorize(name: &str) -> Option<&'static str> {
    let lower = name.to_lowercase();
    FOOD_CATEGORIES
        .iter()
        .find(|(_, terms)| terms.iter().any(|term| lower.contains(term)))
        .map(|(category, _)| *category)
}

fn keyword_regex(keyword: &str) -> Regex {
    Regex::new(&format!(r"(?i)\b{}(?:s|es)?\b", regex::escape(keyword)))
        .expect("valid keyword regex")
}

// Whole-word patterns for every keyword table, plural suffix allowed.
static KEYWORD_PATTERNS: LazyLock<HashMap<&'static str, Regex>> = LazyLock::new(|| {
    [
        MEAL_TYPES,
        TITLE_MEAL_TYPES,
        CUISINE_KEYWORDS,
        RECIPE_TYPE_KEYWORDS,
        DISH_TYPES,
        MAIN_INGREDIENTS,
        COOKING_METHODS,
    ]
    .iter()
    .flat_map(|table| table.iter())
    .flat_map(|(_, words)| words.iter())
    .map(|word| (*word, keyword_regex(word)))
    .collect()
});

/// Whether `keyword` occurs in `haystack` as a whole word, optionally
/// followed by a plural `s`/`es`.
pub fn contains_keyword(haystack: &str, keyword: &str) -> bool {
    match KEYWORD_PATTERNS.get(keyword) {
        Some(pattern) => pattern.is_match(haystack),
        None => keyword_regex(keyword).is_match(haystack),
    }
}

/// First entry of `table` with a keyword present in `haystack` as a word.
pub fn first_keyword_match(
    table: &'static [(&'static str, &'static [&'static str])],
    haystack: &str,
) -> Option<&'static str> {
    table
        .iter()
        .find(|(_, words)| words.iter().any(|w| contains_keyword(haystack, w)))
        .map(|(name, _)| *name)
}

/// Every entry of `table` with a keyword present in `haystack`, in table order.
pub fn all_keyword_matches<'h>(
    table: &'static [(&'static str, &'static [&'static str])],
    haystack: &'h str,
) -> impl Iterator<Item = &'static str> + 'h {
    table
        .iter()
        .filter(move |(_, words)| words.iter().any(|w| contains_keyword(haystack, w)))
        .map(|(name, _)| *name)
}
