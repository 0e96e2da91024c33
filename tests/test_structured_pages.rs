use recipe_normalizer::model::{Complexity, Field, RejectReason, StrategyKind};
use recipe_normalizer::nutrition::RecipeType;
use recipe_normalizer::{Engine, RawSource};

fn create_recipe_html(json_ld: &str, body: &str) -> String {
    format!(
        r#"
        <!DOCTYPE html>
        <html>
        <head>
            <title>Recipe Page</title>
            <script type="application/ld+json">
                {json_ld}
            </script>
        </head>
        <body>
            {body}
        </body>
        </html>
        "#
    )
}

const BEEF_STEW: &str = r#"
{
    "@context": "https://schema.org",
    "@type": "Recipe",
    "name": "Classic Beef Stew Recipe",
    "image": "https://example.com/stew.jpg",
    "prepTime": "PT20M",
    "cookTime": "PT1H30M",
    "recipeYield": "6 servings",
    "recipeCuisine": "American",
    "recipeCategory": "Dinner",
    "recipeIngredient": [
        "2 lbs beef chuck, cubed",
        "3 carrots (peeled)",
        "1 onion, diced"
    ],
    "recipeInstructions": [
        {"@type": "HowToStep", "text": "Brown the beef in batches."},
        {"@type": "HowToStep", "text": "Add the vegetables and broth"},
        {"@type": "HowToStep", "text": "Simmer until tender."}
    ],
    "nutrition": {"@type": "NutritionInformation", "calories": "2400 calories"}
}
"#;

#[test]
fn test_structured_data_beats_conflicting_dom() {
    let body = r#"
        <h1 class="headline">Grandma's Mystery Stew</h1>
        <ul>
            <li itemprop="recipeIngredient">1 cup mystery sauce</li>
            <li itemprop="recipeIngredient">2 mystery cubes</li>
        </ul>
    "#;
    let source = RawSource::html("allrecipes", create_recipe_html(BEEF_STEW, body))
        .with_url("https://www.allrecipes.com/recipe/1/beef-stew");

    let (recipe, report) = Engine::default().normalize(&source).unwrap();

    assert_eq!(recipe.title, "Classic Beef Stew");
    assert_eq!(recipe.source, "AllRecipes");
    assert_eq!(
        recipe.source_url.as_deref(),
        Some("https://www.allrecipes.com/recipe/1/beef-stew")
    );
    assert_eq!(recipe.ingredients.len(), 3);
    assert!(recipe
        .ingredients
        .iter()
        .all(|i| !i.name.contains("mystery")));
    assert_eq!(recipe.ingredients[0].amount, Some(2.0));
    assert!(recipe.ingredients[0].name.contains("beef chuck"));
    assert_eq!(recipe.ingredients[1].notes.as_deref(), Some("peeled"));

    assert_eq!(report.supplier(Field::Title), Some(StrategyKind::StructuredData));
    assert_eq!(
        report.supplier(Field::Ingredients),
        Some(StrategyKind::StructuredData)
    );
    assert_eq!(report.tried(Field::Ingredients), vec![StrategyKind::StructuredData]);
}

#[test]
fn test_structured_metadata_and_derived_values() {
    let source = RawSource::html("allrecipes", create_recipe_html(BEEF_STEW, ""));
    let (recipe, _) = Engine::default().normalize(&source).unwrap();

    assert_eq!(
        recipe.instructions,
        vec![
            "Brown the beef in batches.",
            "Add the vegetables and broth.",
            "Simmer until tender.",
        ]
    );
    assert_eq!(recipe.metadata.prep_time_min, Some(20));
    assert_eq!(recipe.metadata.cook_time_min, Some(90));
    assert_eq!(recipe.metadata.total_time_min, Some(110));
    assert_eq!(recipe.metadata.servings, Some(6));
    assert_eq!(recipe.image_url.as_deref(), Some("https://example.com/stew.jpg"));

    assert_eq!(recipe.complexity, Complexity::Easy);
    assert_eq!(recipe.cuisine.as_deref(), Some("american"));
    assert!(recipe.tags.contains("dinner"));
    assert!(recipe.tags.contains("american"));
    assert!(recipe.tags.contains("soup"));
    assert!(recipe.tags.contains("gluten-free"));
    assert!(!recipe.tags.contains("vegetarian"));
    assert!(!recipe.tags.contains("quick"));

    let nutrition = recipe.nutrition.expect("nutrition should be present");
    assert_eq!(nutrition.servings, 6);
    assert_eq!(nutrition.recipe_type, RecipeType::Main);
    assert_eq!(nutrition.per_serving.calories, Some(400.0));
    assert_eq!(nutrition.per_meal.calories, Some(400.0));
    assert!(recipe.raw_excerpt.chars().count() <= 5000);
}

#[test]
fn test_too_few_ingredients_is_rejected() {
    let json_ld = r#"
    {
        "@context": "https://schema.org",
        "@type": "Recipe",
        "name": "Plain Toast",
        "recipeIngredient": ["1 slice bread"],
        "recipeInstructions": ["Toast the bread.", "Butter it.", "Eat it."]
    }
    "#;
    let body = r#"
        <ul>
            <li itemprop="recipeIngredient">1 slice bread</li>
            <li itemprop="recipeIngredient">1 tbsp butter</li>
        </ul>
    "#;
    let source = RawSource::html("generic", create_recipe_html(json_ld, body));
    let rejected = Engine::default().normalize(&source).unwrap_err();

    assert_eq!(rejected.reason, RejectReason::InsufficientData);
    assert!(rejected.detail.contains("1 ingredients"));
    assert_eq!(
        rejected.report.supplier(Field::Ingredients),
        Some(StrategyKind::StructuredData)
    );
}

#[test]
fn test_generic_title_is_rejected() {
    let json_ld = r#"
    {
        "@context": "https://schema.org",
        "@type": "Recipe",
        "name": "Recipe",
        "recipeIngredient": ["2 eggs", "1 cup milk"],
        "recipeInstructions": ["Whisk everything.", "Cook gently."]
    }
    "#;
    let source = RawSource::html("generic", create_recipe_html(json_ld, ""));
    let rejected = Engine::default().normalize(&source).unwrap_err();
    assert_eq!(rejected.reason, RejectReason::InvalidTitle);
}

#[test]
fn test_page_without_recipe_short_circuits() {
    let source = RawSource::html(
        "generic",
        "<html><body><h1>About us</h1><p>We love food.</p></body></html>",
    );
    let rejected = Engine::default().normalize(&source).unwrap_err();

    assert_eq!(rejected.reason, RejectReason::InsufficientData);
    assert_eq!(
        rejected.report.tried(Field::Ingredients),
        vec![
            StrategyKind::StructuredData,
            StrategyKind::DomHeuristic,
            StrategyKind::TextHeuristic
        ]
    );
    assert!(rejected.report.tried(Field::Instructions).is_empty());
    assert!(rejected.report.tried(Field::Title).is_empty());
}

#[test]
fn test_absurd_prep_time_is_dropped() {
    let json_ld = r#"
    {
        "@context": "https://schema.org",
        "@type": "Recipe",
        "name": "Overnight Oats",
        "prepTime": "P9999999D",
        "cookTime": "PT10M",
        "recipeIngredient": ["1 cup oats", "1 cup milk"],
        "recipeInstructions": ["Stir the oats into the milk.", "Chill overnight."]
    }
    "#;
    let source = RawSource::html("generic", create_recipe_html(json_ld, ""));
    let (recipe, _) = Engine::default().normalize(&source).unwrap();

    assert_eq!(recipe.metadata.prep_time_min, None);
    assert_eq!(recipe.metadata.cook_time_min, Some(10));
    assert_eq!(recipe.metadata.total_time_min, Some(10));
}
