use recipe_normalizer::model::{Field, StrategyKind};
use recipe_normalizer::nutrition::RecipeType;
use recipe_normalizer::{Engine, RawSource};

const FACEBOOK_POST: &str = "
🍝 Creamy Tuscan Garlic Pasta 🍝
Prep time: 10 min
Cook time: 20 minutes
Serves 4

📝 INGREDIENTS:
- 8 oz penne pasta
• 2 tbsp butter
For the sauce:
* 1 cup heavy cream
1️⃣ 3 cloves garlic

👩‍🍳 Instructions
1. Boil the pasta until al dente.
2) Melt the butter and saute the garlic.
Step 3: Stir in the cream and simmer
#pasta #easydinner

Notes: Leftovers keep for 3 days.
Calories: 520 | Protein: 14g
";

#[test]
fn test_facebook_post_through_text_heuristics() {
    let source = RawSource::text("facebook", FACEBOOK_POST);
    let (recipe, report) = Engine::default().normalize(&source).unwrap();

    assert_eq!(recipe.title, "Creamy Tuscan Garlic Pasta");
    assert_eq!(recipe.source, "Facebook");
    assert_eq!(recipe.ingredients.len(), 4);
    assert_eq!(recipe.ingredients[0].amount, Some(8.0));
    assert_eq!(recipe.ingredients[0].name, "penne pasta");
    assert_eq!(
        recipe.instructions,
        vec![
            "Boil the pasta until al dente.",
            "Melt the butter and saute the garlic.",
            "Stir in the cream and simmer.",
        ]
    );
    assert_eq!(recipe.notes, vec!["Leftovers keep for 3 days."]);

    assert_eq!(recipe.metadata.prep_time_min, Some(10));
    assert_eq!(recipe.metadata.cook_time_min, Some(20));
    assert_eq!(recipe.metadata.total_time_min, Some(30));
    assert_eq!(recipe.metadata.servings, Some(4));

    assert!(recipe.tags.contains("pasta"));
    assert!(recipe.tags.contains("easydinner"));
    assert!(recipe.tags.contains("quick"));
    assert!(recipe.tags.contains("vegetarian"));
    assert!(recipe.tags.contains("lunch"));
    assert_eq!(recipe.cuisine.as_deref(), Some("italian"));

    let nutrition = recipe.nutrition.expect("nutrition should be present");
    assert_eq!(nutrition.recipe_type, RecipeType::Main);
    assert_eq!(nutrition.per_serving.calories, Some(130.0));

    for field in [Field::Title, Field::Ingredients, Field::Instructions] {
        assert_eq!(report.supplier(field), Some(StrategyKind::TextHeuristic));
        // no DOM for text sources, but every strategy is still consulted in order
        assert_eq!(
            report.tried(field),
            vec![
                StrategyKind::StructuredData,
                StrategyKind::DomHeuristic,
                StrategyKind::TextHeuristic
            ]
        );
    }
}

#[test]
fn test_status_update_is_not_a_recipe() {
    let source = RawSource::text("facebook", "Had a lovely dinner with friends tonight!");
    let rejected = Engine::default().normalize(&source).unwrap_err();
    assert_eq!(rejected.source_id, "facebook");
    assert_eq!(rejected.report.supplier(Field::Ingredients), None);
}

const TASTY_PAGE: &str = r#"
    <html>
    <head><meta property="og:image" content="https://example.com/og.jpg"></head>
    <body>
        <h1 class="entry-title">My week in food</h1>
        <div class="tasty-recipes">
            <h2 class="tasty-recipes-title">Lemon Garlic Chicken</h2>
            <span class="tasty-recipes-prep-time">10 minutes</span>
            <span class="tasty-recipes-cook-time">1 hour 5 minutes</span>
            <span class="tasty-recipes-yield">4 servings</span>
            <div class="tasty-recipes-ingredients">
                <ul>
                    <li data-tr-ingredient-checkbox="a">1 lb chicken thighs</li>
                    <li data-tr-ingredient-checkbox="b">2 tbsp lemon juice</li>
                    <li data-tr-ingredient-checkbox="c">3 cloves garlic</li>
                </ul>
            </div>
            <div class="tasty-recipes-instructions">
                <ol><li>Marinate the chicken</li><li>Roast until golden.</li></ol>
            </div>
            <div class="tasty-recipes-nutrition">
                <span>Calories: 380</span><span>Fat: 18g</span><span>Protein: 42g</span>
            </div>
        </div>
    </body>
    </html>
"#;

#[test]
fn test_tasty_recipes_card_through_dom_heuristics() {
    let source = RawSource::html("pinchofyum", TASTY_PAGE);
    let (recipe, report) = Engine::default().normalize(&source).unwrap();

    assert_eq!(recipe.title, "Lemon Garlic Chicken");
    assert_eq!(recipe.source, "Pinch of Yum");
    assert_eq!(recipe.ingredients.len(), 3);
    assert_eq!(
        recipe.instructions,
        vec!["Marinate the chicken.", "Roast until golden."]
    );
    assert_eq!(recipe.metadata.total_time_min, Some(75));
    assert_eq!(recipe.metadata.servings, Some(4));
    assert_eq!(recipe.image_url.as_deref(), Some("https://example.com/og.jpg"));
    assert!(recipe.tags.contains("quick"));
    assert!(!recipe.tags.contains("vegetarian"));

    let nutrition = recipe.nutrition.expect("nutrition should be present");
    assert_eq!(nutrition.per_serving.calories, Some(95.0));
    assert_eq!(nutrition.per_serving.protein, Some(10.5));

    assert_eq!(
        report.supplier(Field::Ingredients),
        Some(StrategyKind::DomHeuristic)
    );
    assert_eq!(report.supplier(Field::PrepTime), Some(StrategyKind::DomHeuristic));
}
