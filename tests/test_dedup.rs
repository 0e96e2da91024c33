use recipe_normalizer::config::EngineConfig;
use recipe_normalizer::dedup::{DedupConfig, DedupPolicy};
use recipe_normalizer::model::{BackfillField, DedupAction, Outcome};
use recipe_normalizer::{Engine, MemoryStore, RawSource};
use serde_json::json;

fn stew_page(name: &str, image: Option<&str>) -> String {
    let mut recipe = json!({
        "@context": "https://schema.org",
        "@type": "Recipe",
        "name": name,
        "recipeYield": 4,
        "recipeIngredient": ["1 lb beef", "2 potatoes", "1 cup broth"],
        "recipeInstructions": ["Brown the beef.", "Add everything else.", "Simmer for an hour."]
    });
    if let Some(image) = image {
        recipe["image"] = json!(image);
    }
    format!(
        r#"<html><head><script type="application/ld+json">{}</script></head><body></body></html>"#,
        recipe
    )
}

fn accepted(outcome: Outcome) -> recipe_normalizer::AcceptedRecipe {
    match outcome {
        Outcome::Accepted(accepted) => accepted,
        Outcome::Rejected(rejected) => panic!("unexpected rejection: {}", rejected.detail),
    }
}

#[test]
fn test_second_ingest_skips_existing() {
    let engine = Engine::default();
    let store = MemoryStore::new();

    let first = accepted(
        engine
            .ingest(&RawSource::html("allrecipes", stew_page("Beef Stew", None)), &store)
            .unwrap(),
    );
    assert_eq!(first.decision.action, DedupAction::Insert);
    assert!(first.record_id.is_some());

    // whitespace and case differences still match
    let second = accepted(
        engine
            .ingest(
                &RawSource::html("allrecipes", stew_page("  beef   STEW ", None)),
                &store,
            )
            .unwrap(),
    );
    assert_eq!(second.decision.action, DedupAction::SkipExisting);
    assert_eq!(second.decision.existing_id, first.record_id);
    assert_eq!(store.len().unwrap(), 1);
}

#[test]
fn test_same_title_from_other_source_is_inserted() {
    let engine = Engine::default();
    let store = MemoryStore::new();

    engine
        .ingest(&RawSource::html("allrecipes", stew_page("Beef Stew", None)), &store)
        .unwrap();
    let other = accepted(
        engine
            .ingest(&RawSource::html("foodnetwork", stew_page("Beef Stew", None)), &store)
            .unwrap(),
    );
    assert_eq!(other.decision.action, DedupAction::Insert);
    assert_eq!(store.len().unwrap(), 2);
}

#[test]
fn test_title_only_policy() {
    let engine = Engine::new(EngineConfig {
        dedup: DedupConfig {
            policy: DedupPolicy::TitleOnly,
            backfill: true,
        },
        ..Default::default()
    });
    let store = MemoryStore::new();

    engine
        .ingest(&RawSource::html("allrecipes", stew_page("Beef Stew", None)), &store)
        .unwrap();
    let other = accepted(
        engine
            .ingest(&RawSource::html("foodnetwork", stew_page("Beef Stew", None)), &store)
            .unwrap(),
    );
    assert_eq!(other.decision.action, DedupAction::SkipExisting);
    assert_eq!(store.len().unwrap(), 1);
}

#[test]
fn test_duplicate_backfills_missing_fields() {
    let engine = Engine::default();
    let store = MemoryStore::new();

    let first = accepted(
        engine
            .ingest(&RawSource::html("allrecipes", stew_page("Beef Stew", None)), &store)
            .unwrap(),
    );
    assert!(first.recipe.image_url.is_none());

    let richer = RawSource::html(
        "allrecipes",
        stew_page("Beef Stew", Some("https://example.com/stew.jpg")),
    )
    .with_url("https://www.allrecipes.com/recipe/1/beef-stew");
    let second = accepted(engine.ingest(&richer, &store).unwrap());

    assert_eq!(second.decision.action, DedupAction::UpdateExisting);
    assert_eq!(
        second.decision.backfill,
        vec![BackfillField::SourceUrl, BackfillField::ImageUrl]
    );

    let stored = store.get(first.record_id.unwrap()).unwrap().unwrap();
    assert_eq!(stored.image_url.as_deref(), Some("https://example.com/stew.jpg"));
    assert_eq!(stored.metadata.servings, Some(4));
    assert_eq!(store.len().unwrap(), 1);
}

#[test]
fn test_rejected_candidates_never_reach_the_store() {
    let engine = Engine::default();
    let store = MemoryStore::new();

    let outcome = engine
        .ingest(&RawSource::text("facebook", "Nothing to see here"), &store)
        .unwrap();
    assert!(matches!(outcome, Outcome::Rejected(_)));
    assert!(store.is_empty().unwrap());
}
