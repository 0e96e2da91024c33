use log::debug;
use scraper::{ElementRef, Html, Selector};

use super::{collapse_whitespace, decode_html_symbols, element_text, first_integer};
use super::{FieldValue, ParsingContext, Strategy};
use crate::duration;
use crate::model::{Field, StrategyKind};
use crate::nutrition::parse_nutrition_text;

/// Walks the source profile's ordered selector lists; the first selector
/// that matches a non-empty element wins.
pub struct HtmlClassStrategy;

const IMAGE_ATTRIBUTES: &[&str] = &["content", "src", "data-src", "data-lazy-src", "href"];

impl Strategy for HtmlClassStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::DomHeuristic
    }

    fn try_extract(&self, field: Field, context: &ParsingContext) -> Option<FieldValue> {
        let document = context.document()?;
        let selectors = context.profile.selectors(field);

        for selector_str in selectors {
            let selector = match Selector::parse(selector_str) {
                Ok(selector) => selector,
                Err(e) => {
                    debug!(
                        "HtmlClassStrategy: Skipping unparseable selector '{}': {:?}",
                        selector_str, e
                    );
                    continue;
                }
            };

            if let Some(value) = read_field(document, &selector, field) {
                debug!(
                    "HtmlClassStrategy: Found {} using selector: {}",
                    field, selector_str
                );
                return Some(value);
            }
        }

        None
    }
}

fn read_field(document: &Html, selector: &Selector, field: Field) -> Option<FieldValue> {
    let mut elements = document.select(selector).peekable();
    elements.peek()?;

    match field {
        Field::Ingredients | Field::Instructions | Field::Categories | Field::Notes => {
            let items: Vec<String> = elements
                .map(|el| decode_html_symbols(&element_text(el)))
                .map(|text| collapse_whitespace(&text))
                .filter(|text| !text.is_empty())
                .collect();
            (!items.is_empty()).then_some(FieldValue::List(items))
        }
        Field::Title | Field::Cuisine => elements
            .map(|el| decode_html_symbols(&element_text(el)))
            .find(|text| !text.is_empty())
            .map(FieldValue::Text),
        Field::Image => elements.find_map(image_url).map(FieldValue::Text),
        Field::PrepTime | Field::CookTime | Field::TotalTime => {
            elements.find_map(time_minutes).map(FieldValue::Minutes)
        }
        Field::Servings => elements
            .find_map(|el| {
                el.value()
                    .attr("content")
                    .and_then(first_integer)
                    .or_else(|| first_integer(&element_text(el)))
            })
            .map(FieldValue::Count),
        Field::Nutrition => {
            let text = elements.map(element_text).collect::<Vec<_>>().join(" | ");
            let nutrition = parse_nutrition_text(&text);
            (!nutrition.is_empty()).then_some(FieldValue::Nutrition(nutrition))
        }
    }
}

fn image_url(element: ElementRef) -> Option<String> {
    IMAGE_ATTRIBUTES
        .iter()
        .filter_map(|attr| element.value().attr(attr))
        .map(|url| decode_html_symbols(url.trim()))
        .find(|url| !url.is_empty() && !url.starts_with("data:"))
}

/// ISO-8601 from a `datetime`/`content` attribute when present, else the text.
fn time_minutes(element: ElementRef) -> Option<u32> {
    let iso = ["datetime", "content"]
        .iter()
        .filter_map(|attr| element.value().attr(attr))
        .map(str::trim)
        .find(|value| value.starts_with(['P', 'p']));
    if let Some(iso) = iso {
        if let Some(minutes) = duration::parse_iso8601(iso) {
            return Some(minutes);
        }
    }
    duration::parse_free_text(&element_text(element))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawSource;
    use crate::profiles::ProfileRegistry;

    fn extract(source: &RawSource, field: Field) -> Option<FieldValue> {
        let registry = ProfileRegistry::builtin();
        let context = ParsingContext::new(source, registry.get(&source.source_id));
        HtmlClassStrategy.try_extract(field, &context)
    }

    const TASTY_PAGE: &str = r#"
        <html>
        <head><meta property="og:image" content="https://example.com/og.jpg"></head>
        <body>
            <h1 class="entry-title">Blog Post Heading</h1>
            <div class="tasty-recipes">
                <h2 class="tasty-recipes-title">Lemon   Garlic Chicken</h2>
                <span class="tasty-recipes-prep-time">10 minutes</span>
                <span class="tasty-recipes-cook-time">1 hour 5 minutes</span>
                <span class="tasty-recipes-yield">4 servings</span>
                <div class="tasty-recipes-ingredients">
                    <ul>
                        <li data-tr-ingredient-checkbox="a">1 lb chicken thighs</li>
                        <li data-tr-ingredient-checkbox="b">2 tbsp lemon juice</li>
                        <li data-tr-ingredient-checkbox="c">   </li>
                        <li data-tr-ingredient-checkbox="d">3 cloves garlic &amp; herbs</li>
                    </ul>
                </div>
                <div class="tasty-recipes-instructions">
                    <ol><li>Marinate the chicken.</li><li>Roast until golden.</li></ol>
                </div>
                <div class="tasty-recipes-notes"><p>Use thighs for juiciness.</p></div>
                <div class="tasty-recipes-nutrition">
                    <span>Calories: 380</span><span>Fat: 18g</span><span>Protein: 42g</span>
                </div>
            </div>
        </body>
        </html>
    "#;

    #[test]
    fn test_tasty_recipes_card() {
        let source = RawSource::html("pinchofyum", TASTY_PAGE);

        assert_eq!(
            extract(&source, Field::Title),
            Some(FieldValue::Text("Lemon Garlic Chicken".to_string()))
        );
        assert_eq!(
            extract(&source, Field::Ingredients),
            Some(FieldValue::List(vec![
                "1 lb chicken thighs".to_string(),
                "2 tbsp lemon juice".to_string(),
                "3 cloves garlic & herbs".to_string(),
            ]))
        );
        assert_eq!(
            extract(&source, Field::Instructions),
            Some(FieldValue::List(vec![
                "Marinate the chicken.".to_string(),
                "Roast until golden.".to_string(),
            ]))
        );
        assert_eq!(extract(&source, Field::PrepTime), Some(FieldValue::Minutes(10)));
        assert_eq!(extract(&source, Field::CookTime), Some(FieldValue::Minutes(65)));
        assert_eq!(extract(&source, Field::TotalTime), None);
        assert_eq!(extract(&source, Field::Servings), Some(FieldValue::Count(4)));
        assert_eq!(
            extract(&source, Field::Image),
            Some(FieldValue::Text("https://example.com/og.jpg".to_string()))
        );
        assert_eq!(
            extract(&source, Field::Notes),
            Some(FieldValue::List(vec!["Use thighs for juiciness.".to_string()]))
        );
        match extract(&source, Field::Nutrition) {
            Some(FieldValue::Nutrition(n)) => {
                assert_eq!(n.calories, Some(380.0));
                assert_eq!(n.fat, Some(18.0));
                assert_eq!(n.protein, Some(42.0));
            }
            other => panic!("expected nutrition, got {:?}", other),
        }
    }

    #[test]
    fn test_microdata_fallback_with_iso_attribute() {
        let html = r#"
            <div itemscope itemtype="https://schema.org/Recipe">
                <span itemprop="name">Microdata Pancakes</span>
                <img itemprop="image" data-src="https://example.com/p.jpg">
                <time itemprop="totalTime" datetime="PT25M">Twenty-five minutes</time>
                <ul>
                    <li itemprop="recipeIngredient">1 cup flour</li>
                    <li itemprop="recipeIngredient">1 egg</li>
                </ul>
            </div>
        "#;
        let source = RawSource::html("somesite", html);
        assert_eq!(
            extract(&source, Field::Title),
            Some(FieldValue::Text("Microdata Pancakes".to_string()))
        );
        assert_eq!(
            extract(&source, Field::Image),
            Some(FieldValue::Text("https://example.com/p.jpg".to_string()))
        );
        assert_eq!(extract(&source, Field::TotalTime), Some(FieldValue::Minutes(25)));
        assert_eq!(
            extract(&source, Field::Ingredients),
            Some(FieldValue::List(vec!["1 cup flour".to_string(), "1 egg".to_string()]))
        );
        assert_eq!(extract(&source, Field::Instructions), None);
    }

    #[test]
    fn test_text_source_has_no_dom() {
        let source = RawSource::text("facebook", "Ingredients:\n- 1 egg");
        assert_eq!(extract(&source, Field::Ingredients), None);
    }
}
