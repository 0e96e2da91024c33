use html_escape::decode_html_entities;
use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::cell::OnceCell;
use std::sync::LazyLock;

use crate::model::{ContentType, Field, RawNutrition, RawSource, StrategyKind};
use crate::profiles::SourceProfile;

mod html_class;
mod json_ld;
mod text;

pub use self::html_class::HtmlClassStrategy;
pub use self::json_ld::{sanitize_json, JsonLdStrategy};
pub use self::text::{TextSections, TextStrategy};

/// A value produced by one strategy for one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
    Minutes(u32),
    Count(u32),
    Nutrition(RawNutrition),
}

impl FieldValue {
    /// Empty text, empty lists and empty nutrition count as "not found".
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::List(items) => items.is_empty(),
            FieldValue::Minutes(m) => *m == 0,
            FieldValue::Count(c) => *c == 0,
            FieldValue::Nutrition(n) => n.is_empty(),
        }
    }
}

/// One way of finding recipe fields in a source.
///
/// A strategy answers `None` when it has nothing for a field; it never fails.
pub trait Strategy: Send + Sync {
    fn kind(&self) -> StrategyKind;
    fn try_extract(&self, field: Field, context: &ParsingContext) -> Option<FieldValue>;
}

/// The fixed fallback order: structured data, then DOM selectors, then text.
pub fn default_strategies() -> Vec<Box<dyn Strategy>> {
    vec![
        Box::new(JsonLdStrategy),
        Box::new(HtmlClassStrategy),
        Box::new(TextStrategy),
    ]
}

/// Per-run state shared by the strategies: the parsed document and lazily
/// built views of it.
pub struct ParsingContext<'a> {
    pub source: &'a RawSource,
    pub profile: &'a SourceProfile,
    document: Option<Html>,
    structured: OnceCell<Option<json_ld::JsonLdRecipe>>,
    lines: OnceCell<Vec<String>>,
    sections: OnceCell<TextSections>,
}

impl<'a> ParsingContext<'a> {
    pub fn new(source: &'a RawSource, profile: &'a SourceProfile) -> Self {
        let document = match source.content_type {
            ContentType::Html => Some(Html::parse_document(&source.content)),
            ContentType::Text => None,
        };
        Self {
            source,
            profile,
            document,
            structured: OnceCell::new(),
            lines: OnceCell::new(),
            sections: OnceCell::new(),
        }
    }

    pub fn document(&self) -> Option<&Html> {
        self.document.as_ref()
    }

    fn structured_recipe(&self) -> Option<&json_ld::JsonLdRecipe> {
        self.structured
            .get_or_init(|| self.document().and_then(json_ld::first_recipe))
            .as_ref()
    }

    /// Non-empty text lines: the raw text, or the visible body text of a page.
    pub fn text_lines(&self) -> &[String] {
        self.lines.get_or_init(|| match self.document() {
            Some(document) => visible_lines(document),
            None => self
                .source
                .content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
        })
    }

    fn text_sections(&self) -> &TextSections {
        self.sections
            .get_or_init(|| TextSections::parse(self.text_lines()))
    }
}

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

static TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

static INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("valid integer regex"));

static BODY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("valid body selector"));

const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head", "svg"];

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main",
    "nav", "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

pub(crate) fn decode_html_symbols(text: &str) -> String {
    // entities are sometimes double-encoded
    decode_html_entities(&decode_html_entities(text)).into_owned()
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Decodes entities, drops inline markup and collapses whitespace.
pub(crate) fn clean_text(text: &str) -> String {
    let decoded = decode_html_symbols(text);
    collapse_whitespace(&TAGS.replace_all(&decoded, " "))
}

pub(crate) fn first_integer(text: &str) -> Option<u32> {
    INTEGER
        .find(text)
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .filter(|n| *n > 0)
}

pub(crate) fn element_text(element: ElementRef) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

fn visible_lines(document: &Html) -> Vec<String> {
    let mut buffer = String::new();
    match document.select(&BODY).next() {
        Some(body) => push_visible_text(body, &mut buffer),
        None => push_visible_text(document.root_element(), &mut buffer),
    }
    buffer
        .lines()
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty())
        .collect()
}

fn push_visible_text(element: ElementRef, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED_ELEMENTS.contains(&name) {
                    continue;
                }
                let block = BLOCK_ELEMENTS.contains(&name);
                if block {
                    out.push('\n');
                }
                if let Some(child_element) = ElementRef::wrap(child) {
                    push_visible_text(child_element, out);
                }
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::ProfileRegistry;

    #[test]
    fn test_decode_html_symbols_double_encoded() {
        assert_eq!(decode_html_symbols("Mac &amp;amp; Cheese"), "Mac & Cheese");
        assert_eq!(clean_text("  <b>Stir</b>&nbsp;well\n "), "Stir well");
    }

    #[test]
    fn test_first_integer() {
        assert_eq!(first_integer("Serves 4-6"), Some(4));
        assert_eq!(first_integer("24 cookies"), Some(24));
        assert_eq!(first_integer("a few"), None);
        assert_eq!(first_integer("0"), None);
    }

    #[test]
    fn test_visible_lines_skip_scripts_and_split_blocks() {
        let html = r#"<html><head><title>x</title></head><body>
            <script>var a = 1;</script>
            <h2>Ingredients</h2>
            <ul><li>2 cups <b>flour</b></li><li>1 egg</li></ul>
            <style>.x{}</style>
            <p>Mix   well.</p>
        </body></html>"#;
        let source = RawSource::html("generic", html);
        let registry = ProfileRegistry::builtin();
        let context = ParsingContext::new(&source, registry.get("generic"));
        assert_eq!(
            context.text_lines(),
            &["Ingredients", "2 cups flour", "1 egg", "Mix well."]
        );
    }

    #[test]
    fn test_text_source_lines() {
        let source = RawSource::text("facebook", "Title here\n\n  - 1 egg  \n");
        let registry = ProfileRegistry::builtin();
        let context = ParsingContext::new(&source, registry.get("facebook"));
        assert!(context.document().is_none());
        assert_eq!(context.text_lines(), &["Title here", "- 1 egg"]);
    }
}
