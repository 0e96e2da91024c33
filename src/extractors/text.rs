use log::debug;
use regex::Regex;
use std::sync::LazyLock;

use super::{collapse_whitespace, FieldValue, ParsingContext, Strategy};
use crate::duration;
use crate::model::{Field, RawNutrition, StrategyKind};
use crate::nutrition::parse_nutrition_text;
use crate::tables;

/// Section-header and pattern based extraction for unstructured text.
pub struct TextStrategy;

impl Strategy for TextStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::TextHeuristic
    }

    fn try_extract(&self, field: Field, context: &ParsingContext) -> Option<FieldValue> {
        let sections = context.text_sections();
        let list = |items: &Vec<String>| (!items.is_empty()).then(|| FieldValue::List(items.clone()));

        match field {
            Field::Title => sections.title.clone().map(FieldValue::Text),
            Field::Ingredients => list(&sections.ingredients),
            Field::Instructions => list(&sections.instructions),
            Field::Notes => list(&sections.notes),
            Field::Categories => list(&sections.categories),
            Field::PrepTime => sections.prep_time.map(FieldValue::Minutes),
            Field::CookTime => sections.cook_time.map(FieldValue::Minutes),
            Field::TotalTime => sections.total_time.map(FieldValue::Minutes),
            Field::Servings => sections.servings.map(FieldValue::Count),
            Field::Nutrition => (!sections.nutrition.is_empty())
                .then(|| FieldValue::Nutrition(sections.nutrition.clone())),
            Field::Image | Field::Cuisine => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Ingredients,
    Instructions,
    Notes,
}

const SECTION_HEADERS: &[(Section, &[&str])] = &[
    (Section::Ingredients, tables::INGREDIENT_HEADERS),
    (Section::Instructions, tables::INSTRUCTION_HEADERS),
    (Section::Notes, tables::NOTE_HEADERS),
];

const DURATION: &str = r"\d+(?:\.\d+)?\s*(?:hours?|hrs?|h|minutes?|mins?|m)\b(?:\s*(?:and\s+)?\d+\s*(?:minutes?|mins?|m)\b)?";

static BULLET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:[-*•▪◦·–]\s*|\d+[.)]\s+|step\s*\d+\s*[:.)\-]?\s*|\d\x{FE0F}?\x{20E3}\s*)")
        .expect("valid bullet regex")
});

static PREP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\bprep(?:aration)?(?:\s+time\s*:?|\s*:)\s*({DURATION})"
    ))
    .expect("valid prep regex")
});

static COOK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:cook(?:ing)?|bak(?:e|ing))(?:\s+time\s*:?|\s*:)\s*({DURATION})"
    ))
    .expect("valid cook regex")
});

static TOTAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\btotal(?:\s+time\s*:?|\s*:)\s*({DURATION})"))
        .expect("valid total regex")
});

static SERVINGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:serves|servings|yields?|makes)\b\s*:?\s*(\d+)")
        .expect("valid servings regex")
});

static NUTRITION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:calories|kcal|nutrition)\b|^\W*(?:protein|carbs?|carbohydrates?|fat|fib(?:er|re)|sugars?|sodium)\s*:",
    )
    .expect("valid nutrition line regex")
});

static HASHTAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)#([A-Za-z][\w-]*)").expect("valid hashtag regex")
});

/// Everything the text strategy reads from one source, computed once per run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextSections {
    pub title: Option<String>,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub notes: Vec<String>,
    pub categories: Vec<String>,
    pub prep_time: Option<u32>,
    pub cook_time: Option<u32>,
    pub total_time: Option<u32>,
    pub servings: Option<u32>,
    pub nutrition: RawNutrition,
}

impl TextSections {
    pub fn parse(lines: &[String]) -> Self {
        let mut sections = TextSections::default();
        let mut current: Option<Section> = None;
        let mut preamble: Vec<&str> = Vec::new();

        for line in lines {
            if let Some((section, inline)) = detect_header(line) {
                current = Some(section);
                if let Some(item) = inline.map(|text| strip_bullet(&text)) {
                    if !item.is_empty() {
                        sections.push(section, item);
                    }
                }
                continue;
            }

            let Some(section) = current else {
                preamble.push(line);
                continue;
            };

            if is_metadata_line(line) || is_hashtag_line(line) {
                continue;
            }
            let item = strip_bullet(line);
            if item.is_empty() || is_sub_header(&item) {
                continue;
            }
            sections.push(section, item);
        }

        sections.title = preamble.iter().find_map(|line| title_candidate(line));
        sections.prep_time = first_duration(&PREP, lines);
        sections.cook_time = first_duration(&COOK, lines);
        sections.total_time = first_duration(&TOTAL, lines);
        sections.servings = lines.iter().find_map(|line| {
            SERVINGS
                .captures(line)
                .and_then(|c| c[1].parse::<u32>().ok())
                .filter(|n| *n > 0)
        });

        let nutrition_text = lines
            .iter()
            .filter(|line| NUTRITION_LINE.is_match(line))
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" | ");
        sections.nutrition = parse_nutrition_text(&nutrition_text);

        for line in lines {
            for caps in HASHTAG.captures_iter(line) {
                let tag = caps[1].to_string();
                if !sections.categories.iter().any(|c| c.eq_ignore_ascii_case(&tag)) {
                    sections.categories.push(tag);
                }
            }
        }

        debug!(
            "TextStrategy: title={:?} ingredients={} instructions={} notes={}",
            sections.title,
            sections.ingredients.len(),
            sections.instructions.len(),
            sections.notes.len()
        );
        sections
    }

    fn push(&mut self, section: Section, item: String) {
        match section {
            Section::Ingredients => self.ingredients.push(item),
            Section::Instructions => self.instructions.push(item),
            Section::Notes => self.notes.push(item),
        }
    }
}

fn ascii_only(line: &str) -> String {
    line.chars().filter(char::is_ascii).collect()
}

/// A header line, plus any content written after `keyword:` on the same line.
fn detect_header(line: &str) -> Option<(Section, Option<String>)> {
    let cleaned = ascii_only(line).trim().to_lowercase();
    let bare = cleaned.trim_end_matches(':').trim_end();

    for (section, keywords) in SECTION_HEADERS {
        if keywords.contains(&bare) {
            return Some((*section, None));
        }
        for keyword in keywords.iter() {
            let Some(rest) = cleaned.strip_prefix(keyword) else {
                continue;
            };
            if rest.trim_start().starts_with(':') {
                let inline = line
                    .split_once(':')
                    .map(|(_, after)| after.trim().to_string())
                    .filter(|after| !after.is_empty());
                return Some((*section, inline));
            }
        }
    }
    None
}

fn strip_bullet(line: &str) -> String {
    let trimmed = line.trim_start_matches(|c: char| {
        c.is_whitespace() || (!c.is_ascii() && !c.is_alphanumeric() && c != '•')
    });
    let stripped = BULLET.replace(trimmed, "");
    collapse_whitespace(
        stripped.trim_start_matches(|c: char| c.is_whitespace() || (!c.is_ascii() && !c.is_alphanumeric())),
    )
}

fn is_metadata_line(line: &str) -> bool {
    let lower = strip_bullet(&ascii_only(line)).to_lowercase();
    tables::METADATA_LABELS
        .iter()
        .any(|label| lower.starts_with(label))
}

fn is_hashtag_line(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

fn is_sub_header(item: &str) -> bool {
    item.ends_with(':') && item.chars().count() < 30
}

fn title_candidate(line: &str) -> Option<String> {
    if is_metadata_line(line) || is_hashtag_line(line) {
        return None;
    }
    let cleaned = collapse_whitespace(&ascii_only(line));
    let length = cleaned.chars().count();
    (10..=100).contains(&length).then_some(cleaned)
}

fn first_duration(re: &Regex, lines: &[String]) -> Option<u32> {
    lines
        .iter()
        .filter_map(|line| re.captures(line))
        .find_map(|caps| duration::parse_free_text(&caps[1]))
}
