//! Decomposition of ingredient lines into quantity, unit, name and notes.

use log::debug;
use regex::Regex;
use std::sync::LazyLock;

use crate::model::ParsedIngredient;
use crate::tables;

const VULGAR_FRACTIONS: &[(char, f64)] = &[
    ('½', 0.5),
    ('¼', 0.25),
    ('¾', 0.75),
    ('⅓', 1.0 / 3.0),
    ('⅔', 2.0 / 3.0),
    ('⅛', 0.125),
    ('⅜', 0.375),
    ('⅝', 0.625),
    ('⅞', 0.875),
];

static QUANTITY: LazyLock<Regex> = LazyLock::new(|| {
    let number = r"\d+\s+\d+/\d+|\d+\s*[½¼¾⅓⅔⅛⅜⅝⅞]|[½¼¾⅓⅔⅛⅜⅝⅞]|\d+/\d+|\d+\.\d+|\d+";
    Regex::new(&format!(
        r"^(?P<low>{number})(?:\s*(?:to|-|–)\s*(?:{number}))?"
    ))
    .expect("valid quantity regex")
});

static NOTES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^)]*)\)").expect("valid notes regex"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Parses one ingredient line. Every step is best-effort: a line that yields
/// nothing structured comes back as a bare name.
pub fn parse_ingredient(line: &str) -> ParsedIngredient {
    let line = line.trim();
    let mut result = ParsedIngredient {
        name: line.to_string(),
        ..Default::default()
    };

    let mut rest = line;

    if let Some((amount, glued_unit, remainder)) = take_quantity(line) {
        result.amount = Some(amount);
        rest = remainder;

        if let Some(unit) = glued_unit {
            result.unit = Some(unit.to_string());
        } else if let Some((unit, remainder)) = take_unit(rest) {
            result.unit = Some(unit.to_string());
            rest = remainder;
        }

        if result.unit.is_some() {
            rest = strip_prefix_word(rest, "of");
        }
    }

    let mut text = rest.to_string();
    if let Some(caps) = NOTES.captures(rest) {
        let notes = caps[1].trim();
        if !notes.is_empty() {
            result.notes = Some(notes.to_string());
        }
        if let Some(whole) = caps.get(0) {
            text = format!("{}{}", &rest[..whole.start()], &rest[whole.end()..]);
        }
    }

    let collapsed = WHITESPACE.replace_all(text.trim(), " ");
    let name = collapsed
        .trim_end_matches([',', '.', ';', ':'])
        .trim()
        .to_string();

    result.category = tables::categorize(&name).map(str::to_string);
    result.name = name;

    debug!(
        "Parsed ingredient '{}' -> amount={:?} unit={:?} name='{}'",
        line, result.amount, result.unit, result.name
    );
    result
}

/// Parses every non-blank line, skipping group sub-headers like "For the sauce:".
pub fn parse_ingredients(lines: &[String]) -> Vec<ParsedIngredient> {
    lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty() && !is_group_header(line))
        .map(parse_ingredient)
        .filter(|ingredient| !ingredient.name.is_empty() || ingredient.amount.is_some())
        .collect()
}

/// "For the sauce:" or "FOR THE FILLING:" style group labels.
pub fn is_group_header(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.ends_with(':') && trimmed.chars().count() < 40 && !trimmed.starts_with(char::is_numeric)
}

/// Leading quantity, an optional unit glued to it, and the remaining text.
fn take_quantity(line: &str) -> Option<(f64, Option<&'static str>, &str)> {
    let caps = QUANTITY.captures(line)?;
    let whole = caps.get(0)?;
    let amount = parse_number(caps.name("low")?.as_str())?;
    let rest = &line[whole.end()..];

    match rest.chars().next() {
        None => Some((amount, None, rest)),
        Some(c) if c.is_whitespace() => Some((amount, None, rest)),
        Some(c) if c.is_alphabetic() => {
            // "200g flour": accept only when the glued token is a known unit
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            let unit = tables::lookup_unit(&rest[..end])?;
            Some((amount, Some(unit), &rest[end..]))
        }
        Some(_) => None,
    }
}

fn take_unit(text: &str) -> Option<(&'static str, &str)> {
    let text = text.trim_start();
    let end = text.find(char::is_whitespace).unwrap_or(text.len());
    let token = text[..end].trim_end_matches(',');
    let unit = tables::lookup_unit(token)?;
    Some((unit, &text[end..]))
}

fn strip_prefix_word<'a>(text: &'a str, word: &str) -> &'a str {
    let trimmed = text.trim_start();
    match trimmed.split_once(char::is_whitespace) {
        Some((first, remainder)) if first.eq_ignore_ascii_case(word) => remainder,
        _ => text,
    }
}

/// Integer, decimal, fraction, mixed number or unicode vulgar fraction.
fn parse_number(raw: &str) -> Option<f64> {
    let raw = raw.trim();

    if let Some(last) = raw.chars().last() {
        if let Some((_, value)) = VULGAR_FRACTIONS.iter().find(|(c, _)| *c == last) {
            let whole = raw[..raw.len() - last.len_utf8()].trim();
            let whole = if whole.is_empty() {
                0.0
            } else {
                whole.parse::<f64>().ok()?
            };
            return Some(whole + value);
        }
    }

    let mut parts = raw.split_whitespace();
    let first = parts.next()?;
    match parts.next() {
        Some(fraction) => Some(first.parse::<f64>().ok()? + parse_fraction(fraction)?),
        None if first.contains('/') => parse_fraction(first),
        None => first.parse::<f64>().ok(),
    }
}

fn parse_fraction(raw: &str) -> Option<f64> {
    let (num, denom) = raw.split_once('/')?;
    let num = num.trim().parse::<f64>().ok()?;
    let denom = denom.trim().parse::<f64>().ok()?;
    if denom == 0.0 {
        None
    } else {
        Some(num / denom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_number_with_unit_and_notes() {
        let parsed = parse_ingredient("2 1/2 cups diced tomatoes (fresh)");
        assert_eq!(parsed.amount, Some(2.5));
        assert_eq!(parsed.unit.as_deref(), Some("cup"));
        assert_eq!(parsed.name, "diced tomatoes");
        assert_eq!(parsed.notes.as_deref(), Some("fresh"));
        assert_eq!(parsed.category.as_deref(), Some("VEGETABLE"));
    }

    #[test]
    fn test_bare_name() {
        let parsed = parse_ingredient("salt");
        assert_eq!(parsed.amount, None);
        assert_eq!(parsed.unit, None);
        assert_eq!(parsed.name, "salt");
        assert_eq!(parsed.category.as_deref(), Some("SPICE"));
    }

    #[test]
    fn test_simple_fraction_and_decimal() {
        let parsed = parse_ingredient("1/2 tsp ground cumin");
        assert_eq!(parsed.amount, Some(0.5));
        assert_eq!(parsed.unit.as_deref(), Some("teaspoon"));
        assert_eq!(parsed.name, "ground cumin");

        let parsed = parse_ingredient("1.5 lbs chicken thighs");
        assert_eq!(parsed.amount, Some(1.5));
        assert_eq!(parsed.unit.as_deref(), Some("pound"));
        assert_eq!(parsed.category.as_deref(), Some("PROTEIN"));
    }

    #[test]
    fn test_range_takes_lower_bound() {
        let parsed = parse_ingredient("1 to 2 tbsp honey");
        assert_eq!(parsed.amount, Some(1.0));
        assert_eq!(parsed.unit.as_deref(), Some("tablespoon"));
        assert_eq!(parsed.name, "honey");

        let parsed = parse_ingredient("3-4 cloves garlic, minced.");
        assert_eq!(parsed.amount, Some(3.0));
        assert_eq!(parsed.unit.as_deref(), Some("clove"));
        assert_eq!(parsed.name, "garlic, minced");
    }

    #[test]
    fn test_case_sensitive_single_letter_units() {
        assert_eq!(
            parse_ingredient("1 T butter").unit.as_deref(),
            Some("tablespoon")
        );
        assert_eq!(
            parse_ingredient("1 t vanilla").unit.as_deref(),
            Some("teaspoon")
        );
    }

    #[test]
    fn test_unit_must_be_whole_token() {
        let parsed = parse_ingredient("2 cupcakes");
        assert_eq!(parsed.amount, Some(2.0));
        assert_eq!(parsed.unit, None);
        assert_eq!(parsed.name, "cupcakes");

        let parsed = parse_ingredient("3 large eggs");
        assert_eq!(parsed.unit, None);
        assert_eq!(parsed.name, "large eggs");
    }

    #[test]
    fn test_unicode_fractions_and_glued_units() {
        let parsed = parse_ingredient("1½ cups milk");
        assert_eq!(parsed.amount, Some(1.5));
        assert_eq!(parsed.unit.as_deref(), Some("cup"));

        let parsed = parse_ingredient("¾ cup sugar");
        assert_eq!(parsed.amount, Some(0.75));

        let parsed = parse_ingredient("200g plain flour");
        assert_eq!(parsed.amount, Some(200.0));
        assert_eq!(parsed.unit.as_deref(), Some("gram"));
        assert_eq!(parsed.name, "plain flour");
    }

    #[test]
    fn test_glued_non_unit_is_not_a_quantity() {
        let parsed = parse_ingredient("2-inch piece ginger");
        assert_eq!(parsed.amount, None);
        assert_eq!(parsed.name, "2-inch piece ginger");
    }

    #[test]
    fn test_of_after_unit_is_dropped() {
        let parsed = parse_ingredient("1 pinch of salt");
        assert_eq!(parsed.unit.as_deref(), Some("pinch"));
        assert_eq!(parsed.name, "salt");
    }

    #[test]
    fn test_parse_ingredients_skips_blank_and_group_headers() {
        let lines = vec![
            "For the sauce:".to_string(),
            "  ".to_string(),
            "1 cup cream".to_string(),
            "2 tbsp butter".to_string(),
        ];
        let parsed = parse_ingredients(&lines);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].name, "cream");
    }
}
