//! Runs the extraction strategies field by field and records coverage.

use log::{debug, info};

use crate::extractors::{default_strategies, FieldValue, ParsingContext, Strategy};
use crate::model::{
    Attempt, ExtractionCandidate, ExtractionReport, Field, RawSource, RejectReason,
    RejectedCandidate, Sourced, StrategyKind, MAX_EXCERPT_CHARS,
};
use crate::profiles::SourceProfile;

/// Fields whose absence ends a run early.
const REQUIRED_FIELDS: [Field; 2] = [Field::Ingredients, Field::Instructions];

const OPTIONAL_FIELDS: [Field; 10] = [
    Field::Title,
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

/// What a successful run hands to the normalizer.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub candidate: ExtractionCandidate,
    pub report: ExtractionReport,
    /// Visible source text, capped at [`MAX_EXCERPT_CHARS`].
    pub excerpt: String,
}

pub struct ExtractionPipeline {
    strategies: Vec<Box<dyn Strategy>>,
}

impl Default for ExtractionPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionPipeline {
    pub fn new() -> Self {
        Self::with_strategies(default_strategies())
    }

    /// Strategies are consulted in the given order for every field.
    pub fn with_strategies(strategies: Vec<Box<dyn Strategy>>) -> Self {
        Self { strategies }
    }

    pub fn run(
        &self,
        source: &RawSource,
        profile: &SourceProfile,
    ) -> Result<Extraction, RejectedCandidate> {
        let context = ParsingContext::new(source, profile);
        let mut report = ExtractionReport {
            source_id: source.source_id.clone(),
            attempts: Vec::new(),
        };
        let mut candidate = ExtractionCandidate::default();

        for field in REQUIRED_FIELDS {
            match self.extract_field(field, &context, &mut report) {
                Some((value, strategy)) => assign(&mut candidate, field, value, strategy),
                None => {
                    info!(
                        "Rejecting candidate from {}: no {} found by any strategy",
                        source.source_id, field
                    );
                    return Err(RejectedCandidate {
                        source_id: source.source_id.clone(),
                        reason: RejectReason::InsufficientData,
                        detail: format!("no {} found", field),
                        report,
                    });
                }
            }
        }

        for field in OPTIONAL_FIELDS {
            if let Some((value, strategy)) = self.extract_field(field, &context, &mut report) {
                assign(&mut candidate, field, value, strategy);
            }
        }

        let excerpt = truncate_chars(&context.text_lines().join("\n"), MAX_EXCERPT_CHARS);

        Ok(Extraction {
            candidate,
            report,
            excerpt,
        })
    }

    fn extract_field(
        &self,
        field: Field,
        context: &ParsingContext,
        report: &mut ExtractionReport,
    ) -> Option<(FieldValue, StrategyKind)> {
        for strategy in &self.strategies {
            let value = strategy
                .try_extract(field, context)
                .filter(|value| !value.is_empty() && fits(field, value));
            let found = value.is_some();
            report.attempts.push(Attempt {
                field,
                strategy: strategy.kind(),
                found,
            });
            debug!(
                "{}: {} via {} -> {}",
                context.source.source_id,
                field,
                strategy.kind(),
                if found { "found" } else { "missing" }
            );
            if let Some(value) = value {
                return Some((value, strategy.kind()));
            }
        }
        None
    }
}

/// Whether `value` has the shape `field` expects.
fn fits(field: Field, value: &FieldValue) -> bool {
    match field {
        Field::Ingredients | Field::Instructions | Field::Categories | Field::Notes => {
            matches!(value, FieldValue::List(_))
        }
        Field::Title | Field::Image | Field::Cuisine => matches!(value, FieldValue::Text(_)),
        Field::PrepTime | Field::CookTime | Field::TotalTime => {
            matches!(value, FieldValue::Minutes(_))
        }
        Field::Servings => matches!(value, FieldValue::Count(_)),
        Field::Nutrition => matches!(value, FieldValue::Nutrition(_)),
    }
}

fn assign(
    candidate: &mut ExtractionCandidate,
    field: Field,
    value: FieldValue,
    strategy: StrategyKind,
) {
    match (field, value) {
        (Field::Title, FieldValue::Text(v)) => candidate.title = Some(Sourced::new(v, strategy)),
        (Field::Image, FieldValue::Text(v)) => {
            candidate.image_url = Some(Sourced::new(v, strategy))
        }
        (Field::Cuisine, FieldValue::Text(v)) => {
            candidate.cuisine = Some(Sourced::new(v, strategy))
        }
        (Field::Ingredients, FieldValue::List(v)) => {
            candidate.ingredients = Some(Sourced::new(v, strategy))
        }
        (Field::Instructions, FieldValue::List(v)) => {
            candidate.instructions = Some(Sourced::new(v, strategy))
        }
        (Field::Categories, FieldValue::List(v)) => {
            candidate.categories = Some(Sourced::new(v, strategy))
        }
        (Field::Notes, FieldValue::List(v)) => candidate.notes = Some(Sourced::new(v, strategy)),
        (Field::PrepTime, FieldValue::Minutes(v)) => {
            candidate.prep_time_min = Some(Sourced::new(v, strategy))
        }
        (Field::CookTime, FieldValue::Minutes(v)) => {
            candidate.cook_time_min = Some(Sourced::new(v, strategy))
        }
        (Field::TotalTime, FieldValue::Minutes(v)) => {
            candidate.total_time_min = Some(Sourced::new(v, strategy))
        }
        (Field::Servings, FieldValue::Count(v)) => {
            candidate.servings = Some(Sourced::new(v, strategy))
        }
        (Field::Nutrition, FieldValue::Nutrition(v)) => {
            candidate.nutrition = Some(Sourced::new(v, strategy))
        }
        _ => {}
    }
}

pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::ProfileRegistry;

    struct Fixed(StrategyKind, Field, FieldValue);

    impl Strategy for Fixed {
        fn kind(&self) -> StrategyKind {
            self.0
        }

        fn try_extract(&self, field: Field, _context: &ParsingContext) -> Option<FieldValue> {
            (field == self.1).then(|| self.2.clone())
        }
    }

    fn list(items: &[&str]) -> FieldValue {
        FieldValue::List(items.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_first_strategy_with_a_value_wins() {
        let pipeline = ExtractionPipeline::with_strategies(vec![
            Box::new(Fixed(StrategyKind::StructuredData, Field::Ingredients, list(&["a", "b"]))),
            Box::new(Fixed(StrategyKind::DomHeuristic, Field::Ingredients, list(&["x", "y"]))),
            Box::new(Fixed(StrategyKind::TextHeuristic, Field::Instructions, list(&["s1", "s2"]))),
        ]);
        let registry = ProfileRegistry::builtin();
        let source = RawSource::text("generic", "anything");

        let extraction = pipeline.run(&source, registry.get("generic")).unwrap();
        assert_eq!(extraction.candidate.ingredient_lines(), &["a", "b"]);
        assert_eq!(
            extraction.candidate.provenance(Field::Instructions),
            Some(StrategyKind::TextHeuristic)
        );
        assert_eq!(
            extraction.report.tried(Field::Instructions),
            vec![
                StrategyKind::StructuredData,
                StrategyKind::DomHeuristic,
                StrategyKind::TextHeuristic
            ]
        );
        assert_eq!(extraction.report.tried(Field::Ingredients), vec![StrategyKind::StructuredData]);
        assert_eq!(extraction.excerpt, "anything");
    }

    #[test]
    fn test_empty_values_fall_through() {
        let pipeline = ExtractionPipeline::with_strategies(vec![
            Box::new(Fixed(StrategyKind::StructuredData, Field::Ingredients, list(&[]))),
            Box::new(Fixed(StrategyKind::DomHeuristic, Field::Ingredients, list(&["x"]))),
        ]);
        let registry = ProfileRegistry::builtin();
        let source = RawSource::text("generic", "");
        let rejected = pipeline.run(&source, registry.get("generic")).unwrap_err();

        // ingredients came from the second strategy, instructions from nobody
        assert_eq!(rejected.reason, RejectReason::InsufficientData);
        assert_eq!(rejected.report.supplier(Field::Ingredients), Some(StrategyKind::DomHeuristic));
        assert_eq!(rejected.report.supplier(Field::Instructions), None);
        assert!(rejected.report.tried(Field::Title).is_empty());
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
