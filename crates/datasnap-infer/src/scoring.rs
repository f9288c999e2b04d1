//! Candidate type scorers.
//!
//! Each scorer looks at one column sample and returns how strongly the
//! values match its semantic type, in `[0, 1]`. Scorers never see each
//! other's results; the caller picks the highest score, and the scorer
//! registered first wins a tie.

use std::sync::OnceLock;

use datasnap_model::{SemanticType, Value};
use regex::Regex;

use crate::dates::{has_time_marker, parse_date, parse_datetime};
use crate::options::InferenceOptions;
use crate::patterns;
use crate::session::TypeScore;
use crate::statistics::{StatisticalProperties, compute_statistics};

/// The non-missing sampled values of one column plus their statistics.
#[derive(Debug, Clone)]
pub struct ColumnSample<'a> {
    pub values: Vec<&'a Value>,
    pub stats: StatisticalProperties,
}

impl<'a> ColumnSample<'a> {
    pub fn new(values: Vec<&'a Value>, null_count: usize) -> Self {
        let stats = compute_statistics(&values, null_count);
        Self { values, stats }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Share of values satisfying `predicate`.
    pub fn rate(&self, predicate: impl Fn(&Value) -> bool) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let hits = self.values.iter().filter(|&&v| predicate(v)).count();
        hits as f64 / self.values.len() as f64
    }

    /// Share of values whose string form matches `regex`.
    pub fn match_rate(&self, regex: &Regex) -> f64 {
        self.rate(|v| regex.is_match(&v.to_display_string()))
    }

    /// Share of values that parse as finite numbers.
    pub fn numeric_rate(&self) -> f64 {
        self.rate(|v| v.as_f64().is_some())
    }

    /// Share of values that parse as finite whole numbers.
    pub fn integer_rate(&self) -> f64 {
        self.rate(|v| v.as_f64().is_some_and(|n| n.fract() == 0.0))
    }
}

/// Scores one semantic type.
pub trait TypeScorer: Send + Sync {
    /// The type this scorer votes for.
    fn semantic_type(&self) -> SemanticType;

    /// Raw score; the registry clamps it to `[0, 1]`.
    fn score(&self, sample: &ColumnSample<'_>) -> f64;
}

/// Ordered set of scorers.
pub struct ScorerRegistry {
    scorers: Vec<Box<dyn TypeScorer>>,
}

impl ScorerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            scorers: Vec::new(),
        }
    }

    /// Appends a scorer. Earlier scorers win ties.
    pub fn register(&mut self, scorer: Box<dyn TypeScorer>) {
        self.scorers.push(scorer);
    }

    pub fn len(&self) -> usize {
        self.scorers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scorers.is_empty()
    }

    /// Score a column with every enabled scorer plus the custom patterns.
    ///
    /// Advanced types are skipped when `options.test_advanced_types` is off.
    /// A custom pattern's match rate replaces the built-in score of its type
    /// when it is higher; types without a built-in scorer are appended.
    pub fn score_all(&self, sample: &ColumnSample<'_>, options: &InferenceOptions) -> Vec<TypeScore> {
        let mut scores: Vec<TypeScore> = self
            .scorers
            .iter()
            .filter(|s| options.test_advanced_types || !s.semantic_type().is_advanced())
            .map(|s| TypeScore {
                semantic_type: s.semantic_type(),
                score: s.score(sample).clamp(0.0, 1.0),
            })
            .collect();

        for pattern in &options.custom_patterns {
            let rate = sample
                .rate(|v| pattern.is_match(&v.to_display_string()))
                .clamp(0.0, 1.0);
            match scores
                .iter_mut()
                .find(|s| s.semantic_type == pattern.semantic_type)
            {
                Some(existing) => existing.score = existing.score.max(rate),
                None => scores.push(TypeScore {
                    semantic_type: pattern.semantic_type,
                    score: rate,
                }),
            }
        }
        scores
    }
}

impl Default for ScorerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Cached registry with the built-in scorers, in tie-break order.
static DEFAULT_REGISTRY: OnceLock<ScorerRegistry> = OnceLock::new();

/// Returns the built-in scorer registry.
///
/// Basic scorers (string, integer, float, boolean, date, datetime,
/// categorical) come first, then the advanced ones.
pub fn default_registry() -> &'static ScorerRegistry {
    DEFAULT_REGISTRY.get_or_init(build_default_registry)
}

fn build_default_registry() -> ScorerRegistry {
    let mut registry = ScorerRegistry::new();
    registry.register(Box::new(StringScorer));
    registry.register(Box::new(IntegerScorer));
    registry.register(Box::new(FloatScorer));
    registry.register(Box::new(BooleanScorer));
    registry.register(Box::new(DateScorer));
    registry.register(Box::new(DatetimeScorer));
    registry.register(Box::new(CategoricalScorer));
    registry.register(Box::new(PatternScorer::new(SemanticType::Time, &patterns::TIME)));
    registry.register(Box::new(PatternScorer::new(SemanticType::Email, &patterns::EMAIL)));
    registry.register(Box::new(PatternScorer::new(SemanticType::Url, &patterns::URL)));
    registry.register(Box::new(PatternScorer::new(SemanticType::Phone, &patterns::PHONE)));
    registry.register(Box::new(PatternScorer::new(
        SemanticType::Currency,
        &patterns::CURRENCY,
    )));
    registry.register(Box::new(PatternScorer::new(
        SemanticType::Percentage,
        &patterns::PERCENTAGE,
    )));
    registry.register(Box::new(PatternScorer::new(SemanticType::Uuid, &patterns::UUID)));
    registry.register(Box::new(JsonScorer));
    registry
}

/// Fallback type: weak base score, penalized when the data looks numeric.
struct StringScorer;

impl TypeScorer for StringScorer {
    fn semantic_type(&self) -> SemanticType {
        SemanticType::String
    }

    fn score(&self, sample: &ColumnSample<'_>) -> f64 {
        let mut score = 0.3;
        if sample.numeric_rate() > 0.8 {
            score -= 0.4;
        }
        if sample
            .stats
            .string_lengths
            .as_ref()
            .is_some_and(|l| l.avg > 20.0)
        {
            score += 0.1;
        }
        if sample.stats.uniqueness_ratio() > 0.8 {
            score += 0.1;
        }
        score
    }
}

struct IntegerScorer;

impl TypeScorer for IntegerScorer {
    fn semantic_type(&self) -> SemanticType {
        SemanticType::Integer
    }

    fn score(&self, sample: &ColumnSample<'_>) -> f64 {
        let rate = sample.integer_rate();
        if rate < 0.8 {
            return 0.0;
        }
        let no_decimals = sample.stats.numeric.as_ref().is_some_and(|n| !n.has_decimals);
        if no_decimals { rate + 0.1 } else { rate }
    }
}

struct FloatScorer;

impl TypeScorer for FloatScorer {
    fn semantic_type(&self) -> SemanticType {
        SemanticType::Float
    }

    fn score(&self, sample: &ColumnSample<'_>) -> f64 {
        let rate = sample.numeric_rate();
        if rate < 0.8 {
            return 0.0;
        }
        match &sample.stats.numeric {
            Some(n) if n.has_decimals => rate + 0.1,
            Some(_) => rate - 0.2,
            None => rate,
        }
    }
}

const TRUE_TOKENS: &[&str] = &["true", "yes", "y", "1"];
const FALSE_TOKENS: &[&str] = &["false", "no", "n", "0"];

/// Normalized boolean reading of a value, if it has one.
fn boolean_token(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) if *n == 1.0 => Some(true),
        Value::Number(n) if *n == 0.0 => Some(false),
        Value::String(s) => {
            let lower = s.trim().to_lowercase();
            if TRUE_TOKENS.contains(&lower.as_str()) {
                Some(true)
            } else if FALSE_TOKENS.contains(&lower.as_str()) {
                Some(false)
            } else {
                None
            }
        }
        _ => None,
    }
}

struct BooleanScorer;

impl TypeScorer for BooleanScorer {
    fn semantic_type(&self) -> SemanticType {
        SemanticType::Boolean
    }

    fn score(&self, sample: &ColumnSample<'_>) -> f64 {
        let rate = sample.rate(|v| boolean_token(v).is_some());
        if rate < 0.9 {
            return 0.0;
        }
        let mut distinct: Vec<String> = Vec::new();
        for value in &sample.values {
            let token = match boolean_token(value) {
                Some(b) => b.to_string(),
                None => value.to_display_string().to_lowercase(),
            };
            if !distinct.contains(&token) {
                distinct.push(token);
            }
        }
        if distinct.len() <= 2 { rate + 0.2 } else { rate }
    }
}

struct DateScorer;

impl TypeScorer for DateScorer {
    fn semantic_type(&self) -> SemanticType {
        SemanticType::Date
    }

    fn score(&self, sample: &ColumnSample<'_>) -> f64 {
        let rate = sample.rate(|v| match v {
            Value::Date(_) => true,
            Value::String(s) => parse_date(s).is_some(),
            _ => false,
        });
        if rate < 0.8 {
            return 0.0;
        }
        let layout_rate = sample.rate(|v| {
            let text = v.to_display_string();
            patterns::DATE_LAYOUTS.iter().any(|re| re.is_match(&text))
        });
        if layout_rate >= 0.8 { rate + 0.1 } else { rate }
    }
}

struct DatetimeScorer;

impl TypeScorer for DatetimeScorer {
    fn semantic_type(&self) -> SemanticType {
        SemanticType::Datetime
    }

    fn score(&self, sample: &ColumnSample<'_>) -> f64 {
        sample.rate(|v| match v {
            Value::Date(_) => true,
            Value::String(s) => has_time_marker(s) && parse_datetime(s).is_some(),
            _ => false,
        })
    }
}

struct CategoricalScorer;

impl TypeScorer for CategoricalScorer {
    fn semantic_type(&self) -> SemanticType {
        SemanticType::Categorical
    }

    fn score(&self, sample: &ColumnSample<'_>) -> f64 {
        let ratio = sample.stats.uniqueness_ratio();
        let distinct = sample.stats.unique_count;
        if ratio < 0.1 && distinct < 20 {
            0.8
        } else if ratio < 0.3 && distinct < 50 {
            0.6
        } else {
            0.0
        }
    }
}

/// Share of values matching a fixed regex.
struct PatternScorer {
    semantic_type: SemanticType,
    regex: &'static Regex,
}

impl PatternScorer {
    fn new(semantic_type: SemanticType, regex: &'static Regex) -> Self {
        Self {
            semantic_type,
            regex,
        }
    }
}

impl TypeScorer for PatternScorer {
    fn semantic_type(&self) -> SemanticType {
        self.semantic_type
    }

    fn score(&self, sample: &ColumnSample<'_>) -> f64 {
        sample.match_rate(self.regex)
    }
}

/// Share of string values holding a JSON object or array.
struct JsonScorer;

impl TypeScorer for JsonScorer {
    fn semantic_type(&self) -> SemanticType {
        SemanticType::Json
    }

    fn score(&self, sample: &ColumnSample<'_>) -> f64 {
        sample.rate(|v| {
            v.as_str().is_some_and(|s| {
                matches!(
                    serde_json::from_str::<serde_json::Value>(s.trim()),
                    Ok(serde_json::Value::Object(_) | serde_json::Value::Array(_))
                )
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score_of(values: &[&str], ty: SemanticType) -> f64 {
        let owned: Vec<Value> = values.iter().map(|v| Value::text(*v)).collect();
        let sample = ColumnSample::new(owned.iter().collect(), 0);
        default_registry()
            .score_all(&sample, &InferenceOptions::default())
            .into_iter()
            .find(|s| s.semantic_type == ty)
            .map_or(0.0, |s| s.score)
    }

    #[test]
    fn test_registration_order_breaks_ties() {
        let registry = default_registry();
        let sample = ColumnSample::new(Vec::new(), 0);
        let types: Vec<SemanticType> = registry
            .score_all(&sample, &InferenceOptions::default())
            .into_iter()
            .map(|s| s.semantic_type)
            .collect();
        assert_eq!(types[0], SemanticType::String);
        assert_eq!(types[1], SemanticType::Integer);
        assert_eq!(types.len(), registry.len());

        // Categorical is registered ahead of the pattern types even though
        // it is declared after them.
        let position = |ty: SemanticType| types.iter().position(|t| *t == ty).unwrap();
        assert!(position(SemanticType::Categorical) < position(SemanticType::Email));
        assert!(SemanticType::Categorical > SemanticType::Email);
    }

    #[test]
    fn test_advanced_types_can_be_disabled() {
        let owned = [Value::text("a@b.co")];
        let sample = ColumnSample::new(owned.iter().collect(), 0);
        let options = InferenceOptions::default().with_advanced_types(false);
        let scores = default_registry().score_all(&sample, &options);
        assert!(scores.iter().all(|s| !s.semantic_type.is_advanced()));
    }

    #[test]
    fn test_string_penalized_for_numbers() {
        // 0.3 - 0.4 + 0.1 (all unique) = 0.0
        assert_eq!(score_of(&["1", "2", "3"], SemanticType::String), 0.0);
        // 0.3 + 0.1 (all unique)
        assert!((score_of(&["ab", "cd"], SemanticType::String) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_integer_bonus_and_threshold() {
        assert_eq!(score_of(&["1", "2", "3", "4"], SemanticType::Integer), 1.0);
        assert_eq!(score_of(&["1", "2", "x", "y"], SemanticType::Integer), 0.0);
    }

    #[test]
    fn test_float_rewards_decimals() {
        assert_eq!(score_of(&["1.5", "2.25"], SemanticType::Float), 1.0);
        assert!((score_of(&["1", "2"], SemanticType::Float) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_boolean_requires_ninety_percent() {
        assert_eq!(score_of(&["yes", "no", "Y", "N"], SemanticType::Boolean), 1.0);
        let values = ["true", "false", "true", "maybe", "false", "maybe", "true", "false", "true", "false"];
        assert_eq!(score_of(&values, SemanticType::Boolean), 0.0);
    }

    #[test]
    fn test_date_and_datetime() {
        assert_eq!(score_of(&["2024-01-01", "2024-02-01"], SemanticType::Date), 1.0);
        assert_eq!(score_of(&["2024-01-01", "2024-02-01"], SemanticType::Datetime), 0.0);
        assert_eq!(
            score_of(&["2024-01-01T10:00:00", "2024-02-01 11:30"], SemanticType::Datetime),
            1.0
        );
    }

    #[test]
    fn test_categorical_levels() {
        let mut values = Vec::new();
        for _ in 0..20 {
            values.extend(["red", "green", "blue"]);
        }
        // 3 distinct out of 60 -> ratio 0.05
        assert_eq!(score_of(&values, SemanticType::Categorical), 0.8);
        let values = ["a", "b", "a", "b", "c", "a", "b", "a", "b", "a"];
        // 3 distinct out of 10 -> ratio 0.3
        assert_eq!(score_of(&values, SemanticType::Categorical), 0.0);
    }

    #[test]
    fn test_json_scorer_ignores_scalars() {
        assert_eq!(score_of(&["{\"a\":1}", "[1,2]"], SemanticType::Json), 1.0);
        assert_eq!(score_of(&["42", "\"x\""], SemanticType::Json), 0.0);
    }

    #[test]
    fn test_custom_pattern_competes_with_builtin() {
        let owned: Vec<Value> = ["SKU-1", "SKU-2"].iter().map(|v| Value::text(*v)).collect();
        let sample = ColumnSample::new(owned.iter().collect(), 0);
        let options = InferenceOptions::default()
            .with_custom_pattern("sku", SemanticType::Ordinal, r"^SKU-\d+$")
            .unwrap();
        let scores = default_registry().score_all(&sample, &options);
        let ordinal = scores
            .iter()
            .find(|s| s.semantic_type == SemanticType::Ordinal)
            .unwrap();
        assert_eq!(ordinal.score, 1.0);
    }
}
