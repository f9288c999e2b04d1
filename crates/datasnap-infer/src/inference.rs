//! Single-column inference: statistics, scoring, conversion preview, rules.

use chrono::Utc;
use datasnap_model::{NativeType, Record, SemanticType, Value};
use tracing::debug;

use crate::conversion::convert_value;
use crate::options::InferenceOptions;
use crate::reasoning::{NO_DATA, build_reasoning};
use crate::rules::infer_rules;
use crate::sampling::{effective_sample_size, sample_rows};
use crate::scoring::{ColumnSample, default_registry};
use crate::session::{
    ConversionExample, ConversionPreview, InferenceMetadata, TypeInference, TypeScore,
};
use crate::statistics::StatisticalProperties;

/// Values inspected when deriving the original (native) type.
const ORIGINAL_TYPE_WINDOW: usize = 10;

/// Conversion examples kept in the preview.
const PREVIEW_EXAMPLES: usize = 5;

/// Infer the type of one column of `rows`.
///
/// Samples the rows the same way a full analysis does. Never fails: a
/// column without usable values yields an `unknown` inference with zero
/// confidence.
pub fn infer_column_type(column: &str, rows: &[Record], options: &InferenceOptions) -> TypeInference {
    let size = effective_sample_size(options.sample_size, rows.len());
    let sample = sample_rows(rows, size);
    infer_from_sample(column, &sample, rows.len(), options)
}

/// Infer a column from already sampled rows.
pub(crate) fn infer_from_sample(
    column: &str,
    sample: &[&Record],
    total_rows: usize,
    options: &InferenceOptions,
) -> TypeInference {
    let values: Vec<&Value> = sample
        .iter()
        .filter_map(|row| row.get(column))
        .filter(|v| !v.is_missing())
        .collect();
    let null_count = sample.len() - values.len();

    if values.is_empty() {
        debug!(column, null_count, "Column has no usable values");
        return unknown_inference(column, null_count, sample.len(), total_rows, options);
    }

    let original_type = original_type(&values);
    let column_sample = ColumnSample::new(values, null_count);
    let scores = default_registry().score_all(&column_sample, options);
    let (suggested_type, confidence, ambiguity_level) = pick_winner(&scores);
    let conversion_preview = preview_values(&column_sample.values, suggested_type);

    let stats = column_sample.stats;
    let reasoning = build_reasoning(
        suggested_type,
        confidence,
        conversion_preview.convertible,
        &stats,
    );
    let validation_rules = infer_rules(column, suggested_type, &stats);
    let quality_score = quality_score(confidence, &stats, sample.len());

    debug!(
        column,
        suggested_type = %suggested_type,
        confidence,
        ambiguity_level,
        "Inferred column type"
    );

    TypeInference {
        column: column.to_string(),
        suggested_type,
        original_type,
        confidence,
        reasoning,
        conversion_preview,
        validation_rules,
        statistics: stats,
        metadata: InferenceMetadata {
            ambiguity_level,
            quality_score,
            scores,
            sample_size: sample.len(),
            total_rows,
            analyzed_at: Utc::now(),
        },
        needs_review: confidence < options.confidence_threshold,
    }
}

fn unknown_inference(
    column: &str,
    null_count: usize,
    sample_size: usize,
    total_rows: usize,
    options: &InferenceOptions,
) -> TypeInference {
    TypeInference {
        column: column.to_string(),
        suggested_type: SemanticType::Unknown,
        original_type: NativeType::Unknown,
        confidence: 0.0,
        reasoning: NO_DATA.to_string(),
        conversion_preview: ConversionPreview::empty(),
        validation_rules: Vec::new(),
        statistics: StatisticalProperties::empty(null_count),
        metadata: InferenceMetadata {
            ambiguity_level: 1.0,
            quality_score: 0.0,
            scores: Vec::new(),
            sample_size,
            total_rows,
            analyzed_at: Utc::now(),
        },
        needs_review: 0.0 < options.confidence_threshold,
    }
}

/// Winning type, its confidence and the ambiguity against the runner-up.
///
/// The first of several equal maxima wins.
fn pick_winner(scores: &[TypeScore]) -> (SemanticType, f64, f64) {
    let Some((best_index, best)) = scores
        .iter()
        .enumerate()
        .fold(None::<(usize, &TypeScore)>, |acc, (i, s)| match acc {
            Some((_, b)) if b.score >= s.score => acc,
            _ => Some((i, s)),
        })
    else {
        return (SemanticType::Unknown, 0.0, 1.0);
    };
    let runner_up = scores
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != best_index)
        .map(|(_, s)| s.score)
        .fold(0.0, f64::max);
    let ambiguity = (1.0 - (best.score - runner_up)).clamp(0.0, 1.0);
    (best.semantic_type, best.score, ambiguity)
}

/// Majority native type among the first values; ties go to `String`.
fn original_type(values: &[&Value]) -> NativeType {
    let window = &values[..values.len().min(ORIGINAL_TYPE_WINDOW)];
    let mut counts: Vec<(NativeType, usize)> = Vec::new();
    for value in window {
        let native = value.native_type();
        match counts.iter_mut().find(|(t, _)| *t == native) {
            Some((_, count)) => *count += 1,
            None => counts.push((native, 1)),
        }
    }
    let Some(max) = counts.iter().map(|(_, c)| *c).max() else {
        return NativeType::Unknown;
    };
    let leaders: Vec<NativeType> = counts
        .iter()
        .filter(|(_, c)| *c == max)
        .map(|(t, _)| *t)
        .collect();
    match leaders.as_slice() {
        [only] => *only,
        _ => NativeType::String,
    }
}

fn preview_values(values: &[&Value], target: SemanticType) -> ConversionPreview {
    let mut examples = Vec::new();
    let mut convertible = 0;
    for value in values {
        let converted = convert_value(value, target);
        if converted.is_some() {
            convertible += 1;
        }
        if examples.len() < PREVIEW_EXAMPLES {
            examples.push(ConversionExample {
                original: (*value).clone(),
                converted,
            });
        }
    }
    let total = values.len();
    ConversionPreview {
        total_values: total,
        convertible,
        unconvertible: total - convertible,
        conversion_rate: if total == 0 {
            0.0
        } else {
            convertible as f64 / total as f64
        },
        potential_data_loss: convertible < total,
        examples,
    }
}

/// Confidence minus a missing-value penalty, plus a bonus for mid-range
/// cardinality.
fn quality_score(confidence: f64, stats: &StatisticalProperties, sample_size: usize) -> f64 {
    let null_rate = if sample_size == 0 {
        0.0
    } else {
        stats.null_count as f64 / sample_size as f64
    };
    let mut score = confidence - 0.3 * null_rate;
    let ratio = stats.uniqueness_ratio();
    if ratio > 0.1 && ratio < 0.9 {
        score += 0.1;
    }
    score.clamp(0.0, 1.0)
}
