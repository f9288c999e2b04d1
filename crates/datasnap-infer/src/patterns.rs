//! Fixed regular expressions used by the advanced type scorers.
//!
//! The expressions are part of the observable behavior: changing one changes
//! which columns are classified as that type.

use std::sync::LazyLock;

use regex::Regex;

pub static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid email regex"));

pub static URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://[^\s/$.?#].[^\s]*$").expect("Invalid URL regex")
});

pub static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+]?[\d\s\-()]{10,}$").expect("Invalid phone regex"));

pub static CURRENCY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[$£€¥]?[\d,]+\.?\d*$").expect("Invalid currency regex"));

pub static PERCENTAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.?\d*%$").expect("Invalid percentage regex"));

pub static UUID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
        .expect("Invalid UUID regex")
});

pub static TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{1,2}:\d{2}(:\d{2})?(\s?[AaPp][Mm])?$").expect("Invalid time regex")
});

/// Canonical date layouts that earn the date pattern bonus.
pub static DATE_LAYOUTS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^\d{4}-\d{2}-\d{2}$",
        r"^\d{2}/\d{2}/\d{4}$",
        r"^\d{2}-\d{2}-\d{4}$",
        r"^\d{4}/\d{2}/\d{2}$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Invalid date layout regex"))
    .collect()
});

pub static FOUR_DIGIT_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}").expect("Invalid year regex"));

/// Leading numeric prefix accepted by the float conversion.
pub static FLOAT_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?").expect("Invalid float prefix regex")
});

/// Leading integer prefix accepted by the integer conversion.
pub static INTEGER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d+").expect("Invalid integer prefix regex"));
