//! Semantic and native type enumerations.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Candidate semantic type of a column.
///
/// Ties between equal candidate scores are broken by the order in which the
/// scorers are registered, not by variant order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    String,
    Integer,
    Float,
    Boolean,
    Date,
    Datetime,
    Time,
    Email,
    Url,
    Phone,
    Currency,
    Percentage,
    Uuid,
    Json,
    Categorical,
    Ordinal,
    Unknown,
}

impl SemanticType {
    /// All semantic types in declaration order.
    pub const fn all() -> &'static [Self] {
        &[
            Self::String,
            Self::Integer,
            Self::Float,
            Self::Boolean,
            Self::Date,
            Self::Datetime,
            Self::Time,
            Self::Email,
            Self::Url,
            Self::Phone,
            Self::Currency,
            Self::Percentage,
            Self::Uuid,
            Self::Json,
            Self::Categorical,
            Self::Ordinal,
            Self::Unknown,
        ]
    }

    /// Lowercase identifier, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Datetime => "datetime",
            Self::Time => "time",
            Self::Email => "email",
            Self::Url => "url",
            Self::Phone => "phone",
            Self::Currency => "currency",
            Self::Percentage => "percentage",
            Self::Uuid => "uuid",
            Self::Json => "json",
            Self::Categorical => "categorical",
            Self::Ordinal => "ordinal",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a type from its identifier (case-insensitive).
    pub fn parse(s: &str) -> Result<Self, ModelError> {
        let needle = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == needle)
            .ok_or_else(|| ModelError::UnknownSemanticType(s.to_string()))
    }

    /// Types whose values are numbers once converted.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Integer | Self::Float | Self::Currency | Self::Percentage
        )
    }

    /// Types that are only scored when advanced detection is enabled.
    pub fn is_advanced(&self) -> bool {
        matches!(
            self,
            Self::Time
                | Self::Email
                | Self::Url
                | Self::Phone
                | Self::Currency
                | Self::Percentage
                | Self::Uuid
                | Self::Json
        )
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime type of raw values, before any inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NativeType {
    String,
    Number,
    Boolean,
    Date,
    #[default]
    Unknown,
}

impl NativeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_identifiers() {
        for ty in SemanticType::all() {
            assert_eq!(SemanticType::parse(ty.as_str()).unwrap(), *ty);
        }
        assert!(SemanticType::parse("money").is_err());
    }

    #[test]
    fn test_declaration_order_is_tie_break_order() {
        assert!(SemanticType::Integer < SemanticType::Currency);
        assert!(SemanticType::Date < SemanticType::Datetime);
    }
}
