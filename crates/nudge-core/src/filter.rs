//! Descriptor entry filters.
//!
//! Every update and message entry may restrict itself to a subset of
//! installations with a map from property key to pattern:
//!
//! ```json
//! "filters": { "deviceOsName": "android", "appVersionCode": "<12", "deviceLanguage": "tr*" }
//! ```
//!
//! An entry applies only when all of its patterns match.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Deserialize;

use crate::properties::CurrentProperties;
use crate::version::compare_version_names;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
}

impl Comparison {
    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Self::Greater => ordering == Ordering::Greater,
            Self::GreaterOrEqual => ordering != Ordering::Less,
            Self::Less => ordering == Ordering::Less,
            Self::LessOrEqual => ordering != Ordering::Greater,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    Any,
    Not(Box<Pattern>),
    AnyOf(Vec<Pattern>),
    Compare(Comparison, String),
    Prefix(String),
    Exact(String),
}

impl Pattern {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();

        if raw == "*" {
            return Self::Any;
        }
        if let Some(rest) = raw.strip_prefix('!') {
            return Self::Not(Box::new(Self::parse(rest)));
        }
        if raw.contains('|') {
            return Self::AnyOf(raw.split('|').map(Self::parse).collect());
        }

        for (operator, comparison) in [
            (">=", Comparison::GreaterOrEqual),
            ("<=", Comparison::LessOrEqual),
            (">", Comparison::Greater),
            ("<", Comparison::Less),
        ] {
            if let Some(operand) = raw.strip_prefix(operator) {
                return Self::Compare(comparison, operand.trim().to_string());
            }
        }

        if let Some(prefix) = raw.strip_suffix('*') {
            return Self::Prefix(prefix.to_lowercase());
        }

        Self::Exact(raw.to_lowercase())
    }

    /// Matches against a property value; `None` means the property is absent.
    #[must_use]
    pub fn matches(&self, value: Option<&str>) -> bool {
        match self {
            Self::Any => true,
            Self::Not(inner) => !inner.matches(value),
            Self::AnyOf(alternatives) => alternatives.iter().any(|p| p.matches(value)),
            Self::Compare(comparison, operand) => value
                .and_then(|value| compare_values(value.trim(), operand))
                .is_some_and(|ordering| comparison.accepts(ordering)),
            Self::Prefix(prefix) => {
                value.is_some_and(|value| value.trim().to_lowercase().starts_with(prefix))
            }
            Self::Exact(expected) => {
                value.is_some_and(|value| value.trim().to_lowercase() == *expected)
            }
        }
    }
}

fn compare_values(value: &str, operand: &str) -> Option<Ordering> {
    match (value.parse::<i64>(), operand.parse::<i64>()) {
        (Ok(value), Ok(operand)) => Some(value.cmp(&operand)),
        _ => compare_version_names(value, operand),
    }
}

/// Parsed `filters` object of a descriptor entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "BTreeMap<String, serde_json::Value>")]
pub struct FilterSet {
    conditions: Vec<(String, Pattern)>,
}

impl FilterSet {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    #[must_use]
    pub fn matches(&self, properties: &CurrentProperties) -> bool {
        self.conditions
            .iter()
            .all(|(key, pattern)| pattern.matches(properties.get(key).as_deref()))
    }
}

impl TryFrom<BTreeMap<String, serde_json::Value>> for FilterSet {
    type Error = String;

    fn try_from(raw: BTreeMap<String, serde_json::Value>) -> Result<Self, Self::Error> {
        let conditions = raw
            .into_iter()
            .map(|(key, value)| {
                let pattern = match &value {
                    serde_json::Value::String(text) => Pattern::parse(text),
                    serde_json::Value::Number(number) => Pattern::parse(&number.to_string()),
                    serde_json::Value::Bool(flag) => Pattern::parse(&flag.to_string()),
                    _ => return Err(format!("filter {key} must be a string or number")),
                };
                Ok((key, pattern))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { conditions })
    }
}
