//! Field rules: per-column text transformations.

use std::str::FromStr;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::RecordError;

/// A text transformation applied to one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleKind {
    /// Keep the text as extracted.
    Identity,
    /// Replace spaces with a decimal point ("12 34" -> "12.34").
    SpaceToDecimal,
    /// Remove a fixed label in front of the value ("Phone 555-0100" -> "555-0100").
    StripPrefix { prefix: String },
    /// Regex replacement; `with` may reference capture groups (`$1`).
    Replace { pattern: String, with: String },
    /// Normalize a numeric amount ("1 234,56" -> "1234.56"); non-numbers pass through.
    Decimal,
    /// Apply several rules in order.
    Chain { rules: Vec<RuleKind> },
}

/// Binds a rule to a named template field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRule {
    /// Template field name the rule applies to.
    pub field: String,
    /// The transformation.
    pub rule: RuleKind,
}

impl FieldRule {
    pub fn new(field: impl Into<String>, rule: RuleKind) -> Self {
        Self {
            field: field.into(),
            rule,
        }
    }
}

/// A rule ready to apply.
#[derive(Debug, Clone)]
pub(crate) enum CompiledRule {
    Identity,
    SpaceToDecimal,
    StripPrefix(String),
    Replace(Regex, String),
    Decimal,
    Chain(Vec<CompiledRule>),
}

impl CompiledRule {
    pub(crate) fn compile(field: &str, kind: &RuleKind) -> Result<Self, RecordError> {
        Ok(match kind {
            RuleKind::Identity => Self::Identity,
            RuleKind::SpaceToDecimal => Self::SpaceToDecimal,
            RuleKind::StripPrefix { prefix } => Self::StripPrefix(prefix.clone()),
            RuleKind::Replace { pattern, with } => {
                let regex = Regex::new(pattern).map_err(|e| RecordError::InvalidRule {
                    field: field.to_string(),
                    reason: e.to_string(),
                })?;
                Self::Replace(regex, with.clone())
            }
            RuleKind::Decimal => Self::Decimal,
            RuleKind::Chain { rules } => Self::Chain(
                rules
                    .iter()
                    .map(|r| Self::compile(field, r))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }

    pub(crate) fn apply(&self, text: &str) -> String {
        match self {
            Self::Identity => text.to_string(),
            Self::SpaceToDecimal => text.replace(' ', "."),
            Self::StripPrefix(prefix) => text
                .strip_prefix(prefix.as_str())
                .map(|rest| rest.trim_start().to_string())
                .unwrap_or_else(|| text.to_string()),
            Self::Replace(regex, with) => regex.replace_all(text, with.as_str()).into_owned(),
            Self::Decimal => parse_amount(text)
                .map(|d| d.to_string())
                .unwrap_or_else(|| text.to_string()),
            Self::Chain(rules) => rules
                .iter()
                .fold(text.to_string(), |acc, rule| rule.apply(&acc)),
        }
    }
}

/// Parse an amount written with space or dot thousand separators and a comma
/// or dot decimal separator ("1 234,56", "1.234,56", "1,234.56", "1234.56").
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let trimmed = s.trim();
    let negative = trimmed.starts_with('-');

    // Anything other than digits, separators and a currency label is not an amount.
    let body: String = trimmed
        .trim_start_matches('-')
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{00a0}' && *c != '$')
        .collect();
    if body.is_empty() || !body.chars().all(|c| c.is_ascii_digit() || c == ',' || c == '.') {
        return None;
    }

    let normalized = match (body.rfind(','), body.rfind('.')) {
        (Some(c), Some(d)) if c > d => body.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => body.replace(',', ""),
        (Some(c), None) if c > 0 && body.len() - c - 1 == 3 => {
            // "1,234" reads as a thousands separator
            body.replace(',', "")
        }
        (Some(_), None) => body.replace(',', "."),
        _ => body,
    };

    let value = Decimal::from_str(&normalized).ok()?;
    Some(if negative { -value } else { value })
}

/// An ordered table of named field rules.
///
/// Rules are keyed by field name rather than column position, so a
/// template can gain or lose fields without silently shifting every
/// rule after the change. The table is checked against the template when
/// it is bound into a [`super::FieldRuleSet`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleTable {
    rules: Vec<FieldRule>,
}

impl RuleTable {
    pub fn new(rules: Vec<FieldRule>) -> Self {
        Self { rules }
    }

    /// Load a rule table from a JSON file (a list of `{field, rule}` objects).
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Built-in rule tables by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "disposal-form" => Some(Self::disposal_form()),
            "none" => Some(Self::default()),
            _ => None,
        }
    }

    /// Names accepted by [`RuleTable::preset`].
    pub fn preset_names() -> &'static [&'static str] {
        &["disposal-form", "none"]
    }

    /// Rules for the property disposal turn-in form: prices printed with a
    /// space instead of a decimal point and contact fields carrying labels.
    pub fn disposal_form() -> Self {
        Self::new(vec![
            FieldRule::new("Unit Price", RuleKind::SpaceToDecimal),
            FieldRule::new("Total Price", RuleKind::SpaceToDecimal),
            FieldRule::new(
                "POC Phone",
                RuleKind::StripPrefix {
                    prefix: "Phone ".to_string(),
                },
            ),
            FieldRule::new(
                "POC Email",
                RuleKind::StripPrefix {
                    prefix: "Email ".to_string(),
                },
            ),
        ])
    }

    pub fn push(&mut self, rule: FieldRule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }
}
