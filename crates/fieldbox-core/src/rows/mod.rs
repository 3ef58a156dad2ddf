//! Record builder: turns extracted fields into output rows.

pub mod rules;

pub use rules::{FieldRule, RuleKind, RuleTable, parse_amount};

use rules::CompiledRule;
use tracing::trace;

use crate::error::RecordError;
use crate::models::{Cell, ExtractedField, OutputRow};

/// Result type for row building.
pub type Result<T> = std::result::Result<T, RecordError>;

/// Positional rules for one row shape, one entry per expected field.
#[derive(Debug, Clone)]
pub struct FieldRuleSet {
    entries: Vec<(String, CompiledRule)>,
}

impl FieldRuleSet {
    /// Identity rules for the given field names.
    pub fn identity<S: AsRef<str>>(names: &[S]) -> Self {
        Self {
            entries: names
                .iter()
                .map(|n| (n.as_ref().to_string(), CompiledRule::Identity))
                .collect(),
        }
    }

    /// Bind a rule table to the field names making up a row.
    ///
    /// Every rule must name a field present in `names`; a field without a
    /// rule keeps its text unchanged. A field name that appears more than
    /// once in `names` (same name on several template pages) gets the rule
    /// in every position.
    pub fn bind<S: AsRef<str>>(table: &RuleTable, names: &[S]) -> Result<Self> {
        let mut set = Self::identity(names);
        let mut seen: Vec<&str> = Vec::new();

        for rule in table.rules() {
            if seen.contains(&rule.field.as_str()) {
                return Err(RecordError::InvalidRule {
                    field: rule.field.clone(),
                    reason: "field has more than one rule, use a chain".to_string(),
                });
            }
            seen.push(&rule.field);

            let compiled = CompiledRule::compile(&rule.field, &rule.rule)?;
            let mut matched = false;
            for (name, slot) in set.entries.iter_mut() {
                if *name == rule.field {
                    *slot = compiled.clone();
                    matched = true;
                }
            }
            if !matched {
                return Err(RecordError::UnknownRuleField(rule.field.clone()));
            }
        }

        Ok(set)
    }

    /// Expected field names, in row order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Apply field rules to a list of extracted fields.
///
/// The fields must line up with the rule set one to one; a template change
/// that is not reflected in the rule set fails here instead of producing
/// shifted columns.
pub fn build_row(fields: &[ExtractedField], rules: &FieldRuleSet) -> Result<OutputRow> {
    if fields.len() != rules.len() {
        return Err(RecordError::FieldCountMismatch {
            fields: fields.len(),
            rules: rules.len(),
        });
    }

    let mut cells = Vec::with_capacity(fields.len());
    for (position, (field, (expected, rule))) in fields.iter().zip(&rules.entries).enumerate() {
        if field.name != *expected {
            return Err(RecordError::FieldNameMismatch {
                position,
                expected: expected.clone(),
                found: field.name.clone(),
            });
        }

        let value = rule.apply(&field.text);
        trace!("{} = {:?} -> {:?}", field.name, field.text, value);
        cells.push(Cell {
            name: field.name.clone(),
            value,
        });
    }

    Ok(OutputRow {
        document: None,
        cells,
    })
}
