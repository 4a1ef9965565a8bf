use crate::domain::model::{FieldValue, Unit, UnitField};
use crate::utils::error::{Result, UnitError};

/// Holds the unit draft being edited.
#[derive(Debug, Clone, Default)]
pub struct UnitForm {
    draft: Unit,
}

impl UnitForm {
    pub fn new(defaults: Unit) -> Self {
        Self { draft: defaults }
    }

    pub fn draft(&self) -> &Unit {
        &self.draft
    }

    /// Replaces one field; the draft is untouched when the value kind is wrong.
    pub fn set_field(&mut self, field: UnitField, value: FieldValue) -> Result<()> {
        self.draft = self.draft.with_field(field, value)?;
        Ok(())
    }

    /// Sets a capacity counter from raw input; unparsable text becomes 0.
    pub fn set_count_from_input(&mut self, field: UnitField, raw: &str) -> Result<()> {
        if !field.is_count() {
            return Err(UnitError::validation(format!(
                "field '{}' is not a counter",
                field
            )));
        }
        let count = parse_leading_int(raw).unwrap_or(0);
        self.set_field(field, FieldValue::Count(count))
    }

    /// Replaces the whole draft with an existing unit.
    pub fn seed(&mut self, unit: Unit) {
        self.draft = unit;
    }
}

/// Integer prefix of `raw` after leading whitespace, e.g. `"12abc"` is 12.
fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}
