//! Typed attribute values and the per-column conversion policy.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A typed attribute as accepted by the target table. Numbers stay in
/// their textual representation; the table service parses them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttrValue {
    S(String),
    N(String),
    B(bool),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::S(s) | AttrValue::N(s) => Some(s),
            AttrValue::B(_) => None,
        }
    }
}

/// One imported row: column name → typed attribute. Columns whose cell
/// was empty are absent.
pub type Record = HashMap<String, AttrValue>;

/// Converter assigned to a column. Policy is plain data so it can be
/// serialized and inspected alongside the rest of the import request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Number,
    Boolean,
}

impl ColumnType {
    /// Converts one cell. Empty cells convert to nothing, whatever the
    /// column type; the attribute is omitted from the record.
    ///
    /// Boolean columns accept the exact literals `true` / `TRUE` as
    /// true; everything else, including `false` / `FALSE`, is false.
    pub fn convert(&self, cell: &str) -> Option<AttrValue> {
        if cell.is_empty() {
            return None;
        }
        Some(match self {
            ColumnType::String => AttrValue::S(cell.to_string()),
            ColumnType::Number => AttrValue::N(cell.to_string()),
            ColumnType::Boolean => AttrValue::B(matches!(cell, "true" | "TRUE")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_pass_through_verbatim() {
        assert_eq!(
            ColumnType::String.convert("red, wine"),
            Some(AttrValue::S("red, wine".into()))
        );
    }

    #[test]
    fn numbers_keep_textual_representation() {
        assert_eq!(
            ColumnType::Number.convert("2.12"),
            Some(AttrValue::N("2.12".into()))
        );
        assert_eq!(
            ColumnType::Number.convert("-3"),
            Some(AttrValue::N("-3".into()))
        );
    }

    #[test]
    fn booleans_match_exact_literals_only() {
        assert_eq!(
            ColumnType::Boolean.convert("true"),
            Some(AttrValue::B(true))
        );
        assert_eq!(
            ColumnType::Boolean.convert("TRUE"),
            Some(AttrValue::B(true))
        );
        assert_eq!(
            ColumnType::Boolean.convert("false"),
            Some(AttrValue::B(false))
        );
        assert_eq!(
            ColumnType::Boolean.convert("FALSE"),
            Some(AttrValue::B(false))
        );
        // Mixed case and arbitrary values fall through to false.
        assert_eq!(
            ColumnType::Boolean.convert("True"),
            Some(AttrValue::B(false))
        );
        assert_eq!(
            ColumnType::Boolean.convert("yes"),
            Some(AttrValue::B(false))
        );
    }

    #[test]
    fn empty_cells_convert_to_nothing() {
        assert_eq!(ColumnType::String.convert(""), None);
        assert_eq!(ColumnType::Number.convert(""), None);
        assert_eq!(ColumnType::Boolean.convert(""), None);
    }

    #[test]
    fn attribute_json_shape_is_externally_tagged() {
        let json = serde_json::to_value(AttrValue::N("42".to_string())).unwrap();
        assert_eq!(json, serde_json::json!({"N": "42"}));
        let json = serde_json::to_value(AttrValue::B(true)).unwrap();
        assert_eq!(json, serde_json::json!({"B": true}));
    }
}
