// ABOUTME: Todo type definitions
// ABOUTME: Stored todo rows, validated create/update inputs, and reorder payload parsing

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use tasklane_core::{coerce_id, validate_title, Flag, LenientInt, Patch, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub done: bool,
    pub list_id: i64,
    pub position: i64,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TodoCreateInput {
    #[serde(default)]
    pub title: Option<String>,
}

impl TodoCreateInput {
    /// The trimmed, non-empty title
    pub fn validate(self) -> Result<String, ValidationError> {
        validate_title(self.title.as_deref().unwrap_or_default())
    }
}

/// Body of a PATCH request for a todo
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TodoUpdateInput {
    #[serde(default)]
    pub title: Patch<String>,
    #[serde(default)]
    pub done: Patch<Flag>,
    #[serde(default)]
    pub list_id: Patch<LenientInt>,
}

/// Validated changes for one todo
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoChanges {
    pub title: Option<String>,
    pub done: Option<bool>,
    /// Destination list; moving places the todo at the front of it
    pub list_id: Option<i64>,
}

impl TodoChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.done.is_none() && self.list_id.is_none()
    }
}

impl TodoUpdateInput {
    /// Validate each present field. A null `done` clears the flag and a null
    /// `list_id` is ignored.
    pub fn into_changes(self) -> Result<TodoChanges, ValidationError> {
        let title = match self.title {
            Patch::Absent => None,
            Patch::Null => Some(validate_title("")?),
            Patch::Value(title) => Some(validate_title(&title)?),
        };

        let done = match self.done {
            Patch::Absent => None,
            Patch::Null => Some(false),
            Patch::Value(Flag(done)) => Some(done),
        };

        let list_id = self.list_id.value().map(|LenientInt(id)| id);

        let changes = TodoChanges {
            title,
            done,
            list_id,
        };
        if changes.is_empty() {
            return Err(ValidationError::NoFields);
        }
        Ok(changes)
    }
}

/// Body of a reorder request. `order` stays untyped so malformed entries
/// surface as validation errors rather than body-parsing failures.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReorderInput {
    #[serde(default)]
    pub order: Value,
}

impl ReorderInput {
    pub fn ids(&self) -> Result<Vec<i64>, ValidationError> {
        parse_order(&self.order)
    }
}

/// Turn a JSON `order` value into todo ids. A missing or null order is empty.
pub fn parse_order(order: &Value) -> Result<Vec<i64>, ValidationError> {
    match order {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                coerce_id(item).ok_or_else(|| {
                    ValidationError::Malformed("order must contain integers".to_string())
                })
            })
            .collect(),
        _ => Err(ValidationError::Malformed("order must be an array".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!(null), Ok(vec![]))]
    #[case(json!([]), Ok(vec![]))]
    #[case(json!([3, "1", 2]), Ok(vec![3, 1, 2]))]
    fn test_parse_order_accepts(#[case] order: Value, #[case] expected: Result<Vec<i64>, ValidationError>) {
        assert_eq!(parse_order(&order), expected);
    }

    #[rstest]
    #[case(json!("1,2,3"))]
    #[case(json!({"0": 1}))]
    #[case(json!([1, "two"]))]
    #[case(json!([1, null]))]
    #[case(json!([1.5]))]
    fn test_parse_order_rejects(#[case] order: Value) {
        assert!(matches!(
            parse_order(&order),
            Err(ValidationError::Malformed(_))
        ));
    }

    #[test]
    fn test_missing_order_key_is_empty() {
        let input: ReorderInput = serde_json::from_value(json!({})).unwrap();
        assert_eq!(input.ids().unwrap(), Vec::<i64>::new());
    }

    #[test]
    fn test_whitespace_title_is_rejected() {
        let input = TodoCreateInput {
            title: Some("   ".to_string()),
        };
        assert_eq!(input.validate(), Err(ValidationError::Empty { field: "Title" }));
    }

    #[test]
    fn test_update_changes() {
        let changes = serde_json::from_value::<TodoUpdateInput>(json!({
            "title": " Renamed ",
            "done": "1",
            "list_id": "7"
        }))
        .unwrap()
        .into_changes()
        .unwrap();

        assert_eq!(
            changes,
            TodoChanges {
                title: Some("Renamed".to_string()),
                done: Some(true),
                list_id: Some(7),
            }
        );
    }

    #[test]
    fn test_null_list_id_alone_is_no_change() {
        let result = serde_json::from_value::<TodoUpdateInput>(json!({"list_id": null}))
            .unwrap()
            .into_changes();
        assert_eq!(result, Err(ValidationError::NoFields));
    }

    #[test]
    fn test_null_done_clears_flag() {
        let changes = serde_json::from_value::<TodoUpdateInput>(json!({"done": null}))
            .unwrap()
            .into_changes()
            .unwrap();
        assert_eq!(changes.done, Some(false));
    }
}
