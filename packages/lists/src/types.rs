// ABOUTME: List type definitions
// ABOUTME: Stored list rows plus validated create and partial-update inputs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tasklane_core::{
    normalize_color, validate_list_name, LenientInt, Patch, ValidationError, DEFAULT_LIST_COLOR,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct List {
    pub id: i64,
    pub name: String,
    pub position: i64,
    pub color: Option<String>,
    pub is_hidden: bool,
    /// Absent for rows written before the column existed
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of a create-list request, before validation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListCreateInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// A list that passed validation and is ready to insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewList {
    pub name: String,
    pub color: String,
}

impl ListCreateInput {
    pub fn validate(self) -> Result<NewList, ValidationError> {
        let name = validate_list_name(self.name.as_deref().unwrap_or_default())?;
        let color = normalize_color(self.color.as_deref())?
            .unwrap_or_else(|| DEFAULT_LIST_COLOR.to_string());
        Ok(NewList { name, color })
    }
}

/// Body of a PATCH request; every field may be absent, null, or set
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListUpdateInput {
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub position: Patch<LenientInt>,
    #[serde(default)]
    pub color: Patch<String>,
}

/// Validated column changes for one list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListChanges {
    pub name: Option<String>,
    pub position: Option<i64>,
    pub color: Option<String>,
}

impl ListChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.position.is_none() && self.color.is_none()
    }
}

impl ListUpdateInput {
    /// Validate each present field.
    ///
    /// A null position means 0 and a null or blank color resets to the
    /// default, while a null name is rejected like an empty one.
    pub fn into_changes(self) -> Result<ListChanges, ValidationError> {
        let name = match self.name {
            Patch::Absent => None,
            Patch::Null => Some(validate_list_name("")?),
            Patch::Value(name) => Some(validate_list_name(&name)?),
        };

        let position = match self.position {
            Patch::Absent => None,
            Patch::Null => Some(0),
            Patch::Value(LenientInt(position)) => Some(position),
        };

        let color = if self.color.is_absent() {
            None
        } else {
            let color = self.color.value();
            Some(
                normalize_color(color.as_deref())?
                    .unwrap_or_else(|| DEFAULT_LIST_COLOR.to_string()),
            )
        };

        let changes = ListChanges {
            name,
            position,
            color,
        };
        if changes.is_empty() {
            return Err(ValidationError::NoFields);
        }
        Ok(changes)
    }
}
