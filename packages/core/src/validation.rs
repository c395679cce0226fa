// ABOUTME: Input validation for todo titles, list names, and colors
// ABOUTME: Trims input and rejects empty, oversized, or null-byte values

use thiserror::Error;

/// Maximum length of a todo title (in characters, after trimming)
pub const MAX_TITLE_LEN: usize = 1000;

/// Maximum length of a list name (in characters, after trimming)
pub const MAX_LIST_NAME_LEN: usize = 200;

pub const MAX_COLOR_LEN: usize = 32;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Empty { field: &'static str },
    #[error("{field} exceeds maximum length of {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("{field} contains invalid null bytes")]
    NullByte { field: &'static str },
    #[error("No fields to update")]
    NoFields,
    #[error("{0}")]
    Malformed(String),
}

fn validate_text(
    value: &str,
    field: &'static str,
    max: usize,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    if trimmed.contains('\0') {
        return Err(ValidationError::NullByte { field });
    }

    Ok(trimmed.to_string())
}

/// Validate and trim a todo title
pub fn validate_title(title: &str) -> Result<String, ValidationError> {
    validate_text(title, "Title", MAX_TITLE_LEN)
}

/// Validate and trim a list name
pub fn validate_list_name(name: &str) -> Result<String, ValidationError> {
    validate_text(name, "Name", MAX_LIST_NAME_LEN)
}

/// Trim a color; a blank color means "use the default" and yields `None`
pub fn normalize_color(color: Option<&str>) -> Result<Option<String>, ValidationError> {
    match color.map(str::trim) {
        None | Some("") => Ok(None),
        Some(c) => validate_text(c, "Color", MAX_COLOR_LEN).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_is_trimmed() {
        assert_eq!(validate_title("  Buy milk \n").unwrap(), "Buy milk");
    }

    #[test]
    fn test_whitespace_only_title_is_rejected() {
        assert_eq!(
            validate_title("   "),
            Err(ValidationError::Empty { field: "Title" })
        );
        assert_eq!(
            validate_title("").unwrap_err().to_string(),
            "Title is required"
        );
    }

    #[test]
    fn test_oversized_name_is_rejected() {
        let name = "x".repeat(MAX_LIST_NAME_LEN + 1);
        assert!(matches!(
            validate_list_name(&name),
            Err(ValidationError::TooLong { .. })
        ));
        assert!(validate_list_name(&"x".repeat(MAX_LIST_NAME_LEN)).is_ok());
    }

    #[test]
    fn test_null_bytes_are_rejected() {
        assert!(matches!(
            validate_title("bad\0title"),
            Err(ValidationError::NullByte { .. })
        ));
    }

    #[test]
    fn test_blank_color_means_default() {
        assert_eq!(normalize_color(None).unwrap(), None);
        assert_eq!(normalize_color(Some("   ")).unwrap(), None);
        assert_eq!(
            normalize_color(Some(" #ff0000 ")).unwrap(),
            Some("#ff0000".to_string())
        );
    }
}
