// ABOUTME: Core types, constants, and validation for Tasklane
// ABOUTME: Foundational package shared by the storage, domain, and API packages

pub mod coerce;
pub mod constants;
pub mod patch;
pub mod validation;

// Re-export constants
pub use constants::{
    DEFAULT_LIST_COLOR, INBOX_COLOR, INBOX_LIST_NAME, NOTEPAD_COLOR, NOTEPAD_LIST_NAME,
};

// Re-export request-body helpers
pub use coerce::{coerce_id, Flag, LenientInt};
pub use patch::Patch;

// Re-export validation
pub use validation::{
    normalize_color, validate_list_name, validate_title, ValidationError, MAX_COLOR_LEN,
    MAX_LIST_NAME_LEN, MAX_TITLE_LEN,
};
