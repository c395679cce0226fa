// ABOUTME: List management system for organizing todos
// ABOUTME: Provides types and storage layer for lists, including the hidden Notepad

pub mod storage;
pub mod types;

// Re-export main types
pub use storage::ListStorage;
pub use types::{List, ListChanges, ListCreateInput, ListUpdateInput, NewList};
