// ABOUTME: Todo management with manual, dense ordering inside each list
// ABOUTME: Provides todo types, the reorder resolver, and the storage layer

pub mod ordering;
pub mod storage;
pub mod types;

pub use ordering::resolve_order;
pub use storage::TodoStorage;
pub use types::{parse_order, ReorderInput, Todo, TodoChanges, TodoCreateInput, TodoUpdateInput};
