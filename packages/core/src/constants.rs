/// Name of the always-present default list that receives unassigned todos
pub const INBOX_LIST_NAME: &str = "Inbox";

/// Name of the hidden scratch-space list
pub const NOTEPAD_LIST_NAME: &str = "Notepad";

pub const INBOX_COLOR: &str = "#fffbe6";
pub const NOTEPAD_COLOR: &str = "#e6fffb";

/// Color given to user-created lists when none (or a blank one) is supplied
pub const DEFAULT_LIST_COLOR: &str = INBOX_COLOR;
