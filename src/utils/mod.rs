pub mod string_utils;
pub mod time_utils;

// Re-export commonly used functions
pub use string_utils::{is_blank, non_blank};
pub use time_utils::*;
