pub mod formatter;
pub mod labels;

pub use formatter::{format, DisplayEntry, FormatOptions};
