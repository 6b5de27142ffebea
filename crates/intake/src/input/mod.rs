//! Input parsing and data source handling.

mod parser;
mod source;
mod table;
pub mod values;

pub use parser::Parser;
pub use source::{FileInfo, FileKind, SourceMetadata, content_hash, extension_of};
pub use table::{Column, ColumnKind, DataTable, Records, TableIssue, Value, validate_table};
