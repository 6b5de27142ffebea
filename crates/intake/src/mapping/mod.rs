//! Column mapping: raw headers onto canonical template fields.

mod mapper;
mod memory;
mod similarity;

pub use mapper::{
    ColumnMapper, ColumnMapping, FieldMatch, MappedView, MappingResult, MappingValidation,
};
pub use memory::{MappingMemory, MappingRecord};
pub use similarity::{normalize, ratio, similarity};
