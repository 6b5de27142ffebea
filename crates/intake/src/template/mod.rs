//! Template types, their canonical schemas and detection profiles.

mod profile;
mod registry;
mod types;

pub use profile::{CountRange, Gate, ScoringProfile, Signal, WeightedSignal};
pub use registry::{FieldSpec, SchemaRegistry, TemplateSpec};
pub use types::TemplateType;
