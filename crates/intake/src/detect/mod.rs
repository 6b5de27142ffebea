//! Content-based template detection.

mod analysis;
mod detector;

pub use analysis::{ColumnTag, TableAnalysis, tag_column};
pub use detector::{Detection, DetectionReport, TemplateDetector, TemplateScore, decide};
