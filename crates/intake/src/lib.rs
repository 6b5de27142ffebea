//! Intake: template detection, column mapping and data-quality validation
//! for financial spreadsheet exports.
//!
//! A file is parsed into a [`DataTable`], classified against the known
//! financial templates, its columns are mapped onto the template's canonical
//! fields, and the mapped table is run through a battery of data-quality
//! checks.
//!
//! # Core Principles
//!
//! - **Explainable**: every template score and field match is reported
//! - **Non-destructive**: the parsed table is never rewritten
//! - **Configurable**: thresholds, synonyms and date formats live in [`IntakeConfig`]
//!
//! # Example
//!
//! ```no_run
//! use intake::Intake;
//!
//! let intake = Intake::default();
//! let outcome = intake.run("bank_export.csv").unwrap();
//!
//! println!("Template: {}", outcome.template_type);
//! println!("DQ status: {}", outcome.dq_report.status);
//! ```

pub mod config;
pub mod detect;
pub mod error;
pub mod input;
pub mod mapping;
pub mod template;
pub mod validation;

mod pipeline;

pub use crate::pipeline::{Intake, IntakeOutcome, run_intake, run_intake_async};
pub use config::IntakeConfig;
pub use detect::{Detection, TemplateDetector};
pub use error::{IntakeError, Result};
pub use input::{DataTable, Parser, SourceMetadata, Value};
pub use mapping::{ColumnMapper, ColumnMapping, MappingMemory};
pub use template::{SchemaRegistry, TemplateType};
pub use validation::{CheckStatus, DqReport, DqValidator};
