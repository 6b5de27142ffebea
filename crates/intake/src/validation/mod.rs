//! Rule-based data-quality validation.

mod checks;
mod report;
mod validator;

pub use checks::{
    CheckContext, DateFormatCheck, DqCheck, DuplicatesCheck, NullValuesCheck,
    NumericColumnsCheck, RequiredColumnsCheck, RowCountCheck,
};
pub use report::{CheckResult, CheckStatus, DqReport};
pub use validator::DqValidator;
