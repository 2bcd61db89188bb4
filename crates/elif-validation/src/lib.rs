//! # elif-validation
//!
//! Error collection and reusable value rules used by the translatable column
//! validators. Errors are keyed by attribute and may carry a translation key
//! (`column.locale.field`) so hosts can localize messages per nested value.

pub mod error;
pub mod traits;
pub mod validators;

pub use error::{codes, ValidationError, ValidationErrors, ValidationResult};
pub use traits::{is_blank, ValidationRule};

pub use validators::{
    length::LengthValidator,
    pattern::PatternValidator,
    required::RequiredValidator,
};
