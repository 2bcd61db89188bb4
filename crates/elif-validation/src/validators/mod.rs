//! Built-in value rules

pub mod length;
pub mod pattern;
pub mod required;

pub use length::LengthValidator;
pub use pattern::PatternValidator;
pub use required::RequiredValidator;
