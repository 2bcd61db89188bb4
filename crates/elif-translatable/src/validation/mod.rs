//! Validation pipeline for the translations column
//!
//! Structural checks run first and report undeclared locales and fields;
//! field rules then run in declaration order. Failures are collected, never
//! raised, and every nested failure carries a `column.locale.field` key.

pub mod rules;
pub mod structure;

pub use rules::{validate_fields, CustomPredicate, RuleOptions, TranslationRule, VALID_OPTIONS};
pub use structure::validate_structure;
