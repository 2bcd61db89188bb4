//! Identifier checks for the names that end up in generated SQL
//!
//! The translations column name is the only identifier interpolated into
//! predicate text, so it is validated once at registration and quoted per
//! dialect. Locale codes and field names are only ever bound, but they become
//! JSON path segments and must not be able to escape a quoted segment.

use crate::error::{TranslatableError, TranslatableResult};

/// Characters allowed in SQL identifiers (alphanumeric, underscore, dollar)
const ALLOWED_IDENTIFIER_CHARS: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_$";

static SQL_KEYWORDS: &[&str] = &[
    "SELECT", "INSERT", "UPDATE", "DELETE", "FROM", "WHERE", "JOIN", "UNION", "DROP",
    "CREATE", "ALTER", "GRANT", "REVOKE", "TRUNCATE", "EXEC", "EXECUTE", "DECLARE",
    "CAST", "CONVERT", "TABLE", "ORDER", "GROUP", "USER",
];

/// Wrap an identifier in the dialect's quote character, doubling embedded quotes
pub fn quote_identifier(identifier: &str, quote: char) -> String {
    let doubled: String = [quote, quote].iter().collect();
    let escaped = identifier.replace(quote, &doubled);
    format!("{quote}{escaped}{quote}")
}

/// Validate that a column name is safe to interpolate
pub fn validate_identifier(identifier: &str) -> TranslatableResult<()> {
    let mut chars = identifier.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return Err(TranslatableError::invalid_identifier(identifier, "identifier cannot be empty")),
    };

    // PostgreSQL limit
    if identifier.len() > 63 {
        return Err(TranslatableError::invalid_identifier(identifier, "too long (max 63 characters)"));
    }

    if let Some(c) = identifier.chars().find(|c| !ALLOWED_IDENTIFIER_CHARS.contains(*c)) {
        return Err(TranslatableError::invalid_identifier(
            identifier,
            format!("contains invalid character '{}'", c),
        ));
    }

    if first.is_ascii_digit() {
        return Err(TranslatableError::invalid_identifier(identifier, "cannot start with a number"));
    }

    if SQL_KEYWORDS.contains(&identifier.to_uppercase().as_str()) {
        return Err(TranslatableError::invalid_identifier(identifier, "reserved SQL keyword"));
    }

    Ok(())
}

/// Validate a locale code or field name used as a JSON object key
pub fn validate_path_segment(segment: &str) -> TranslatableResult<()> {
    if segment.trim().is_empty() {
        return Err(TranslatableError::invalid_identifier(segment, "name cannot be blank"));
    }
    if let Some(c) = segment.chars().find(|c| matches!(c, '"' | '\\') || c.is_control()) {
        return Err(TranslatableError::invalid_identifier(
            segment,
            format!("contains invalid character {:?}", c),
        ));
    }
    Ok(())
}
