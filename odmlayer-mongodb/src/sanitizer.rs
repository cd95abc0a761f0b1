//! Field name sanitization for MongoDB compatibility.
//!
//! MongoDB reserves dots and dollar signs in field names for its query syntax, so record
//! keys are escaped on the way in and restored on the way out. This includes keys of maps
//! nested inside values; scalar values such as strings are never rewritten. Query values
//! go through the same escaping so they compare equal to what was stored.

use bson::Bson;

use odmlayer_core::document::Record;


/// Escapes and restores record keys.
///
/// MongoDB does not allow field names (document keys) to contain:
/// - Dots (`.`) - used for nested field access in queries
/// - Dollar signs (`$`) - used for operators in queries
/// - Null bytes (`\0`) - field name terminators
pub(crate) struct FieldSanitizer;

impl FieldSanitizer {
    const REPLACEMENTS: [(&'static str, &'static str); 3] = [
        (".", "__dot__"),
        ("$", "__dollar__"),
        ("\0", "__null__"),
    ];

    /// Escapes every key in a record, descending into nested maps and lists.
    pub(crate) fn sanitize_record(record: Record) -> Record {
        record
            .into_iter()
            .map(|(key, value)| (Self::sanitize_key(&key), Self::sanitize_value(value)))
            .collect()
    }

    /// Escapes the keys of any maps inside `value`.
    pub(crate) fn sanitize_value(value: Bson) -> Bson {
        match value {
            Bson::Array(arr) => Bson::Array(
                arr
                    .into_iter()
                    .map(Self::sanitize_value)
                    .collect(),
            ),
            Bson::Document(doc) => Bson::Document(Self::sanitize_record(doc)),
            other => other,
        }
    }

    /// Escapes a single field or collection name.
    pub(crate) fn sanitize_key(input: &str) -> String {
        let mut sanitized = input.to_string();
        for (target, replacement) in Self::REPLACEMENTS.iter() {
            sanitized = sanitized.replace(*target, *replacement);
        }
        sanitized
    }

    /// Reverts [`sanitize_record`](Self::sanitize_record).
    pub(crate) fn restore_record(record: Record) -> Record {
        record
            .into_iter()
            .map(|(key, value)| (Self::restore_key(&key), Self::restore_value(value)))
            .collect()
    }

    fn restore_value(value: Bson) -> Bson {
        match value {
            Bson::Array(arr) => Bson::Array(
                arr
                    .into_iter()
                    .map(Self::restore_value)
                    .collect(),
            ),
            Bson::Document(doc) => Bson::Document(Self::restore_record(doc)),
            other => other,
        }
    }

    fn restore_key(input: &str) -> String {
        let mut restored = input.to_string();
        for (target, replacement) in Self::REPLACEMENTS.iter().rev() {
            restored = restored.replace(*replacement, *target);
        }
        restored
    }
}
