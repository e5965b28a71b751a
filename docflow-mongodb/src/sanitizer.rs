//! Field-name and namespace sanitization for MongoDB compatibility.
//!
//! MongoDB does not allow document keys to contain dots, dollar signs or null bytes, and
//! database and collection names are similarly restricted. Keys and names are escaped on
//! the way in and restored on the way out. String values are stored as they are, so
//! filters compare against the caller's values without translation.

use bson::{Bson, Document};

pub(crate) struct ValueSanitizer;

impl ValueSanitizer {
    const REPLACEMENTS: [(&'static str, &'static str); 3] = [
        (".", "__dot__"),
        ("$", "__dollar__"),
        ("\0", "__null__"),
    ];

    /// Escapes every key of a document, recursing into nested documents and arrays.
    pub(crate) fn sanitize_keys(document: &Document) -> Document {
        document
            .iter()
            .map(|(k, v)| (Self::sanitize_string(k), Self::map_nested(v, Self::sanitize_keys)))
            .collect()
    }

    /// Inverse of [`ValueSanitizer::sanitize_keys`].
    pub(crate) fn restore_keys(document: &Document) -> Document {
        document
            .iter()
            .map(|(k, v)| (Self::restore_string(k), Self::map_nested(v, Self::restore_keys)))
            .collect()
    }

    fn map_nested(value: &Bson, f: fn(&Document) -> Document) -> Bson {
        match value {
            Bson::Document(doc) => Bson::Document(f(doc)),
            Bson::Array(arr) => Bson::Array(
                arr.iter()
                    .map(|item| Self::map_nested(item, f))
                    .collect(),
            ),
            _ => value.clone(),
        }
    }

    /// Escapes each segment of a dotted field path, keeping the dots that address
    /// nested documents.
    pub(crate) fn sanitize_path(path: &str) -> String {
        path.split('.')
            .map(Self::sanitize_string)
            .collect::<Vec<_>>()
            .join(".")
    }

    pub(crate) fn sanitize_string(input: &str) -> String {
        let mut sanitized = input.to_string();
        for (target, replacement) in Self::REPLACEMENTS.iter() {
            sanitized = sanitized.replace(*target, *replacement);
        }
        sanitized
    }

    pub(crate) fn restore_string(input: &str) -> String {
        let mut restored = input.to_string();
        for (target, replacement) in Self::REPLACEMENTS.iter().rev() {
            restored = restored.replace(*replacement, *target);
        }
        restored
    }
}
