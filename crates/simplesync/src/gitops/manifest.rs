//! A parsed resource manifest.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_yaml::{Mapping, Value};

/// Untyped key/value body of a manifest.
pub type Document = Mapping;

/// Top-level field carrying the resource kind.
pub const KIND_FIELD: &str = "kind";
/// Top-level field carrying the resource name.
pub const NAME_FIELD: &str = "name";

/// One manifest file loaded from the working copy.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    path: PathBuf,
    body: Document,
}

impl Manifest {
    /// Creates a manifest from its source path and parsed body.
    pub fn new(path: impl Into<PathBuf>, body: Document) -> Self {
        Self {
            path: path.into(),
            body,
        }
    }

    /// Parses raw file content into a manifest.
    ///
    /// Only the first document of a multi-document stream is read; the
    /// file as a whole is still what gets applied. An empty document yields
    /// an empty body. Anything other than a mapping at the top level is
    /// rejected.
    pub fn parse(path: impl Into<PathBuf>, content: &[u8]) -> Result<Self, serde_yaml::Error> {
        let first = match serde_yaml::Deserializer::from_slice(content).next() {
            Some(document) => Value::deserialize(document)?,
            None => Value::Null,
        };
        let body = match first {
            Value::Null => Mapping::new(),
            value => serde_yaml::from_value::<Mapping>(value)?,
        };
        Ok(Self::new(path, body))
    }

    /// Path of the file this manifest was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The parsed document body.
    pub fn body(&self) -> &Document {
        &self.body
    }

    /// The resource kind, or an empty string if absent or not a string.
    pub fn kind(&self) -> &str {
        extract_identity(&self.body).0
    }

    /// The resource name, or an empty string if absent or not a string.
    pub fn name(&self) -> &str {
        extract_identity(&self.body).1
    }
}

/// Reads `(kind, name)` from the top level of `body`.
pub fn extract_identity(body: &Document) -> (&str, &str) {
    (string_field(body, KIND_FIELD), string_field(body, NAME_FIELD))
}

fn string_field<'a>(body: &'a Document, key: &str) -> &'a str {
    body.get(key).and_then(Value::as_str).unwrap_or("")
}
