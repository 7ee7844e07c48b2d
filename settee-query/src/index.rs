//! View index generation.
//!
//! Every query compiles to a view whose key is the tuple of the queried
//! fields, in query order. Both the view name and its map function are pure
//! functions of the entity discriminator and the [`FieldSequence`], so equal
//! queries always ask the store for the same view and the store can treat
//! `ensure_index` as idempotent.
//!
//! ```rust
//! use settee_query::field::{FieldPath, FieldSequence};
//! use settee_query::index::IndexDefinition;
//!
//! let fields = FieldSequence::try_from(vec![
//!     FieldPath::parse("Name")?,
//!     FieldPath::parse("Price")?,
//! ])?;
//! let index = IndexDefinition::generate("by", "widget", &fields);
//! assert_eq!(index.name, "by-Name-Price");
//! assert!(index.map.contains(r#"emit([doc["Name"], doc["Price"]], null);"#));
//!
//! // nested paths and non-letters carry a digest of the exact field text
//! let nested = FieldSequence::try_from(vec![FieldPath::parse("Owner.Name")?])?;
//! let name = IndexDefinition::generate("by", "widget", &nested).name;
//! assert!(name.starts_with("by-Owner-Name-"));
//! # Ok::<(), settee_query::QueryError>(())
//! ```

use serde::Serialize;
use serde_json::Value;
use xxhash_rust::xxh3::xxh3_64;

use crate::field::{FieldPath, FieldSequence};
use crate::traits::ID_SEPARATOR;

/// Language tag for generated map functions.
pub const MAP_LANGUAGE: &str = "javascript";

/// Separator substituted for every non-letter character in index names.
pub const NAME_SEPARATOR: char = '-';

/// A view index derived from a field sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexDefinition {
    /// Deterministic view name.
    pub name: String,
    /// Entity discriminator the view is scoped to.
    pub discriminator: String,
    /// Key columns, in order.
    pub fields: FieldSequence,
    /// Map function source.
    pub map: String,
    /// Map function language.
    pub language: &'static str,
}

impl IndexDefinition {
    /// Derive the definition for `fields` over documents of `discriminator`.
    pub fn generate(prefix: &str, discriminator: &str, fields: &FieldSequence) -> Self {
        Self {
            name: index_name(prefix, fields),
            discriminator: discriminator.to_string(),
            fields: fields.clone(),
            map: render_map(discriminator, fields),
            language: MAP_LANGUAGE,
        }
    }

    /// Whether `other` can share this definition's name without conflict.
    pub fn is_compatible(&self, other: &IndexDefinition) -> bool {
        self.name == other.name && self.map == other.map
    }
}

/// Build the view name for a field sequence.
///
/// Each path segment contributes a separator followed by its text, with
/// every non-letter character replaced by the separator. When that loses
/// information (a nested path, or a segment with non-letters) the name
/// ends with a hex digest of the exact field text, so `["Owner.Name"]`,
/// `["Owner", "Name"]`, `Price1` and `Price2` all get distinct names.
pub fn index_name(prefix: &str, fields: &FieldSequence) -> String {
    let mut name = String::with_capacity(prefix.len() + 16 * fields.len() + 17);
    name.push_str(prefix);
    for segment in fields.iter().flat_map(FieldPath::segments) {
        name.push(NAME_SEPARATOR);
        name.extend(
            segment
                .chars()
                .map(|c| if c.is_alphabetic() { c } else { NAME_SEPARATOR }),
        );
    }
    if !is_plain(fields) {
        name.push(NAME_SEPARATOR);
        name.push_str(&format!("{:016x}", fields_digest(fields)));
    }
    name
}

/// Every path is a single segment made of letters only.
fn is_plain(fields: &FieldSequence) -> bool {
    fields.iter().all(|path| {
        path.depth() == 1 && path.leaf().chars().all(char::is_alphabetic)
    })
}

/// Stable digest of the field sequence, segment and path boundaries included.
fn fields_digest(fields: &FieldSequence) -> u64 {
    let canonical: Vec<Vec<&str>> = fields
        .iter()
        .map(|path| path.segments().iter().map(|s| s.as_str()).collect())
        .collect();
    xxh3_64(Value::from(canonical).to_string().as_bytes())
}

/// Render the map function emitting `[field, ...]` for matching documents.
///
/// Names and the discriminator are embedded as JSON string literals, so
/// quotes or backslashes in them cannot escape the generated source.
pub fn render_map(discriminator: &str, fields: &FieldSequence) -> String {
    let prefix = js_string(&format!("{}{}", discriminator, ID_SEPARATOR));
    let key = fields
        .iter()
        .map(doc_accessor)
        .collect::<Vec<_>>()
        .join(", ");

    let mut map = String::with_capacity(96 + key.len());
    map.push_str("function(doc) {\n");
    map.push_str(&format!("  if (doc._id.indexOf({}) === 0) {{\n", prefix));
    map.push_str(&format!("    emit([{}], null);\n", key));
    map.push_str("  }\n");
    map.push_str("}\n");
    map
}

fn doc_accessor(path: &FieldPath) -> String {
    let mut out = String::from("doc");
    for segment in path.segments() {
        out.push('[');
        out.push_str(&js_string(segment));
        out.push(']');
    }
    out
}

fn js_string(text: &str) -> String {
    Value::String(text.to_string()).to_string()
}
