//! Published-content documents as written by the admin tool.
//!
//! Documents are kept as raw JSON. Each item is judged on its own, so one
//! malformed entry never hides its well-formed neighbours.
use serde_json::{json, Map, Value};
use thiserror::Error;

/// The document itself has the wrong shape, so no item can be judged.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("document is not a JSON object")]
    NotAnObject,
    #[error("`{0}` is not an array")]
    NotAnArray(&'static str),
}

/// `{ resources: [...], published: [...] }`
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDocument(Value);

/// `{ testimonials: [...] }`
#[derive(Debug, Clone, PartialEq)]
pub struct TestimonialDocument(Value);

impl Default for ResourceDocument {
    fn default() -> Self {
        Self(json!({ "resources": [], "published": [] }))
    }
}

impl Default for TestimonialDocument {
    fn default() -> Self {
        Self(json!({ "testimonials": [] }))
    }
}

impl From<Value> for ResourceDocument {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<Value> for TestimonialDocument {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// A blob-backed document that can be reduced to its public entries.
/// `Default` is the value served when the blob is missing or unreadable.
pub trait Publishable: From<Value> + Default + Send {
    /// Public entries in document order, returned unchanged.
    fn into_published(self) -> Result<Vec<Value>, FilterError>;
}

impl Publishable for ResourceDocument {
    /// Both gates: the item's own flag and membership of its `id` in the
    /// top-level list. Ids match by exact JSON value, so `"1"` is not `1`.
    fn into_published(self) -> Result<Vec<Value>, FilterError> {
        let mut doc = into_object(self.0)?;
        let resources = take_array(&mut doc, "resources")?;
        let listed = take_array(&mut doc, "published")?;
        Ok(resources
            .into_iter()
            .filter(|r| is_flagged(r) && r.get("id").map_or(false, |id| listed.contains(id)))
            .collect())
    }
}

impl Publishable for TestimonialDocument {
    fn into_published(self) -> Result<Vec<Value>, FilterError> {
        let mut doc = into_object(self.0)?;
        let testimonials = take_array(&mut doc, "testimonials")?;
        Ok(testimonials.into_iter().filter(is_flagged).collect())
    }
}

/// Only a literal `true` publishes; non-object items never do.
fn is_flagged(item: &Value) -> bool {
    item.get("published") == Some(&Value::Bool(true))
}

fn into_object(doc: Value) -> Result<Map<String, Value>, FilterError> {
    match doc {
        Value::Object(map) => Ok(map),
        _ => Err(FilterError::NotAnObject),
    }
}

/// A missing key reads as empty.
fn take_array(doc: &mut Map<String, Value>, key: &'static str) -> Result<Vec<Value>, FilterError> {
    match doc.remove(key) {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(FilterError::NotAnArray(key)),
    }
}
