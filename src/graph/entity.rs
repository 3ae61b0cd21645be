//! Entity representation for graph snapshots fetched from the backend

use serde_json::{Map, Value};
use thiserror::Error;

/// Schema tags the translator cares about.
pub mod schema {
    /// Plain text note segment
    pub const NOTE_BLOCK: &str = "$/schema/note_block";
    /// Child relation for structural (outline) nesting
    pub const SUBENTITY: &str = "$/schema/subentity";
    /// Child relation referencing another page-like entity
    pub const SEMANTIC_INTERFACE: &str = "$/schema/interface/semantic";
    /// Children display mode that keeps nested notes at the parent's level
    pub const PARAGRAPH: &str = "paragraph";
}

/// Errors raised while building entities from raw backend JSON
#[derive(Debug, Error)]
pub enum EntityError {
    #[error("Expected an entity object, found {0}")]
    NotAnObject(&'static str),

    #[error("Entity {uid} is missing field '{field}'")]
    MissingField { uid: String, field: &'static str },
}

/// Result type for entity construction
pub type EntityResult<T> = Result<T, EntityError>;

/// How a child is attached to its parent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildKind {
    /// Outline nesting, inlined into the parent page
    Subentity,
    /// Reference to a page of its own
    SemanticInterface,
    /// Any other relation; ignored by the translator
    Other(String),
}

impl ChildKind {
    pub fn from_schema(schema_type: &str) -> Self {
        match schema_type {
            schema::SUBENTITY => Self::Subentity,
            schema::SEMANTIC_INTERFACE => Self::SemanticInterface,
            other => Self::Other(other.to_string()),
        }
    }
}

/// An ordered child reference carrying its wrapped target
#[derive(Debug, Clone, PartialEq)]
pub struct ChildRef {
    /// Sort index within the parent (may be absent in the backend data)
    pub index: Option<f64>,
    pub kind: ChildKind,
    pub target: GraphEntity,
}

impl ChildRef {
    pub fn new(index: Option<f64>, kind: ChildKind, target: GraphEntity) -> Self {
        Self {
            index,
            kind,
            target,
        }
    }

    pub fn subentity(index: f64, target: GraphEntity) -> Self {
        Self::new(Some(index), ChildKind::Subentity, target)
    }

    pub fn semantic(index: f64, target: GraphEntity) -> Self {
        Self::new(Some(index), ChildKind::SemanticInterface, target)
    }

    /// Numeric sort key; a missing or NaN index sorts as 0.
    pub fn sort_key(&self) -> f64 {
        match self.index {
            Some(i) if !i.is_nan() => i,
            _ => 0.0,
        }
    }
}

/// A read-only snapshot of one node in the backend graph
#[derive(Debug, Clone, PartialEq)]
pub struct GraphEntity {
    /// Backend identifier
    pub uid: String,
    /// Schema tag, e.g. `$/schema/note_block`
    pub schema_type: String,
    /// Text primitive (empty when the entity has none)
    pub text: String,
    /// Children in backend order (not yet sorted by index)
    pub children: Vec<ChildRef>,
    pub hidden: bool,
    /// Children display mode (`paragraph`, `outliner`, ...)
    pub display_as: Option<String>,
    /// Uid of the embedded content for non-note entities
    pub content_uid: Option<String>,
}

impl GraphEntity {
    pub fn new(uid: impl Into<String>, schema_type: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            schema_type: schema_type.into(),
            text: text.into(),
            children: Vec::new(),
            hidden: false,
            display_as: None,
            content_uid: None,
        }
    }

    /// Create a note block entity
    pub fn note(uid: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(uid, schema::NOTE_BLOCK, text)
    }

    pub fn with_child(mut self, child: ChildRef) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_display_as(mut self, mode: impl Into<String>) -> Self {
        self.display_as = Some(mode.into());
        self
    }

    pub fn with_content_uid(mut self, uid: impl Into<String>) -> Self {
        self.content_uid = Some(uid.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn schema_type(&self) -> &str {
        &self.schema_type
    }

    pub fn children(&self) -> &[ChildRef] {
        &self.children
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn is_note_block(&self) -> bool {
        self.schema_type == schema::NOTE_BLOCK
    }

    pub fn is_paragraph_mode(&self) -> bool {
        self.display_as.as_deref() == Some(schema::PARAGRAPH)
    }

    /// Uid to reference when this entity is embedded rather than inlined
    pub fn embed_uid(&self) -> &str {
        self.content_uid.as_deref().unwrap_or(&self.uid)
    }

    /// Build an entity from the backend's raw `_value`-wrapped JSON.
    pub fn from_value(value: &Value) -> EntityResult<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| EntityError::NotAnObject(json_kind(value)))?;
        let uid = map
            .get("uid")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let schema_type = map
            .get("type")
            .and_then(|t| t.get("unigraph.id"))
            .and_then(Value::as_str)
            .ok_or_else(|| EntityError::MissingField {
                uid: uid.clone(),
                field: "type",
            })?
            .to_string();

        let body = map.get("_value");
        let text = body
            .and_then(|b| b.get("text"))
            .and_then(primitive)
            .unwrap_or_default();
        let children_container = body.and_then(|b| b.get("children"));

        let children = match children_container.and_then(|c| c.get("_value[")) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(child_from_value)
                .collect::<EntityResult<Vec<_>>>()?,
            _ => Vec::new(),
        };

        let display_as = children_container
            .and_then(|c| c.get("_displayAs"))
            .or_else(|| map.get("_displayAs"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let content_uid = body
            .and_then(|b| b.get("content"))
            .and_then(|c| c.get("_value"))
            .and_then(|c| c.get("uid"))
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self {
            uid,
            schema_type,
            text,
            children,
            hidden: flag(map, "_hide"),
            display_as,
            content_uid,
        })
    }

    /// Build the entities of a `get_object` response.
    ///
    /// Accepts either an array or a single object; `null` entries (deleted
    /// entities) are skipped.
    pub fn from_batch(value: &Value) -> EntityResult<Vec<Self>> {
        match value {
            Value::Array(items) => items
                .iter()
                .filter(|item| !item.is_null())
                .map(Self::from_value)
                .collect(),
            Value::Null => Ok(Vec::new()),
            other => Ok(vec![Self::from_value(other)?]),
        }
    }
}

/// Parse one item of a `_value[` children array.
///
/// Items without a wrapped target are skipped. A `_hide` on the wrapper
/// hides the target as well.
fn child_from_value(item: &Value) -> Option<EntityResult<ChildRef>> {
    let wrapper = item.get("_value")?;
    let target = wrapper.get("_value").filter(|t| t.is_object())?;
    let wrapper_hidden = wrapper
        .as_object()
        .map(|w| flag(w, "_hide"))
        .unwrap_or(false);
    let kind = wrapper
        .get("type")
        .and_then(|t| t.get("unigraph.id"))
        .and_then(Value::as_str)
        .map(ChildKind::from_schema)
        .unwrap_or_else(|| ChildKind::Other(String::new()));
    let index = item
        .get("_index")
        .and_then(primitive_value)
        .and_then(Value::as_f64);

    Some(GraphEntity::from_value(target).map(|mut target| {
        target.hidden |= wrapper_hidden;
        ChildRef::new(index, kind, target)
    }))
}

/// Follow `_value` wrappers down to the primitive they hold.
fn primitive_value(value: &Value) -> Option<&Value> {
    match value {
        Value::Object(map) => {
            if let Some((_, inner)) = map.iter().find(|(k, _)| k.starts_with("_value.")) {
                return primitive_value(inner);
            }
            map.get("_value").and_then(primitive_value)
        }
        Value::Null | Value::Array(_) => None,
        other => Some(other),
    }
}

fn primitive(value: &Value) -> Option<String> {
    match primitive_value(value)? {
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn flag(map: &Map<String, Value>, key: &str) -> bool {
    map.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
