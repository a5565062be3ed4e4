//! Element specifications and instances.
//!
//! An [`ElementSpec`] describes one kind of building block in the closed
//! catalog: its configuration schema, input/output slots, accepted actions,
//! and stateful/realtime flags. An [`ElementInstance`] is a concrete
//! placement of a spec inside one composition, with its own id, display
//! name, and merged configuration.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Configuration schema
// ---------------------------------------------------------------------------

/// The declared type of a configuration field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    List,
    Object,
}

impl FieldType {
    /// Whether a JSON value matches this field type.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::List => value.is_array(),
            FieldType::Object => value.is_object(),
        }
    }
}

/// A typed descriptor for one field in an element's configuration schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigField {
    /// Field name as it appears in instance config maps.
    pub name: String,
    /// Declared value type.
    pub field_type: FieldType,
    /// Whether the field must be present in a valid config.
    #[serde(default)]
    pub required: bool,
    /// Allowed values, when the field is an enumeration. Empty = unrestricted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<Value>,
    /// Default value merged into instance configs when the field is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Human-readable description, surfaced in the catalog export.
    #[serde(default)]
    pub description: String,
}

// ---------------------------------------------------------------------------
// ElementSpec
// ---------------------------------------------------------------------------

/// Default width/height in grid units for a placed element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

/// Position of a placed element in grid units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

/// Immutable description of one kind of building block.
///
/// Specs are loaded once into the catalog at startup and never mutated.
/// The `actions` list is the complete set of action names the runtime will
/// accept for instances of this spec.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementSpec {
    /// Stable identifier, e.g. `"poll"` or `"countdown-timer"`.
    pub id: String,
    /// Catalog category, e.g. `"interactive"` or `"display"`.
    pub category: String,
    /// Human-readable name.
    pub name: String,
    /// Human-readable description, embedded into the generation prompt.
    pub description: String,
    /// Example use cases, matched by catalog search.
    #[serde(default)]
    pub use_cases: Vec<String>,
    /// Typed configuration schema. Only declared fields are validated;
    /// unknown keys in an instance config are ignored.
    #[serde(default)]
    pub config_schema: Vec<ConfigField>,
    /// Named input slots this element accepts data on.
    #[serde(default)]
    pub inputs: Vec<String>,
    /// Named output slots this element emits data on.
    #[serde(default)]
    pub outputs: Vec<String>,
    /// Action names the runtime dispatches for this element.
    #[serde(default)]
    pub actions: Vec<String>,
    /// Whether instances retain runtime state across actions.
    #[serde(default)]
    pub stateful: bool,
    /// Whether state changes are pushed to live subscribers.
    #[serde(default)]
    pub realtime: bool,
    /// Default size when the generation service does not supply one.
    pub default_size: Size,
}

impl ElementSpec {
    /// Whether `action` is declared on this spec.
    pub fn has_action(&self, action: &str) -> bool {
        self.actions.iter().any(|a| a == action)
    }

    /// Whether `output` is a declared output slot.
    pub fn has_output(&self, output: &str) -> bool {
        self.outputs.iter().any(|o| o == output)
    }

    /// Whether `input` is a declared input slot.
    pub fn has_input(&self, input: &str) -> bool {
        self.inputs.iter().any(|i| i == input)
    }
}

// ---------------------------------------------------------------------------
// ElementInstance
// ---------------------------------------------------------------------------

/// A concrete placement of an [`ElementSpec`] within one composition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementInstance {
    /// Unique within the owning composition.
    pub instance_id: String,
    /// Reference into the catalog.
    pub element_id: String,
    /// Display name, also used by fuzzy refinement targeting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Configuration overrides, merged onto the spec's defaults.
    #[serde(default)]
    pub config: serde_json::Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
}

impl ElementInstance {
    /// Create an instance with the given ids and no overrides.
    pub fn new(instance_id: impl Into<String>, element_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            element_id: element_id.into(),
            name: None,
            config: serde_json::Map::new(),
            position: None,
            size: None,
        }
    }

    /// Whether the instance's display name or element id contains `keyword`,
    /// case-insensitively. Used by refinement targeting.
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        let needle = keyword.to_lowercase();
        if self.element_id.to_lowercase().contains(&needle) {
            return true;
        }
        self.name
            .as_deref()
            .is_some_and(|n| n.to_lowercase().contains(&needle))
    }
}

// ---------------------------------------------------------------------------
// Connection
// ---------------------------------------------------------------------------

/// A directed link from a named output of one instance to a named input of
/// another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Connection {
    pub source_id: String,
    pub output: String,
    pub target_id: String,
    pub input: String,
}

impl Connection {
    /// Whether this connection references `instance_id` as source or target.
    pub fn touches(&self, instance_id: &str) -> bool {
        self.source_id == instance_id || self.target_id == instance_id
    }
}
