//! Generation event types for the streaming protocol.
//!
//! `GenerationEvent` is one decoded unit of the newline-delimited stream the
//! generation service emits. Records are adjacently tagged on the wire:
//! a required `type` field selects the variant and `data` carries the
//! payload. The schemars derive lets the prompt assembly embed the exact
//! wire schema the service is allowed to produce.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::element::{Connection, Position, Size};

/// How an `element` record targets an existing element instead of creating
/// a new one.
///
/// Any refinement tag other than `delete` is treated as [`Modify`]; the
/// service occasionally emits variants like `"update"` and they all mean
/// "merge config into the matched element".
///
/// [`Modify`]: RefinementAction::Modify
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefinementAction {
    Delete,
    Modify,
}

/// Payload of an `element` record.
///
/// For a fresh element, `element_type` names a catalog spec and `id` is an
/// optional caller-chosen instance id. For a refinement, `target_keyword`
/// selects the existing element and the structural fields are optional.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ElementPayload {
    /// Instance id; generated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Catalog element type, e.g. `"poll"`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub element_type: Option<String>,
    /// Display name for the placed element.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Configuration overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    /// When non-empty, this record refines an existing element. `"delete"`
    /// removes the target; anything else merges config into it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refinement_action: Option<String>,
    /// Fuzzy keyword locating the refinement target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_keyword: Option<String>,
}

impl ElementPayload {
    /// Interpret the raw refinement tag. Empty or missing tags mean the
    /// record creates a new element.
    pub fn refinement(&self) -> Option<RefinementAction> {
        match self.refinement_action.as_deref() {
            None | Some("") => None,
            Some(tag) if tag.eq_ignore_ascii_case("delete") => Some(RefinementAction::Delete),
            Some(_) => Some(RefinementAction::Modify),
        }
    }
}

/// One decoded unit of the streaming generation protocol.
///
/// Wire format: `{"type": "...", "data": {...}}`, one record per line.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum GenerationEvent {
    /// Progress narration; updates the session status string only.
    Thinking { message: String },
    /// Create or refine one element.
    Element(ElementPayload),
    /// Wire a declared output slot to a declared input slot.
    Connection(Connection),
    /// Terminal success: name the tool and finalize the composition.
    Complete {
        name: String,
        #[serde(default)]
        description: String,
    },
    /// Terminal failure reported by the service.
    Error { message: String },
}

impl GenerationEvent {
    /// Whether this event ends the session (successfully or not).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GenerationEvent::Complete { .. } | GenerationEvent::Error { .. }
        )
    }
}
