//! Compositions: the full graph of element instances and connections that
//! makes up one generated tool.
//!
//! The struct here is a plain data carrier. Mutation with catalog validation
//! lives in `toolforge-core::composition`; this crate only provides the
//! shape, snapshot round-trips, and read accessors.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::element::{Connection, ElementInstance};

/// The in-memory graph of element instances and connections for one tool.
///
/// Instances are kept in arrival order; refinement targeting depends on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Composition {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub elements: Vec<ElementInstance>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    /// Set by the terminal `complete` event; a finalized composition refuses
    /// structural mutation.
    #[serde(default)]
    pub is_finalized: bool,
}

impl Composition {
    /// Create an empty, unfinalized composition.
    pub fn new() -> Self {
        Self {
            id: Uuid::now_v7(),
            name: String::new(),
            description: String::new(),
            elements: Vec::new(),
            connections: Vec::new(),
            is_finalized: false,
        }
    }

    /// Look up an instance by id.
    pub fn element(&self, instance_id: &str) -> Option<&ElementInstance> {
        self.elements.iter().find(|e| e.instance_id == instance_id)
    }

    /// Whether an instance with this id exists.
    pub fn contains(&self, instance_id: &str) -> bool {
        self.element(instance_id).is_some()
    }

    /// Lossless snapshot for persistence or iteration seeding.
    pub fn to_snapshot(&self) -> CompositionSnapshot {
        CompositionSnapshot {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            elements: self.elements.clone(),
            connections: self.connections.clone(),
            is_finalized: self.is_finalized,
        }
    }

    /// Restore a composition exactly as snapshotted.
    pub fn from_snapshot(snapshot: CompositionSnapshot) -> Self {
        Self {
            id: snapshot.id,
            name: snapshot.name,
            description: snapshot.description,
            elements: snapshot.elements,
            connections: snapshot.connections,
            is_finalized: snapshot.is_finalized,
        }
    }

    /// Restore a snapshot as a mutable draft for an iteration session.
    ///
    /// The draft keeps the snapshot's elements and connections but gets a
    /// fresh id and is no longer finalized, so a refinement stream can edit
    /// it without touching the stored original.
    pub fn draft_from_snapshot(snapshot: CompositionSnapshot) -> Self {
        let mut draft = Self::from_snapshot(snapshot);
        draft.id = Uuid::now_v7();
        draft.is_finalized = false;
        draft
    }
}

impl Default for Composition {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialized form of a [`Composition`], handed to the external persistence
/// collaborator and used to seed iteration sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositionSnapshot {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub elements: Vec<ElementInstance>,
    pub connections: Vec<Connection>,
    pub is_finalized: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Connection;

    fn sample_composition() -> Composition {
        let mut composition = Composition::new();
        composition.name = "Pizza Poll".to_string();
        let mut e1 = ElementInstance::new("e1", "poll");
        e1.name = Some("Pizza Poll".to_string());
        composition.elements.push(e1);
        composition.elements.push(ElementInstance::new("e2", "text-display"));
        composition.connections.push(Connection {
            source_id: "e1".to_string(),
            output: "results".to_string(),
            target_id: "e2".to_string(),
            input: "text".to_string(),
        });
        composition.is_finalized = true;
        composition
    }

    #[test]
    fn snapshot_roundtrip_is_lossless() {
        let original = sample_composition();
        let snapshot = original.to_snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: CompositionSnapshot = serde_json::from_str(&json).unwrap();
        let restored = Composition::from_snapshot(parsed);

        assert_eq!(restored.id, original.id);
        assert_eq!(restored.name, "Pizza Poll");
        assert_eq!(restored.elements.len(), 2);
        assert_eq!(restored.connections.len(), 1);
        assert!(restored.is_finalized);
    }

    #[test]
    fn draft_from_snapshot_unfinalizes_with_fresh_id() {
        let original = sample_composition();
        let draft = Composition::draft_from_snapshot(original.to_snapshot());

        assert_ne!(draft.id, original.id);
        assert!(!draft.is_finalized);
        assert_eq!(draft.elements.len(), 2);
        assert_eq!(draft.connections.len(), 1);
    }

    #[test]
    fn element_lookup_by_id() {
        let composition = sample_composition();
        assert!(composition.contains("e1"));
        assert!(composition.contains("e2"));
        assert!(!composition.contains("e3"));
        assert_eq!(composition.element("e1").unwrap().element_id, "poll");
    }
}
