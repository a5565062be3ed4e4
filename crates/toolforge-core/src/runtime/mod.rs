//! Live execution of a finalized composition: per-element state, action
//! dispatch, and dataflow propagation along declared connections.

pub mod engine;
pub mod handlers;

use serde_json::{Map, Value};

pub use engine::RuntimeEngine;

/// What an action handler produced: a shallow state patch plus named
/// output values to propagate along connections.
#[derive(Debug, Clone, Default)]
pub struct ActionEffect {
    pub patch: Map<String, Value>,
    pub outputs: Vec<(String, Value)>,
}

/// A state-patch notification delivered to subscribers of a realtime
/// element.
#[derive(Debug, Clone)]
pub struct StateNotification {
    pub instance_id: String,
    pub patch: Map<String, Value>,
}
