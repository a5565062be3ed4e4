//! The runtime engine: state slots, serialized action dispatch, and
//! last-write-wins propagation.
//!
//! Concurrency model: `dispatch_action` calls against different instances
//! may run concurrently; calls against the same instance are serialized in
//! arrival order through a lazily-created keyed mutex, preventing lost
//! updates from interleaved state patches. Propagation deliberately does
//! not queue: overwriting the same input from multiple sources in quick
//! succession is last-write-wins.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use uuid::Uuid;

use toolforge_types::composition::Composition;
use toolforge_types::error::RuntimeError;

use crate::catalog::ElementCatalog;

use super::{StateNotification, handlers};

type Subscriber = (Uuid, mpsc::UnboundedSender<StateNotification>);

/// Live runtime for one finalized composition.
#[derive(Debug)]
pub struct RuntimeEngine {
    catalog: Arc<ElementCatalog>,
    composition: Composition,
    /// Effective config per instance, resolved once at instantiation.
    configs: HashMap<String, Map<String, Value>>,
    /// State slot per stateful instance. A stateful instance always has a
    /// state value once instantiated, never undefined.
    states: DashMap<String, Value>,
    /// Latest propagated value per (instance, input). Last write wins.
    inputs: DashMap<String, Map<String, Value>>,
    /// Per-instance serialization for action dispatch, created lazily on
    /// first dispatch.
    action_locks: DashMap<String, Arc<tokio::sync::Mutex<()>>>,
    subscribers: DashMap<String, Vec<Subscriber>>,
}

impl RuntimeEngine {
    /// Instantiate a finalized composition: resolve every instance's spec
    /// and effective config, and seed default state for stateful instances.
    pub fn instantiate(
        composition: Composition,
        catalog: Arc<ElementCatalog>,
    ) -> Result<Self, RuntimeError> {
        if !composition.is_finalized {
            return Err(RuntimeError::NotFinalized);
        }

        let mut configs = HashMap::new();
        let states = DashMap::new();
        for instance in &composition.elements {
            let spec = catalog
                .get(&instance.element_id)
                .ok_or_else(|| RuntimeError::UnknownElement(instance.element_id.clone()))?;
            let config = catalog
                .effective_config(&instance.element_id, &instance.config)
                .map_err(|_| RuntimeError::UnknownElement(instance.element_id.clone()))?;
            if spec.stateful {
                states.insert(
                    instance.instance_id.clone(),
                    handlers::default_state(&instance.element_id, &config),
                );
            }
            configs.insert(instance.instance_id.clone(), config);
        }

        Ok(Self {
            catalog,
            composition,
            configs,
            states,
            inputs: DashMap::new(),
            action_locks: DashMap::new(),
            subscribers: DashMap::new(),
        })
    }

    /// Dispatch one action against one instance.
    ///
    /// Validates the action against the spec's declared `actions`, runs the
    /// element handler under the instance's lock, applies the state patch,
    /// notifies subscribers, propagates outputs, and returns the applied
    /// patch.
    pub async fn dispatch_action(
        &self,
        instance_id: &str,
        action: &str,
        payload: Value,
    ) -> Result<Map<String, Value>, RuntimeError> {
        let instance = self
            .composition
            .element(instance_id)
            .ok_or_else(|| RuntimeError::UnknownInstance(instance_id.to_string()))?;
        let spec = self
            .catalog
            .get(&instance.element_id)
            .ok_or_else(|| RuntimeError::UnknownElement(instance.element_id.clone()))?;

        if !spec.has_action(action) {
            return Err(RuntimeError::UnsupportedAction {
                element_id: spec.id.clone(),
                action: action.to_string(),
            });
        }

        let lock = self
            .action_locks
            .entry(instance_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let config = self.configs.get(instance_id).cloned().unwrap_or_default();
        let state = self
            .states
            .get(instance_id)
            .map(|entry| entry.value().clone())
            .unwrap_or(Value::Null);

        let effect = handlers::handle_action(&instance.element_id, &config, &state, action, &payload)?;

        if !effect.patch.is_empty() {
            self.apply_patch(instance_id, effect.patch.clone(), spec.realtime);
        }
        if !effect.outputs.is_empty() {
            self.propagate(instance_id, &effect.outputs);
        }

        tracing::debug!(instance_id, action, "dispatched action");
        Ok(effect.patch)
    }

    /// Push named output values along every connection whose source is
    /// `instance_id`. Fan-out is supported; the target input slot is simply
    /// overwritten (last write wins), and stateful/realtime targets run
    /// their input-changed recomputation.
    pub fn propagate(&self, instance_id: &str, outputs: &[(String, Value)]) {
        for connection in &self.composition.connections {
            if connection.source_id != instance_id {
                continue;
            }
            let Some((_, value)) = outputs.iter().find(|(name, _)| *name == connection.output)
            else {
                continue;
            };

            self.inputs
                .entry(connection.target_id.clone())
                .or_default()
                .insert(connection.input.clone(), value.clone());

            let Some(target) = self.composition.element(&connection.target_id) else {
                continue;
            };
            let Some(target_spec) = self.catalog.get(&target.element_id) else {
                continue;
            };
            if target_spec.stateful || target_spec.realtime {
                if let Some(patch) =
                    handlers::on_input_changed(&target.element_id, &connection.input, value)
                {
                    self.apply_patch(&connection.target_id, patch, target_spec.realtime);
                }
            }
        }
    }

    /// Current state of a stateful instance.
    pub fn state(&self, instance_id: &str) -> Option<Value> {
        self.states.get(instance_id).map(|entry| entry.value().clone())
    }

    /// Latest propagated input values for an instance.
    pub fn input_values(&self, instance_id: &str) -> Option<Map<String, Value>> {
        self.inputs.get(instance_id).map(|entry| entry.value().clone())
    }

    /// Register a listener for state-patch notifications on one instance.
    pub fn subscribe(
        &self,
        instance_id: &str,
    ) -> Result<(Uuid, mpsc::UnboundedReceiver<StateNotification>), RuntimeError> {
        if !self.composition.contains(instance_id) {
            return Err(RuntimeError::UnknownInstance(instance_id.to_string()));
        }
        let (sender, receiver) = mpsc::unbounded_channel();
        let subscription_id = Uuid::now_v7();
        self.subscribers
            .entry(instance_id.to_string())
            .or_default()
            .push((subscription_id, sender));
        Ok((subscription_id, receiver))
    }

    /// Drop one listener.
    pub fn unsubscribe(&self, instance_id: &str, subscription_id: Uuid) {
        if let Some(mut entry) = self.subscribers.get_mut(instance_id) {
            entry.retain(|(id, _)| *id != subscription_id);
        }
    }

    fn apply_patch(&self, instance_id: &str, patch: Map<String, Value>, notify: bool) {
        if let Some(mut entry) = self.states.get_mut(instance_id) {
            if let Value::Object(state) = entry.value_mut() {
                for (key, value) in &patch {
                    state.insert(key.clone(), value.clone());
                }
            }
        }
        if notify {
            self.notify(instance_id, patch);
        }
    }

    fn notify(&self, instance_id: &str, patch: Map<String, Value>) {
        if let Some(mut entry) = self.subscribers.get_mut(instance_id) {
            // Closed receivers are pruned on the way through.
            entry.retain(|(_, sender)| {
                sender
                    .send(StateNotification {
                        instance_id: instance_id.to_string(),
                        patch: patch.clone(),
                    })
                    .is_ok()
            });
        }
    }
}
