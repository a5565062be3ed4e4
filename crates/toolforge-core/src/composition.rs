//! Catalog-validated mutation of a composition.
//!
//! These operations back both paths that edit a composition: the
//! generation-driven builder (which tolerates failures) and direct user
//! edits (which must be exact). Every operation returns a structured
//! [`CompositionError`] instead of mutating on bad input, and every
//! operation refuses to touch a finalized composition.

use serde_json::{Map, Value};

use toolforge_types::composition::Composition;
use toolforge_types::element::{Connection, ElementInstance, Position, Size};
use toolforge_types::error::CompositionError;

use crate::catalog::ElementCatalog;

/// Shallow patch applied to an existing instance by [`update_element`].
#[derive(Debug, Clone, Default)]
pub struct ElementPatch {
    pub name: Option<String>,
    pub config: Option<Map<String, Value>>,
    pub position: Option<Position>,
    pub size: Option<Size>,
}

fn ensure_mutable(composition: &Composition) -> Result<(), CompositionError> {
    if composition.is_finalized {
        return Err(CompositionError::Finalized);
    }
    Ok(())
}

/// Append an element instance, in arrival order.
///
/// Rejects an unregistered `element_id` (`UnknownElement`) or an
/// `instance_id` already present (`DuplicateInstance`) without mutating.
pub fn add_element(
    composition: &mut Composition,
    catalog: &ElementCatalog,
    instance: ElementInstance,
) -> Result<(), CompositionError> {
    ensure_mutable(composition)?;
    if catalog.get(&instance.element_id).is_none() {
        return Err(CompositionError::UnknownElement(instance.element_id.clone()));
    }
    if composition.contains(&instance.instance_id) {
        return Err(CompositionError::DuplicateInstance(instance.instance_id.clone()));
    }
    composition.elements.push(instance);
    Ok(())
}

/// Remove an instance and every connection that references it as source or
/// target. Unknown ids are reported, not ignored; callers that want
/// best-effort semantics check existence first.
pub fn remove_element(
    composition: &mut Composition,
    instance_id: &str,
) -> Result<(), CompositionError> {
    ensure_mutable(composition)?;
    if !composition.contains(instance_id) {
        return Err(CompositionError::UnknownInstance(instance_id.to_string()));
    }
    composition.elements.retain(|e| e.instance_id != instance_id);
    composition.connections.retain(|c| !c.touches(instance_id));
    Ok(())
}

/// Shallow-merge a patch into an existing instance. A no-op when the
/// instance is absent, per the best-effort refinement contract.
pub fn update_element(
    composition: &mut Composition,
    instance_id: &str,
    patch: ElementPatch,
) -> Result<(), CompositionError> {
    ensure_mutable(composition)?;
    let Some(instance) = composition
        .elements
        .iter_mut()
        .find(|e| e.instance_id == instance_id)
    else {
        return Ok(());
    };

    if let Some(name) = patch.name {
        instance.name = Some(name);
    }
    if let Some(config) = patch.config {
        for (key, value) in config {
            instance.config.insert(key, value);
        }
    }
    if let Some(position) = patch.position {
        instance.position = Some(position);
    }
    if let Some(size) = patch.size {
        instance.size = Some(size);
    }
    Ok(())
}

/// Wire a declared output slot of one instance to a declared input slot of
/// another. Rejects without mutating when either endpoint or slot name is
/// invalid.
pub fn connect(
    composition: &mut Composition,
    catalog: &ElementCatalog,
    source_id: &str,
    output: &str,
    target_id: &str,
    input: &str,
) -> Result<(), CompositionError> {
    ensure_mutable(composition)?;

    let source = composition
        .element(source_id)
        .ok_or_else(|| CompositionError::UnknownInstance(source_id.to_string()))?;
    let target = composition
        .element(target_id)
        .ok_or_else(|| CompositionError::UnknownInstance(target_id.to_string()))?;

    let source_spec = catalog
        .get(&source.element_id)
        .ok_or_else(|| CompositionError::UnknownElement(source.element_id.clone()))?;
    let target_spec = catalog
        .get(&target.element_id)
        .ok_or_else(|| CompositionError::UnknownElement(target.element_id.clone()))?;

    if !source_spec.has_output(output) {
        return Err(CompositionError::UndeclaredOutput {
            element_id: source_spec.id.clone(),
            output: output.to_string(),
        });
    }
    if !target_spec.has_input(input) {
        return Err(CompositionError::UndeclaredInput {
            element_id: target_spec.id.clone(),
            input: input.to_string(),
        });
    }

    composition.connections.push(Connection {
        source_id: source_id.to_string(),
        output: output.to_string(),
        target_id: target_id.to_string(),
        input: input.to_string(),
    });
    Ok(())
}

/// Name the composition and mark it finalized. Structural mutation through
/// this module is refused from here on; a fresh edit session starts from a
/// snapshot copy.
pub fn finalize(
    composition: &mut Composition,
    name: &str,
    description: &str,
) -> Result<(), CompositionError> {
    ensure_mutable(composition)?;
    composition.name = name.to_string();
    composition.description = description.to_string();
    composition.is_finalized = true;
    Ok(())
}
