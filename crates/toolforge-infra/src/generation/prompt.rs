//! Prompt assembly for the generation service.
//!
//! The system prompt embeds two machine-derived artifacts so the service's
//! vocabulary matches exactly what the runtime can execute: the catalog
//! export (every element type with its schema, slots, and actions) and the
//! JSON schema of the wire record enum. Iteration mode additionally embeds
//! the seed composition being refined.

use toolforge_core::catalog::ElementCatalog;
use toolforge_types::composition::CompositionSnapshot;
use toolforge_types::event::GenerationEvent;

const PROTOCOL_RULES: &str = "\
Respond with newline-delimited JSON records, one per line, and nothing else.\n\
Each record is an object with a `type` field (one of: thinking, element, \
connection, complete, error) and a `data` payload matching the schema below.\n\
Emit `thinking` records to narrate progress, `element` and `connection` \
records to build the tool, and exactly one `complete` record when done. \
Only use element types, config fields, inputs, outputs, and actions from \
the catalog.";

const REFINEMENT_RULES: &str = "\
You are refining the existing tool below. To change or remove an existing \
element, emit an `element` record with `refinement_action` (\"modify\" or \
\"delete\") and a `target_keyword` matching the element's name. New elements \
and connections are added as usual. Finish with a `complete` record.";

/// JSON schema of the wire record, derived from the event enum.
fn wire_schema() -> serde_json::Value {
    let schema = schemars::schema_for!(GenerationEvent);
    serde_json::to_value(schema).unwrap_or_default()
}

/// Build the system prompt for a fresh generation.
pub fn build_generation_prompt(catalog: &ElementCatalog, user_description: &str) -> String {
    format!(
        "You compose small interactive tools from a fixed catalog of elements.\n\n\
         {PROTOCOL_RULES}\n\n\
         ## Element catalog\n{catalog}\n\n\
         ## Wire record schema\n{schema}\n\n\
         ## Request\n{user_description}\n",
        catalog = catalog.describe(),
        schema = wire_schema(),
    )
}

/// Build the system prompt for an iteration on an existing tool.
pub fn build_iteration_prompt(
    catalog: &ElementCatalog,
    user_description: &str,
    seed: &CompositionSnapshot,
) -> String {
    format!(
        "You compose small interactive tools from a fixed catalog of elements.\n\n\
         {PROTOCOL_RULES}\n\n\
         {REFINEMENT_RULES}\n\n\
         ## Element catalog\n{catalog}\n\n\
         ## Wire record schema\n{schema}\n\n\
         ## Existing tool\n{seed}\n\n\
         ## Requested change\n{user_description}\n",
        catalog = catalog.describe(),
        schema = wire_schema(),
        seed = serde_json::to_value(seed).unwrap_or_default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolforge_core::catalog::builtin::builtin_catalog;
    use toolforge_types::composition::Composition;
    use toolforge_types::element::ElementInstance;

    #[test]
    fn generation_prompt_embeds_catalog_and_schema() {
        let catalog = builtin_catalog();
        let prompt = build_generation_prompt(&catalog, "a poll about pizza");

        // Every catalog id must be visible to the service.
        for spec in catalog.all() {
            assert!(prompt.contains(&spec.id), "prompt missing {}", spec.id);
        }
        assert!(prompt.contains("target_keyword"));
        assert!(prompt.contains("a poll about pizza"));
    }

    #[test]
    fn iteration_prompt_embeds_the_seed() {
        let catalog = builtin_catalog();
        let mut composition = Composition::new();
        let mut instance = ElementInstance::new("e1", "poll");
        instance.name = Some("Pizza Poll".to_string());
        composition.elements.push(instance);
        composition.is_finalized = true;

        let prompt =
            build_iteration_prompt(&catalog, "remove the poll", &composition.to_snapshot());
        assert!(prompt.contains("Pizza Poll"));
        assert!(prompt.contains("refinement_action"));
        assert!(prompt.contains("remove the poll"));
    }
}
