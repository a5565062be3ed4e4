//! The element catalog: a fixed, ordered registry of element specifications.
//!
//! The catalog is built once at startup from the closed builtin list (see
//! [`builtin::builtin_catalog`]) and exposed read-only behind an `Arc`
//! thereafter. It is deliberately not a mutable global: every consumer gets
//! accessors, nobody gets to re-register specs mid-flight.

pub mod builtin;

use std::collections::HashMap;

use serde_json::{Map, Value, json};

use toolforge_types::element::ElementSpec;
use toolforge_types::error::CompositionError;

// ---------------------------------------------------------------------------
// ConfigViolation
// ---------------------------------------------------------------------------

/// One problem found while validating an instance config against a spec's
/// schema. An empty violation list means the config is valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigViolation {
    /// Name of the offending field.
    pub field: String,
    /// Human-readable reason.
    pub reason: String,
}

impl std::fmt::Display for ConfigViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

// ---------------------------------------------------------------------------
// ElementCatalog
// ---------------------------------------------------------------------------

/// Ordered, read-only registry of [`ElementSpec`]s.
///
/// Registration order is preserved; `all()` and the catalog export iterate
/// in that order so the generation prompt is stable across runs.
#[derive(Debug, Default)]
pub struct ElementCatalog {
    order: Vec<String>,
    specs: HashMap<String, ElementSpec>,
}

impl ElementCatalog {
    /// Create an empty catalog. Production code uses
    /// [`builtin::builtin_catalog`]; this exists for tests and tooling.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a spec. Idempotent: re-registering an id overwrites the
    /// prior spec and keeps its original position in the ordering.
    pub fn register(&mut self, spec: ElementSpec) {
        if !self.specs.contains_key(&spec.id) {
            self.order.push(spec.id.clone());
        }
        self.specs.insert(spec.id.clone(), spec);
    }

    /// Look up a spec by id.
    pub fn get(&self, id: &str) -> Option<&ElementSpec> {
        self.specs.get(id)
    }

    /// All specs in registration order.
    pub fn all(&self) -> Vec<&ElementSpec> {
        self.order.iter().filter_map(|id| self.specs.get(id)).collect()
    }

    /// Specs in the given category, in registration order.
    pub fn by_category(&self, category: &str) -> Vec<&ElementSpec> {
        self.all()
            .into_iter()
            .filter(|spec| spec.category == category)
            .collect()
    }

    /// Specs declaring the given action, in registration order.
    pub fn by_action(&self, action: &str) -> Vec<&ElementSpec> {
        self.all()
            .into_iter()
            .filter(|spec| spec.has_action(action))
            .collect()
    }

    /// Case-insensitive substring search over name, description, and use
    /// cases.
    pub fn search(&self, query: &str) -> Vec<&ElementSpec> {
        let needle = query.to_lowercase();
        self.all()
            .into_iter()
            .filter(|spec| {
                spec.name.to_lowercase().contains(&needle)
                    || spec.description.to_lowercase().contains(&needle)
                    || spec
                        .use_cases
                        .iter()
                        .any(|uc| uc.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Validate a config map against the spec's declared schema.
    ///
    /// Only declared fields are checked (type, required, enum). Unknown
    /// extra keys are ignored. Returns the list of violations; empty means
    /// valid.
    pub fn validate_config(
        &self,
        id: &str,
        config: &Map<String, Value>,
    ) -> Result<Vec<ConfigViolation>, CompositionError> {
        let spec = self
            .get(id)
            .ok_or_else(|| CompositionError::UnknownElement(id.to_string()))?;

        let mut violations = Vec::new();
        for field in &spec.config_schema {
            let value = match config.get(&field.name) {
                Some(value) => value,
                None => {
                    if field.required && field.default.is_none() {
                        violations.push(ConfigViolation {
                            field: field.name.clone(),
                            reason: "required field is missing".to_string(),
                        });
                    }
                    continue;
                }
            };

            if !field.field_type.matches(value) {
                violations.push(ConfigViolation {
                    field: field.name.clone(),
                    reason: format!("expected {:?} value", field.field_type),
                });
                continue;
            }

            if !field.allowed_values.is_empty() && !field.allowed_values.contains(value) {
                violations.push(ConfigViolation {
                    field: field.name.clone(),
                    reason: format!("value {value} is not one of the allowed values"),
                });
            }
        }
        Ok(violations)
    }

    /// The default config for a spec, built from its schema defaults.
    pub fn default_config(&self, id: &str) -> Result<Map<String, Value>, CompositionError> {
        let spec = self
            .get(id)
            .ok_or_else(|| CompositionError::UnknownElement(id.to_string()))?;

        let mut config = Map::new();
        for field in &spec.config_schema {
            if let Some(default) = &field.default {
                config.insert(field.name.clone(), default.clone());
            }
        }
        Ok(config)
    }

    /// An instance's effective config: spec defaults with the instance's
    /// overrides merged on top.
    pub fn effective_config(
        &self,
        id: &str,
        overrides: &Map<String, Value>,
    ) -> Result<Map<String, Value>, CompositionError> {
        let mut config = self.default_config(id)?;
        for (key, value) in overrides {
            config.insert(key.clone(), value.clone());
        }
        Ok(config)
    }

    /// Serializable catalog export, embedded into the generation prompt so
    /// the service's vocabulary matches exactly what the runtime executes.
    pub fn describe(&self) -> Value {
        let mut entries = Map::new();
        for spec in self.all() {
            entries.insert(
                spec.id.clone(),
                json!({
                    "category": spec.category,
                    "description": spec.description,
                    "config_schema": spec.config_schema,
                    "inputs": spec.inputs,
                    "outputs": spec.outputs,
                    "actions": spec.actions,
                    "use_cases": spec.use_cases,
                }),
            );
        }
        Value::Object(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolforge_types::element::{ConfigField, FieldType, Size};

    fn minimal_spec(id: &str, category: &str) -> ElementSpec {
        ElementSpec {
            id: id.to_string(),
            category: category.to_string(),
            name: id.to_string(),
            description: format!("A {id}"),
            use_cases: vec![],
            config_schema: vec![],
            inputs: vec![],
            outputs: vec![],
            actions: vec![],
            stateful: false,
            realtime: false,
            default_size: Size { width: 4, height: 3 },
        }
    }

    #[test]
    fn register_preserves_order_and_overwrites_idempotently() {
        let mut catalog = ElementCatalog::new();
        catalog.register(minimal_spec("a", "x"));
        catalog.register(minimal_spec("b", "x"));

        let mut replacement = minimal_spec("a", "y");
        replacement.description = "replaced".to_string();
        catalog.register(replacement);

        let all: Vec<&str> = catalog.all().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(all, vec!["a", "b"]);
        assert_eq!(catalog.get("a").unwrap().description, "replaced");
        assert_eq!(catalog.get("a").unwrap().category, "y");
    }

    #[test]
    fn lookup_by_category_and_action() {
        let mut catalog = ElementCatalog::new();
        let mut voting = minimal_spec("poll", "interactive");
        voting.actions = vec!["vote".to_string(), "reset".to_string()];
        catalog.register(voting);
        catalog.register(minimal_spec("banner", "display"));

        assert_eq!(catalog.by_category("interactive").len(), 1);
        assert_eq!(catalog.by_category("display").len(), 1);
        assert_eq!(catalog.by_category("none").len(), 0);
        assert_eq!(catalog.by_action("vote").len(), 1);
        assert_eq!(catalog.by_action("explode").len(), 0);
    }

    #[test]
    fn search_is_case_insensitive_over_name_description_use_cases() {
        let mut catalog = ElementCatalog::new();
        let mut spec = minimal_spec("poll", "interactive");
        spec.name = "Poll".to_string();
        spec.description = "Collect votes from a group".to_string();
        spec.use_cases = vec!["Lunch decisions".to_string()];
        catalog.register(spec);

        assert_eq!(catalog.search("VOTES").len(), 1);
        assert_eq!(catalog.search("lunch").len(), 1);
        assert_eq!(catalog.search("poll").len(), 1);
        assert_eq!(catalog.search("karaoke").len(), 0);
    }

    fn spec_with_schema() -> ElementSpec {
        let mut spec = minimal_spec("poll", "interactive");
        spec.config_schema = vec![
            ConfigField {
                name: "question".to_string(),
                field_type: FieldType::String,
                required: true,
                allowed_values: vec![],
                default: None,
                description: String::new(),
            },
            ConfigField {
                name: "style".to_string(),
                field_type: FieldType::String,
                required: false,
                allowed_values: vec![serde_json::json!("bars"), serde_json::json!("pie")],
                default: Some(serde_json::json!("bars")),
                description: String::new(),
            },
        ];
        spec
    }

    #[test]
    fn validate_config_reports_missing_required_and_bad_types() {
        let mut catalog = ElementCatalog::new();
        catalog.register(spec_with_schema());

        let violations = catalog.validate_config("poll", &Map::new()).unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "question");

        let mut config = Map::new();
        config.insert("question".to_string(), serde_json::json!(42));
        let violations = catalog.validate_config("poll", &config).unwrap();
        assert_eq!(violations.len(), 1);
        assert!(violations[0].reason.contains("expected"));
    }

    #[test]
    fn validate_config_checks_enum_and_ignores_unknown_keys() {
        let mut catalog = ElementCatalog::new();
        catalog.register(spec_with_schema());

        let mut config = Map::new();
        config.insert("question".to_string(), serde_json::json!("Pizza?"));
        config.insert("style".to_string(), serde_json::json!("sparkles"));
        config.insert("extra_key_nobody_declared".to_string(), serde_json::json!(true));
        let violations = catalog.validate_config("poll", &config).unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "style");

        config.insert("style".to_string(), serde_json::json!("pie"));
        let violations = catalog.validate_config("poll", &config).unwrap();
        assert!(violations.is_empty());
    }

    #[test]
    fn validate_config_unknown_element_errors() {
        let catalog = ElementCatalog::new();
        let result = catalog.validate_config("ghost", &Map::new());
        assert_eq!(
            result.unwrap_err(),
            CompositionError::UnknownElement("ghost".to_string())
        );
    }

    #[test]
    fn default_and_effective_config() {
        let mut catalog = ElementCatalog::new();
        catalog.register(spec_with_schema());

        let defaults = catalog.default_config("poll").unwrap();
        assert_eq!(defaults["style"], serde_json::json!("bars"));
        assert!(!defaults.contains_key("question"));

        let mut overrides = Map::new();
        overrides.insert("style".to_string(), serde_json::json!("pie"));
        overrides.insert("question".to_string(), serde_json::json!("Pizza?"));
        let effective = catalog.effective_config("poll", &overrides).unwrap();
        assert_eq!(effective["style"], serde_json::json!("pie"));
        assert_eq!(effective["question"], serde_json::json!("Pizza?"));
    }

    #[test]
    fn describe_exports_every_spec() {
        let mut catalog = ElementCatalog::new();
        catalog.register(minimal_spec("a", "x"));
        catalog.register(minimal_spec("b", "y"));

        let export = catalog.describe();
        let entries = export.as_object().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries["a"]["category"], "x");
        assert!(entries["b"]["inputs"].as_array().unwrap().is_empty());
    }
}
