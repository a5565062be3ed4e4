//! One generation session's working state and per-event tolerance policy.
//!
//! The session applies decoded events strictly in arrival order -- never
//! concurrently -- because structural mutation order determines correctness
//! (a refinement must see the element it targets). Individual bad elements
//! and connections are recorded as warnings and never sink an otherwise
//! good generation; only a protocol `error` record (or an unexpected stream
//! end) aborts.

use std::sync::Arc;

use uuid::Uuid;

use toolforge_types::composition::{Composition, CompositionSnapshot};
use toolforge_types::element::ElementInstance;
use toolforge_types::event::{ElementPayload, GenerationEvent, RefinementAction};

use crate::catalog::ElementCatalog;
use crate::composition::{self, ElementPatch};

// ---------------------------------------------------------------------------
// BuilderOutcome
// ---------------------------------------------------------------------------

/// Result of applying one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuilderOutcome {
    /// Session still running; `status` is the external-facing progress line.
    Continue { status: String },
    /// The `complete` event arrived and the composition is finalized.
    Completed,
    /// A protocol `error` arrived (or the stream ended without a terminal
    /// event). The partial composition is retained for the caller.
    Aborted { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Terminal {
    Completed,
    Aborted(String),
}

// ---------------------------------------------------------------------------
// BuilderSession
// ---------------------------------------------------------------------------

/// Best-effort incremental builder for one generation session.
pub struct BuilderSession {
    catalog: Arc<ElementCatalog>,
    composition: Composition,
    status: String,
    warnings: Vec<String>,
    terminal: Option<Terminal>,
}

impl BuilderSession {
    /// Start a session with an empty composition.
    pub fn new(catalog: Arc<ElementCatalog>) -> Self {
        Self {
            catalog,
            composition: Composition::new(),
            status: "Waiting for generation...".to_string(),
            warnings: Vec::new(),
            terminal: None,
        }
    }

    /// Start an iteration session seeded from a previously finalized
    /// composition.
    pub fn iterate_on(catalog: Arc<ElementCatalog>, seed: CompositionSnapshot) -> Self {
        let mut session = Self::new(catalog);
        session.composition = Composition::draft_from_snapshot(seed);
        session
    }

    /// Apply one decoded event. Events after a terminal outcome are ignored
    /// and re-report that outcome.
    pub fn apply(&mut self, event: GenerationEvent) -> BuilderOutcome {
        if let Some(terminal) = &self.terminal {
            return match terminal {
                Terminal::Completed => BuilderOutcome::Completed,
                Terminal::Aborted(message) => BuilderOutcome::Aborted {
                    message: message.clone(),
                },
            };
        }

        match event {
            GenerationEvent::Thinking { message } => {
                self.status = message;
            }
            GenerationEvent::Element(payload) => match payload.refinement() {
                Some(RefinementAction::Delete) => self.apply_delete(&payload),
                Some(RefinementAction::Modify) => self.apply_modify(payload),
                None => self.apply_create(payload),
            },
            GenerationEvent::Connection(conn) => {
                if let Err(err) = composition::connect(
                    &mut self.composition,
                    &self.catalog,
                    &conn.source_id,
                    &conn.output,
                    &conn.target_id,
                    &conn.input,
                ) {
                    self.warn(format!(
                        "skipped connection {}:{} -> {}:{}: {err}",
                        conn.source_id, conn.output, conn.target_id, conn.input
                    ));
                }
            }
            GenerationEvent::Complete { name, description } => {
                match composition::finalize(&mut self.composition, &name, &description) {
                    Ok(()) => {
                        self.status = format!("Finished building {name}");
                        self.terminal = Some(Terminal::Completed);
                        return BuilderOutcome::Completed;
                    }
                    Err(err) => {
                        // Only reachable on a double-complete; treat the
                        // second one as noise.
                        self.warn(format!("ignored complete event: {err}"));
                    }
                }
            }
            GenerationEvent::Error { message } => {
                self.status = format!("Generation failed: {message}");
                self.terminal = Some(Terminal::Aborted(message.clone()));
                return BuilderOutcome::Aborted { message };
            }
        }

        BuilderOutcome::Continue {
            status: self.status.clone(),
        }
    }

    /// Signal that the stream ended. Without a prior terminal event this is
    /// an implicit fatal error.
    pub fn end_of_stream(&mut self) -> BuilderOutcome {
        match &self.terminal {
            Some(Terminal::Completed) => BuilderOutcome::Completed,
            Some(Terminal::Aborted(message)) => BuilderOutcome::Aborted {
                message: message.clone(),
            },
            None => {
                let message = "generation ended unexpectedly".to_string();
                self.terminal = Some(Terminal::Aborted(message.clone()));
                self.status = "Generation ended unexpectedly".to_string();
                BuilderOutcome::Aborted { message }
            }
        }
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Non-fatal problems tolerated so far, in arrival order.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal.is_some()
    }

    /// The working (or final) composition.
    pub fn composition(&self) -> &Composition {
        &self.composition
    }

    /// Consume the session, keeping the composition. On the aborted path
    /// this is the retained partial result; the caller decides whether to
    /// keep or discard it.
    pub fn into_composition(self) -> Composition {
        self.composition
    }

    // -----------------------------------------------------------------------
    // Per-event handlers
    // -----------------------------------------------------------------------

    /// Most-recently-added element whose display name or element id contains
    /// the keyword, case-insensitively. First match wins; with several
    /// similarly-named elements this can mis-target, which is accepted
    /// behavior for now.
    fn find_target(&self, keyword: &str) -> Option<String> {
        self.composition
            .elements
            .iter()
            .rev()
            .find(|e| e.matches_keyword(keyword))
            .map(|e| e.instance_id.clone())
    }

    fn apply_delete(&mut self, payload: &ElementPayload) {
        let Some(keyword) = payload.target_keyword.as_deref().filter(|k| !k.is_empty())
        else {
            self.warn("delete refinement without target keyword".to_string());
            return;
        };
        match self.find_target(keyword) {
            Some(instance_id) => {
                if let Err(err) = composition::remove_element(&mut self.composition, &instance_id)
                {
                    self.warn(format!("failed to delete '{instance_id}': {err}"));
                } else {
                    self.status = format!("Removed {instance_id}");
                }
            }
            // Keyword matching is fuzzy and the target may legitimately be
            // absent; a miss is a deliberate no-op.
            None => {
                tracing::debug!(keyword, "delete refinement matched nothing");
            }
        }
    }

    fn apply_modify(&mut self, payload: ElementPayload) {
        let target = payload
            .target_keyword
            .as_deref()
            .filter(|k| !k.is_empty())
            .and_then(|keyword| self.find_target(keyword));

        match target {
            Some(instance_id) => {
                let patch = ElementPatch {
                    name: payload.name,
                    config: payload.config,
                    position: payload.position,
                    size: payload.size,
                };
                if let Err(err) =
                    composition::update_element(&mut self.composition, &instance_id, patch)
                {
                    self.warn(format!("failed to modify '{instance_id}': {err}"));
                } else {
                    self.status = format!("Updated {instance_id}");
                }
            }
            // No match: the content is still useful, so fall through to
            // "treat as a new element" rather than silently dropping it.
            None => self.apply_create(payload),
        }
    }

    fn apply_create(&mut self, payload: ElementPayload) {
        let Some(element_id) = payload.element_type else {
            self.warn("element event without a type".to_string());
            return;
        };

        let instance_id = payload
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| format!("el-{}", Uuid::now_v7()));

        let mut instance = ElementInstance::new(instance_id.clone(), element_id);
        instance.name = payload.name;
        instance.position = payload.position;
        instance.size = payload.size;
        if let Some(config) = payload.config {
            instance.config = config;
        }

        if let Ok(violations) = self
            .catalog
            .validate_config(&instance.element_id, &instance.config)
        {
            for violation in violations {
                self.warn(format!("config for '{instance_id}': {violation}"));
            }
        }

        match composition::add_element(&mut self.composition, &self.catalog, instance) {
            Ok(()) => {
                self.status = format!("Added {instance_id}");
            }
            // One bad element must not sink the session.
            Err(err) => self.warn(format!("skipped element '{instance_id}': {err}")),
        }
    }

    fn warn(&mut self, message: String) {
        tracing::warn!(%message, "builder tolerated a bad event");
        self.status = message.clone();
        self.warnings.push(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builtin::builtin_catalog;
    use serde_json::json;

    fn session() -> BuilderSession {
        BuilderSession::new(Arc::new(builtin_catalog()))
    }

    fn parse(line: &str) -> GenerationEvent {
        serde_json::from_str(line).unwrap()
    }

    fn element_line(id: &str, element_type: &str, name: &str) -> String {
        format!(
            r#"{{"type":"element","data":{{"id":"{id}","type":"{element_type}","name":"{name}"}}}}"#
        )
    }

    #[test]
    fn well_formed_element_increases_count_by_one() {
        // P1
        let mut session = session();
        let outcome = session.apply(parse(&element_line("e1", "poll", "Pizza Poll")));
        assert!(matches!(outcome, BuilderOutcome::Continue { .. }));
        assert_eq!(session.composition().elements.len(), 1);
        assert!(session.warnings().is_empty());
    }

    #[test]
    fn element_without_id_gets_a_generated_one() {
        let mut session = session();
        session.apply(parse(r#"{"type":"element","data":{"type":"counter"}}"#));
        assert_eq!(session.composition().elements.len(), 1);
        assert!(session.composition().elements[0].instance_id.starts_with("el-"));
    }

    #[test]
    fn unknown_element_type_is_tolerated() {
        let mut session = session();
        session.apply(parse(&element_line("e1", "jukebox", "Jukebox")));
        assert_eq!(session.composition().elements.len(), 0);
        assert_eq!(session.warnings().len(), 1);
        assert!(session.warnings()[0].contains("jukebox"));
        assert!(!session.is_terminal());

        // The session keeps accepting good events afterwards.
        session.apply(parse(&element_line("e2", "poll", "Poll")));
        assert_eq!(session.composition().elements.len(), 1);
    }

    #[test]
    fn duplicate_instance_is_tolerated() {
        let mut session = session();
        session.apply(parse(&element_line("e1", "poll", "Poll")));
        session.apply(parse(&element_line("e1", "counter", "Counter")));
        assert_eq!(session.composition().elements.len(), 1);
        assert_eq!(session.composition().elements[0].element_id, "poll");
        assert_eq!(session.warnings().len(), 1);
    }

    #[test]
    fn thinking_updates_status_without_structure() {
        let mut session = session();
        let outcome =
            session.apply(parse(r#"{"type":"thinking","data":{"message":"Building..."}}"#));
        assert_eq!(
            outcome,
            BuilderOutcome::Continue {
                status: "Building...".to_string()
            }
        );
        assert!(session.composition().elements.is_empty());
    }

    #[test]
    fn scenario_a_single_poll_tool() {
        let mut session = session();
        session.apply(parse(r#"{"type":"thinking","data":{"message":"Building..."}}"#));
        session.apply(parse(
            r#"{"type":"element","data":{"id":"e1","type":"poll","config":{"question":"Pizza?","options":["Yes","No"]}}}"#,
        ));
        let outcome = session.apply(parse(r#"{"type":"complete","data":{"name":"Pizza Poll"}}"#));

        assert_eq!(outcome, BuilderOutcome::Completed);
        let composition = session.into_composition();
        assert!(composition.is_finalized);
        assert_eq!(composition.name, "Pizza Poll");
        assert_eq!(composition.elements.len(), 1);
        assert_eq!(composition.elements[0].element_id, "poll");
    }

    #[test]
    fn scenario_b_iteration_delete_by_keyword() {
        let catalog = Arc::new(builtin_catalog());
        let mut seed_session = BuilderSession::new(catalog.clone());
        seed_session.apply(parse(&element_line("e1", "poll", "Pizza Poll")));
        seed_session.apply(parse(r#"{"type":"complete","data":{"name":"Pizza Poll"}}"#));
        let seed = seed_session.into_composition().to_snapshot();

        let mut refine = BuilderSession::iterate_on(catalog, seed);
        refine.apply(parse(
            r#"{"type":"element","data":{"refinement_action":"delete","target_keyword":"poll"}}"#,
        ));
        assert_eq!(refine.composition().elements.len(), 0);
    }

    #[test]
    fn delete_removes_touching_connections() {
        // P2: the deleted element and every connection touching it are gone.
        let mut session = session();
        session.apply(parse(&element_line("e1", "poll", "Pizza Poll")));
        session.apply(parse(&element_line("e2", "text-display", "Results")));
        session.apply(parse(
            r#"{"type":"connection","data":{"source_id":"e1","output":"results","target_id":"e2","input":"text"}}"#,
        ));
        assert_eq!(session.composition().connections.len(), 1);

        session.apply(parse(
            r#"{"type":"element","data":{"refinement_action":"delete","target_keyword":"PIZZA"}}"#,
        ));
        let snapshot = session.composition().to_snapshot();
        assert!(snapshot.elements.iter().all(|e| e.instance_id != "e1"));
        assert!(snapshot.connections.is_empty());
    }

    #[test]
    fn delete_with_no_match_is_a_noop() {
        let mut session = session();
        session.apply(parse(&element_line("e1", "poll", "Pizza Poll")));
        session.apply(parse(
            r#"{"type":"element","data":{"refinement_action":"delete","target_keyword":"karaoke"}}"#,
        ));
        assert_eq!(session.composition().elements.len(), 1);
        assert!(!session.is_terminal());
    }

    #[test]
    fn refinement_targets_most_recently_added_match() {
        // Documents the accepted ambiguity: with two elements matching the
        // keyword, the most recently added one is targeted.
        let mut session = session();
        session.apply(parse(&element_line("e1", "poll", "Lunch Poll")));
        session.apply(parse(&element_line("e2", "poll", "Dinner Poll")));
        session.apply(parse(
            r#"{"type":"element","data":{"refinement_action":"delete","target_keyword":"poll"}}"#,
        ));
        let remaining: Vec<&str> = session
            .composition()
            .elements
            .iter()
            .map(|e| e.instance_id.as_str())
            .collect();
        assert_eq!(remaining, vec!["e1"]);
    }

    #[test]
    fn modify_merges_config_into_match() {
        let mut session = session();
        session.apply(parse(
            r#"{"type":"element","data":{"id":"e1","type":"countdown-timer","name":"Talk Timer","config":{"duration_seconds":60}}}"#,
        ));
        session.apply(parse(
            r#"{"type":"element","data":{"refinement_action":"modify","target_keyword":"timer","config":{"duration_seconds":120}}}"#,
        ));
        assert_eq!(session.composition().elements.len(), 1);
        assert_eq!(
            session.composition().element("e1").unwrap().config["duration_seconds"],
            json!(120)
        );
    }

    #[test]
    fn modify_with_no_match_falls_through_to_create() {
        let mut session = session();
        session.apply(parse(
            r#"{"type":"element","data":{"type":"counter","name":"Slice Counter","refinement_action":"modify","target_keyword":"slices"}}"#,
        ));
        assert_eq!(session.composition().elements.len(), 1);
        assert_eq!(session.composition().elements[0].element_id, "counter");
    }

    #[test]
    fn bad_connection_is_tolerated() {
        let mut session = session();
        session.apply(parse(&element_line("e1", "poll", "Poll")));
        session.apply(parse(
            r#"{"type":"connection","data":{"source_id":"e1","output":"results","target_id":"ghost","input":"text"}}"#,
        ));
        assert!(session.composition().connections.is_empty());
        assert_eq!(session.warnings().len(), 1);
        assert!(!session.is_terminal());
    }

    #[test]
    fn error_event_aborts_and_retains_partial_composition() {
        let mut session = session();
        session.apply(parse(&element_line("e1", "poll", "Poll")));
        let outcome = session.apply(parse(r#"{"type":"error","data":{"message":"model refused"}}"#));
        assert_eq!(
            outcome,
            BuilderOutcome::Aborted {
                message: "model refused".to_string()
            }
        );
        assert!(session.is_terminal());

        // Further events are ignored and re-report the abort.
        let outcome = session.apply(parse(&element_line("e2", "counter", "C")));
        assert!(matches!(outcome, BuilderOutcome::Aborted { .. }));
        assert_eq!(session.composition().elements.len(), 1);
    }

    #[test]
    fn events_after_complete_are_ignored() {
        let mut session = session();
        session.apply(parse(&element_line("e1", "poll", "Poll")));
        session.apply(parse(r#"{"type":"complete","data":{"name":"Done"}}"#));
        let outcome = session.apply(parse(&element_line("e2", "counter", "C")));
        assert_eq!(outcome, BuilderOutcome::Completed);
        assert_eq!(session.composition().elements.len(), 1);
    }

    #[test]
    fn stream_end_without_terminal_event_is_fatal() {
        let mut session = session();
        session.apply(parse(&element_line("e1", "poll", "Poll")));
        let outcome = session.end_of_stream();
        assert_eq!(
            outcome,
            BuilderOutcome::Aborted {
                message: "generation ended unexpectedly".to_string()
            }
        );
    }

    #[test]
    fn stream_end_after_complete_stays_completed() {
        let mut session = session();
        session.apply(parse(r#"{"type":"complete","data":{"name":"Empty Tool"}}"#));
        assert_eq!(session.end_of_stream(), BuilderOutcome::Completed);
    }

    #[test]
    fn config_violations_warn_but_do_not_block_add() {
        let mut session = session();
        // Poll without its required question/options still lands; the
        // violations surface as warnings for the caller.
        session.apply(parse(r#"{"type":"element","data":{"id":"e1","type":"poll"}}"#));
        assert_eq!(session.composition().elements.len(), 1);
        assert_eq!(session.warnings().len(), 2);
    }
}
