//! Element-type-specific behavior: default state, action handling, and
//! input-changed recomputation.
//!
//! One arm per builtin element type. Actions reaching these handlers have
//! already been validated against the spec's declared `actions`, so an
//! unmatched arm is an internal inconsistency and reported as
//! `UnsupportedAction`.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};

use toolforge_types::error::RuntimeError;

use super::ActionEffect;

// ---------------------------------------------------------------------------
// Default state
// ---------------------------------------------------------------------------

/// Initial state for a stateful instance, derived from its effective config.
pub fn default_state(element_id: &str, config: &Map<String, Value>) -> Value {
    match element_id {
        "poll" => json!({
            "counts": zeroed_counts(config),
            "total_votes": 0,
        }),
        "rsvp" => json!({
            "attendees": [],
            "declined": [],
        }),
        "countdown-timer" => json!({
            "status": "stopped",
            "elapsed_seconds": 0.0,
            "started_at": null,
        }),
        "form" => json!({
            "values": {},
            "submitted": false,
        }),
        "counter" => json!({
            "value": config_number(config, "initial", 0.0),
        }),
        "text-display" => json!({
            "text": config.get("text").cloned().unwrap_or_else(|| json!("")),
        }),
        "result-chart" => json!({
            "data": null,
        }),
        "button" => json!({
            "press_count": 0,
        }),
        _ => json!({}),
    }
}

// ---------------------------------------------------------------------------
// Action dispatch
// ---------------------------------------------------------------------------

/// Run one action against the current state, returning the patch to apply
/// and the named outputs to propagate.
pub fn handle_action(
    element_id: &str,
    config: &Map<String, Value>,
    state: &Value,
    action: &str,
    payload: &Value,
) -> Result<ActionEffect, RuntimeError> {
    match (element_id, action) {
        ("poll", "vote") => poll_vote(config, state, payload),
        ("poll", "reset") => {
            let counts = zeroed_counts(config);
            Ok(ActionEffect {
                patch: object(json!({"counts": counts, "total_votes": 0})),
                outputs: vec![
                    ("results".to_string(), json!(zeroed_counts(config))),
                    ("total_votes".to_string(), json!(0)),
                ],
            })
        }

        ("rsvp", "respond") => rsvp_respond(config, state, payload),
        ("rsvp", "withdraw") => rsvp_withdraw(config, state, payload),

        ("countdown-timer", "start") => timer_start(state),
        ("countdown-timer", "pause") => timer_pause(config, state),
        ("countdown-timer", "reset") => {
            let duration = config_number(config, "duration_seconds", 60.0);
            Ok(ActionEffect {
                patch: object(json!({
                    "status": "stopped",
                    "elapsed_seconds": 0.0,
                    "started_at": null,
                })),
                outputs: vec![
                    ("remaining".to_string(), json!(duration)),
                    ("expired".to_string(), json!(false)),
                ],
            })
        }

        ("form", "set_field") => form_set_field(config, state, payload),
        ("form", "submit") => form_submit(state),
        ("form", "clear") => Ok(ActionEffect {
            patch: object(json!({"values": {}, "submitted": false})),
            outputs: vec![],
        }),

        ("counter", "increment") => counter_step(config, state, 1.0),
        ("counter", "decrement") => counter_step(config, state, -1.0),
        ("counter", "reset") => {
            let initial = config_number(config, "initial", 0.0);
            Ok(ActionEffect {
                patch: object(json!({"value": initial})),
                outputs: vec![("count".to_string(), json!(initial))],
            })
        }

        ("button", "press") => {
            let count = state_number(state, "press_count") + 1.0;
            Ok(ActionEffect {
                patch: object(json!({"press_count": count})),
                outputs: vec![("pressed".to_string(), json!(count))],
            })
        }

        _ => Err(RuntimeError::UnsupportedAction {
            element_id: element_id.to_string(),
            action: action.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Input-changed recomputation
// ---------------------------------------------------------------------------

/// React to a propagated input value. Returns the state patch to apply, or
/// `None` when the element does not react to that input.
pub fn on_input_changed(element_id: &str, input: &str, value: &Value) -> Option<Map<String, Value>> {
    match (element_id, input) {
        ("text-display", "text") => {
            // Display whatever arrives; non-string values are rendered as
            // their JSON text.
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some(object(json!({"text": text})))
        }
        ("result-chart", "data") => Some(object(json!({"data": value}))),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Per-element handlers
// ---------------------------------------------------------------------------

fn poll_vote(
    config: &Map<String, Value>,
    state: &Value,
    payload: &Value,
) -> Result<ActionEffect, RuntimeError> {
    let option = payload
        .get("option")
        .and_then(Value::as_str)
        .ok_or_else(|| RuntimeError::InvalidPayload("vote requires an 'option' string".to_string()))?;

    let valid = config
        .get("options")
        .and_then(Value::as_array)
        .is_some_and(|options| options.iter().any(|o| o.as_str() == Some(option)));
    if !valid {
        return Err(RuntimeError::InvalidPayload(format!(
            "'{option}' is not one of the poll options"
        )));
    }

    let mut counts = state
        .get("counts")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    let tally = counts.get(option).and_then(Value::as_f64).unwrap_or(0.0) + 1.0;
    counts.insert(option.to_string(), json!(tally));
    let total = state_number(state, "total_votes") + 1.0;

    Ok(ActionEffect {
        patch: object(json!({"counts": counts, "total_votes": total})),
        outputs: vec![
            ("results".to_string(), json!(counts)),
            ("total_votes".to_string(), json!(total)),
        ],
    })
}

fn rsvp_respond(
    config: &Map<String, Value>,
    state: &Value,
    payload: &Value,
) -> Result<ActionEffect, RuntimeError> {
    let name = payload
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| RuntimeError::InvalidPayload("respond requires a 'name' string".to_string()))?;
    let attending = payload.get("attending").and_then(Value::as_bool).unwrap_or(true);

    let mut attendees = string_list(state, "attendees");
    let mut declined = string_list(state, "declined");
    attendees.retain(|n| n != name);
    declined.retain(|n| n != name);

    let capacity = config.get("capacity").and_then(Value::as_f64);
    if attending {
        if let Some(capacity) = capacity
            && attendees.len() as f64 >= capacity
        {
            return Err(RuntimeError::InvalidPayload("event is at capacity".to_string()));
        }
        attendees.push(name.to_string());
    } else {
        declined.push(name.to_string());
    }

    let count = attendees.len() as f64;
    let full = capacity.is_some_and(|c| count >= c);
    Ok(ActionEffect {
        patch: object(json!({"attendees": attendees, "declined": declined})),
        outputs: vec![
            ("attendee_count".to_string(), json!(count)),
            ("capacity_reached".to_string(), json!(full)),
        ],
    })
}

fn rsvp_withdraw(
    config: &Map<String, Value>,
    state: &Value,
    payload: &Value,
) -> Result<ActionEffect, RuntimeError> {
    let name = payload
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| RuntimeError::InvalidPayload("withdraw requires a 'name' string".to_string()))?;

    let mut attendees = string_list(state, "attendees");
    let mut declined = string_list(state, "declined");
    attendees.retain(|n| n != name);
    declined.retain(|n| n != name);

    let count = attendees.len() as f64;
    let full = config
        .get("capacity")
        .and_then(Value::as_f64)
        .is_some_and(|c| count >= c);
    Ok(ActionEffect {
        patch: object(json!({"attendees": attendees, "declined": declined})),
        outputs: vec![
            ("attendee_count".to_string(), json!(count)),
            ("capacity_reached".to_string(), json!(full)),
        ],
    })
}

fn timer_start(state: &Value) -> Result<ActionEffect, RuntimeError> {
    if state.get("status").and_then(Value::as_str) == Some("running") {
        return Ok(ActionEffect::default());
    }
    Ok(ActionEffect {
        patch: object(json!({
            "status": "running",
            "started_at": Utc::now().to_rfc3339(),
        })),
        outputs: vec![],
    })
}

fn timer_pause(config: &Map<String, Value>, state: &Value) -> Result<ActionEffect, RuntimeError> {
    if state.get("status").and_then(Value::as_str) != Some("running") {
        return Ok(ActionEffect::default());
    }

    let mut elapsed = state_number(state, "elapsed_seconds");
    if let Some(started_at) = state
        .get("started_at")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
    {
        let running_for = (Utc::now() - started_at.with_timezone(&Utc)).num_milliseconds();
        elapsed += running_for as f64 / 1000.0;
    }

    let duration = config_number(config, "duration_seconds", 60.0);
    let remaining = (duration - elapsed).max(0.0);
    Ok(ActionEffect {
        patch: object(json!({
            "status": "paused",
            "elapsed_seconds": elapsed,
            "started_at": null,
        })),
        outputs: vec![
            ("remaining".to_string(), json!(remaining)),
            ("expired".to_string(), json!(remaining <= 0.0)),
        ],
    })
}

fn form_set_field(
    config: &Map<String, Value>,
    state: &Value,
    payload: &Value,
) -> Result<ActionEffect, RuntimeError> {
    let field = payload
        .get("field")
        .and_then(Value::as_str)
        .ok_or_else(|| RuntimeError::InvalidPayload("set_field requires a 'field' string".to_string()))?;
    let value = payload.get("value").cloned().unwrap_or(Value::Null);

    let declared = config
        .get("fields")
        .and_then(Value::as_array)
        .is_some_and(|fields| fields.iter().any(|f| f.as_str() == Some(field)));
    if !declared {
        return Err(RuntimeError::InvalidPayload(format!(
            "'{field}' is not a declared form field"
        )));
    }

    let mut values = state
        .get("values")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    values.insert(field.to_string(), value);

    Ok(ActionEffect {
        patch: object(json!({"values": values, "submitted": false})),
        outputs: vec![],
    })
}

fn form_submit(state: &Value) -> Result<ActionEffect, RuntimeError> {
    let values = state
        .get("values")
        .cloned()
        .unwrap_or_else(|| json!({}));
    Ok(ActionEffect {
        patch: object(json!({"submitted": true})),
        outputs: vec![("submission".to_string(), values)],
    })
}

fn counter_step(
    config: &Map<String, Value>,
    state: &Value,
    direction: f64,
) -> Result<ActionEffect, RuntimeError> {
    let step = config_number(config, "step", 1.0);
    let value = state_number(state, "value") + direction * step;
    Ok(ActionEffect {
        patch: object(json!({"value": value})),
        outputs: vec![("count".to_string(), json!(value))],
    })
}

// ---------------------------------------------------------------------------
// Small helpers
// ---------------------------------------------------------------------------

fn zeroed_counts(config: &Map<String, Value>) -> Map<String, Value> {
    let mut counts = Map::new();
    if let Some(options) = config.get("options").and_then(Value::as_array) {
        for option in options {
            if let Some(name) = option.as_str() {
                counts.insert(name.to_string(), json!(0));
            }
        }
    }
    counts
}

fn config_number(config: &Map<String, Value>, key: &str, fallback: f64) -> f64 {
    config.get(key).and_then(Value::as_f64).unwrap_or(fallback)
}

fn state_number(state: &Value, key: &str) -> f64 {
    state.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

fn string_list(state: &Value, key: &str) -> Vec<String> {
    state
        .get(key)
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
