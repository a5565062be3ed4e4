//! The closed, curated list of builtin element specifications.
//!
//! This is the entire vocabulary the generation service may emit and the
//! runtime can execute. Adding an element type means adding it here, giving
//! it a handler in `runtime::handlers`, and nothing else -- there is no
//! runtime registration surface.

use serde_json::json;

use toolforge_types::element::{ConfigField, ElementSpec, FieldType, Size};

use super::ElementCatalog;

fn field(name: &str, field_type: FieldType, description: &str) -> ConfigField {
    ConfigField {
        name: name.to_string(),
        field_type,
        required: false,
        allowed_values: vec![],
        default: None,
        description: description.to_string(),
    }
}

fn required(mut f: ConfigField) -> ConfigField {
    f.required = true;
    f
}

fn with_default(mut f: ConfigField, default: serde_json::Value) -> ConfigField {
    f.default = Some(default);
    f
}

fn poll() -> ElementSpec {
    ElementSpec {
        id: "poll".to_string(),
        category: "interactive".to_string(),
        name: "Poll".to_string(),
        description: "A multiple-choice poll that tallies votes live.".to_string(),
        use_cases: vec![
            "Decide where the group eats lunch".to_string(),
            "Vote on a movie night pick".to_string(),
            "Quick yes/no pulse check".to_string(),
        ],
        config_schema: vec![
            required(field("question", FieldType::String, "The question being asked.")),
            required(field("options", FieldType::List, "Choices voters pick from.")),
            with_default(
                field("allow_multiple", FieldType::Boolean, "Whether one voter may pick several options."),
                json!(false),
            ),
        ],
        inputs: vec![],
        outputs: vec!["results".to_string(), "total_votes".to_string()],
        actions: vec!["vote".to_string(), "reset".to_string()],
        stateful: true,
        realtime: true,
        default_size: Size { width: 6, height: 4 },
    }
}

fn rsvp() -> ElementSpec {
    ElementSpec {
        id: "rsvp".to_string(),
        category: "interactive".to_string(),
        name: "RSVP Tracker".to_string(),
        description: "Tracks who is attending an event, with an optional capacity cap."
            .to_string(),
        use_cases: vec![
            "Headcount for a floor barbecue".to_string(),
            "Sign-ups for an intramural game".to_string(),
        ],
        config_schema: vec![
            required(field("event_name", FieldType::String, "What people are RSVPing to.")),
            field("capacity", FieldType::Number, "Maximum number of attendees."),
        ],
        inputs: vec![],
        outputs: vec!["attendee_count".to_string(), "capacity_reached".to_string()],
        actions: vec!["respond".to_string(), "withdraw".to_string()],
        stateful: true,
        realtime: true,
        default_size: Size { width: 6, height: 5 },
    }
}

fn countdown_timer() -> ElementSpec {
    ElementSpec {
        id: "countdown-timer".to_string(),
        category: "interactive".to_string(),
        name: "Countdown Timer".to_string(),
        description: "A start/pause/reset countdown from a configured duration.".to_string(),
        use_cases: vec![
            "Time a lightning talk".to_string(),
            "Laundry room reservation timer".to_string(),
        ],
        config_schema: vec![with_default(
            required(field("duration_seconds", FieldType::Number, "Countdown length in seconds.")),
            json!(60),
        )],
        inputs: vec![],
        outputs: vec!["remaining".to_string(), "expired".to_string()],
        actions: vec!["start".to_string(), "pause".to_string(), "reset".to_string()],
        stateful: true,
        realtime: true,
        default_size: Size { width: 4, height: 3 },
    }
}

fn form() -> ElementSpec {
    ElementSpec {
        id: "form".to_string(),
        category: "input".to_string(),
        name: "Form".to_string(),
        description: "A small form with named fields and a submit action.".to_string(),
        use_cases: vec![
            "Collect maintenance requests".to_string(),
            "Suggestion box with a name field".to_string(),
        ],
        config_schema: vec![
            required(field("fields", FieldType::List, "Ordered list of field names.")),
            with_default(
                field("submit_label", FieldType::String, "Label on the submit button."),
                json!("Submit"),
            ),
        ],
        inputs: vec![],
        outputs: vec!["submission".to_string()],
        actions: vec!["set_field".to_string(), "submit".to_string(), "clear".to_string()],
        stateful: true,
        realtime: false,
        default_size: Size { width: 6, height: 6 },
    }
}

fn counter() -> ElementSpec {
    ElementSpec {
        id: "counter".to_string(),
        category: "interactive".to_string(),
        name: "Counter".to_string(),
        description: "A shared tally that anyone can bump up or down.".to_string(),
        use_cases: vec![
            "Count free pizza slices left".to_string(),
            "Track games won in a tournament".to_string(),
        ],
        config_schema: vec![
            field("label", FieldType::String, "What is being counted."),
            with_default(field("initial", FieldType::Number, "Starting value."), json!(0)),
            with_default(field("step", FieldType::Number, "Amount added per increment."), json!(1)),
        ],
        inputs: vec![],
        outputs: vec!["count".to_string()],
        actions: vec!["increment".to_string(), "decrement".to_string(), "reset".to_string()],
        stateful: true,
        realtime: true,
        default_size: Size { width: 3, height: 3 },
    }
}

fn text_display() -> ElementSpec {
    ElementSpec {
        id: "text-display".to_string(),
        category: "display".to_string(),
        name: "Text Display".to_string(),
        description: "Shows a block of text, either configured or fed from another element."
            .to_string(),
        use_cases: vec![
            "Announcement banner".to_string(),
            "Show the current poll leader".to_string(),
        ],
        config_schema: vec![
            field("text", FieldType::String, "Initial text to display."),
            with_default(
                field("heading", FieldType::Boolean, "Render as a heading."),
                json!(false),
            ),
        ],
        inputs: vec!["text".to_string()],
        outputs: vec![],
        actions: vec![],
        stateful: true,
        realtime: true,
        default_size: Size { width: 6, height: 2 },
    }
}

fn result_chart() -> ElementSpec {
    ElementSpec {
        id: "result-chart".to_string(),
        category: "display".to_string(),
        name: "Result Chart".to_string(),
        description: "Charts structured data pushed from a connected element.".to_string(),
        use_cases: vec![
            "Visualize poll results as bars".to_string(),
            "Attendance over time".to_string(),
        ],
        config_schema: vec![with_default(
            field("chart_type", FieldType::String, "How to render the data."),
            json!("bars"),
        )],
        inputs: vec!["data".to_string()],
        outputs: vec![],
        actions: vec![],
        stateful: true,
        realtime: true,
        default_size: Size { width: 6, height: 4 },
    }
}

fn button() -> ElementSpec {
    ElementSpec {
        id: "button".to_string(),
        category: "input".to_string(),
        name: "Button".to_string(),
        description: "A single button that reports how many times it was pressed.".to_string(),
        use_cases: vec![
            "Ring a virtual doorbell".to_string(),
            "\"I'm here\" check-in".to_string(),
        ],
        config_schema: vec![with_default(
            field("label", FieldType::String, "Button label."),
            json!("Press"),
        )],
        inputs: vec![],
        outputs: vec!["pressed".to_string()],
        actions: vec!["press".to_string()],
        stateful: true,
        realtime: true,
        default_size: Size { width: 3, height: 2 },
    }
}

/// Build the full builtin catalog, in stable registration order.
pub fn builtin_catalog() -> ElementCatalog {
    let mut catalog = ElementCatalog::new();
    for spec in [
        poll(),
        rsvp(),
        countdown_timer(),
        form(),
        counter(),
        text_display(),
        result_chart(),
        button(),
    ] {
        catalog.register(spec);
    }
    catalog
}
