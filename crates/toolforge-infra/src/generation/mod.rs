//! Generation service boundary: HTTP streaming client, prompt assembly,
//! and the active-session registry.

pub mod client;
pub mod prompt;
pub mod registry;

pub use client::{GenerationClient, HttpGenerationSource};
pub use registry::SessionRegistry;
