//! Infrastructure implementations for Toolforge.
//!
//! Provides the streaming HTTP client for the external generation service,
//! prompt assembly from the catalog export, the active-session registry,
//! and `config.toml` loading. Everything here implements ports defined in
//! `toolforge-core`.

pub mod config;
pub mod generation;
