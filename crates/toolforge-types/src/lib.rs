//! Shared domain types for Toolforge.
//!
//! This crate contains the core domain types used across the Toolforge
//! platform: element specifications, compositions, generation events, and
//! their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, thiserror,
//! schemars.

pub mod composition;
pub mod config;
pub mod element;
pub mod error;
pub mod event;
