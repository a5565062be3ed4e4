//! Core logic for Toolforge: the element catalog, the composition model,
//! the streaming generation decoder, the incremental builder, and the
//! runtime engine.
//!
//! This crate defines the `GenerationSource` port that the infrastructure
//! layer implements. It depends only on `toolforge-types` -- never on
//! `toolforge-infra` or any HTTP/IO crate.

pub mod builder;
pub mod catalog;
pub mod composition;
pub mod runtime;
pub mod stream;
