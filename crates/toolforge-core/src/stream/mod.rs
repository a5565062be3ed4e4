//! Streaming generation protocol decode.

pub mod decoder;

pub use decoder::StreamDecoder;
