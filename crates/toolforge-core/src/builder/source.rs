//! The port through which generation stream data reaches the builder.
//!
//! `toolforge-infra` implements this over a streaming HTTP response; tests
//! implement it with scripted chunk sequences. Uses RPITIT for the async
//! method, consistent with the workspace's Rust 2024 approach.

use std::future::Future;

use toolforge_types::error::SessionError;

/// A cooperative, single-reader source of raw stream fragments.
///
/// One outstanding read at a time: the session driver awaits `next_chunk`
/// and never issues a second read before the first resolves. `None` means
/// end-of-stream.
pub trait GenerationSource: Send {
    fn next_chunk(
        &mut self,
    ) -> impl Future<Output = Option<Result<String, SessionError>>> + Send;
}

/// A scripted source for tests: yields its chunks in order, then
/// end-of-stream.
#[derive(Debug)]
pub struct ScriptedSource {
    chunks: std::vec::IntoIter<String>,
}

impl ScriptedSource {
    pub fn new(chunks: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            chunks: chunks
                .into_iter()
                .map(Into::into)
                .collect::<Vec<_>>()
                .into_iter(),
        }
    }
}

impl GenerationSource for ScriptedSource {
    async fn next_chunk(&mut self) -> Option<Result<String, SessionError>> {
        self.chunks.next().map(Ok)
    }
}
