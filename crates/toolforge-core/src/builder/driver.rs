//! The session driver: one cooperative read loop per active stream.
//!
//! Pumps raw fragments from a [`GenerationSource`] through the decoder into
//! a [`BuilderSession`]. One outstanding read at a time; cancellation
//! aborts the read and guarantees no further events are applied; a read
//! that stalls past the configured interval fails the session instead of
//! hanging indefinitely.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use toolforge_types::error::SessionError;

use crate::stream::StreamDecoder;

use super::session::{BuilderOutcome, BuilderSession};
use super::source::GenerationSource;

/// Drive a generation session to its terminal state.
///
/// On `Ok(())` the session completed and holds the finalized composition.
/// On `Err` the session holds whatever partial composition was built; the
/// caller decides whether to keep or discard it.
pub async fn run_session<S: GenerationSource>(
    mut source: S,
    session: &mut BuilderSession,
    cancel: CancellationToken,
    stall_timeout: Duration,
) -> Result<(), SessionError> {
    let mut decoder = StreamDecoder::new();

    loop {
        let read = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("generation session cancelled");
                return Err(SessionError::Cancelled);
            }
            read = tokio::time::timeout(stall_timeout, source.next_chunk()) => read,
        };

        let chunk = match read {
            Err(_) => return Err(SessionError::Stalled),
            Ok(None) => {
                decoder.finish();
                return match session.end_of_stream() {
                    BuilderOutcome::Completed => Ok(()),
                    BuilderOutcome::Aborted { .. } => Err(SessionError::UnexpectedEnd),
                    BuilderOutcome::Continue { .. } => Err(SessionError::UnexpectedEnd),
                };
            }
            Ok(Some(Err(err))) => return Err(err),
            Ok(Some(Ok(chunk))) => chunk,
        };

        for event in decoder.decode(&chunk) {
            match session.apply(event) {
                BuilderOutcome::Completed => return Ok(()),
                BuilderOutcome::Aborted { message } => {
                    return Err(SessionError::Protocol(message));
                }
                BuilderOutcome::Continue { .. } => {}
            }
        }
    }
}
