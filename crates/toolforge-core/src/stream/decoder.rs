//! Incremental decoder for the newline-delimited generation stream.
//!
//! Network delivery boundaries are not aligned to logical records, so the
//! decoder keeps a carry-over buffer and only ever parses whole lines. A
//! consumer is never handed a truncated object: decoding the same total
//! text split at different fragment boundaries yields the identical ordered
//! event list.
//!
//! Tolerance policy:
//! - A malformed line is skipped (counted and logged), never fatal.
//! - An `error` record is terminal: the decoder surfaces it and ignores all
//!   further input.
//! - A trailing partial line at end-of-stream is discarded, not
//!   force-parsed.

use toolforge_types::event::GenerationEvent;

/// Incremental NDJSON decoder with a carry-over buffer.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    buffer: String,
    terminated: bool,
    skipped_lines: u64,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one fragment of arbitrary size; returns every event completed
    /// by it, in order.
    pub fn decode(&mut self, chunk: &str) -> Vec<GenerationEvent> {
        if self.terminated {
            return Vec::new();
        }
        self.buffer.push_str(chunk);

        let mut events = Vec::new();
        // The final split segment may be an incomplete record; it stays in
        // the buffer as the new carry-over.
        while let Some(newline) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=newline).collect();
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match serde_json::from_str::<GenerationEvent>(line) {
                Ok(event) => {
                    let fatal = matches!(event, GenerationEvent::Error { .. });
                    events.push(event);
                    if fatal {
                        self.terminated = true;
                        self.buffer.clear();
                        break;
                    }
                }
                Err(err) => {
                    // Whole line reached us, so this is genuine malformation,
                    // not a truncation artifact. Skip it and keep going.
                    self.skipped_lines += 1;
                    tracing::warn!(line, %err, "skipping malformed generation record");
                }
            }
        }
        events
    }

    /// Signal end-of-stream. Unconsumed buffered content that never resolved
    /// to a complete line is discarded.
    pub fn finish(&mut self) {
        if !self.buffer.trim().is_empty() {
            tracing::debug!(
                bytes = self.buffer.len(),
                "discarding incomplete trailing record at end of stream"
            );
        }
        self.buffer.clear();
        self.terminated = true;
    }

    /// Whether a terminal `error` record was decoded (or the stream was
    /// finished).
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Number of malformed lines skipped so far.
    pub fn skipped_lines(&self) -> u64 {
        self.skipped_lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STREAM: &str = concat!(
        r#"{"type":"thinking","data":{"message":"Building..."}}"#,
        "\n",
        r#"{"type":"element","data":{"id":"e1","type":"poll","config":{"question":"Pizza?","options":["Yes","No"]}}}"#,
        "\n",
        r#"{"type":"complete","data":{"name":"Pizza Poll"}}"#,
        "\n",
    );

    fn decode_all(decoder: &mut StreamDecoder, chunks: &[&str]) -> Vec<GenerationEvent> {
        let mut events = Vec::new();
        for chunk in chunks {
            events.extend(decoder.decode(chunk));
        }
        decoder.finish();
        events
    }

    #[test]
    fn whole_stream_in_one_fragment() {
        let mut decoder = StreamDecoder::new();
        let events = decode_all(&mut decoder, &[STREAM]);
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], GenerationEvent::Thinking { .. }));
        assert!(matches!(events[1], GenerationEvent::Element(_)));
        assert!(matches!(events[2], GenerationEvent::Complete { .. }));
    }

    #[test]
    fn framing_invariance_across_arbitrary_splits() {
        // P3: one fragment vs. many arbitrary-length fragments (including
        // char-by-char) must produce the identical ordered event list.
        let mut reference = StreamDecoder::new();
        let expected = decode_all(&mut reference, &[STREAM]);

        for split_at in [1usize, 3, 7, 20, 41, 80, STREAM.len() - 1] {
            let mut decoder = StreamDecoder::new();
            let (head, tail) = STREAM.split_at(split_at);
            let events = decode_all(&mut decoder, &[head, tail]);
            assert_eq!(
                serde_json::to_string(&events).unwrap(),
                serde_json::to_string(&expected).unwrap(),
                "split at {split_at} changed the event list"
            );
        }

        let mut decoder = StreamDecoder::new();
        let chars: Vec<String> = STREAM.chars().map(String::from).collect();
        let refs: Vec<&str> = chars.iter().map(String::as_str).collect();
        let events = decode_all(&mut decoder, &refs);
        assert_eq!(
            serde_json::to_string(&events).unwrap(),
            serde_json::to_string(&expected).unwrap()
        );
    }

    #[test]
    fn malformed_line_is_skipped_and_stream_continues() {
        // Scenario C: one unparseable line between two valid element lines.
        let stream = concat!(
            r#"{"type":"element","data":{"id":"e1","type":"poll"}}"#,
            "\n",
            "{this is not json at all\n",
            r#"{"type":"element","data":{"id":"e2","type":"counter"}}"#,
            "\n",
        );
        let mut decoder = StreamDecoder::new();
        let events = decoder.decode(stream);
        assert_eq!(events.len(), 2);
        assert_eq!(decoder.skipped_lines(), 1);
        assert!(!decoder.is_terminated());
    }

    #[test]
    fn unknown_record_type_is_a_skipped_line() {
        let mut decoder = StreamDecoder::new();
        let events = decoder.decode("{\"type\":\"confetti\",\"data\":{}}\n");
        assert!(events.is_empty());
        assert_eq!(decoder.skipped_lines(), 1);
    }

    #[test]
    fn blank_lines_are_ignored() {
        let mut decoder = StreamDecoder::new();
        let events = decoder.decode("\n   \n{\"type\":\"thinking\",\"data\":{\"message\":\"hi\"}}\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(decoder.skipped_lines(), 0);
    }

    #[test]
    fn error_record_is_terminal() {
        let stream = concat!(
            r#"{"type":"error","data":{"message":"model refused"}}"#,
            "\n",
            r#"{"type":"element","data":{"id":"e1","type":"poll"}}"#,
            "\n",
        );
        let mut decoder = StreamDecoder::new();
        let events = decoder.decode(stream);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], GenerationEvent::Error { .. }));
        assert!(decoder.is_terminated());

        // Further fragments are ignored entirely.
        let more = decoder.decode("{\"type\":\"thinking\",\"data\":{\"message\":\"x\"}}\n");
        assert!(more.is_empty());
    }

    #[test]
    fn trailing_partial_line_is_discarded_at_end_of_stream() {
        let mut decoder = StreamDecoder::new();
        let events = decoder.decode(
            "{\"type\":\"thinking\",\"data\":{\"message\":\"hi\"}}\n{\"type\":\"element\",\"data\":{\"id\":",
        );
        assert_eq!(events.len(), 1);
        decoder.finish();
        assert!(decoder.decode("never parsed").is_empty());
        assert_eq!(decoder.skipped_lines(), 0);
    }

    #[test]
    fn record_split_across_three_fragments_emits_once() {
        let mut decoder = StreamDecoder::new();
        assert!(decoder.decode("{\"type\":\"thin").is_empty());
        assert!(decoder.decode("king\",\"data\":{\"message\":\"Buil").is_empty());
        let events = decoder.decode("ding...\"}}\n");
        assert_eq!(events.len(), 1);
        match &events[0] {
            GenerationEvent::Thinking { message } => assert_eq!(message, "Building..."),
            other => panic!("expected Thinking, got: {other:?}"),
        }
    }
}
