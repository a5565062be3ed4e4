//! Streaming HTTP client for the external generation service.
//!
//! The service answers a generation request with a newline-delimited record
//! stream. The client exposes that response as a [`GenerationSource`] of
//! text fragments: byte chunks arrive on whatever boundaries the transport
//! picks, including mid-codepoint, so a small UTF-8 carry buffer holds any
//! trailing incomplete sequence until the next chunk completes it.

use std::pin::Pin;

use futures_util::{Stream, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use toolforge_core::builder::GenerationSource;
use toolforge_types::config::GenerationConfig;
use toolforge_types::error::SessionError;

/// Body of a generation request.
#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// HTTP client for the generation service.
pub struct GenerationClient {
    http: reqwest::Client,
    config: GenerationConfig,
    api_key: Option<SecretString>,
}

impl GenerationClient {
    pub fn new(config: GenerationConfig, api_key: Option<SecretString>) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            api_key,
        }
    }

    /// Open a generation stream for an assembled prompt.
    pub async fn open_stream(&self, prompt: &str) -> Result<HttpGenerationSource, SessionError> {
        let mut request = self.http.post(&self.config.endpoint).json(&GenerationRequest {
            model: &self.config.model,
            prompt,
            stream: true,
        });
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|err| SessionError::Transport(err.to_string()))?
            .error_for_status()
            .map_err(|err| SessionError::Transport(err.to_string()))?;

        tracing::debug!(endpoint = %self.config.endpoint, "generation stream opened");
        Ok(HttpGenerationSource::new(Box::pin(
            response.bytes_stream().map(|chunk| chunk.map(|b| b.to_vec())),
        )))
    }
}

type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, reqwest::Error>> + Send>>;

/// A [`GenerationSource`] over a streaming HTTP response body.
pub struct HttpGenerationSource {
    stream: ByteStream,
    /// Trailing bytes of an incomplete UTF-8 sequence, prepended to the
    /// next chunk.
    utf8_carry: Vec<u8>,
}

impl HttpGenerationSource {
    fn new(stream: ByteStream) -> Self {
        Self {
            stream,
            utf8_carry: Vec::new(),
        }
    }

    /// Split `bytes` into the longest valid UTF-8 prefix and a (possibly
    /// empty) incomplete trailing sequence carried to the next chunk.
    fn take_valid_prefix(&mut self, bytes: Vec<u8>) -> Result<String, SessionError> {
        match String::from_utf8(bytes) {
            Ok(text) => Ok(text),
            // An incomplete sequence at the very end is a boundary artifact;
            // hold it back and return the prefix before it.
            Err(err) if err.utf8_error().error_len().is_none() => {
                let valid_up_to = err.utf8_error().valid_up_to();
                let mut bytes = err.into_bytes();
                self.utf8_carry = bytes.split_off(valid_up_to);
                String::from_utf8(bytes)
                    .map_err(|_| SessionError::Transport("stream is not valid UTF-8".to_string()))
            }
            // An invalid sequence in the middle of a chunk is corrupt
            // transport data.
            Err(_) => Err(SessionError::Transport(
                "stream is not valid UTF-8".to_string(),
            )),
        }
    }
}

impl GenerationSource for HttpGenerationSource {
    async fn next_chunk(&mut self) -> Option<Result<String, SessionError>> {
        let chunk = match self.stream.next().await? {
            Ok(chunk) => chunk,
            Err(err) => return Some(Err(SessionError::Transport(err.to_string()))),
        };

        let mut bytes = std::mem::take(&mut self.utf8_carry);
        bytes.extend_from_slice(&chunk);
        Some(self.take_valid_prefix(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source_from(chunks: Vec<Vec<u8>>) -> HttpGenerationSource {
        HttpGenerationSource::new(Box::pin(futures_util::stream::iter(
            chunks.into_iter().map(Ok),
        )))
    }

    #[tokio::test]
    async fn plain_ascii_chunks_pass_through() {
        let mut source = source_from(vec![b"hello ".to_vec(), b"world".to_vec()]);
        assert_eq!(source.next_chunk().await.unwrap().unwrap(), "hello ");
        assert_eq!(source.next_chunk().await.unwrap().unwrap(), "world");
        assert!(source.next_chunk().await.is_none());
    }

    #[tokio::test]
    async fn multibyte_codepoint_split_across_chunks_is_reassembled() {
        // "é" is 0xC3 0xA9; split it between chunks.
        let mut source = source_from(vec![vec![b'c', b'a', b'f', 0xC3], vec![0xA9, b'!']]);
        assert_eq!(source.next_chunk().await.unwrap().unwrap(), "caf");
        assert_eq!(source.next_chunk().await.unwrap().unwrap(), "é!");
    }

    #[tokio::test]
    async fn four_byte_codepoint_split_across_three_chunks_is_reassembled() {
        // "🍕" is 0xF0 0x9F 0x8D 0x95; spread it over three reads.
        let mut source = source_from(vec![
            vec![b'a', 0xF0],
            vec![0x9F, 0x8D],
            vec![0x95, b'b'],
        ]);
        assert_eq!(source.next_chunk().await.unwrap().unwrap(), "a");
        assert_eq!(source.next_chunk().await.unwrap().unwrap(), "");
        assert_eq!(source.next_chunk().await.unwrap().unwrap(), "🍕b");
    }

    #[tokio::test]
    async fn invalid_utf8_mid_chunk_is_a_transport_error() {
        let mut source = source_from(vec![vec![b'a', 0xFF, b'b']]);
        let err = source.next_chunk().await.unwrap().unwrap_err();
        assert!(matches!(err, SessionError::Transport(_)));
    }

    #[test]
    fn request_body_serializes() {
        let body = GenerationRequest {
            model: "toolforge-composer-1",
            prompt: "build a poll",
            stream: true,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["stream"], serde_json::json!(true));
        assert_eq!(json["model"], serde_json::json!("toolforge-composer-1"));
    }
}
