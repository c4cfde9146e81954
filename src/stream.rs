//! Decoding of the streaming response body.
//!
//! `streamGenerateContent?alt=sse` answers with newline-delimited records:
//!
//! ```text
//! data: {"candidates":[{"content":{"parts":[{"text":"Hel"}]}}]}
//!
//! data: {"candidates":[{"content":{"parts":[{"text":"lo"}]},"finishReason":"STOP"}]}
//! ```
//!
//! Each non-blank line carries one JSON record, usually behind a `data: `
//! prefix; blank lines separate events. Unlike OpenAI-style streams there is
//! no `[DONE]` sentinel, the stream simply ends when the body does.
//!
//! HTTP chunk boundaries fall anywhere, including mid-record or even
//! mid-character, so [`decode_record_stream`] carries the trailing partial
//! line between chunks as raw bytes and converts to text only once a line is
//! complete. Nothing beyond that one line is buffered; the caller
//! backpressures by not polling for the next record until it has consumed
//! the current one.

use std::pin::Pin;

use futures::stream::{self, Stream, StreamExt};

use crate::error::{Error, Result};
use crate::types::GeminiResponse;

/// Prefix of a data line, stripped when present
const DATA_PREFIX: &str = "data: ";

/// A lazy, forward-only sequence of decoded stream records
pub type RecordStream = Pin<Box<dyn Stream<Item = Result<GeminiResponse>> + Send>>;

/// Decode an HTTP response body into a stream of [`GeminiResponse`] records
pub fn decode_record_stream(body: reqwest::Response) -> RecordStream {
    decode_chunks(body.bytes_stream().map(|chunk| chunk.map_err(Error::Http)))
}

/// Split raw body chunks into lines, then decode each non-blank line
///
/// The buffer holds bytes, not text, so a multi-byte character split by a
/// chunk boundary is reassembled before decoding. The `None` sentinel
/// appended after the last chunk flushes a final line that arrived without
/// a trailing newline.
fn decode_chunks<S, B>(chunks: S) -> RecordStream
where
    S: Stream<Item = Result<B>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let records = chunks
        .map(Some)
        .chain(stream::once(futures::future::ready(None)))
        .scan(Vec::new(), |buffer, item| {
            let records = match item {
                Some(Ok(bytes)) => {
                    buffer.extend_from_slice(bytes.as_ref());
                    let mut out = Vec::new();
                    while let Some(newline) = buffer.iter().position(|&byte| byte == b'\n') {
                        let rest = buffer.split_off(newline + 1);
                        let mut line = std::mem::replace(buffer, rest);
                        line.truncate(newline);
                        let line = String::from_utf8_lossy(strip_line_ending(&line));
                        if let Some(record) = decode_line(&line) {
                            out.push(record);
                        }
                    }
                    out
                }
                Some(Err(err)) => vec![Err(err)],
                None => {
                    let line = String::from_utf8_lossy(strip_line_ending(buffer));
                    decode_line(&line).into_iter().collect()
                }
            };
            futures::future::ready(Some(records))
        })
        .flat_map(stream::iter);

    Box::pin(records)
}

/// Strip the carriage-return half of a CRLF terminator, at most one
fn strip_line_ending(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Decode one line; blank lines are event separators and yield nothing
fn decode_line(line: &str) -> Option<Result<GeminiResponse>> {
    if line.is_empty() {
        return None;
    }
    let payload = line.strip_prefix(DATA_PREFIX).unwrap_or(line);
    Some(parse_record(payload))
}

/// Parse one JSON payload; a record without candidates is a protocol error
fn parse_record(payload: &str) -> Result<GeminiResponse> {
    let record: GeminiResponse = serde_json::from_str(payload)?;
    if record.candidates.is_empty() {
        return Err(Error::protocol(format!(
            "expected at least one candidate in stream record: {}",
            payload
        )));
    }
    Ok(record)
}
