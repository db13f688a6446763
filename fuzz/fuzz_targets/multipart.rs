//! Fuzz target for the multipart push parser.
//!
//! Feeds the same body whole and in arbitrary chunk sizes; when both runs
//! accept the message they must observe identical parts.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use gusset::{HeaderMap, MultipartParser, ParserLimits, PartVisitor};

/// Arbitrary multipart traffic for fuzzing.
#[derive(Debug, Arbitrary)]
struct FuzzMultipart {
    /// Boundary before sanitizing
    boundary: String,
    /// Raw body bytes
    body: Vec<u8>,
    /// Chunk size for the split run
    chunk: u8,
}

/// Records everything the parser reports.
#[derive(Default, PartialEq, Debug)]
struct Observed {
    parts: Vec<(usize, Vec<u8>)>,
    ended: usize,
}

impl PartVisitor for Observed {
    fn begin_part(&mut self, headers: &HeaderMap) {
        self.parts.push((headers.names_len(), Vec::new()));
    }

    fn data(&mut self, chunk: &[u8]) {
        if let Some(part) = self.parts.last_mut() {
            part.1.extend_from_slice(chunk);
        }
    }

    fn end_part(&mut self) {
        self.ended += 1;
    }
}

fn run_whole(boundary: &str, body: &[u8]) -> Option<Observed> {
    let mut parser = MultipartParser::new(boundary, ParserLimits::default());
    let mut observed = Observed::default();
    parser.parse(body, &mut observed).ok()?;
    parser.finish().ok()?;
    Some(observed)
}

fn run_chunked(boundary: &str, body: &[u8], chunk: usize) -> Option<Observed> {
    let mut parser = MultipartParser::new(boundary, ParserLimits::default());
    let mut observed = Observed::default();
    for piece in body.chunks(chunk) {
        parser.parse(piece, &mut observed).ok()?;
    }
    parser.finish().ok()?;
    Some(observed)
}

fuzz_target!(|data: FuzzMultipart| {
    // Limit body size to keep iterations fast
    if data.body.len() > 64 * 1024 {
        return;
    }

    // Real boundaries never contain CR or LF; restrict to the token-ish
    // alphabet senders actually use
    let boundary: String = data
        .boundary
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        .take(64)
        .collect();
    if boundary.is_empty() {
        return;
    }

    let chunk = data.chunk as usize % 64 + 1;

    // Neither run may panic; agreeing runs must agree on the parts
    let whole = run_whole(&boundary, &data.body);
    let chunked = run_chunked(&boundary, &data.body, chunk);
    if let (Some(whole), Some(chunked)) = (whole, chunked) {
        assert_eq!(whole, chunked);
    }
});
