//! MIME Multipart Push Parser
//!
//! An incremental parser for `multipart/form-data` and `multipart/mixed`
//! bodies. Input arrives in arbitrary chunks; the parser drives a
//! [`PartVisitor`] with part headers and decoded body bytes as soon as they
//! can be confirmed, carrying any straddled delimiter across calls.
//!
//! Part bodies declared `Content-Transfer-Encoding: base64` or
//! `quoted-printable` are decoded before reaching the visitor.
//!
//! ## Example
//!
//! ```rust
//! use gusset::multipart::{boundary_from_content_type, MultipartParser, ParserLimits, PartVisitor};
//! use gusset::HeaderMap;
//!
//! struct Collect {
//!     body: Vec<u8>,
//! }
//!
//! impl PartVisitor for Collect {
//!     fn begin_part(&mut self, _headers: &HeaderMap) {}
//!     fn data(&mut self, chunk: &[u8]) {
//!         self.body.extend_from_slice(chunk);
//!     }
//!     fn end_part(&mut self) {}
//! }
//!
//! let boundary = boundary_from_content_type("multipart/form-data; boundary=xyz").unwrap();
//! let mut parser = MultipartParser::new(&boundary, ParserLimits::default());
//! let mut visitor = Collect { body: Vec::new() };
//!
//! parser
//!     .parse(
//!         b"--xyz\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\nhi\r\n--xyz--",
//!         &mut visitor,
//!     )
//!     .unwrap();
//! parser.finish().unwrap();
//! assert_eq!(visitor.body, b"hi");
//! ```

use compact_str::CompactString;
use memchr::memmem;

use crate::buffer::{self, BufferClass, PooledBuffer};
use crate::encoding;
use crate::error::{Error, Result};
use crate::header_map::HeaderMap;

/// Spaces or tabs tolerated between a boundary and its line ending.
/// A longer run means the line is content, not a delimiter.
const MAX_TRANSPORT_PADDING: usize = 256;

// ============================================================================
// Visitor
// ============================================================================

/// Callbacks driven by [`MultipartParser`] as parts stream through.
///
/// `data` fires any number of times per part, zero included for an empty
/// body. Chunk boundaries carry no meaning.
pub trait PartVisitor {
    /// The headers of a new part are complete.
    fn begin_part(&mut self, headers: &HeaderMap);

    /// Decoded body bytes for the current part.
    fn data(&mut self, chunk: &[u8]);

    /// The current part's body is complete.
    fn end_part(&mut self);
}

// ============================================================================
// Limits
// ============================================================================

/// Bounds on per-part header blocks.
#[derive(Debug, Clone)]
pub struct ParserLimits {
    /// Upper bound on one part's header block, in bytes.
    pub max_header_block: usize,
    /// Upper bound on the number of headers in one part.
    pub max_headers: usize,
}

impl Default for ParserLimits {
    fn default() -> Self {
        Self {
            max_header_block: 16 * 1024,
            max_headers: 64,
        }
    }
}

// ============================================================================
// Boundary extraction
// ============================================================================

/// Pull the boundary parameter out of a `Content-Type` header.
///
/// Accepts bare and quoted forms; returns `None` when the media type is not
/// `multipart/*` or no usable boundary is present.
pub fn boundary_from_content_type(content_type: &str) -> Option<CompactString> {
    let media = content_type.trim_start();
    if media.len() < 10 || !media.as_bytes()[..10].eq_ignore_ascii_case(b"multipart/") {
        return None;
    }

    // Boundary characters exclude ';', so parameter splitting is safe even
    // against quoted values.
    for param in media.split(';').skip(1) {
        let Some((name, value)) = param.split_once('=') else {
            continue;
        };
        if !name.trim().eq_ignore_ascii_case("boundary") {
            continue;
        }
        let value = value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value);
        if value.is_empty() {
            return None;
        }
        return Some(CompactString::new(value));
    }
    None
}

// ============================================================================
// Parser
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Discarding everything before the first delimiter.
    Preamble,
    /// Accumulating a part's header block up to its blank line.
    PartHeaders,
    /// Streaming a part's body until the next delimiter.
    PartData,
    /// Past the close delimiter; all further input is ignored.
    Epilogue,
}

/// Outcome of checking the bytes after a matched `CRLF--boundary`.
enum TailDecision {
    /// Padding then CRLF: a part follows. `tail` is the padding plus CRLF.
    NextPart { tail: usize },
    /// `--`: the close delimiter.
    Close,
    /// Ran out of bytes before deciding.
    NeedMore,
    /// Something else follows, so the match was content, not a delimiter.
    NotDelimiter,
}

/// What a scan of the carry buffer produced.
enum Scan {
    /// A confirmed delimiter. Bytes before `data_end` are payload; `resume`
    /// is the offset just past the delimiter line.
    Delimiter {
        data_end: usize,
        resume: usize,
        close: bool,
    },
    /// No confirmed delimiter yet; bytes before `data_end` are safe to
    /// release, the rest could still become one.
    Partial { data_end: usize },
}

/// Incremental multipart parser.
///
/// Feed raw body bytes to [`parse`](Self::parse) in whatever chunks the
/// transport delivers, then call [`finish`](Self::finish) at end of stream
/// to verify the close delimiter arrived.
pub struct MultipartParser {
    /// `CRLF--boundary`, the canonical delimiter prefix.
    delimiter: Vec<u8>,
    finder: memmem::Finder<'static>,
    state: State,
    carry: PooledBuffer,
    decoder: PartDecoder,
    limits: ParserLimits,
}

impl MultipartParser {
    /// Create a parser for `boundary` (without the leading `--`).
    pub fn new(boundary: &str, limits: ParserLimits) -> Self {
        let mut delimiter = Vec::with_capacity(boundary.len() + 4);
        delimiter.extend_from_slice(b"\r\n--");
        delimiter.extend_from_slice(boundary.as_bytes());
        let finder = memmem::Finder::new(&delimiter).into_owned();

        // A delimiter at the very start of the stream has no leading CRLF;
        // seeding the carry with one lets the same search cover it.
        let mut carry = buffer::acquire(BufferClass::Small);
        carry.extend_from_slice(b"\r\n");

        Self {
            delimiter,
            finder,
            state: State::Preamble,
            carry,
            decoder: PartDecoder::default(),
            limits,
        }
    }

    /// Whether the close delimiter has been seen.
    #[inline]
    pub fn complete(&self) -> bool {
        self.state == State::Epilogue
    }

    /// Feed the next chunk of body bytes.
    ///
    /// Chunks may split the message anywhere, including mid-delimiter. The
    /// visitor observes each part exactly once regardless of chunking.
    pub fn parse<V: PartVisitor>(&mut self, data: &[u8], visitor: &mut V) -> Result<()> {
        if self.state == State::Epilogue {
            return Ok(());
        }
        self.carry.extend_from_slice(data);

        loop {
            match self.state {
                State::Preamble => match self.scan_delimiter() {
                    Scan::Delimiter { close: true, .. } => {
                        self.enter_epilogue();
                        return Ok(());
                    }
                    Scan::Delimiter { resume, .. } => {
                        self.consume(resume);
                        self.state = State::PartHeaders;
                    }
                    Scan::Partial { data_end } => {
                        self.consume(data_end);
                        return Ok(());
                    }
                },
                State::PartHeaders => match self.parse_part_headers()? {
                    Some((headers, consumed)) => {
                        self.decoder.reset(transfer_encoding(&headers));
                        visitor.begin_part(&headers);
                        self.consume(consumed);
                        self.state = State::PartData;
                    }
                    None => {
                        if self.carry.len() > self.limits.max_header_block {
                            return Err(Error::LimitExceeded(format!(
                                "part header block exceeds {} bytes",
                                self.limits.max_header_block
                            )));
                        }
                        return Ok(());
                    }
                },
                State::PartData => match self.scan_delimiter() {
                    Scan::Delimiter {
                        data_end,
                        resume,
                        close,
                    } => {
                        self.decoder.push(&self.carry[..data_end], visitor)?;
                        self.decoder.finish(visitor)?;
                        visitor.end_part();
                        if close {
                            self.enter_epilogue();
                            return Ok(());
                        }
                        self.consume(resume);
                        self.state = State::PartHeaders;
                    }
                    Scan::Partial { data_end } => {
                        if data_end > 0 {
                            self.decoder.push(&self.carry[..data_end], visitor)?;
                            self.consume(data_end);
                        }
                        return Ok(());
                    }
                },
                State::Epilogue => return Ok(()),
            }
        }
    }

    /// Signal end of stream.
    ///
    /// Fails with [`Error::MalformedMultipart`] if the close delimiter never
    /// arrived.
    pub fn finish(&mut self) -> Result<()> {
        if self.state == State::Epilogue {
            Ok(())
        } else {
            Err(Error::MalformedMultipart(
                "message ended before the close delimiter".into(),
            ))
        }
    }

    fn enter_epilogue(&mut self) {
        self.carry.clear();
        self.state = State::Epilogue;
    }

    #[inline]
    fn consume(&mut self, n: usize) {
        bytes::Buf::advance(&mut *self.carry, n);
    }

    /// Search the carry for the next confirmed delimiter.
    ///
    /// A matched `CRLF--boundary` only counts once the bytes after it prove
    /// it out; a match followed by other content stays content.
    fn scan_delimiter(&self) -> Scan {
        let haystack = &self.carry[..];
        let mut search_from = 0;

        while let Some(rel) = self.finder.find(&haystack[search_from..]) {
            let pos = search_from + rel;
            let after = pos + self.delimiter.len();
            match classify_tail(&haystack[after..]) {
                TailDecision::NextPart { tail } => {
                    return Scan::Delimiter {
                        data_end: pos,
                        resume: after + tail,
                        close: false,
                    };
                }
                TailDecision::Close => {
                    return Scan::Delimiter {
                        data_end: pos,
                        resume: haystack.len(),
                        close: true,
                    };
                }
                TailDecision::NeedMore => {
                    return Scan::Partial { data_end: pos };
                }
                // The delimiter cannot restart inside its own match: the
                // boundary alphabet excludes CR and LF.
                TailDecision::NotDelimiter => search_from = pos + 1,
            }
        }

        let keep = suffix_overlap(haystack, &self.delimiter);
        Scan::Partial {
            data_end: haystack.len() - keep,
        }
    }

    /// Try to complete the current part's header block.
    ///
    /// Returns the parsed headers and the bytes consumed through the blank
    /// line, or `None` when more input is needed.
    fn parse_part_headers(&self) -> Result<Option<(HeaderMap, usize)>> {
        let mut slots = vec![httparse::EMPTY_HEADER; self.limits.max_headers];
        match httparse::parse_headers(&self.carry, &mut slots) {
            Ok(httparse::Status::Complete((consumed, parsed))) => {
                if consumed > self.limits.max_header_block {
                    return Err(Error::LimitExceeded(format!(
                        "part header block exceeds {} bytes",
                        self.limits.max_header_block
                    )));
                }
                let mut headers = HeaderMap::new();
                for header in parsed {
                    let value = std::str::from_utf8(header.value).map_err(|_| {
                        Error::MalformedMultipart("part header value is not UTF-8".into())
                    })?;
                    headers.append(header.name, value)?;
                }
                Ok(Some((headers, consumed)))
            }
            Ok(httparse::Status::Partial) => Ok(None),
            Err(httparse::Error::TooManyHeaders) => Err(Error::LimitExceeded(format!(
                "part carries more than {} headers",
                self.limits.max_headers
            ))),
            Err(e) => Err(Error::MalformedMultipart(format!(
                "invalid part headers: {e}"
            ))),
        }
    }
}

impl std::fmt::Debug for MultipartParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultipartParser")
            .field("state", &self.state)
            .field("carried", &self.carry.len())
            .finish()
    }
}

/// Decide what the bytes after a matched `CRLF--boundary` make of it.
fn classify_tail(after: &[u8]) -> TailDecision {
    let mut i = 0;
    while i < after.len() && matches!(after[i], b' ' | b'\t') {
        if i > MAX_TRANSPORT_PADDING {
            return TailDecision::NotDelimiter;
        }
        i += 1;
    }
    match (after.get(i), after.get(i + 1)) {
        (Some(b'-'), Some(b'-')) => TailDecision::Close,
        (Some(b'\r'), Some(b'\n')) => TailDecision::NextPart { tail: i + 2 },
        (None, _) | (Some(b'-'), None) | (Some(b'\r'), None) => TailDecision::NeedMore,
        _ => TailDecision::NotDelimiter,
    }
}

/// Longest prefix of `needle` sitting at the end of `haystack`.
fn suffix_overlap(haystack: &[u8], needle: &[u8]) -> usize {
    let max = haystack.len().min(needle.len() - 1);
    for k in (1..=max).rev() {
        if haystack[haystack.len() - k..] == needle[..k] {
            return k;
        }
    }
    0
}

// ============================================================================
// Content-Transfer-Encoding
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum PartEncoding {
    #[default]
    Identity,
    Base64,
    QuotedPrintable,
}

fn transfer_encoding(headers: &HeaderMap) -> PartEncoding {
    match headers.get("content-transfer-encoding") {
        Some(value) => {
            let value = value.trim();
            if value.eq_ignore_ascii_case("base64") {
                PartEncoding::Base64
            } else if value.eq_ignore_ascii_case("quoted-printable") {
                PartEncoding::QuotedPrintable
            } else {
                PartEncoding::Identity
            }
        }
        None => PartEncoding::Identity,
    }
}

/// Streams body bytes through the part's declared transfer encoding.
///
/// Base64 holds back up to three unfinished alphabet characters;
/// quoted-printable holds back a trailing `=` or `=X` partial escape.
#[derive(Default)]
struct PartDecoder {
    encoding: PartEncoding,
    pending: Vec<u8>,
}

impl PartDecoder {
    fn reset(&mut self, encoding: PartEncoding) {
        self.encoding = encoding;
        self.pending.clear();
    }

    fn push<V: PartVisitor>(&mut self, chunk: &[u8], visitor: &mut V) -> Result<()> {
        if chunk.is_empty() {
            return Ok(());
        }
        match self.encoding {
            PartEncoding::Identity => {
                visitor.data(chunk);
            }
            PartEncoding::Base64 => {
                self.pending.extend(
                    chunk
                        .iter()
                        .copied()
                        .filter(|&b| !encoding::is_transport_whitespace(b)),
                );
                let whole = self.pending.len() - self.pending.len() % 4;
                if whole > 0 {
                    let decoded = encoding::decode_base64(&self.pending[..whole])?;
                    if !decoded.is_empty() {
                        visitor.data(&decoded);
                    }
                    self.pending.drain(..whole);
                }
            }
            PartEncoding::QuotedPrintable => {
                self.pending.extend_from_slice(chunk);
                let held = qp_partial_tail(&self.pending);
                let safe = self.pending.len() - held;
                if safe > 0 {
                    let decoded = encoding::decode_quoted_printable(&self.pending[..safe]);
                    if !decoded.is_empty() {
                        visitor.data(&decoded);
                    }
                    self.pending.drain(..safe);
                }
            }
        }
        Ok(())
    }

    fn finish<V: PartVisitor>(&mut self, visitor: &mut V) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let tail = std::mem::take(&mut self.pending);
        let decoded = match self.encoding {
            PartEncoding::Identity => tail,
            PartEncoding::Base64 => encoding::decode_base64(&tail)?,
            PartEncoding::QuotedPrintable => encoding::decode_quoted_printable(&tail),
        };
        if !decoded.is_empty() {
            visitor.data(&decoded);
        }
        Ok(())
    }
}

/// Bytes at the end of `buf` that could open a quoted-printable escape.
fn qp_partial_tail(buf: &[u8]) -> usize {
    if buf.len() >= 2 && buf[buf.len() - 2] == b'=' {
        2
    } else if buf.last() == Some(&b'=') {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Collector {
        parts: Vec<(HeaderMap, Vec<u8>)>,
        ended: usize,
    }

    impl PartVisitor for Collector {
        fn begin_part(&mut self, headers: &HeaderMap) {
            self.parts.push((headers.clone(), Vec::new()));
        }

        fn data(&mut self, chunk: &[u8]) {
            self.parts
                .last_mut()
                .expect("data before begin_part")
                .1
                .extend_from_slice(chunk);
        }

        fn end_part(&mut self) {
            self.ended += 1;
        }
    }

    fn parse_whole(boundary: &str, message: &[u8]) -> Result<Collector> {
        let mut parser = MultipartParser::new(boundary, ParserLimits::default());
        let mut collector = Collector::default();
        parser.parse(message, &mut collector)?;
        parser.finish()?;
        Ok(collector)
    }

    #[test]
    fn test_boundary_from_content_type() {
        assert_eq!(
            boundary_from_content_type("multipart/form-data; boundary=----abc123").as_deref(),
            Some("----abc123")
        );
        assert_eq!(
            boundary_from_content_type("multipart/mixed; charset=utf-8; boundary=\"a b\"")
                .as_deref(),
            Some("a b")
        );
        assert_eq!(
            boundary_from_content_type("Multipart/Form-Data; BOUNDARY=x").as_deref(),
            Some("x")
        );
        assert_eq!(boundary_from_content_type("text/plain; boundary=x"), None);
        assert_eq!(boundary_from_content_type("multipart/form-data"), None);
        assert_eq!(
            boundary_from_content_type("multipart/form-data; boundary="),
            None
        );
    }

    #[test]
    fn test_single_part() {
        let message = b"--b\r\n\
            Content-Disposition: form-data; name=\"field1\"\r\n\
            \r\n\
            value1\r\n\
            --b--\r\n";
        let collector = parse_whole("b", message).unwrap();

        assert_eq!(collector.parts.len(), 1);
        assert_eq!(collector.ended, 1);
        let (headers, body) = &collector.parts[0];
        assert_eq!(
            headers.get("content-disposition"),
            Some("form-data; name=\"field1\"")
        );
        assert_eq!(body, b"value1");
    }

    #[test]
    fn test_preamble_and_two_parts() {
        let message = b"this preamble is discarded\r\n\
            --b\r\n\
            Content-Disposition: form-data; name=\"a\"\r\n\
            \r\n\
            first\r\n\
            --b\r\n\
            Content-Disposition: form-data; name=\"b\"\r\n\
            \r\n\
            second body\r\nwith a line break\r\n\
            --b--";
        let collector = parse_whole("b", message).unwrap();

        assert_eq!(collector.parts.len(), 2);
        assert_eq!(collector.parts[0].1, b"first");
        assert_eq!(collector.parts[1].1, b"second body\r\nwith a line break");
    }

    #[test]
    fn test_byte_at_a_time_matches_whole() {
        let message: &[u8] = b"--bound\r\n\
            Content-Type: text/plain\r\n\
            X-Extra: yes\r\n\
            \r\n\
            split me anywhere\r\n\
            --bound \t\r\n\
            \r\n\
            headerless part\r\n\
            --bound--\r\ntrailing epilogue ignored";
        let whole = parse_whole("bound", message).unwrap();

        let mut parser = MultipartParser::new("bound", ParserLimits::default());
        let mut dribble = Collector::default();
        for chunk in message.chunks(1) {
            parser.parse(chunk, &mut dribble).unwrap();
        }
        parser.finish().unwrap();

        assert_eq!(whole.parts.len(), 2);
        assert_eq!(dribble.parts.len(), 2);
        for (a, b) in whole.parts.iter().zip(dribble.parts.iter()) {
            assert_eq!(a.1, b.1);
        }
        assert_eq!(whole.parts[1].0.names_len(), 0);
        assert_eq!(whole.parts[1].1, b"headerless part");
    }

    #[test]
    fn test_base64_part_split_mid_group() {
        let mut parser = MultipartParser::new("b", ParserLimits::default());
        let mut collector = Collector::default();

        parser
            .parse(
                b"--b\r\nContent-Transfer-Encoding: base64\r\n\r\naGVs",
                &mut collector,
            )
            .unwrap();
        parser.parse(b"bG8=\r\n--b--", &mut collector).unwrap();
        parser.finish().unwrap();

        assert_eq!(collector.parts.len(), 1);
        assert_eq!(collector.parts[0].1, b"hello");
    }

    #[test]
    fn test_base64_part_with_folded_lines() {
        let message = b"--b\r\n\
            Content-Transfer-Encoding: BASE64\r\n\
            \r\n\
            aGVsbG8g\r\n\
            d29ybGQ=\r\n\
            --b--";
        let collector = parse_whole("b", message).unwrap();
        assert_eq!(collector.parts[0].1, b"hello world");
    }

    #[test]
    fn test_quoted_printable_part() {
        let message = b"--b\r\n\
            Content-Transfer-Encoding: quoted-printable\r\n\
            \r\n\
            he=6Clo=\r\n\
            world\r\n\
            --b--";
        let collector = parse_whole("b", message).unwrap();
        // =6C decodes, =CRLF is a soft break.
        assert_eq!(collector.parts[0].1, b"helloworld");
    }

    #[test]
    fn test_zero_length_part() {
        let message = b"--b\r\n\
            Content-Disposition: form-data; name=\"empty\"\r\n\
            \r\n\
            \r\n\
            --b--";
        let collector = parse_whole("b", message).unwrap();
        assert_eq!(collector.parts.len(), 1);
        assert_eq!(collector.parts[0].1, b"");
    }

    #[test]
    fn test_cr_split_across_chunks_stays_in_body() {
        let mut parser = MultipartParser::new("b", ParserLimits::default());
        let mut collector = Collector::default();

        parser.parse(b"--b\r\n\r\nabc\r", &mut collector).unwrap();
        parser.parse(b"\ndef\r\n--b--", &mut collector).unwrap();
        parser.finish().unwrap();

        assert_eq!(collector.parts[0].1, b"abc\r\ndef");
    }

    #[test]
    fn test_boundary_prefix_inside_body_is_content() {
        // "--bx" shares a prefix with the delimiter but is body content.
        let message = b"--b\r\n\r\ndata\r\n--bx more\r\n--b--";
        let collector = parse_whole("b", message).unwrap();
        assert_eq!(collector.parts[0].1, b"data\r\n--bx more");
    }

    #[test]
    fn test_missing_close_delimiter() {
        let mut parser = MultipartParser::new("b", ParserLimits::default());
        let mut collector = Collector::default();
        parser
            .parse(b"--b\r\n\r\nbody without end", &mut collector)
            .unwrap();
        assert!(!parser.complete());
        assert!(matches!(
            parser.finish(),
            Err(Error::MalformedMultipart(_))
        ));
    }

    #[test]
    fn test_header_block_limit() {
        let limits = ParserLimits {
            max_header_block: 32,
            ..ParserLimits::default()
        };
        let mut parser = MultipartParser::new("b", limits);
        let mut collector = Collector::default();

        let mut message = b"--b\r\nX-Long: ".to_vec();
        message.extend(std::iter::repeat_n(b'a', 100));
        let err = parser.parse(&message, &mut collector).unwrap_err();
        assert!(matches!(err, Error::LimitExceeded(_)));
    }

    #[test]
    fn test_header_count_limit() {
        let limits = ParserLimits {
            max_headers: 2,
            ..ParserLimits::default()
        };
        let mut parser = MultipartParser::new("b", limits);
        let mut collector = Collector::default();

        let err = parser
            .parse(b"--b\r\nA: 1\r\nB: 2\r\nC: 3\r\n\r\nx\r\n--b--", &mut collector)
            .unwrap_err();
        assert!(matches!(err, Error::LimitExceeded(_)));
    }

    #[test]
    fn test_input_after_close_is_ignored() {
        let mut parser = MultipartParser::new("b", ParserLimits::default());
        let mut collector = Collector::default();
        parser.parse(b"--b\r\n\r\nx\r\n--b--\r\n", &mut collector).unwrap();
        assert!(parser.complete());

        parser.parse(b"--b\r\n\r\nghost\r\n--b--", &mut collector).unwrap();
        assert_eq!(collector.parts.len(), 1);
    }
}
