//! Benchmarks for the hot parsing paths
//!
//! Run with: cargo bench --bench parsers

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use gusset::*;
use std::hint::black_box;

fn bench_header_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("header_map");

    // Known names resolve to interned statics
    group.bench_function("insert/known", |b| {
        b.iter(|| {
            let mut headers = HeaderMap::new();
            headers
                .insert(black_box("Content-Type"), "text/html")
                .unwrap();
            headers
                .insert(black_box("Content-Length"), "1024")
                .unwrap();
            headers.insert(black_box("Connection"), "keep-alive").unwrap();
            headers
        })
    });

    group.bench_function("insert/custom", |b| {
        b.iter(|| {
            let mut headers = HeaderMap::new();
            headers
                .insert(black_box("X-Request-Trace"), "abc123")
                .unwrap();
            headers
        })
    });

    let mut headers = HeaderMap::new();
    headers.insert("Content-Type", "text/html").unwrap();
    headers.insert("Content-Length", "1024").unwrap();
    headers.insert("Host", "example.com").unwrap();
    headers.insert("Accept-Encoding", "gzip, br").unwrap();

    group.bench_function("get/exact_case", |b| {
        b.iter(|| headers.get(black_box("Content-Type")))
    });

    group.bench_function("get/folded_case", |b| {
        b.iter(|| headers.get(black_box("CONTENT-TYPE")))
    });

    group.finish();
}

fn bench_template_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("template_match");

    let mut matcher = PathTemplateMatcher::new();
    matcher.add("/api/v1/health", 0).unwrap();
    matcher.add("/api/v1/users", 1).unwrap();
    matcher.add("/api/v1/users/{user}", 2).unwrap();
    matcher.add("/api/v1/users/{user}/posts/{post}", 3).unwrap();
    matcher.add("/files/*", 4).unwrap();

    // Static routes short-circuit through the hash lookup
    group.bench_function("static", |b| {
        b.iter(|| matcher.match_path(black_box("/api/v1/health")))
    });

    group.bench_function("single_param", |b| {
        b.iter(|| matcher.match_path(black_box("/api/v1/users/123")))
    });

    group.bench_function("two_params", |b| {
        b.iter(|| matcher.match_path(black_box("/api/v1/users/123/posts/456")))
    });

    group.bench_function("wildcard", |b| {
        b.iter(|| matcher.match_path(black_box("/files/css/site.css")))
    });

    group.bench_function("miss", |b| {
        b.iter(|| matcher.match_path(black_box("/metrics")))
    });

    group.finish();
}

fn bench_canonicalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("canonicalize");

    // Already-canonical paths take the borrowing fast path
    let clean = "/api/v1/users/123/posts";
    group.bench_function("clean", |b| b.iter(|| canonicalize(black_box(clean))));

    let dotted = "/api/./v1/users/../admins/123";
    group.bench_function("dotted", |b| b.iter(|| canonicalize(black_box(dotted))));

    group.finish();
}

fn bench_query_string(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_string");

    let small = "page=1&limit=10&sort=asc";
    group.throughput(Throughput::Bytes(small.len() as u64));
    group.bench_function("small", |b| {
        b.iter(|| parse_query_string(black_box(small)))
    });

    let encoded = "q=rust%20http%20parser&redirect=%2Fdocs%2Fintro&flags=a+b+c";
    group.throughput(Throughput::Bytes(encoded.len() as u64));
    group.bench_function("encoded", |b| {
        b.iter(|| parse_query_string(black_box(encoded)))
    });

    group.finish();
}

fn bench_cookie_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("cookie_parse");

    let options = CookieParseOptions::default();
    let typical = "session=8f4b2c1d9e; theme=dark; locale=en-US; _ga=GA1.2.12345.67890";
    group.throughput(Throughput::Bytes(typical.len() as u64));
    group.bench_function("typical", |b| {
        b.iter(|| parse_request_cookies(black_box(typical), &options))
    });

    let set_cookie = "session=8f4b2c1d9e; Path=/; Max-Age=3600; Secure; HttpOnly; SameSite=Lax";
    group.bench_function("set_cookie", |b| {
        b.iter(|| parse_set_cookie(black_box(set_cookie)))
    });

    group.finish();
}

fn bench_range_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("range");

    group.bench_function("single", |b| {
        b.iter(|| ByteRange::parse(black_box("bytes=0-1023")))
    });

    group.bench_function("multi", |b| {
        b.iter(|| ByteRange::parse(black_box("bytes=0-99,200-299,-100")))
    });

    group.finish();
}

fn bench_negotiation(c: &mut Criterion) {
    let mut group = c.benchmark_group("negotiation");

    let accept_encoding = "br;q=1.0, gzip;q=0.8, deflate;q=0.5, identity;q=0.1, *;q=0";
    group.bench_function("best_match", |b| {
        b.iter(|| {
            best_match(black_box(accept_encoding), |enc| {
                matches!(enc, "gzip" | "identity")
            })
        })
    });

    group.finish();
}

struct Discard;

impl PartVisitor for Discard {
    fn begin_part(&mut self, _headers: &HeaderMap) {}
    fn data(&mut self, _chunk: &[u8]) {}
    fn end_part(&mut self) {}
}

fn bench_multipart(c: &mut Criterion) {
    let mut group = c.benchmark_group("multipart");

    let mut body = Vec::new();
    body.extend_from_slice(b"--edge\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\n");
    body.extend_from_slice(&[b'x'; 4096]);
    body.extend_from_slice(b"\r\n--edge\r\nContent-Disposition: form-data; name=\"b\"\r\n\r\n");
    body.extend_from_slice(&[b'y'; 4096]);
    body.extend_from_slice(b"\r\n--edge--\r\n");

    group.throughput(Throughput::Bytes(body.len() as u64));
    group.bench_function("two_parts/whole", |b| {
        b.iter(|| {
            let mut parser = MultipartParser::new("edge", ParserLimits::default());
            let mut visitor = Discard;
            parser.parse(black_box(&body), &mut visitor).unwrap();
            parser.finish().unwrap();
        })
    });

    group.bench_function("two_parts/chunked", |b| {
        b.iter(|| {
            let mut parser = MultipartParser::new("edge", ParserLimits::default());
            let mut visitor = Discard;
            for chunk in black_box(&body).chunks(512) {
                parser.parse(chunk, &mut visitor).unwrap();
            }
            parser.finish().unwrap();
        })
    });

    group.finish();
}

criterion_group!(
    parser_benches,
    bench_header_map,
    bench_template_matching,
    bench_canonicalize,
    bench_query_string,
    bench_cookie_parsing,
    bench_range_parsing,
    bench_negotiation,
    bench_multipart,
);

criterion_main!(parser_benches);
