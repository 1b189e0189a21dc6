#![no_main]

use std::collections::HashMap;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use kuma_accesslog_format::entry::{HttpRequestProperties, HttpResponseProperties};
use kuma_accesslog_format::{parse_format, HttpAccessLogEntry};

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    /// 포맷 문자열
    format: String,
    path: String,
    authority: String,
    request_headers: Vec<(String, String)>,
    response_headers: Vec<(String, String)>,
    response_trailers: Vec<(String, String)>,
    response_code: Option<u32>,
    request_body_bytes: u64,
}

fuzz_target!(|input: FuzzInput| {
    let Ok(format) = parse_format(&input.format) else {
        return;
    };

    // 헤더 수 제한 (퍼징 성능)
    let lowercase = |pairs: Vec<(String, String)>| -> HashMap<String, String> {
        pairs
            .into_iter()
            .take(16)
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect()
    };

    let entry = HttpAccessLogEntry {
        request: Some(HttpRequestProperties {
            path: input.path,
            authority: input.authority,
            request_body_bytes: input.request_body_bytes,
            request_headers: lowercase(input.request_headers),
            ..Default::default()
        }),
        response: Some(HttpResponseProperties {
            response_code: input.response_code,
            response_headers: lowercase(input.response_headers),
            response_trailers: lowercase(input.response_trailers),
            ..Default::default()
        }),
        ..Default::default()
    };

    // 빈 조각은 항상 "-"로 치환되므로, fragment가 있으면 결과도 비어 있지 않다
    let rendered = format.format_http_log_entry(&entry);
    if !format.is_empty() {
        assert!(!rendered.is_empty());
    }
});
