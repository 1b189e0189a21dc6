#![no_main]

use libfuzzer_sys::fuzz_target;
use kuma_accesslog_format::{parse_format, HttpAccessLogEntry, TcpAccessLogEntry};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(format) = parse_format(input) else {
        return;
    };

    // 렌더링은 빈 엔트리에서도 패닉하지 않아야 한다
    let _ = format.format_http_log_entry(&HttpAccessLogEntry::default());
    let _ = format.format_tcp_log_entry(&TcpAccessLogEntry::default());

    // 정규 형태는 다시 파싱했을 때 같은 포맷이어야 한다
    let canonical = format.to_string();
    let reparsed = parse_format(&canonical).expect("canonical form must parse");
    assert_eq!(reparsed, format);
});
