//! 포맷 파서 + 렌더러 통합 테스트
//!
//! 하나의 HTTP/TCP 엔트리 쌍에 대해 command operator별 결과를 검증합니다.

use std::collections::HashMap;
use std::time::Duration;

use chrono::DateTime;
use kuma_accesslog_format::entry::{
    Address, CertificateProperties, ConnectionProperties, HttpRequestProperties,
    HttpResponseProperties, HttpVersion, ResponseFlags, SubjectAltName, TlsProperties,
    TlsVersion,
};
use kuma_accesslog_format::{
    AccessLogCommon, AccessLogError, HttpAccessLogEntry, HttpGrpcAccessLogConfig,
    InterpolationVariables, TcpAccessLogEntry, TcpGrpcAccessLogConfig, parse_format,
};

fn common_properties() -> AccessLogCommon {
    AccessLogCommon {
        start_time: DateTime::from_timestamp(1582062737, 987654321),
        time_to_last_rx_byte: Some(Duration::from_millis(57)),
        time_to_first_upstream_rx_byte: Some(Duration::from_millis(102)),
        time_to_last_downstream_tx_byte: Some(Duration::from_millis(123)),
        response_flags: Some(ResponseFlags {
            upstream_connection_failure: true,
            upstream_retry_limit_exceeded: true,
            ..Default::default()
        }),
        downstream_local_address: Some(Address::socket("127.0.0.1", 10000)),
        downstream_remote_address: Some(Address::socket("127.0.0.3", 53165)),
        downstream_direct_remote_address: Some(Address::socket("127.0.0.4", 53166)),
        upstream_cluster: "outbound:backend".to_owned(),
        upstream_local_address: Some(Address::socket("127.0.0.2", 10001)),
        upstream_remote_address: Some(Address::socket("10.0.0.2", 443)),
        upstream_transport_failure_reason: "mystery".to_owned(),
        route_name: "outbound:backend".to_owned(),
        tls_properties: Some(TlsProperties {
            tls_version: TlsVersion::TlsV1_2,
            tls_cipher_suite: Some(0xcca8),
            tls_sni_hostname: "backend.internal".to_owned(),
            local_certificate_properties: Some(CertificateProperties {
                subject_alt_name: vec![SubjectAltName::Uri(
                    "spiffe://default/backend".to_owned(),
                )],
                subject: "CN=backend,OU=IT,O=Webshop,L=San Francisco,ST=California,C=US"
                    .to_owned(),
            }),
            peer_certificate_properties: Some(CertificateProperties {
                subject_alt_name: vec![SubjectAltName::Uri("spiffe://default/web".to_owned())],
                subject: "CN=web,OU=IT,O=Webshop,L=San Francisco,ST=California,C=US".to_owned(),
            }),
            tls_session_id: "b10662bf6bd4e6a068f0910d3d60c50f000355840fea4ce6844626b61c973901"
                .to_owned(),
        }),
    }
}

fn http_example() -> HttpAccessLogEntry {
    HttpAccessLogEntry {
        common_properties: Some(common_properties()),
        protocol_version: HttpVersion::Http11,
        request: Some(HttpRequestProperties {
            scheme: "https".to_owned(),
            authority: "backend.internal:8080".to_owned(),
            path: "/api".to_owned(),
            request_body_bytes: 234,
            ..Default::default()
        }),
        response: Some(HttpResponseProperties {
            response_code: Some(200),
            response_code_details: "response code details".to_owned(),
            response_headers: HashMap::from([
                ("server".to_owned(), "Tomcat".to_owned()),
                ("content-type".to_owned(), "application/json".to_owned()),
            ]),
            response_trailers: HashMap::from([
                ("grpc-status".to_owned(), "14".to_owned()),
                ("grpc-message".to_owned(), "unavailable".to_owned()),
            ]),
            response_body_bytes: 567,
            ..Default::default()
        }),
    }
}

fn tcp_example() -> TcpAccessLogEntry {
    TcpAccessLogEntry {
        common_properties: Some(common_properties()),
        connection_properties: Some(ConnectionProperties {
            received_bytes: 234,
            sent_bytes: 567,
        }),
    }
}

/// (포맷, HTTP 결과, TCP 결과)
fn assert_renders(cases: &[(&str, &str, &str)]) {
    let http = http_example();
    let tcp = tcp_example();
    for (input, expected_http, expected_tcp) in cases {
        let format = parse_format(input).unwrap_or_else(|e| panic!("{input}: {e}"));
        assert_eq!(format.format_http_log_entry(&http), *expected_http, "HTTP {input}");
        assert_eq!(format.format_tcp_log_entry(&tcp), *expected_tcp, "TCP {input}");
    }
}

#[test]
fn literals_and_start_time() {
    assert_renders(&[
        ("", "", ""),
        (
            "text without Envoy command operators",
            "text without Envoy command operators",
            "text without Envoy command operators",
        ),
        ("%START_TIME%", "2020-02-18T21:52:17.987Z", "2020-02-18T21:52:17.987Z"),
        ("%START_TIME()%", "2020-02-18T21:52:17.987Z", "2020-02-18T21:52:17.987Z"),
        (
            "%START_TIME(%Y/%m/%dT%H:%M:%S%z %s)%",
            "2020-02-18T21:52:17.987Z",
            "2020-02-18T21:52:17.987Z",
        ),
        ("%START_TIME(%s.%3f)%", "2020-02-18T21:52:17.987Z", "2020-02-18T21:52:17.987Z"),
    ]);
}

#[test]
fn entry_kind_specific_fields() {
    assert_renders(&[
        ("%BYTES_RECEIVED%", "234", "234"),
        ("%BYTES_SENT%", "567", "567"),
        ("%PROTOCOL%", "HTTP/1.1", "-"),
        ("%RESPONSE_CODE%", "200", "0"),
        ("%RESPONSE_CODE_DETAILS%", "response code details", "-"),
        ("%REQUEST_DURATION%", "57", "-"),
        ("%RESPONSE_DURATION%", "102", "-"),
        ("%RESPONSE_TX_DURATION%", "21", "-"),
        ("%GRPC_STATUS%", "UNAVAILABLE", "-"),
    ]);
}

#[test]
fn common_fields() {
    assert_renders(&[
        ("%UPSTREAM_TRANSPORT_FAILURE_REASON%", "mystery", "mystery"),
        ("%DURATION%", "123", "123"),
        ("%RESPONSE_FLAGS%", "UF,URX", "UF,URX"),
        ("%UPSTREAM_HOST%", "10.0.0.2:443", "10.0.0.2:443"),
        ("%UPSTREAM_CLUSTER%", "outbound:backend", "outbound:backend"),
        ("%UPSTREAM_LOCAL_ADDRESS%", "127.0.0.2:10001", "127.0.0.2:10001"),
        ("%DOWNSTREAM_LOCAL_ADDRESS%", "127.0.0.1:10000", "127.0.0.1:10000"),
        ("%DOWNSTREAM_LOCAL_ADDRESS_WITHOUT_PORT%", "127.0.0.1", "127.0.0.1"),
        ("%DOWNSTREAM_REMOTE_ADDRESS%", "127.0.0.3:53165", "127.0.0.3:53165"),
        ("%DOWNSTREAM_REMOTE_ADDRESS_WITHOUT_PORT%", "127.0.0.3", "127.0.0.3"),
        ("%DOWNSTREAM_DIRECT_REMOTE_ADDRESS%", "127.0.0.4:53166", "127.0.0.4:53166"),
        ("%DOWNSTREAM_DIRECT_REMOTE_ADDRESS_WITHOUT_PORT%", "127.0.0.4", "127.0.0.4"),
        ("%REQUESTED_SERVER_NAME%", "backend.internal", "backend.internal"),
        ("%ROUTE_NAME%", "outbound:backend", "outbound:backend"),
        ("%DOWNSTREAM_PEER_URI_SAN%", "spiffe://default/web", "spiffe://default/web"),
        ("%DOWNSTREAM_LOCAL_URI_SAN%", "spiffe://default/backend", "spiffe://default/backend"),
        (
            "%DOWNSTREAM_PEER_SUBJECT%",
            "CN=web,OU=IT,O=Webshop,L=San Francisco,ST=California,C=US",
            "CN=web,OU=IT,O=Webshop,L=San Francisco,ST=California,C=US",
        ),
        (
            "%DOWNSTREAM_LOCAL_SUBJECT%",
            "CN=backend,OU=IT,O=Webshop,L=San Francisco,ST=California,C=US",
            "CN=backend,OU=IT,O=Webshop,L=San Francisco,ST=California,C=US",
        ),
        (
            "%DOWNSTREAM_TLS_SESSION_ID%",
            "b10662bf6bd4e6a068f0910d3d60c50f000355840fea4ce6844626b61c973901",
            "b10662bf6bd4e6a068f0910d3d60c50f000355840fea4ce6844626b61c973901",
        ),
        (
            "%DOWNSTREAM_TLS_CIPHER%",
            "ECDHE-RSA-CHACHA20-POLY1305",
            "ECDHE-RSA-CHACHA20-POLY1305",
        ),
        ("%DOWNSTREAM_TLS_VERSION%", "TLSv1.2", "TLSv1.2"),
    ]);
}

#[test]
fn header_operators() {
    assert_renders(&[
        ("%REQ()%", "-", "-"),
        ("%REQ():10%", "-", "-"),
        ("%REQ(:authority)%", "backend.internal:8080", "-"),
        ("%REQ(:authority):7%", "backend", "-"),
        ("%REQ(x-missing-header?:authority)%", "backend.internal:8080", "-"),
        ("%REQ(x-missing-header?:AUTHORITY):7%", "backend", "-"),
        ("%REQ(:AUTHORITY?:path):7%", "backend", "-"),
        ("%RESP()%", "-", "-"),
        ("%RESP(server)%", "Tomcat", "-"),
        ("%RESP(server):3%", "Tom", "-"),
        ("%RESP(x-missing-header?SERVER):3%", "Tom", "-"),
        ("%RESP(SERVER?content-type):3%", "Tom", "-"),
        ("%TRAILER()%", "-", "-"),
        ("%TRAILER(grpc-status)%", "14", "-"),
        ("%TRAILER(x-missing-header?GRPC-STATUS):1%", "1", "-"),
        ("%TRAILER(GRPC-STATUS?grpc-message):1%", "1", "-"),
    ]);
}

#[test]
fn stub_and_unsupported_commands() {
    const DM: &str = "UNSUPPORTED_COMMAND(%DYNAMIC_METADATA(NAMESPACE:KEY*):Z%)";
    const FS: &str = "UNSUPPORTED_COMMAND(%FILTER_STATE(KEY):Z%)";
    assert_renders(&[
        ("%DYNAMIC_METADATA()%", DM, DM),
        ("%DYNAMIC_METADATA(com.test.my_filter)%", DM, DM),
        ("%DYNAMIC_METADATA(com.test.my_filter:test_object:inner_key):10%", DM, DM),
        ("%FILTER_STATE(key)%", FS, FS),
        ("%FILTER_STATE(key):10%", FS, FS),
        (
            "%DOWNSTREAM_PEER_FINGERPRINT_256%",
            "UNSUPPORTED_FIELD(DOWNSTREAM_PEER_FINGERPRINT_256)",
            "UNSUPPORTED_FIELD(DOWNSTREAM_PEER_FINGERPRINT_256)",
        ),
        (
            "%DOWNSTREAM_PEER_SERIAL%",
            "UNSUPPORTED_FIELD(DOWNSTREAM_PEER_SERIAL)",
            "UNSUPPORTED_FIELD(DOWNSTREAM_PEER_SERIAL)",
        ),
        (
            "%DOWNSTREAM_PEER_CERT_V_END%",
            "UNSUPPORTED_FIELD(DOWNSTREAM_PEER_CERT_V_END)",
            "UNSUPPORTED_FIELD(DOWNSTREAM_PEER_CERT_V_END)",
        ),
        ("%HOSTNAME%", "UNSUPPORTED_FIELD(HOSTNAME)", "UNSUPPORTED_FIELD(HOSTNAME)"),
    ]);
}

#[test]
fn placeholders_render_as_is_before_interpolation() {
    assert_renders(&[
        ("%KUMA_SOURCE_ADDRESS%", "%KUMA_SOURCE_ADDRESS%", "%KUMA_SOURCE_ADDRESS%"),
        (
            "%KUMA_SOURCE_ADDRESS_WITHOUT_PORT%",
            "%KUMA_SOURCE_ADDRESS_WITHOUT_PORT%",
            "%KUMA_SOURCE_ADDRESS_WITHOUT_PORT%",
        ),
        ("%KUMA_SOURCE_SERVICE%", "%KUMA_SOURCE_SERVICE%", "%KUMA_SOURCE_SERVICE%"),
        (
            "%KUMA_DESTINATION_SERVICE%",
            "%KUMA_DESTINATION_SERVICE%",
            "%KUMA_DESTINATION_SERVICE%",
        ),
    ]);
}

#[test]
fn composite_format() {
    assert_renders(&[(
        r#"[%START_TIME%] "%REQ(:METHOD)% %REQ(X-ENVOY-ORIGINAL-PATH?:PATH)% %PROTOCOL%" %RESPONSE_CODE% %RESPONSE_FLAGS% %BYTES_RECEIVED% %BYTES_SENT% %DURATION% %RESP(X-ENVOY-UPSTREAM-SERVICE-TIME)% "%REQ(X-FORWARDED-FOR)%" "%REQ(USER-AGENT)%" "%REQ(X-REQUEST-ID)%" "%REQ(:AUTHORITY)%""#,
        r#"[2020-02-18T21:52:17.987Z] "- /api HTTP/1.1" 200 UF,URX 234 567 123 - "-" "-" "-" "backend.internal:8080""#,
        r#"[2020-02-18T21:52:17.987Z] "- - -" 0 UF,URX 234 567 123 - "-" "-" "-" "-""#,
    )]);
}

#[test]
fn multi_line_format() {
    let input = "\n[%START_TIME%]\n%RESPONSE_CODE%\n%RESP(X-ENVOY-UPSTREAM-SERVICE-TIME)%\n\"%REQ(:AUTHORITY)%\"\n";
    assert_renders(&[(
        input,
        "\n[2020-02-18T21:52:17.987Z]\n200\n-\n\"backend.internal:8080\"\n",
        "\n[2020-02-18T21:52:17.987Z]\n0\n-\n\"-\"\n",
    )]);
}

#[test]
fn default_format_against_empty_http_entry() {
    let format = parse_format(
        "[%START_TIME%] \"%REQ(:METHOD)% %REQ(X-ENVOY-ORIGINAL-PATH?:PATH)% %PROTOCOL%\" %RESPONSE_CODE% %RESPONSE_FLAGS% %BYTES_RECEIVED% %BYTES_SENT% %DURATION% %RESP(CONTENT-TYPE)%\n",
    )
    .expect("valid");

    assert_eq!(
        format.format_http_log_entry(&HttpAccessLogEntry::default()),
        "[-] \"- - -\" 0 - 0 0 - -\n"
    );
}

#[test]
fn request_method_header() {
    let format = parse_format("%REQ(:method)%").expect("valid");
    let entry = HttpAccessLogEntry {
        request: Some(HttpRequestProperties {
            request_method: kuma_accesslog_format::entry::RequestMethod::Post,
            ..Default::default()
        }),
        ..Default::default()
    };
    assert_eq!(format.format_http_log_entry(&entry), "POST");
}

#[test]
fn invalid_formats_are_rejected() {
    let cases = [
        (
            "text with % character",
            r#"format string is not valid: expected a command operator to start at position 10, instead got: "% character""#,
        ),
        (
            "%REQ:10%",
            r#"format string is not valid: command "%REQ(X?Y):Z%" requires a header and optional alternative header names as its arguments, instead got "%REQ:10%""#,
        ),
        (
            "%TRAILER%",
            r#"format string is not valid: command "%TRAILER(X?Y):Z%" requires a header and optional alternative header names as its arguments, instead got "%TRAILER%""#,
        ),
        (
            "%RESP(header-1?\rheader-2)%",
            "format string is not valid: header name contains a newline in \"%RESP(header-1?\\rheader-2)%\"",
        ),
        (
            "%DYNAMIC_METADATA%",
            r#"format string is not valid: command "%DYNAMIC_METADATA(NAMESPACE:KEY*):Z%" requires a filter namespace and optional path as its arguments, instead got "%DYNAMIC_METADATA%""#,
        ),
        (
            "%FILTER_STATE():10%",
            r#"format string is not valid: command "%FILTER_STATE(KEY):Z%" requires a key as its argument, instead got "%FILTER_STATE():10%""#,
        ),
    ];

    for (input, expected) in cases {
        let err: AccessLogError = parse_format(input).expect_err(input);
        assert_eq!(err.to_string(), expected);
    }
}

#[test]
fn configure_without_arguments_leaves_config_untouched() {
    let format = parse_format("%START_TIME% %PROTOCOL%").expect("valid");

    let mut http = HttpGrpcAccessLogConfig::default();
    format.configure_http_log(&mut http);
    assert_eq!(http, HttpGrpcAccessLogConfig::default());

    let mut tcp = TcpGrpcAccessLogConfig::default();
    format.configure_tcp_log(&mut tcp);
    assert_eq!(tcp, TcpGrpcAccessLogConfig::default());
}

#[test]
fn configure_collects_headers_trailers_and_filter_state() {
    let format = parse_format(
        r#""%REQ(x-missing-header?:AUTHORITY):1%" "%RESP(DATE?server):2%" "%TRAILER(grpc-status?GRPC-MESSAGE):3%" "%DYNAMIC_METADATA(com.test.my_filter:test_object:inner_key):4%" "%FILTER_STATE(filter.state.key):5%""#,
    )
    .expect("valid");

    let mut http = HttpGrpcAccessLogConfig::default();
    format.configure_http_log(&mut http);
    assert_eq!(http.additional_request_headers_to_log, vec!["x-missing-header"]);
    assert_eq!(http.additional_response_headers_to_log, vec!["date", "server"]);
    assert_eq!(
        http.additional_response_trailers_to_log,
        vec!["grpc-status", "grpc-message"]
    );
    assert_eq!(
        http.common_config.expect("common config").filter_state_objects_to_log,
        vec!["filter.state.key"]
    );

    let mut tcp = TcpGrpcAccessLogConfig::default();
    format.configure_tcp_log(&mut tcp);
    assert_eq!(
        tcp.common_config.expect("common config").filter_state_objects_to_log,
        vec!["filter.state.key"]
    );
}

#[test]
fn configure_deduplicates() {
    let format = parse_format(
        r#"
"%REQ(:AUTHORITY):1%" "%REQ(:path):2%" "%REQ(:authority):3%"
"%REQ(CONTENT-TYPE):1%" "%REQ(origin):2%" "%REQ(content-type):3%"
"%RESP(SERVER):1%" "%RESP(content-type):2%" "%RESP(server):3%"
"%TRAILER(GRPC-STATUS):1%" "%TRAILER(grpc-message):2%" "%TRAILER(grpc-status):3%"
"%FILTER_STATE(filter.state.key1):1%" "%FILTER_STATE(filter.state.key2):2%" "%FILTER_STATE(filter.state.key1):3%"
%BYTES_SENT%
%KUMA_SOURCE_SERVICE%
"#,
    )
    .expect("valid");

    let mut http = HttpGrpcAccessLogConfig::default();
    format.configure_http_log(&mut http);
    assert_eq!(http.additional_request_headers_to_log, vec!["content-type", "origin"]);
    assert_eq!(http.additional_response_headers_to_log, vec!["server", "content-type"]);
    assert_eq!(
        http.additional_response_trailers_to_log,
        vec!["grpc-status", "grpc-message"]
    );
    assert_eq!(
        http.common_config.expect("common config").filter_state_objects_to_log,
        vec!["filter.state.key1", "filter.state.key2"]
    );
}

#[test]
fn configure_extends_existing_values() {
    let format = parse_format("%RESP(server)% %RESP(date)%").expect("valid");
    let mut http = HttpGrpcAccessLogConfig {
        additional_response_headers_to_log: vec!["date".to_owned()],
        ..Default::default()
    };
    format.configure_http_log(&mut http);
    assert_eq!(http.additional_response_headers_to_log, vec!["date", "server"]);
}

#[test]
fn canonical_form() {
    let format = parse_format(
        r#"[%START_TIME%] "%REQ(:METHOD)% %REQ(X-ENVOY-ORIGINAL-PATH?:PATH)% %PROTOCOL%" %RESP(X-ENVOY-UPSTREAM-SERVICE-TIME)% "%REQ(:AUTHORITY)%""#,
    )
    .expect("valid");
    assert_eq!(
        format.to_string(),
        r#"[%START_TIME%] "%REQ(:method)% %REQ(x-envoy-original-path?:path)% %PROTOCOL%" %RESP(x-envoy-upstream-service-time)% "%REQ(:authority)%""#
    );

    let input = "\n%START_TIME(%Y/%m/%dT%H:%M:%S%z %s)%\n%RESP(content-type?SERVER):10%\n%TRAILER(PROTOCOL)%\n%DYNAMIC_METADATA(com.test.my_filter:test_object:inner_key):10%\n%FILTER_STATE(filter.state.key):10%\n%HOSTNAME%\n%KUMA_SOURCE_SERVICE%\n";
    let expected = "\n%START_TIME(%Y/%m/%dT%H:%M:%S%z %s)%\n%RESP(content-type?server):10%\n%TRAILER(protocol)%\n%DYNAMIC_METADATA(com.test.my_filter:test_object:inner_key):10%\n%FILTER_STATE(filter.state.key):10%\n%HOSTNAME%\n%KUMA_SOURCE_SERVICE%\n";
    let format = parse_format(input).expect("valid");
    assert_eq!(format.to_string(), expected);
    assert_eq!(parse_format(expected).expect("valid"), format);
}

#[test]
fn interpolate_with_full_and_empty_context() {
    let format = parse_format(
        "\n%START_TIME%\n%KUMA_SOURCE_ADDRESS%\n%DURATION%\n%KUMA_SOURCE_ADDRESS_WITHOUT_PORT%\n%BYTES_RECEIVED%\n%KUMA_SOURCE_SERVICE%\n%BYTES_SENT%\n%KUMA_DESTINATION_SERVICE%\n%PROTOCOL%\n",
    )
    .expect("valid");

    let empty = format.interpolate(&InterpolationVariables::new());
    assert_eq!(
        empty.to_string(),
        "\n%START_TIME%\n\n%DURATION%\n\n%BYTES_RECEIVED%\n\n%BYTES_SENT%\n\n%PROTOCOL%\n"
    );

    let variables: InterpolationVariables = [
        ("KUMA_SOURCE_ADDRESS", "10.0.0.3:0"),
        ("KUMA_SOURCE_ADDRESS_WITHOUT_PORT", "10.0.0.3"),
        ("KUMA_SOURCE_SERVICE", "web"),
        ("KUMA_DESTINATION_SERVICE", "backend"),
    ]
    .into_iter()
    .collect();
    let full = format.interpolate(&variables);
    assert_eq!(
        full.to_string(),
        "\n%START_TIME%\n10.0.0.3:0\n%DURATION%\n10.0.0.3\n%BYTES_RECEIVED%\nweb\n%BYTES_SENT%\nbackend\n%PROTOCOL%\n"
    );
}
