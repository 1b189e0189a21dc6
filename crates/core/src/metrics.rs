//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 크레이트는 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`
//! 매크로를 호출합니다. 레코더가 설치되지 않았으면 호출은 no-op입니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `kuma_dp_`
//! - 서브시스템: `access_log_`
//! - 접미어: `_total` (counter), `_seconds`, 없음 (gauge)

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 드롭 사유 레이블 키 (malformed, connect, send, too_large)
pub const LABEL_REASON: &str = "reason";

/// 엔트리 종류 레이블 키 (http, tcp)
pub const LABEL_ENTRY_KIND: &str = "kind";

// ─── 드롭 사유 값 ──────────────────────────────────────────────────

/// 레코드 형식이 `address;message`도 JSON 봉투도 아님
pub const DROP_REASON_MALFORMED: &str = "malformed";

/// 목적지 연결 실패
pub const DROP_REASON_CONNECT: &str = "connect";

/// 목적지 전송 실패
pub const DROP_REASON_SEND: &str = "send";

/// 최대 레코드 크기 초과
pub const DROP_REASON_TOO_LARGE: &str = "too_large";

// ─── Access Log 메트릭 ──────────────────────────────────────────────

/// Access Log: 로컬 전송 계층에서 읽은 레코드 수 (counter)
pub const ACCESS_LOG_RECORDS_RECEIVED_TOTAL: &str = "kuma_dp_access_log_records_received_total";

/// Access Log: 목적지로 전달된 레코드 수 (counter)
pub const ACCESS_LOG_RECORDS_FORWARDED_TOTAL: &str = "kuma_dp_access_log_records_forwarded_total";

/// Access Log: 드롭된 레코드 수 (counter, label: reason)
pub const ACCESS_LOG_RECORDS_DROPPED_TOTAL: &str = "kuma_dp_access_log_records_dropped_total";

/// Access Log: 목적지 연결 실패 수 (counter)
pub const ACCESS_LOG_CONNECT_FAILURES_TOTAL: &str = "kuma_dp_access_log_connect_failures_total";

/// Access Log: 현재 등록된 Sender 수 (gauge)
pub const ACCESS_LOG_ACTIVE_SENDERS: &str = "kuma_dp_access_log_active_senders";

/// Access Log: 수락한 구조화 로그 스트림 수 (counter)
pub const ACCESS_LOG_STREAMS_TOTAL: &str = "kuma_dp_access_log_streams_total";

/// Access Log: 에러로 종료된 구조화 로그 스트림 수 (counter)
pub const ACCESS_LOG_STREAM_ERRORS_TOTAL: &str = "kuma_dp_access_log_stream_errors_total";

// ─── Daemon 메트릭 ──────────────────────────────────────────────────

/// Daemon: 가동 시간 (gauge, 초)
pub const DAEMON_UPTIME_SECONDS: &str = "kuma_dp_uptime_seconds";

/// Daemon: 등록된 컴포넌트 수 (gauge)
pub const DAEMON_COMPONENTS_REGISTERED: &str = "kuma_dp_components_registered";

/// Daemon: 빌드 정보 (gauge, 항상 1, label: version)
pub const DAEMON_BUILD_INFO: &str = "kuma_dp_build_info";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge};

    describe_counter!(
        ACCESS_LOG_RECORDS_RECEIVED_TOTAL,
        "Total number of access log records read from the local transport"
    );
    describe_counter!(
        ACCESS_LOG_RECORDS_FORWARDED_TOTAL,
        "Total number of access log records written to a destination"
    );
    describe_counter!(
        ACCESS_LOG_RECORDS_DROPPED_TOTAL,
        "Total number of access log records dropped, by reason"
    );
    describe_counter!(
        ACCESS_LOG_CONNECT_FAILURES_TOTAL,
        "Total number of failed connection attempts to log destinations"
    );
    describe_gauge!(
        ACCESS_LOG_ACTIVE_SENDERS,
        "Number of open log destination connections"
    );
    describe_counter!(
        ACCESS_LOG_STREAMS_TOTAL,
        "Total number of structured access log streams accepted"
    );
    describe_counter!(
        ACCESS_LOG_STREAM_ERRORS_TOTAL,
        "Total number of structured access log streams closed with an error"
    );

    describe_gauge!(DAEMON_UPTIME_SECONDS, "kuma-dp uptime in seconds");
    describe_gauge!(
        DAEMON_COMPONENTS_REGISTERED,
        "Number of components registered in kuma-dp"
    );
    describe_gauge!(
        DAEMON_BUILD_INFO,
        "Build information (always 1, with version label)"
    );
}
