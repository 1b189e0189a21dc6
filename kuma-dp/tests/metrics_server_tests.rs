//! Metrics endpoint configuration tests.
//!
//! Only the validation paths are exercised here; installing the global
//! recorder would leak into every other test in this binary.

use kuma_dp::metrics_server::{install_metrics_recorder, listen_socket_addr};
use kuma_dp_core::config::MetricsConfig;

fn metrics_config(listen_addr: &str, port: u16, endpoint: &str) -> MetricsConfig {
    MetricsConfig {
        enabled: true,
        listen_addr: listen_addr.to_owned(),
        port,
        endpoint: endpoint.to_owned(),
    }
}

#[test]
fn test_listen_socket_addr_parses_valid_config() {
    let addr = listen_socket_addr(&metrics_config("127.0.0.1", 9902, "/metrics")).unwrap();
    assert_eq!(addr.to_string(), "127.0.0.1:9902");
}

#[test]
fn test_install_metrics_recorder_fails_with_invalid_address() {
    let result = install_metrics_recorder(&metrics_config("999.999.999.999", 9902, "/metrics"));
    assert!(result.is_err());
}

#[test]
fn test_install_metrics_recorder_rejects_unsupported_endpoint() {
    let err = install_metrics_recorder(&metrics_config("127.0.0.1", 9902, "/custom")).unwrap_err();
    assert!(err.to_string().contains("unsupported metrics endpoint"));
}
