//! TLS cipher suite 이름 테이블
//!
//! IANA 코드를 OpenSSL 스타일 이름으로 변환합니다. 테이블에 없는 코드는
//! `0x` 접두사가 붙은 4자리 대문자 16진수로 렌더링합니다.

use crate::entry::TlsVersion;

/// Envoy가 "알 수 없는 cipher"를 표시할 때 쓰는 값
pub const UNKNOWN_CIPHER_SUITE: u32 = 0xFFFF;

/// (IANA 코드, OpenSSL 이름)
const CIPHER_SUITES: &[(u32, &str)] = &[
    (0x0005, "RC4-SHA"),
    (0x000a, "DES-CBC3-SHA"),
    (0x002f, "AES128-SHA"),
    (0x0035, "AES256-SHA"),
    (0x003c, "AES128-SHA256"),
    (0x009c, "AES128-GCM-SHA256"),
    (0x009d, "AES256-GCM-SHA384"),
    (0xc007, "ECDHE-ECDSA-RC4-SHA"),
    (0xc009, "ECDHE-ECDSA-AES128-SHA"),
    (0xc00a, "ECDHE-ECDSA-AES256-SHA"),
    (0xc011, "ECDHE-RSA-RC4-SHA"),
    (0xc012, "ECDHE-RSA-DES-CBC3-SHA"),
    (0xc013, "ECDHE-RSA-AES128-SHA"),
    (0xc014, "ECDHE-RSA-AES256-SHA"),
    (0xc023, "ECDHE-ECDSA-AES128-SHA256"),
    (0xc027, "ECDHE-RSA-AES128-SHA256"),
    (0xc02f, "ECDHE-RSA-AES128-GCM-SHA256"),
    (0xc02b, "ECDHE-ECDSA-AES128-GCM-SHA256"),
    (0xc030, "ECDHE-RSA-AES256-GCM-SHA384"),
    (0xc02c, "ECDHE-ECDSA-AES256-GCM-SHA384"),
    (0xcca8, "ECDHE-RSA-CHACHA20-POLY1305"),
    (0xcca9, "ECDHE-ECDSA-CHACHA20-POLY1305"),
    // TLS 1.3
    (0x1301, "TLS_AES_128_GCM_SHA256"),
    (0x1302, "TLS_AES_256_GCM_SHA384"),
    (0x1303, "TLS_CHACHA20_POLY1305_SHA256"),
];

/// cipher suite 코드의 표시 이름을 반환합니다.
pub fn cipher_suite_name(code: u32) -> String {
    CIPHER_SUITES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| (*name).to_owned())
        .unwrap_or_else(|| format!("0x{code:04X}"))
}

/// TLS 버전 표시 이름. 지정되지 않은 경우 빈 문자열입니다.
pub fn tls_version_name(version: TlsVersion) -> String {
    match version {
        TlsVersion::VersionUnspecified => String::new(),
        TlsVersion::TlsV1 => "TLSv1".to_owned(),
        TlsVersion::TlsV1_1 => "TLSv1.1".to_owned(),
        TlsVersion::TlsV1_2 => "TLSv1.2".to_owned(),
        TlsVersion::TlsV1_3 => "TLSv1.3".to_owned(),
        TlsVersion::Unrecognized(value) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_cipher_suites_use_openssl_names() {
        assert_eq!(cipher_suite_name(0xcca8), "ECDHE-RSA-CHACHA20-POLY1305");
        assert_eq!(cipher_suite_name(0x1301), "TLS_AES_128_GCM_SHA256");
        assert_eq!(cipher_suite_name(0x002f), "AES128-SHA");
    }

    #[test]
    fn unknown_cipher_suite_renders_hex() {
        assert_eq!(cipher_suite_name(0xabcd), "0xABCD");
        assert_eq!(cipher_suite_name(0x0001), "0x0001");
    }

    #[test]
    fn tls_versions() {
        assert_eq!(tls_version_name(TlsVersion::VersionUnspecified), "");
        assert_eq!(tls_version_name(TlsVersion::TlsV1), "TLSv1");
        assert_eq!(tls_version_name(TlsVersion::TlsV1_3), "TLSv1.3");
        assert_eq!(tls_version_name(TlsVersion::Unrecognized(9)), "9");
    }
}
