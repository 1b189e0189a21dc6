//! named pipe 레코드 파싱
//!
//! Envoy는 한 줄에 하나의 레코드를 기록합니다. 두 가지 형태를 받습니다.
//!
//! - JSON 봉투: `{"address":"10.0.0.1:9999","message":"..."}`
//! - 레거시 텍스트: `10.0.0.1:9999;...`
//!
//! JSON을 먼저 시도하고, 실패하면 첫 번째 `;`에서 나눕니다.
//! 전달되는 메시지는 원래 줄의 개행 문자를 유지합니다.

use bytes::Bytes;
use serde::Deserialize;

/// 목적지 주소와 전달할 메시지 바이트
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipeRecord {
    /// 목적지 주소 (host:port)
    pub address: String,
    /// 목적지로 그대로 전송할 바이트
    pub message: Bytes,
}

#[derive(Deserialize)]
struct Envelope {
    address: String,
    message: String,
}

impl PipeRecord {
    /// 한 줄을 레코드로 파싱합니다. 어느 형태에도 맞지 않으면 `None`을 반환합니다.
    pub fn parse(line: &[u8]) -> Option<Self> {
        let (body, terminator) = split_terminator(line);
        if body.iter().all(u8::is_ascii_whitespace) {
            return None;
        }

        Self::parse_json(body, terminator).or_else(|| Self::parse_legacy(line, body))
    }

    fn parse_json(body: &[u8], terminator: &[u8]) -> Option<Self> {
        let trimmed = body.trim_ascii_start();
        if !trimmed.starts_with(b"{") {
            return None;
        }
        let envelope: Envelope = serde_json::from_slice(body).ok()?;
        let address = envelope.address.trim();
        if address.is_empty() {
            return None;
        }

        let mut message = envelope.message.into_bytes();
        if !message.ends_with(b"\n") {
            message.extend_from_slice(terminator);
        }
        Some(Self {
            address: address.to_owned(),
            message: Bytes::from(message),
        })
    }

    fn parse_legacy(line: &[u8], body: &[u8]) -> Option<Self> {
        let separator = body.iter().position(|&b| b == b';')?;
        let address = std::str::from_utf8(&line[..separator]).ok()?.trim();
        if address.is_empty() {
            return None;
        }
        Some(Self {
            address: address.to_owned(),
            message: Bytes::copy_from_slice(&line[separator + 1..]),
        })
    }
}

/// 줄 끝의 `\n` 또는 `\r\n`을 분리한다.
fn split_terminator(line: &[u8]) -> (&[u8], &[u8]) {
    if let Some(body) = line.strip_suffix(b"\r\n") {
        (body, &line[body.len()..])
    } else if let Some(body) = line.strip_suffix(b"\n") {
        (body, &line[body.len()..])
    } else {
        (line, &line[line.len()..])
    }
}
