//! 포맷 문자열 에러 타입
//!
//! 모든 메시지는 `format string is not valid: ` 접두사로 시작합니다.
//! 토큰은 제어 문자를 이스케이프한 큰따옴표 문자열로 출력됩니다
//! (`"%REQ(header-1\n?header-2)%"`).

use std::fmt::Write;

/// 포맷 문자열 파싱 에러
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessLogError {
    /// `%`로 시작하는 위치가 command operator 문법과 맞지 않음
    #[error(
        "format string is not valid: expected a command operator to start at position {position}, instead got: {}",
        quote(.rest)
    )]
    UnexpectedToken {
        /// 0부터 시작하는 바이트 오프셋
        position: usize,
        /// 해당 위치부터 입력 끝까지
        rest: String,
    },

    /// 인자/길이 제한을 받지 않는 필드에 인자가 붙음
    #[error(
        "format string is not valid: command \"%{command}%\" doesn't support arguments or max length constraint, instead got {}",
        quote(.token)
    )]
    ArgumentsNotSupported { command: String, token: String },

    /// `REQ`/`RESP`/`TRAILER`에 헤더 인자가 없음
    #[error(
        "format string is not valid: command \"%{command}(X?Y):Z%\" requires a header and optional alternative header names as its arguments, instead got {}",
        quote(.token)
    )]
    HeaderArgumentsRequired { command: String, token: String },

    /// 대체 헤더가 두 개 이상
    #[error(
        "format string is not valid: more than 1 alternative header specified in {}",
        quote(.token)
    )]
    TooManyAlternativeHeaders { token: String },

    /// 헤더 이름에 NUL/CR/LF 포함
    #[error(
        "format string is not valid: header name contains a newline in {}",
        quote(.token)
    )]
    HeaderContainsNewline { token: String },

    /// `DYNAMIC_METADATA`에 인자가 없음
    #[error(
        "format string is not valid: command \"%DYNAMIC_METADATA(NAMESPACE:KEY*):Z%\" requires a filter namespace and optional path as its arguments, instead got {}",
        quote(.token)
    )]
    DynamicMetadataArgumentsRequired { token: String },

    /// `FILTER_STATE` 키가 비어 있음
    #[error(
        "format string is not valid: command \"%FILTER_STATE(KEY):Z%\" requires a key as its argument, instead got {}",
        quote(.token)
    )]
    FilterStateKeyRequired { token: String },

    /// `START_TIME` 포맷에 NUL/CR/LF 포함
    #[error(
        "format string is not valid: START_TIME format contains a newline in {}",
        quote(.token)
    )]
    StartTimeContainsNewline { token: String },
}

/// 큰따옴표로 감싸고 제어 문자를 이스케이프합니다.
///
/// 출력 가능한 유니코드 문자는 그대로 둡니다.
pub(crate) fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{07}' => out.push_str("\\a"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{0b}' => out.push_str("\\v"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_escapes_control_characters() {
        assert_eq!(quote("a\nb"), r#""a\nb""#);
        assert_eq!(quote("a\rb"), r#""a\rb""#);
        assert_eq!(quote("a\0b"), r#""a\x00b""#);
        assert_eq!(quote("say \"hi\""), r#""say \"hi\"""#);
    }

    #[test]
    fn quote_keeps_printable_unicode() {
        assert_eq!(quote("헤더"), "\"헤더\"");
    }

    #[test]
    fn unexpected_token_reports_position_and_rest() {
        let err = AccessLogError::UnexpectedToken {
            position: 10,
            rest: "% character".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            r#"format string is not valid: expected a command operator to start at position 10, instead got: "% character""#
        );
    }

    #[test]
    fn header_arguments_required_names_command() {
        let err = AccessLogError::HeaderArgumentsRequired {
            command: "RESP".to_owned(),
            token: "%RESP:10%".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            r#"format string is not valid: command "%RESP(X?Y):Z%" requires a header and optional alternative header names as its arguments, instead got "%RESP:10%""#
        );
    }
}
