//! 포맷 문자열 파서
//!
//! 입력을 왼쪽에서 오른쪽으로 훑으며 `%` 밖의 텍스트는 리터럴로, `%`에서 시작하는
//! 토큰은 command operator로 컴파일합니다.
//!
//! # 토큰 문법
//! ```text
//! %COMMAND%
//! %COMMAND(ARGS)%
//! %COMMAND(ARGS):LIMIT%
//! %COMMAND:LIMIT%
//!
//! COMMAND = [A-Z_]+
//! ARGS    = ')'를 제외한 임의의 문자열 (빈 문자열 허용)
//! LIMIT   = [0-9]+
//! ```
//!
//! # 사용 예시
//! ```
//! use kuma_accesslog_format::parse_format;
//!
//! let format = parse_format("%REQ(:METHOD)% %PROTOCOL%").unwrap();
//! assert_eq!(format.to_string(), "%REQ(:method)% %PROTOCOL%");
//! ```

use crate::error::AccessLogError;
use crate::format::AccessLogFormat;
use crate::fragment::{
    DynamicMetadataOperator, Field, FilterStateOperator, Fragment, HeaderKind, HeaderOperator,
    Placeholder, StartTimeOperator,
};

/// 포맷 문자열을 [`AccessLogFormat`]으로 컴파일합니다.
///
/// 빈 문자열은 fragment가 없는 포맷이 됩니다. 실패 시 부분 결과는 없습니다.
pub fn parse_format(format: &str) -> Result<AccessLogFormat, AccessLogError> {
    let mut fragments = Vec::new();
    let mut pos = 0;

    while pos < format.len() {
        let rest = &format[pos..];
        let Some(offset) = rest.find('%') else {
            fragments.push(Fragment::Text(rest.to_owned()));
            break;
        };
        if offset > 0 {
            fragments.push(Fragment::Text(rest[..offset].to_owned()));
            pos += offset;
        }

        let rest = &format[pos..];
        let token = CommandToken::scan(rest).ok_or_else(|| AccessLogError::UnexpectedToken {
            position: pos,
            rest: rest.to_owned(),
        })?;
        fragments.push(token.compile(pos)?);
        pos += token.text.len();
    }

    Ok(AccessLogFormat::new(fragments))
}

// ─── 토큰 ────────────────────────────────────────────────────────────

/// `%`에서 시작하는 command operator 토큰
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CommandToken<'a> {
    /// `%`부터 닫는 `%`까지 전체
    text: &'a str,
    command: &'a str,
    /// 괄호가 있으면 `Some` (내용이 비어 있어도)
    args: Option<&'a str>,
    limit: Option<&'a str>,
}

impl<'a> CommandToken<'a> {
    /// 입력 앞부분이 토큰 문법과 맞으면 토큰을 반환합니다.
    fn scan(input: &'a str) -> Option<Self> {
        let bytes = input.as_bytes();
        if bytes.first() != Some(&b'%') {
            return None;
        }

        // COMMAND: [A-Z_][A-Z0-9_]*
        if !bytes.get(1).is_some_and(|&b| b.is_ascii_uppercase() || b == b'_') {
            return None;
        }
        let mut i = 2;
        while i < bytes.len()
            && (bytes[i].is_ascii_uppercase() || bytes[i].is_ascii_digit() || bytes[i] == b'_')
        {
            i += 1;
        }
        let command = &input[1..i];

        let mut args = None;
        if bytes.get(i) == Some(&b'(') {
            let close = input[i + 1..].find(')')?;
            args = Some(&input[i + 1..i + 1 + close]);
            i += close + 2;
        }

        let mut limit = None;
        if bytes.get(i) == Some(&b':') {
            let start = i + 1;
            let mut end = start;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
            if end == start {
                return None;
            }
            limit = Some(&input[start..end]);
            i = end;
        }

        if bytes.get(i) != Some(&b'%') {
            return None;
        }

        Some(Self {
            text: &input[..=i],
            command,
            args,
            limit,
        })
    }

    /// command 이름에 맞는 fragment를 생성합니다.
    fn compile(&self, position: usize) -> Result<Fragment, AccessLogError> {
        if let Some(kind) = HeaderKind::from_command(self.command) {
            return self.compile_header(kind, position);
        }

        match self.command {
            "DYNAMIC_METADATA" => {
                let args = self.args.ok_or_else(|| {
                    AccessLogError::DynamicMetadataArgumentsRequired {
                        token: self.text.to_owned(),
                    }
                })?;
                Ok(Fragment::DynamicMetadata(
                    DynamicMetadataOperator::from_args(args, self.max_length(position)?),
                ))
            }
            "FILTER_STATE" => {
                let key = self.args.filter(|key| !key.is_empty()).ok_or_else(|| {
                    AccessLogError::FilterStateKeyRequired {
                        token: self.text.to_owned(),
                    }
                })?;
                Ok(Fragment::FilterState(FilterStateOperator::new(
                    key,
                    self.max_length(position)?,
                )))
            }
            "START_TIME" => {
                let spec = self.args.unwrap_or_default();
                if contains_newline(spec) {
                    return Err(AccessLogError::StartTimeContainsNewline {
                        token: self.text.to_owned(),
                    });
                }
                Ok(Fragment::StartTime(StartTimeOperator::new(spec)))
            }
            name => {
                if self.args.is_some() || self.limit.is_some() {
                    return Err(AccessLogError::ArgumentsNotSupported {
                        command: name.to_owned(),
                        token: self.text.to_owned(),
                    });
                }
                Ok(Placeholder::from_name(name)
                    .map(Fragment::Placeholder)
                    .or_else(|| Field::from_name(name).map(Fragment::Field))
                    .unwrap_or_else(|| Fragment::Unsupported(name.to_owned())))
            }
        }
    }

    /// `HEADER` 또는 `HEADER?ALT_HEADER`
    fn compile_header(&self, kind: HeaderKind, position: usize) -> Result<Fragment, AccessLogError> {
        let args = self
            .args
            .ok_or_else(|| AccessLogError::HeaderArgumentsRequired {
                command: self.command.to_owned(),
                token: self.text.to_owned(),
            })?;

        let names: Vec<&str> = args.split('?').collect();
        if names.len() > 2 {
            return Err(AccessLogError::TooManyAlternativeHeaders {
                token: self.text.to_owned(),
            });
        }
        if names.iter().any(|name| contains_newline(name)) {
            return Err(AccessLogError::HeaderContainsNewline {
                token: self.text.to_owned(),
            });
        }

        let header = names.first().copied().unwrap_or_default();
        let alt_header = names.get(1).copied().unwrap_or_default();
        Ok(Fragment::Header(HeaderOperator::new(
            kind,
            header,
            alt_header,
            self.max_length(position)?,
        )))
    }

    /// LIMIT 값. 없으면 0입니다.
    fn max_length(&self, position: usize) -> Result<usize, AccessLogError> {
        match self.limit {
            None => Ok(0),
            Some(limit) => limit
                .parse()
                .map_err(|_| AccessLogError::UnexpectedToken {
                    position,
                    rest: self.text.to_owned(),
                }),
        }
    }
}

fn contains_newline(s: &str) -> bool {
    s.contains(['\0', '\r', '\n'])
}
