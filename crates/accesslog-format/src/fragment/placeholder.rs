//! 메시 전용 placeholder (`%KUMA_SOURCE_SERVICE%` 등)
//!
//! Envoy로 넘기기 전 [`AccessLogFormat::interpolate`](crate::AccessLogFormat::interpolate)로
//! 치환됩니다. 치환 전에는 자기 자신을 그대로 렌더링합니다.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    SourceAddress,
    SourceAddressWithoutPort,
    SourceService,
    DestinationService,
}

impl Placeholder {
    pub const ALL: [Placeholder; 4] = [
        Self::SourceAddress,
        Self::SourceAddressWithoutPort,
        Self::SourceService,
        Self::DestinationService,
    ];

    /// 변수 이름 (`KUMA_SOURCE_ADDRESS` 등)
    pub fn name(self) -> &'static str {
        match self {
            Self::SourceAddress => "KUMA_SOURCE_ADDRESS",
            Self::SourceAddressWithoutPort => "KUMA_SOURCE_ADDRESS_WITHOUT_PORT",
            Self::SourceService => "KUMA_SOURCE_SERVICE",
            Self::DestinationService => "KUMA_DESTINATION_SERVICE",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}%", self.name())
    }
}
