//! Socket option registry.
//!
//! Maps an abstract [`SockoptKind`] to the `(level, name)` pair a given
//! [`Platform`] uses at the `getsockopt`/`setsockopt` boundary. The tables
//! are `const`, so a lookup is a pure function of its inputs and the
//! registry can be read from any number of threads.

use std::fmt;

use serde::Serialize;

use crate::{Error, Result};

/// IANA protocol number for TCP, used as the option level everywhere.
pub const IPPROTO_TCP: i32 = 6;

/// Operating system whose kernel structures are being decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Linux `struct tcp_info`.
    Linux,
    /// Darwin (macOS/iOS) `struct tcp_connection_info`.
    Darwin,
    /// FreeBSD `struct tcp_info`.
    FreeBsd,
    /// NetBSD `struct tcp_info`.
    NetBsd,
    /// Anything else; every lookup and decode fails.
    Unsupported,
}

impl Platform {
    /// Platforms with a decoder.
    pub const SUPPORTED: [Platform; 4] = [Self::Linux, Self::Darwin, Self::FreeBsd, Self::NetBsd];

    /// The platform this crate was built for.
    pub const fn host() -> Self {
        if cfg!(any(target_os = "linux", target_os = "android")) {
            Self::Linux
        } else if cfg!(any(target_os = "macos", target_os = "ios")) {
            Self::Darwin
        } else if cfg!(target_os = "freebsd") {
            Self::FreeBsd
        } else if cfg!(target_os = "netbsd") {
            Self::NetBsd
        } else {
            Self::Unsupported
        }
    }

    /// Get the platform name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Darwin => "darwin",
            Self::FreeBsd => "freebsd",
            Self::NetBsd => "netbsd",
            Self::Unsupported => "unsupported",
        }
    }

    fn table(&self) -> &'static [(SockoptKind, OptionId)] {
        match self {
            Self::Linux => LINUX_OPTIONS,
            Self::Darwin => DARWIN_OPTIONS,
            Self::FreeBsd => FREEBSD_OPTIONS,
            Self::NetBsd => NETBSD_OPTIONS,
            Self::Unsupported => &[],
        }
    }

    /// Resolve the `(level, name)` pair for an option kind.
    pub fn option_id(&self, kind: SockoptKind) -> Result<OptionId> {
        self.table()
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, id)| *id)
            .ok_or_else(|| {
                tracing::debug!(platform = self.name(), %kind, "option kind not registered");
                Error::not_supported(format!("{kind} on {}", self.name()))
            })
    }

    /// Recognize which option kind a `(level, name)` pair refers to.
    pub fn option_kind(&self, id: OptionId) -> Result<SockoptKind> {
        self.table()
            .iter()
            .find(|(_, i)| *i == id)
            .map(|(k, _)| *k)
            .ok_or_else(|| Error::not_supported(format!("option {id} on {}", self.name())))
    }

    /// Option kinds this platform defines.
    pub fn option_kinds(&self) -> impl Iterator<Item = SockoptKind> {
        self.table().iter().map(|(k, _)| *k)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Abstract socket option kind.
///
/// The requested and peer-advertised TCP header options are both decoded
/// out of the [`SockoptKind::Info`] structure, so requests for either
/// resolve to the info option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SockoptKind {
    /// Connection information structure (`TCP_INFO`, `TCP_CONNECTION_INFO`).
    Info,
    /// Congestion control algorithm private information (`TCP_CC_INFO`).
    CcInfo,
    /// Congestion control algorithm name (`TCP_CONGESTION`).
    CcAlgorithm,
}

impl SockoptKind {
    /// Get the kind name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::CcInfo => "cc-info",
            Self::CcAlgorithm => "cc-algorithm",
        }
    }
}

impl fmt::Display for SockoptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A `(level, name)` pair identifying a socket option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OptionId {
    /// Protocol level (`IPPROTO_TCP`).
    pub level: i32,
    /// Option number within the level.
    pub name: i32,
}

impl OptionId {
    /// Create a new option id.
    pub const fn new(level: i32, name: i32) -> Self {
        Self { level, name }
    }

    const fn tcp(name: i32) -> Self {
        Self::new(IPPROTO_TCP, name)
    }
}

impl fmt::Display for OptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {:#x})", self.level, self.name)
    }
}

const LINUX_OPTIONS: &[(SockoptKind, OptionId)] = &[
    (SockoptKind::Info, OptionId::tcp(11)),        // TCP_INFO
    (SockoptKind::CcInfo, OptionId::tcp(26)),      // TCP_CC_INFO
    (SockoptKind::CcAlgorithm, OptionId::tcp(13)), // TCP_CONGESTION
];

const DARWIN_OPTIONS: &[(SockoptKind, OptionId)] = &[
    (SockoptKind::Info, OptionId::tcp(0x106)), // TCP_CONNECTION_INFO
];

const FREEBSD_OPTIONS: &[(SockoptKind, OptionId)] = &[
    (SockoptKind::Info, OptionId::tcp(0x20)),        // TCP_INFO
    (SockoptKind::CcAlgorithm, OptionId::tcp(0x40)), // TCP_CONGESTION
];

const NETBSD_OPTIONS: &[(SockoptKind, OptionId)] = &[
    (SockoptKind::Info, OptionId::tcp(9)), // TCP_INFO
];
