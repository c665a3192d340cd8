//! Option values.
//!
//! Two families live here:
//!
//! - [`TcpOption`]: TCP header options negotiated on the connection (MSS,
//!   window scale, SACK, timestamps), as reported inside the info
//!   structure.
//! - Socket option values ([`CcInfo`], [`CcAlgorithm`], and
//!   [`Info`](crate::Info)) that identify themselves through the
//!   [`Sockopt`] trait and can be parsed from / marshaled to the raw
//!   bytes exchanged with the kernel. [`SocketOption`] is the tagged
//!   union over them.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::registry::{OptionId, Platform, SockoptKind};
use crate::{Error, Info, Result};

/// Kind of a TCP header option, numbered as in the IANA registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum OptionKind {
    /// Maximum segment size.
    MaxSegSize = 2,
    /// Window scale.
    WindowScale = 3,
    /// SACK permitted.
    SackPermitted = 4,
    /// Timestamps.
    Timestamps = 8,
}

impl OptionKind {
    /// Get the kind name used as the serialization key.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MaxSegSize => "mss",
            Self::WindowScale => "wscale",
            Self::SackPermitted => "sack",
            Self::Timestamps => "tmstamps",
        }
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A TCP header option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TcpOption {
    /// Maximum segment size in bytes.
    MaxSegSize(u32),
    /// Window scale shift count.
    WindowScale(u8),
    /// SACK permitted.
    SackPermitted(bool),
    /// Timestamps enabled.
    Timestamps(bool),
}

impl TcpOption {
    /// Get the option kind.
    pub fn kind(&self) -> OptionKind {
        match self {
            Self::MaxSegSize(_) => OptionKind::MaxSegSize,
            Self::WindowScale(_) => OptionKind::WindowScale,
            Self::SackPermitted(_) => OptionKind::SackPermitted,
            Self::Timestamps(_) => OptionKind::Timestamps,
        }
    }

    /// IANA option kind number.
    pub fn kind_number(&self) -> u8 {
        self.kind() as u8
    }
}

impl Serialize for TcpOption {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match *self {
            Self::MaxSegSize(v) => serializer.serialize_u32(v),
            Self::WindowScale(v) => serializer.serialize_u8(v),
            Self::SackPermitted(v) | Self::Timestamps(v) => serializer.serialize_bool(v),
        }
    }
}

/// A value exchanged with the kernel through a socket option.
pub trait Sockopt {
    /// The abstract option kind.
    fn kind(&self) -> SockoptKind;

    /// Encode the value for `setsockopt`.
    fn marshal(&self) -> Result<Vec<u8>>;

    /// Resolve the `(level, name)` pair on `platform`.
    fn id(&self, platform: Platform) -> Result<OptionId> {
        platform.option_id(self.kind())
    }

    /// Protocol level on `platform`.
    fn level(&self, platform: Platform) -> Result<i32> {
        Ok(self.id(platform)?.level)
    }

    /// Option number on `platform`.
    fn name(&self, platform: Platform) -> Result<i32> {
        Ok(self.id(platform)?.name)
    }
}

/// Raw congestion control algorithm information (`TCP_CC_INFO`).
///
/// The layout depends on the active algorithm, so the bytes are kept
/// verbatim; see [`parse_cc_algorithm_info`](crate::parse_cc_algorithm_info).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CcInfo {
    /// Raw bytes as returned by the kernel.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub raw: Vec<u8>,
}

impl CcInfo {
    /// Wrap raw bytes.
    pub fn new(raw: impl Into<Vec<u8>>) -> Self {
        Self { raw: raw.into() }
    }
}

impl Sockopt for CcInfo {
    fn kind(&self) -> SockoptKind {
        SockoptKind::CcInfo
    }

    fn marshal(&self) -> Result<Vec<u8>> {
        Ok(self.raw.clone())
    }
}

/// Parse `TCP_CC_INFO` bytes.
pub fn parse_cc_info(data: &[u8]) -> Result<CcInfo> {
    Ok(CcInfo::new(data))
}

/// Name of a congestion control algorithm (`TCP_CONGESTION`).
///
/// An empty name means "no preference".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CcAlgorithm(pub String);

impl CcAlgorithm {
    /// Create from a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the algorithm name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether no algorithm is named.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CcAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Sockopt for CcAlgorithm {
    fn kind(&self) -> SockoptKind {
        SockoptKind::CcAlgorithm
    }

    fn marshal(&self) -> Result<Vec<u8>> {
        Ok(self.0.as_bytes().to_vec())
    }
}

/// Parse `TCP_CONGESTION` bytes.
///
/// Kernels return the name in a fixed-width NUL-padded buffer; the name
/// ends at the first NUL.
pub fn parse_cc_algorithm(data: &[u8]) -> Result<CcAlgorithm> {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    Ok(CcAlgorithm(
        String::from_utf8_lossy(&data[..end]).into_owned(),
    ))
}

/// Any socket option value this crate understands.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketOption {
    /// Connection information.
    Info(Box<Info>),
    /// Raw congestion control information.
    CcInfo(CcInfo),
    /// Congestion control algorithm name.
    CcAlgorithm(CcAlgorithm),
}

impl SocketOption {
    /// Parse raw option bytes, routing on the `(level, name)` pair.
    pub fn parse(platform: Platform, id: OptionId, data: &[u8]) -> Result<Self> {
        match platform.option_kind(id)? {
            SockoptKind::Info => Ok(Self::Info(Box::new(platform.decode_info(data)?))),
            SockoptKind::CcInfo => parse_cc_info(data).map(Self::CcInfo),
            SockoptKind::CcAlgorithm => parse_cc_algorithm(data).map(Self::CcAlgorithm),
        }
    }
}

impl Sockopt for SocketOption {
    fn kind(&self) -> SockoptKind {
        match self {
            Self::Info(i) => i.kind(),
            Self::CcInfo(c) => c.kind(),
            Self::CcAlgorithm(c) => c.kind(),
        }
    }

    fn marshal(&self) -> Result<Vec<u8>> {
        match self {
            Self::Info(i) => i.marshal(),
            Self::CcInfo(c) => c.marshal(),
            Self::CcAlgorithm(c) => c.marshal(),
        }
    }
}

impl From<Info> for SocketOption {
    fn from(info: Info) -> Self {
        Self::Info(Box::new(info))
    }
}

impl From<CcInfo> for SocketOption {
    fn from(cc: CcInfo) -> Self {
        Self::CcInfo(cc)
    }
}

impl From<CcAlgorithm> for SocketOption {
    fn from(cc: CcAlgorithm) -> Self {
        Self::CcAlgorithm(cc)
    }
}

impl TryFrom<SocketOption> for CcAlgorithm {
    type Error = Error;

    fn try_from(opt: SocketOption) -> Result<Self> {
        match opt {
            SocketOption::CcAlgorithm(c) => Ok(c),
            other => Err(Error::not_supported(format!(
                "{} is not a congestion control algorithm",
                other.kind()
            ))),
        }
    }
}
