//! Per-platform kernel structure decoders.
//!
//! Each submodule declares the kernel layout as a `#[repr(C)]` zerocopy
//! struct plus the length of its mandatory prefix. Older kernels report
//! fewer trailing fields, so buffers between the prefix and the full size
//! are zero-extended before the layout is read.

pub mod bsd;
pub mod darwin;
pub mod linux;

use std::time::Duration;

use serde::Serialize;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::registry::Platform;
use crate::{Error, Info, Result};

pub use bsd::BsdSysInfo;
pub use darwin::DarwinSysInfo;
pub use linux::LinuxSysInfo;

/// `tcpi_options` bits shared by every platform.
pub(crate) mod opt {
    pub const TIMESTAMPS: u8 = 0x01;
    pub const SACK: u8 = 0x02;
    pub const WSCALE: u8 = 0x04;
}

/// Platform-specific information.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SysInfo {
    /// Linux extension block.
    Linux(LinuxSysInfo),
    /// Darwin extension block.
    Darwin(DarwinSysInfo),
    /// FreeBSD extension block.
    FreeBsd(BsdSysInfo),
    /// NetBSD extension block.
    NetBsd(BsdSysInfo),
}

impl SysInfo {
    /// The platform that produced this block.
    pub fn platform(&self) -> Platform {
        match self {
            Self::Linux(_) => Platform::Linux,
            Self::Darwin(_) => Platform::Darwin,
            Self::FreeBsd(_) => Platform::FreeBsd,
            Self::NetBsd(_) => Platform::NetBsd,
        }
    }
}

impl Platform {
    /// Decode this platform's connection information structure.
    pub fn decode_info(&self, data: &[u8]) -> Result<Info> {
        match self {
            Self::Linux => linux::parse_info(data),
            Self::Darwin => darwin::parse_info(data),
            Self::FreeBsd => bsd::parse_freebsd_info(data),
            Self::NetBsd => bsd::parse_netbsd_info(data),
            Self::Unsupported => Err(Error::not_supported("tcp info on this platform")),
        }
    }
}

/// Decode connection information for the host platform.
pub fn decode_info(data: &[u8]) -> Result<Info> {
    Platform::host().decode_info(data)
}

/// Read a kernel layout, zero-filling anything past the end of `data`.
///
/// Fails if `data` does not cover `mandatory` bytes.
pub(crate) fn read_layout<T>(data: &[u8], mandatory: usize) -> Result<T>
where
    T: FromBytes + IntoBytes + KnownLayout + Immutable,
{
    Error::check_len(data, mandatory)?;

    let mut layout = T::new_zeroed();
    let dst = layout.as_mut_bytes();
    let n = data.len().min(dst.len());
    if n < dst.len() {
        tracing::debug!(
            have = data.len(),
            full = dst.len(),
            "short kernel structure, zero-filling trailing fields"
        );
    }
    dst[..n].copy_from_slice(&data[..n]);
    Ok(layout)
}

pub(crate) fn micros(v: u32) -> Duration {
    Duration::from_micros(u64::from(v))
}

pub(crate) fn millis(v: u32) -> Duration {
    Duration::from_millis(u64::from(v))
}
