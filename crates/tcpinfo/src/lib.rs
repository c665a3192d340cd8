//! Decoding and normalization of per-connection TCP kernel information.
//!
//! Operating systems expose the kernel's view of a TCP connection through
//! `getsockopt` at level `IPPROTO_TCP`: connection state, negotiated
//! options, segment sizes, RTT estimates, timers, window and congestion
//! control counters. Each platform uses its own option numbers, structure
//! layout and time units. This crate decodes those buffers into one
//! platform-neutral [`Info`] record, keeping the platform-only fields in
//! [`SysInfo`].
//!
//! Supported platforms are Linux, Darwin, FreeBSD and NetBSD. Decoding is
//! pure: any platform's buffers can be decoded on any host by selecting the
//! [`Platform`] explicitly.
//!
//! # Example
//!
//! ```ignore
//! use tcpinfo::{Platform, SockoptKind};
//!
//! let platform = Platform::host();
//! let id = platform.option_id(SockoptKind::Info)?;
//!
//! // getsockopt(fd, id.level, id.name, buf.as_mut_ptr(), &mut len)
//! let info = platform.decode_info(&buf[..len])?;
//!
//! println!("{} rtt={:?}", info.state, info.rtt);
//! println!("{}", info.to_json_pretty()?);
//! ```
//!
//! # Congestion control
//!
//! `TCP_CONGESTION` yields the algorithm name and `TCP_CC_INFO` an opaque
//! payload whose layout depends on that algorithm:
//!
//! ```ignore
//! use tcpinfo::{parse_cc_algorithm, parse_cc_algorithm_info};
//!
//! let name = parse_cc_algorithm(&name_buf)?;
//! let info = parse_cc_algorithm_info(name.as_str(), &cc_buf)?;
//! println!("{}: {}", info.algorithm(), info.to_json());
//! ```

pub mod cc;
pub mod error;
pub mod info;
pub mod option;
pub mod registry;
pub mod state;
pub mod sys;

pub use cc::{CcAlgorithmInfo, CcAlgorithmRegistry, parse_cc_algorithm_info};
pub use error::{Error, Result};
pub use info::{CongestionControl, FlowControl, Info};
pub use option::{
    CcAlgorithm, CcInfo, OptionKind, SocketOption, Sockopt, TcpOption, parse_cc_algorithm,
    parse_cc_info,
};
pub use registry::{IPPROTO_TCP, OptionId, Platform, SockoptKind};
pub use state::State;
pub use sys::{SysInfo, decode_info};
