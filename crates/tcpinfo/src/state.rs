//! TCP connection states.
//!
//! Kernels number their states differently: Linux uses its own
//! `TCP_ESTABLISHED = 1 ... TCP_CLOSING = 11` numbering while Darwin,
//! FreeBSD and NetBSD share the classic BSD `TCPS_*` numbering. Both map
//! onto the platform-neutral [`State`] here.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::{Error, Result};

/// Name rendered for a raw state value outside the known set.
pub const UNKNOWN_STATE: &str = "unknown-state";

/// TCP connection state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum State {
    /// State could not be determined.
    #[default]
    Unknown = 0,
    /// Connection is closed.
    Closed = 1,
    /// Waiting for a connection request.
    Listen = 2,
    /// SYN sent, waiting for matching SYN.
    SynSent = 3,
    /// SYN received, waiting for ACK.
    SynReceived = 4,
    /// Connection established.
    Established = 5,
    /// FIN sent, waiting for FIN or ACK.
    FinWait1 = 6,
    /// Our FIN acked, waiting for peer FIN.
    FinWait2 = 7,
    /// Peer FIN received, waiting for local close.
    CloseWait = 8,
    /// Waiting for the ACK of our FIN after close-wait.
    LastAck = 9,
    /// Both sides sent FIN simultaneously.
    Closing = 10,
    /// Waiting out 2*MSL.
    TimeWait = 11,
}

impl State {
    /// All states, in discriminant order.
    pub const ALL: [State; 12] = [
        Self::Unknown,
        Self::Closed,
        Self::Listen,
        Self::SynSent,
        Self::SynReceived,
        Self::Established,
        Self::FinWait1,
        Self::FinWait2,
        Self::CloseWait,
        Self::LastAck,
        Self::Closing,
        Self::TimeWait,
    ];

    /// Look up a state by its discriminant.
    pub fn from_repr(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    /// Get the canonical state name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Closed => "closed",
            Self::Listen => "listen",
            Self::SynSent => "syn-sent",
            Self::SynReceived => "syn-received",
            Self::Established => "established",
            Self::FinWait1 => "fin-wait-1",
            Self::FinWait2 => "fin-wait-2",
            Self::CloseWait => "close-wait",
            Self::LastAck => "last-ack",
            Self::Closing => "closing",
            Self::TimeWait => "time-wait",
        }
    }

    /// Name for a raw discriminant, or [`UNKNOWN_STATE`] if it is out of range.
    pub fn name_of(value: u8) -> &'static str {
        Self::from_repr(value).map_or(UNKNOWN_STATE, |s| s.name())
    }

    /// Map a Linux `tcpi_state` code (`TCP_ESTABLISHED` = 1, ...).
    pub fn from_linux(code: u8) -> Self {
        match code {
            1 => Self::Established,
            2 => Self::SynSent,
            3 => Self::SynReceived,
            4 => Self::FinWait1,
            5 => Self::FinWait2,
            6 => Self::TimeWait,
            7 => Self::Closed,
            8 => Self::CloseWait,
            9 => Self::LastAck,
            10 => Self::Listen,
            11 => Self::Closing,
            _ => {
                tracing::trace!(code, "unknown linux tcp state");
                Self::Unknown
            }
        }
    }

    /// Map a BSD `TCPS_*` code, shared by Darwin, FreeBSD and NetBSD.
    pub fn from_bsd(code: u8) -> Self {
        match code {
            0 => Self::Closed,
            1 => Self::Listen,
            2 => Self::SynSent,
            3 => Self::SynReceived,
            4 => Self::Established,
            5 => Self::CloseWait,
            6 => Self::FinWait1,
            7 => Self::Closing,
            8 => Self::LastAck,
            9 => Self::FinWait2,
            10 => Self::TimeWait,
            _ => {
                tracing::trace!(code, "unknown bsd tcp state");
                Self::Unknown
            }
        }
    }

    /// Whether data can still flow in at least one direction.
    pub fn is_connected(&self) -> bool {
        matches!(
            self,
            Self::Established | Self::FinWait1 | Self::FinWait2 | Self::CloseWait
        )
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for State {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .find(|st| st.name() == s)
            .copied()
            .ok_or_else(|| Error::not_supported(format!("tcp state {s:?}")))
    }
}

impl Serialize for State {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}
