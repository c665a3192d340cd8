//! The normalized connection information record.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::option::{OptionKind, Sockopt, TcpOption};
use crate::registry::SockoptKind;
use crate::state::State;
use crate::sys::SysInfo;
use crate::{Error, Result};

/// Linux reports an unset slow start threshold as `TCP_INFINITE_SSTHRESH`.
const INFINITE_SSTHRESH: u32 = 0x7fff_ffff;

/// Connection information decoded from a single kernel query.
///
/// Duration fields not reported by a platform are zero. The optional
/// blocks are only present when the platform fills them in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Info {
    /// Connection state.
    pub state: State,
    /// Options we requested.
    pub options: Vec<TcpOption>,
    /// Options the peer advertised.
    pub peer_options: Vec<TcpOption>,
    /// Sender maximum segment size in bytes.
    pub sender_mss: u32,
    /// Receiver maximum segment size in bytes.
    pub receiver_mss: u32,
    /// Round-trip time.
    pub rtt: Duration,
    /// Round-trip time variation.
    pub rtt_var: Duration,
    /// Retransmission timeout.
    pub rto: Duration,
    /// Delayed acknowledgement timeout (Linux only).
    pub ato: Duration,
    /// Time since last data sent (Linux only).
    pub last_data_sent: Duration,
    /// Time since last data received (Linux, FreeBSD and NetBSD).
    pub last_data_received: Duration,
    /// Time since last ack received (Linux only).
    pub last_ack_received: Duration,
    /// Flow control information.
    pub flow_control: Option<FlowControl>,
    /// Congestion control information.
    pub congestion_control: Option<CongestionControl>,
    /// Platform-specific information.
    pub sys: Option<SysInfo>,
}

/// Flow control information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FlowControl {
    /// Advertised receiver window in bytes.
    #[serde(rename = "rcv_wnd")]
    pub receiver_window: u32,
}

/// Congestion control information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CongestionControl {
    /// Sender slow start threshold, in bytes or segments.
    #[serde(rename = "snd_ssthresh")]
    pub sender_ss_threshold: u32,
    /// Receiver slow start threshold in bytes (Linux only).
    #[serde(rename = "rcv_ssthresh")]
    pub receiver_ss_threshold: u32,
    /// Sender congestion window, in bytes or segments.
    #[serde(rename = "snd_cwnd")]
    pub sender_window: u32,
}

impl Info {
    /// Find a requested option by kind. The last one wins.
    pub fn option(&self, kind: OptionKind) -> Option<TcpOption> {
        self.options.iter().rev().find(|o| o.kind() == kind).copied()
    }

    /// Find a peer-advertised option by kind. The last one wins.
    pub fn peer_option(&self, kind: OptionKind) -> Option<TcpOption> {
        self.peer_options.iter().rev().find(|o| o.kind() == kind).copied()
    }

    /// Render as a JSON document.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Render as a pretty-printed JSON document.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Format as an ss-style line with the non-zero metrics.
    ///
    /// ```text
    /// ts sack wscale:7,7 rto:204 rtt:0.123/0.050 ato:40 mss:1448 cwnd:10
    /// ```
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        if self.option(OptionKind::Timestamps) == Some(TcpOption::Timestamps(true)) {
            parts.push("ts".to_string());
        }
        if self.option(OptionKind::SackPermitted) == Some(TcpOption::SackPermitted(true)) {
            parts.push("sack".to_string());
        }
        // ss prints the send scale (advertised by the peer) first
        if let (Some(TcpOption::WindowScale(snd)), Some(TcpOption::WindowScale(rcv))) = (
            self.peer_option(OptionKind::WindowScale),
            self.option(OptionKind::WindowScale),
        ) {
            parts.push(format!("wscale:{},{}", snd, rcv));
        }

        if !self.rto.is_zero() {
            parts.push(format!("rto:{}", self.rto.as_millis()));
        }
        if !self.rtt.is_zero() {
            parts.push(format!(
                "rtt:{:.3}/{:.3}",
                millis_f64(self.rtt),
                millis_f64(self.rtt_var)
            ));
        }
        if !self.ato.is_zero() {
            parts.push(format!("ato:{}", self.ato.as_millis()));
        }

        if self.sender_mss > 0 {
            parts.push(format!("mss:{}", self.sender_mss));
        }
        if self.receiver_mss > 0 {
            parts.push(format!("rcvmss:{}", self.receiver_mss));
        }

        if let Some(cc) = &self.congestion_control {
            if cc.sender_window > 0 {
                parts.push(format!("cwnd:{}", cc.sender_window));
            }
            if cc.sender_ss_threshold > 0 && cc.sender_ss_threshold < INFINITE_SSTHRESH {
                parts.push(format!("ssthresh:{}", cc.sender_ss_threshold));
            }
        }

        if !self.last_data_sent.is_zero() {
            parts.push(format!("lastsnd:{}", self.last_data_sent.as_millis()));
        }
        if !self.last_data_received.is_zero() {
            parts.push(format!("lastrcv:{}", self.last_data_received.as_millis()));
        }
        if !self.last_ack_received.is_zero() {
            parts.push(format!("lastack:{}", self.last_ack_received.as_millis()));
        }

        if let Some(fc) = &self.flow_control {
            if fc.receiver_window > 0 {
                parts.push(format!("rcv_space:{}", fc.receiver_window));
            }
        }

        parts.join(" ")
    }
}

fn millis_f64(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

fn nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

/// Serialize a duration as integer nanoseconds.
pub(crate) fn serialize_nanos<S: Serializer>(
    d: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(nanos(*d))
}

/// Collapse an option list into a map keyed by kind name.
///
/// Duplicate kinds overwrite in iteration order.
fn option_map(opts: &[TcpOption]) -> BTreeMap<&'static str, TcpOption> {
    opts.iter().map(|o| (o.kind().name(), *o)).collect()
}

impl Serialize for Info {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("state", &self.state)?;
        if !self.options.is_empty() {
            map.serialize_entry("opts", &option_map(&self.options))?;
        }
        if !self.peer_options.is_empty() {
            map.serialize_entry("peer_opts", &option_map(&self.peer_options))?;
        }
        map.serialize_entry("snd_mss", &self.sender_mss)?;
        map.serialize_entry("rcv_mss", &self.receiver_mss)?;
        map.serialize_entry("rtt", &nanos(self.rtt))?;
        map.serialize_entry("rttvar", &nanos(self.rtt_var))?;
        map.serialize_entry("rto", &nanos(self.rto))?;
        map.serialize_entry("ato", &nanos(self.ato))?;
        map.serialize_entry("last_data_sent", &nanos(self.last_data_sent))?;
        map.serialize_entry("last_data_rcvd", &nanos(self.last_data_received))?;
        map.serialize_entry("last_ack_rcvd", &nanos(self.last_ack_received))?;
        if let Some(fc) = &self.flow_control {
            map.serialize_entry("flow_ctl", fc)?;
        }
        if let Some(cc) = &self.congestion_control {
            map.serialize_entry("cong_ctl", cc)?;
        }
        if let Some(sys) = &self.sys {
            map.serialize_entry("sys", sys)?;
        }
        map.end()
    }
}

impl Sockopt for Info {
    fn kind(&self) -> SockoptKind {
        SockoptKind::Info
    }

    /// The info structure is read only.
    fn marshal(&self) -> Result<Vec<u8>> {
        Err(Error::not_supported("marshaling connection information"))
    }
}
