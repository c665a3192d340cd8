//! Linux `struct tcp_info`.

use std::time::Duration;

use serde::Serialize;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::{SysInfo, micros, millis, opt, read_layout};
use crate::info::{CongestionControl, FlowControl, serialize_nanos};
use crate::option::TcpOption;
use crate::state::State;
use crate::{Info, Result};

/// Bytes up to and including `tcpi_total_retrans`, present since 2.6.
pub const MANDATORY_LEN: usize = 104;

/// Kernel `struct tcp_info` as of Linux 6.x.
///
/// Rates are bytes/sec, `rto`/`ato`/`rtt`/`rttvar`/`rcv_rtt`/`min_rtt`
/// are microseconds and the `last_*` fields milliseconds.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct TcpInfoRaw {
    pub state: u8,
    pub ca_state: u8,
    pub retransmits: u8,
    pub probes: u8,
    pub backoff: u8,
    pub options: u8,
    /// `snd_wscale:4, rcv_wscale:4`.
    pub wscale: u8,
    /// `delivery_rate_app_limited:1, fastopen_client_fail:2`.
    pub flags: u8,

    pub rto: u32,
    pub ato: u32,
    pub snd_mss: u32,
    pub rcv_mss: u32,

    pub unacked: u32,
    pub sacked: u32,
    pub lost: u32,
    pub retrans: u32,
    pub fackets: u32,

    pub last_data_sent: u32,
    pub last_ack_sent: u32,
    pub last_data_recv: u32,
    pub last_ack_recv: u32,

    pub pmtu: u32,
    pub rcv_ssthresh: u32,
    pub rtt: u32,
    pub rttvar: u32,
    pub snd_ssthresh: u32,
    pub snd_cwnd: u32,
    pub advmss: u32,
    pub reordering: u32,

    pub rcv_rtt: u32,
    pub rcv_space: u32,

    pub total_retrans: u32,

    pub pacing_rate: u64,
    pub max_pacing_rate: u64,
    pub bytes_acked: u64,
    pub bytes_received: u64,
    pub segs_out: u32,
    pub segs_in: u32,

    pub notsent_bytes: u32,
    pub min_rtt: u32,
    pub data_segs_in: u32,
    pub data_segs_out: u32,

    pub delivery_rate: u64,

    pub busy_time: u64,
    pub rwnd_limited: u64,
    pub sndbuf_limited: u64,

    pub delivered: u32,
    pub delivered_ce: u32,

    pub bytes_sent: u64,
    pub bytes_retrans: u64,
    pub dsack_dups: u32,
    pub reord_seen: u32,

    pub rcv_ooopack: u32,
    pub snd_wnd: u32,
    pub rcv_wnd: u32,
    pub rehash: u32,
}

impl TcpInfoRaw {
    /// Size of the full layout.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Send window scale (low nibble).
    pub fn snd_wscale(&self) -> u8 {
        self.wscale & 0x0f
    }

    /// Receive window scale (high nibble).
    pub fn rcv_wscale(&self) -> u8 {
        self.wscale >> 4
    }

    pub fn delivery_rate_app_limited(&self) -> bool {
        self.flags & 0x01 != 0
    }
}

/// Linux-only connection information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinuxSysInfo {
    /// Path MTU.
    pub path_mtu: u32,
    /// Advertised maximum segment size.
    #[serde(rename = "adv_mss")]
    pub advertised_mss: u32,
    /// Congestion avoidance state.
    pub ca_state: u8,
    /// Consecutive retransmits of the head segment.
    #[serde(rename = "rexmits")]
    pub retransmissions: u8,
    /// RTO backoff count.
    pub backoffs: u8,
    /// Zero window or keepalive probes sent.
    #[serde(rename = "wnd_ka_probes")]
    pub window_or_keepalive_probes: u8,
    pub unacked_segs: u32,
    pub sacked_segs: u32,
    pub lost_segs: u32,
    /// Retransmitted segments in flight.
    pub retrans_segs: u32,
    #[serde(rename = "fack_segs")]
    pub forward_ack_segs: u32,
    /// Reordering metric.
    #[serde(rename = "reord_segs")]
    pub reordered_segs: u32,
    /// Receiver-side RTT estimate.
    #[serde(rename = "rcv_rtt", serialize_with = "serialize_nanos")]
    pub receiver_rtt: Duration,
    pub total_retrans_segs: u32,
    /// Delivery rate limited by the application.
    pub app_limited: bool,
    /// Pacing rate in bytes/sec.
    pub pacing_rate: u64,
    /// Maximum pacing rate in bytes/sec.
    pub max_pacing_rate: u64,
    pub bytes_acked: u64,
    #[serde(rename = "bytes_rcvd")]
    pub bytes_received: u64,
    pub bytes_sent: u64,
    pub bytes_retrans: u64,
    pub segs_out: u32,
    pub segs_in: u32,
    pub data_segs_out: u32,
    pub data_segs_in: u32,
    /// Bytes queued but not yet sent.
    pub notsent_bytes: u32,
    /// Minimum RTT observed.
    #[serde(serialize_with = "serialize_nanos")]
    pub min_rtt: Duration,
    /// Delivery rate in bytes/sec.
    pub delivery_rate: u64,
    #[serde(serialize_with = "serialize_nanos")]
    pub busy_time: Duration,
    #[serde(serialize_with = "serialize_nanos")]
    pub rwnd_limited: Duration,
    #[serde(serialize_with = "serialize_nanos")]
    pub sndbuf_limited: Duration,
    pub delivered: u32,
    pub delivered_ce: u32,
    pub dsack_dups: u32,
    pub reord_seen: u32,
    /// Out-of-order packets received.
    pub rcv_ooopack: u32,
    /// Peer's advertised receive window in bytes.
    pub snd_wnd: u32,
}

/// Decode a Linux `tcp_info` buffer.
pub fn parse_info(data: &[u8]) -> Result<Info> {
    let ti: TcpInfoRaw = read_layout(data, MANDATORY_LEN)?;

    let mut info = Info {
        state: State::from_linux(ti.state),
        ..Default::default()
    };

    if ti.options & opt::WSCALE != 0 {
        info.options.push(TcpOption::WindowScale(ti.rcv_wscale()));
        info.peer_options.push(TcpOption::WindowScale(ti.snd_wscale()));
    }
    if ti.options & opt::SACK != 0 {
        info.options.push(TcpOption::SackPermitted(true));
        info.peer_options.push(TcpOption::SackPermitted(true));
    }
    if ti.options & opt::TIMESTAMPS != 0 {
        info.options.push(TcpOption::Timestamps(true));
        info.peer_options.push(TcpOption::Timestamps(true));
    }

    info.sender_mss = ti.snd_mss;
    info.receiver_mss = ti.rcv_mss;
    info.rtt = micros(ti.rtt);
    info.rtt_var = micros(ti.rttvar);
    info.rto = micros(ti.rto);
    info.ato = micros(ti.ato);
    info.last_data_sent = millis(ti.last_data_sent);
    info.last_data_received = millis(ti.last_data_recv);
    info.last_ack_received = millis(ti.last_ack_recv);

    info.flow_control = Some(FlowControl {
        receiver_window: ti.rcv_space,
    });
    info.congestion_control = Some(CongestionControl {
        sender_ss_threshold: ti.snd_ssthresh,
        receiver_ss_threshold: ti.rcv_ssthresh,
        sender_window: ti.snd_cwnd,
    });

    info.sys = Some(SysInfo::Linux(LinuxSysInfo {
        path_mtu: ti.pmtu,
        advertised_mss: ti.advmss,
        ca_state: ti.ca_state,
        retransmissions: ti.retransmits,
        backoffs: ti.backoff,
        window_or_keepalive_probes: ti.probes,
        unacked_segs: ti.unacked,
        sacked_segs: ti.sacked,
        lost_segs: ti.lost,
        retrans_segs: ti.retrans,
        forward_ack_segs: ti.fackets,
        reordered_segs: ti.reordering,
        receiver_rtt: micros(ti.rcv_rtt),
        total_retrans_segs: ti.total_retrans,
        app_limited: ti.delivery_rate_app_limited(),
        pacing_rate: ti.pacing_rate,
        max_pacing_rate: ti.max_pacing_rate,
        bytes_acked: ti.bytes_acked,
        bytes_received: ti.bytes_received,
        bytes_sent: ti.bytes_sent,
        bytes_retrans: ti.bytes_retrans,
        segs_out: ti.segs_out,
        segs_in: ti.segs_in,
        data_segs_out: ti.data_segs_out,
        data_segs_in: ti.data_segs_in,
        notsent_bytes: ti.notsent_bytes,
        min_rtt: micros(ti.min_rtt),
        delivery_rate: ti.delivery_rate,
        busy_time: Duration::from_micros(ti.busy_time),
        rwnd_limited: Duration::from_micros(ti.rwnd_limited),
        sndbuf_limited: Duration::from_micros(ti.sndbuf_limited),
        delivered: ti.delivered,
        delivered_ce: ti.delivered_ce,
        dsack_dups: ti.dsack_dups,
        reord_seen: ti.reord_seen,
        rcv_ooopack: ti.rcv_ooopack,
        snd_wnd: ti.snd_wnd,
    }));

    Ok(info)
}
