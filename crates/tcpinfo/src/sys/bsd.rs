//! FreeBSD and NetBSD `struct tcp_info`.
//!
//! NetBSD adopted FreeBSD's layout, including the FreeBSD extension
//! block, so both share one decoder. Times are in microseconds; the
//! Linux-compat fields the BSDs leave unfilled are `__`-prefixed in the
//! kernel headers and are not decoded.

use serde::Serialize;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::{SysInfo, micros, opt, read_layout};
use crate::info::{CongestionControl, FlowControl};
use crate::option::TcpOption;
use crate::state::State;
use crate::{Info, Result};

/// Bytes up to and including `tcpi_rcv_space`.
pub const MANDATORY_LEN: usize = 100;

/// Kernel `struct tcp_info` on FreeBSD and NetBSD.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct BsdTcpInfoRaw {
    pub state: u8,
    pub ca_state: u8,
    pub retransmits: u8,
    pub probes: u8,
    pub backoff: u8,
    pub options: u8,
    /// `snd_wscale:4, rcv_wscale:4`.
    pub wscale: u8,
    pub pad: u8,

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

    pub snd_wnd: u32,
    pub snd_bwnd: u32,
    pub snd_nxt: u32,
    pub rcv_nxt: u32,
    pub toe_tid: u32,
    pub snd_rexmitpack: u32,
    pub rcv_ooopack: u32,
    pub snd_zerowin: u32,

    pub spare: [u32; 26],
}

impl BsdTcpInfoRaw {
    /// Size of the full layout.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    pub fn snd_wscale(&self) -> u8 {
        self.wscale & 0x0f
    }

    pub fn rcv_wscale(&self) -> u8 {
        self.wscale >> 4
    }
}

/// FreeBSD/NetBSD-only connection information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BsdSysInfo {
    /// Peer's advertised window in bytes.
    #[serde(rename = "snd_wnd")]
    pub sender_window: u32,
    /// Bandwidth-controlled window (always zero on recent kernels).
    #[serde(rename = "snd_bwnd")]
    pub sender_bandwidth_window: u32,
    /// Next sequence number to send.
    #[serde(rename = "snd_nxt")]
    pub next_egress_seq: u32,
    /// Next sequence number expected.
    #[serde(rename = "rcv_nxt")]
    pub next_ingress_seq: u32,
    /// TCP offload engine connection id.
    pub toe_tid: u32,
    /// Retransmitted packets.
    #[serde(rename = "snd_rexmit_segs")]
    pub retrans_segs: u32,
    /// Out-of-order packets received.
    #[serde(rename = "rcv_ooo_segs")]
    pub out_of_order_segs: u32,
    /// Zero window probes sent.
    #[serde(rename = "snd_zerowin_segs")]
    pub zero_window_updates: u32,
}

/// Decode a FreeBSD `tcp_info` buffer.
pub fn parse_freebsd_info(data: &[u8]) -> Result<Info> {
    parse_info(data).map(|(info, sys)| Info {
        sys: Some(SysInfo::FreeBsd(sys)),
        ..info
    })
}

/// Decode a NetBSD `tcp_info` buffer.
pub fn parse_netbsd_info(data: &[u8]) -> Result<Info> {
    parse_info(data).map(|(info, sys)| Info {
        sys: Some(SysInfo::NetBsd(sys)),
        ..info
    })
}

fn parse_info(data: &[u8]) -> Result<(Info, BsdSysInfo)> {
    let ti: BsdTcpInfoRaw = read_layout(data, MANDATORY_LEN)?;

    let mut info = Info {
        state: State::from_bsd(ti.state),
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
    info.last_data_received = micros(ti.last_data_recv);

    info.flow_control = Some(FlowControl {
        receiver_window: ti.rcv_space,
    });
    info.congestion_control = Some(CongestionControl {
        sender_ss_threshold: ti.snd_ssthresh,
        receiver_ss_threshold: 0,
        sender_window: ti.snd_cwnd,
    });

    let sys = BsdSysInfo {
        sender_window: ti.snd_wnd,
        sender_bandwidth_window: ti.snd_bwnd,
        next_egress_seq: ti.snd_nxt,
        next_ingress_seq: ti.rcv_nxt,
        toe_tid: ti.toe_tid,
        retrans_segs: ti.snd_rexmitpack,
        out_of_order_segs: ti.rcv_ooopack,
        zero_window_updates: ti.snd_zerowin,
    };

    Ok((info, sys))
}
