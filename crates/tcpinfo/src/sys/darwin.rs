//! Darwin `struct tcp_connection_info`.
//!
//! All times are reported in milliseconds. Darwin has a single `maxseg`
//! for both directions and no delayed-ack or last-activity timers.

use std::time::Duration;

use serde::Serialize;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::{SysInfo, millis, opt, read_layout};
use crate::info::{CongestionControl, FlowControl, serialize_nanos};
use crate::option::TcpOption;
use crate::state::State;
use crate::{Info, Result};

/// Bytes up to and including `tcpi_rttvar`.
pub const MANDATORY_LEN: usize = 52;

/// Kernel `struct tcp_connection_info`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct TcpConnectionInfoRaw {
    pub state: u8,
    pub snd_wscale: u8,
    pub rcv_wscale: u8,
    pub pad: u8,
    pub options: u32,
    pub flags: u32,
    pub rto: u32,
    pub maxseg: u32,
    pub snd_ssthresh: u32,
    pub snd_cwnd: u32,
    pub snd_wnd: u32,
    pub snd_sbbytes: u32,
    pub rcv_wnd: u32,
    pub rttcur: u32,
    pub srtt: u32,
    pub rttvar: u32,
    /// TCP Fast Open bitfield (`tcpi_tfo_cookie_req:1, ...`).
    pub tfo: u32,
    pub txpackets: u64,
    pub txbytes: u64,
    pub txretransmitbytes: u64,
    pub rxpackets: u64,
    pub rxbytes: u64,
    pub rxoutoforderbytes: u64,
    pub txretransmitpackets: u64,
}

impl TcpConnectionInfoRaw {
    /// Size of the full layout.
    pub const SIZE: usize = std::mem::size_of::<Self>();
}

/// Darwin-only connection information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DarwinSysInfo {
    /// `TCPCI_FLAG_*` bits.
    pub flags: u32,
    /// Peer's advertised window in bytes.
    #[serde(rename = "snd_wnd")]
    pub sender_window: u32,
    /// Bytes in the send buffer, including in-flight data.
    #[serde(rename = "snd_buf_inuse")]
    pub sender_in_use: u32,
    /// Smoothed RTT.
    #[serde(serialize_with = "serialize_nanos")]
    pub srtt: Duration,
    pub segs_sent: u64,
    pub bytes_sent: u64,
    pub retrans_segs_sent: u64,
    pub retrans_bytes: u64,
    #[serde(rename = "segs_rcvd")]
    pub segs_received: u64,
    #[serde(rename = "bytes_rcvd")]
    pub bytes_received: u64,
    #[serde(rename = "out_of_order_bytes_rcvd")]
    pub out_of_order_bytes_received: u64,
}

/// Decode a Darwin `tcp_connection_info` buffer.
pub fn parse_info(data: &[u8]) -> Result<Info> {
    let ti: TcpConnectionInfoRaw = read_layout(data, MANDATORY_LEN)?;

    // The option bits live in the low byte of a u32 here.
    let options = (ti.options & 0xff) as u8;

    let mut info = Info {
        state: State::from_bsd(ti.state),
        ..Default::default()
    };

    if options & opt::WSCALE != 0 {
        info.options.push(TcpOption::WindowScale(ti.rcv_wscale));
        info.peer_options.push(TcpOption::WindowScale(ti.snd_wscale));
    }
    if options & opt::SACK != 0 {
        info.options.push(TcpOption::SackPermitted(true));
        info.peer_options.push(TcpOption::SackPermitted(true));
    }
    if options & opt::TIMESTAMPS != 0 {
        info.options.push(TcpOption::Timestamps(true));
        info.peer_options.push(TcpOption::Timestamps(true));
    }

    info.sender_mss = ti.maxseg;
    info.receiver_mss = ti.maxseg;
    info.rtt = millis(ti.rttcur);
    info.rtt_var = millis(ti.rttvar);
    info.rto = millis(ti.rto);

    info.flow_control = Some(FlowControl {
        receiver_window: ti.rcv_wnd,
    });
    info.congestion_control = Some(CongestionControl {
        sender_ss_threshold: ti.snd_ssthresh,
        receiver_ss_threshold: 0,
        sender_window: ti.snd_cwnd,
    });

    info.sys = Some(SysInfo::Darwin(DarwinSysInfo {
        flags: ti.flags,
        sender_window: ti.snd_wnd,
        sender_in_use: ti.snd_sbbytes,
        srtt: millis(ti.srtt),
        segs_sent: ti.txpackets,
        bytes_sent: ti.txbytes,
        retrans_segs_sent: ti.txretransmitpackets,
        retrans_bytes: ti.txretransmitbytes,
        segs_received: ti.rxpackets,
        bytes_received: ti.rxbytes,
        out_of_order_bytes_received: ti.rxoutoforderbytes,
    }));

    Ok(info)
}
