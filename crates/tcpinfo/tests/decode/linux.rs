//! Linux `tcp_info` decoding.

use std::time::Duration;

use serde_json::json;
use tcpinfo::sys::linux::{MANDATORY_LEN, TcpInfoRaw};
use tcpinfo::{OptionKind, Platform, State, SysInfo, TcpOption};

use crate::common::{OPT_SACK, OPT_TIMESTAMPS, OPT_WSCALE, RawBuf, linux};

fn established() -> RawBuf {
    RawBuf::new(TcpInfoRaw::SIZE)
        .u8(linux::STATE, 1)
        .u8(linux::OPTIONS, OPT_TIMESTAMPS | OPT_SACK | OPT_WSCALE)
        .u8(linux::WSCALE, 0x79)
        .u32(linux::RTO, 204_000)
        .u32(linux::ATO, 40_000)
        .u32(linux::SND_MSS, 1448)
        .u32(linux::RCV_MSS, 536)
        .u32(linux::LAST_DATA_SENT, 12)
        .u32(linux::LAST_DATA_RECV, 34)
        .u32(linux::LAST_ACK_RECV, 56)
        .u32(linux::PMTU, 1500)
        .u32(linux::RCV_SSTHRESH, 64_076)
        .u32(linux::RTT, 123)
        .u32(linux::RTTVAR, 50)
        .u32(linux::SND_SSTHRESH, 0x7fff_ffff)
        .u32(linux::SND_CWND, 10)
        .u32(linux::RCV_SPACE, 14_600)
        .u32(linux::TOTAL_RETRANS, 2)
        .u64(linux::PACING_RATE, 1_000_000)
        .u64(linux::BYTES_ACKED, 4096)
        .u32(linux::MIN_RTT, 80)
        .u64(linux::DELIVERY_RATE, 500_000)
        .u32(linux::SND_WND, 65_535)
}

#[test]
fn test_full_layout() {
    assert_eq!(TcpInfoRaw::SIZE, 240);

    let info = Platform::Linux.decode_info(established().bytes()).unwrap();
    assert_eq!(info.state, State::Established);
    assert_eq!(info.sender_mss, 1448);
    assert_eq!(info.receiver_mss, 536);
    assert_eq!(info.rtt, Duration::from_micros(123));
    assert_eq!(info.rtt_var, Duration::from_micros(50));
    assert_eq!(info.rto, Duration::from_millis(204));
    assert_eq!(info.ato, Duration::from_millis(40));
    assert_eq!(info.last_data_sent, Duration::from_millis(12));
    assert_eq!(info.last_data_received, Duration::from_millis(34));
    assert_eq!(info.last_ack_received, Duration::from_millis(56));

    assert_eq!(info.flow_control.unwrap().receiver_window, 14_600);
    let cc = info.congestion_control.unwrap();
    assert_eq!(cc.sender_window, 10);
    assert_eq!(cc.receiver_ss_threshold, 64_076);

    let Some(SysInfo::Linux(sys)) = &info.sys else {
        panic!("expected linux sys info");
    };
    assert_eq!(sys.path_mtu, 1500);
    assert_eq!(sys.total_retrans_segs, 2);
    assert_eq!(sys.pacing_rate, 1_000_000);
    assert_eq!(sys.bytes_acked, 4096);
    assert_eq!(sys.min_rtt, Duration::from_micros(80));
    assert_eq!(sys.delivery_rate, 500_000);
    assert_eq!(sys.snd_wnd, 65_535);
}

#[test]
fn test_window_scale_nibbles() {
    let info = Platform::Linux.decode_info(established().bytes()).unwrap();
    // Low nibble is the peer's (send) scale, high nibble ours.
    assert_eq!(
        info.option(OptionKind::WindowScale),
        Some(TcpOption::WindowScale(7))
    );
    assert_eq!(
        info.peer_option(OptionKind::WindowScale),
        Some(TcpOption::WindowScale(9))
    );
    assert_eq!(
        info.option(OptionKind::Timestamps),
        Some(TcpOption::Timestamps(true))
    );
    assert_eq!(info.option(OptionKind::MaxSegSize), None);
}

#[test]
fn test_no_options_negotiated() {
    let buf = RawBuf::new(TcpInfoRaw::SIZE).u8(linux::STATE, 10);
    let info = Platform::Linux.decode_info(buf.bytes()).unwrap();
    assert_eq!(info.state, State::Listen);
    assert!(info.options.is_empty());
    assert!(info.peer_options.is_empty());

    let v: serde_json::Value = serde_json::from_str(&info.to_json().unwrap()).unwrap();
    assert!(v.get("opts").is_none());
    assert!(v.get("peer_opts").is_none());
}

#[test]
fn test_older_kernel_prefix() {
    let buf = established();
    let info = Platform::Linux.decode_info(buf.prefix(MANDATORY_LEN)).unwrap();
    assert_eq!(info.state, State::Established);
    assert_eq!(info.rtt, Duration::from_micros(123));

    let Some(SysInfo::Linux(sys)) = &info.sys else {
        panic!("expected linux sys info");
    };
    assert_eq!(sys.total_retrans_segs, 2);
    assert_eq!(sys.pacing_rate, 0);
    assert_eq!(sys.snd_wnd, 0);
}

#[test]
fn test_truncated_below_prefix() {
    let buf = established();
    let err = Platform::Linux
        .decode_info(buf.prefix(MANDATORY_LEN - 1))
        .unwrap_err();
    assert!(err.is_buffer_too_short());
    assert!(Platform::Linux.decode_info(&[]).unwrap_err().is_buffer_too_short());
}

#[test]
fn test_newer_kernel_extra_bytes() {
    let full = Platform::Linux.decode_info(established().bytes()).unwrap();
    let extended = Platform::Linux
        .decode_info(established().extended(32).bytes())
        .unwrap();
    assert_eq!(full, extended);
}

#[test]
fn test_unknown_state_code() {
    let buf = RawBuf::new(TcpInfoRaw::SIZE).u8(linux::STATE, 42);
    let info = Platform::Linux.decode_info(buf.bytes()).unwrap();
    assert_eq!(info.state, State::Unknown);
}

#[test]
fn test_json_shape() {
    let info = Platform::Linux.decode_info(established().bytes()).unwrap();
    let v: serde_json::Value = serde_json::from_str(&info.to_json().unwrap()).unwrap();

    assert_eq!(v["state"], "established");
    assert_eq!(
        v["opts"],
        json!({ "sack": true, "tmstamps": true, "wscale": 7 })
    );
    assert_eq!(v["peer_opts"]["wscale"], 9);
    assert_eq!(v["snd_mss"], 1448);
    assert_eq!(v["rtt"], 123_000);
    assert_eq!(v["rto"], 204_000_000);
    assert_eq!(v["last_ack_rcvd"], 56_000_000);
    assert_eq!(v["flow_ctl"], json!({ "rcv_wnd": 14_600 }));
    assert_eq!(v["cong_ctl"]["snd_cwnd"], 10);
    assert_eq!(v["sys"]["path_mtu"], 1500);
    assert_eq!(v["sys"]["min_rtt"], 80_000);
}

#[test]
fn test_summary() {
    let info = Platform::Linux.decode_info(established().bytes()).unwrap();
    let line = info.summary();
    assert!(line.starts_with("ts sack wscale:9,7 rto:204 rtt:0.123/0.050 ato:40"));
    assert!(line.contains("cwnd:10"));
    assert!(!line.contains("ssthresh:"));
    assert!(line.ends_with("lastsnd:12 lastrcv:34 lastack:56 rcv_space:14600"));
}
