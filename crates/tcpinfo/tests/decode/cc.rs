//! Congestion control algorithm information.

use std::time::Duration;

use tcpinfo::cc::{BbrInfo, CcAlgorithmRegistry, DctcpInfo, VegasInfo};
use tcpinfo::{CcAlgorithmInfo, Result, parse_cc_algorithm, parse_cc_algorithm_info};

fn words(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_ne_bytes()).collect()
}

#[test]
fn test_bbr_from_name_buffer() {
    let mut name = [0u8; 16];
    name[..3].copy_from_slice(b"bbr");
    let algo = parse_cc_algorithm(&name).unwrap();

    let payload = words(&[125_000, 0, 20_000, 256, 512]);
    let info = parse_cc_algorithm_info(algo.as_str(), &payload).unwrap();
    assert_eq!(info.algorithm(), "bbr");

    let bbr = info.downcast_ref::<BbrInfo>().unwrap();
    assert_eq!(bbr.max_bandwidth, 125_000);
    assert_eq!(bbr.bandwidth_bps(), 1_000_000);
    assert_eq!(bbr.min_rtt, Duration::from_millis(20));
    assert_eq!(bbr.congestion_window_gain, 512);

    let json = info.to_json();
    assert_eq!(json["max_bw"], 125_000);
    assert_eq!(json["min_rtt"], 20_000_000);
}

#[test]
fn test_bbr_high_word() {
    let payload = words(&[0, 2, 0, 0, 0]);
    let info = parse_cc_algorithm_info("bbr", &payload).unwrap();
    let bbr = info.downcast_ref::<BbrInfo>().unwrap();
    assert_eq!(bbr.max_bandwidth, 2 << 32);
}

#[test]
fn test_vegas_and_dctcp() {
    let info = parse_cc_algorithm_info("vegas", &words(&[1, 3, 900, 700])).unwrap();
    let vegas = info.downcast_ref::<VegasInfo>().unwrap();
    assert!(vegas.enabled);
    assert_eq!(vegas.rtt, Duration::from_micros(900));

    // enabled and ce_state are u16 halves of the first word
    let mut payload = Vec::new();
    payload.extend_from_slice(&1u16.to_ne_bytes());
    payload.extend_from_slice(&1u16.to_ne_bytes());
    payload.extend(words(&[512, 40, 400]));
    let info = parse_cc_algorithm_info("dctcp", &payload).unwrap();
    let dctcp = info.downcast_ref::<DctcpInfo>().unwrap();
    assert_eq!((dctcp.ce_state, dctcp.alpha), (1, 512));
    assert_eq!(dctcp.ecn_acked_bytes, 40);
}

#[test]
fn test_unknown_and_short() {
    assert!(
        parse_cc_algorithm_info("cubic", &[0; 32])
            .unwrap_err()
            .is_not_supported()
    );
    assert!(
        parse_cc_algorithm_info("vegas", &[0; 15])
            .unwrap_err()
            .is_buffer_too_short()
    );
    assert!(
        CcAlgorithmRegistry::new()
            .parse("bbr", &[0; 20])
            .unwrap_err()
            .is_not_supported()
    );
}

#[derive(Debug)]
struct Echo(Vec<u8>);

impl CcAlgorithmInfo for Echo {
    fn algorithm(&self) -> &str {
        "echo"
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "len": self.0.len() })
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

fn parse_echo(data: &[u8]) -> Result<Box<dyn CcAlgorithmInfo>> {
    Ok(Box::new(Echo(data.to_vec())))
}

#[test]
fn test_registered_decoder() {
    let registry = CcAlgorithmRegistry::builtin().with_decoder("echo", parse_echo);
    assert!(registry.contains("echo"));
    assert!(registry.contains("bbr"));

    let info = registry.parse("echo", &[1, 2, 3]).unwrap();
    assert_eq!(info.algorithm(), "echo");
    assert_eq!(info.to_json()["len"], 3);
    assert_eq!(info.downcast_ref::<Echo>().unwrap().0, [1, 2, 3]);

    // The process-wide registry is unaffected.
    assert!(
        parse_cc_algorithm_info("echo", &[])
            .unwrap_err()
            .is_not_supported()
    );
}
