//! Option registry and raw option dispatch.

use tcpinfo::sys::linux::TcpInfoRaw;
use tcpinfo::{
    CcAlgorithm, CcInfo, IPPROTO_TCP, Info, OptionId, Platform, SocketOption, Sockopt,
    SockoptKind, State,
};

use crate::common::{RawBuf, linux};

#[test]
fn test_registry_table() {
    let expected = [
        (Platform::Linux, SockoptKind::Info, Some(11)),
        (Platform::Linux, SockoptKind::CcInfo, Some(26)),
        (Platform::Linux, SockoptKind::CcAlgorithm, Some(13)),
        (Platform::Darwin, SockoptKind::Info, Some(0x106)),
        (Platform::Darwin, SockoptKind::CcInfo, None),
        (Platform::Darwin, SockoptKind::CcAlgorithm, None),
        (Platform::FreeBsd, SockoptKind::Info, Some(0x20)),
        (Platform::FreeBsd, SockoptKind::CcInfo, None),
        (Platform::FreeBsd, SockoptKind::CcAlgorithm, Some(0x40)),
        (Platform::NetBsd, SockoptKind::Info, Some(9)),
        (Platform::NetBsd, SockoptKind::CcInfo, None),
        (Platform::NetBsd, SockoptKind::CcAlgorithm, None),
    ];

    for (platform, kind, name) in expected {
        match name {
            Some(name) => {
                let id = platform.option_id(kind).unwrap();
                assert_eq!(id, OptionId::new(IPPROTO_TCP, name), "{platform} {kind}");
            }
            None => assert!(
                platform.option_id(kind).unwrap_err().is_not_supported(),
                "{platform} {kind}"
            ),
        }
    }
}

#[test]
fn test_sockopt_level_and_name() {
    let info = Info::default();
    for platform in Platform::SUPPORTED {
        assert_eq!(info.level(platform).unwrap(), IPPROTO_TCP);
    }
    assert_eq!(info.name(Platform::Darwin).unwrap(), 0x106);
    assert!(info.marshal().unwrap_err().is_not_supported());

    assert!(
        CcInfo::default()
            .id(Platform::NetBsd)
            .unwrap_err()
            .is_not_supported()
    );
}

#[test]
fn test_parse_info_by_id() {
    let buf = RawBuf::new(TcpInfoRaw::SIZE)
        .u8(linux::STATE, 1)
        .u32(linux::SND_MSS, 1448);
    let id = Platform::Linux.option_id(SockoptKind::Info).unwrap();

    let SocketOption::Info(info) = SocketOption::parse(Platform::Linux, id, buf.bytes()).unwrap()
    else {
        panic!("expected connection info");
    };
    assert_eq!(info.state, State::Established);
    assert_eq!(info.sender_mss, 1448);
}

#[test]
fn test_parse_algorithm_by_id() {
    let id = Platform::FreeBsd
        .option_id(SockoptKind::CcAlgorithm)
        .unwrap();
    let mut buf = [0u8; 16];
    buf[..7].copy_from_slice(b"newreno");

    let opt = SocketOption::parse(Platform::FreeBsd, id, &buf).unwrap();
    assert_eq!(opt.kind(), SockoptKind::CcAlgorithm);
    let algo = CcAlgorithm::try_from(opt).unwrap();
    assert_eq!(algo.as_str(), "newreno");
    assert_eq!(algo.marshal().unwrap(), b"newreno");
}

#[test]
fn test_parse_unknown_id() {
    // Linux TCP_CC_INFO is not defined on Darwin.
    let err = SocketOption::parse(Platform::Darwin, OptionId::new(IPPROTO_TCP, 26), &[0; 8])
        .unwrap_err();
    assert!(err.is_not_supported());
}

#[test]
fn test_wrong_variant_conversion() {
    let opt = SocketOption::from(CcInfo::new(vec![1, 2, 3]));
    assert!(CcAlgorithm::try_from(opt).unwrap_err().is_not_supported());
}
