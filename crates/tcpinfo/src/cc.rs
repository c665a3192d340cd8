//! Congestion control algorithm information.
//!
//! `TCP_CC_INFO` returns a payload whose layout depends on the active
//! algorithm (as reported by `TCP_CONGESTION`). A [`CcAlgorithmRegistry`]
//! maps algorithm names to decoders for those payloads. Registries are
//! built once and never mutated afterwards; new algorithms are added in
//! the construction step:
//!
//! ```ignore
//! use tcpinfo::cc::CcAlgorithmRegistry;
//!
//! let registry = CcAlgorithmRegistry::builtin().with_decoder("mycc", parse_mycc);
//! let info = registry.parse("bbr", &bytes)?;
//! assert_eq!(info.algorithm(), "bbr");
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;

use serde::Serialize;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::info::serialize_nanos;
use crate::{Error, Result};

/// Algorithm-specific information decoded from `TCP_CC_INFO`.
pub trait CcAlgorithmInfo: fmt::Debug + Send + Sync {
    /// Name of the algorithm that produced this information.
    fn algorithm(&self) -> &str;

    /// Render as a JSON value.
    fn to_json(&self) -> serde_json::Value;

    /// Access the concrete type.
    fn as_any(&self) -> &dyn Any;
}

impl dyn CcAlgorithmInfo {
    /// Downcast to a concrete information type.
    pub fn downcast_ref<T: CcAlgorithmInfo + 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }
}

/// Decoder for one algorithm's payload.
pub type CcAlgorithmDecoder = fn(&[u8]) -> Result<Box<dyn CcAlgorithmInfo>>;

/// Immutable mapping from algorithm name to payload decoder.
#[derive(Clone, Default)]
pub struct CcAlgorithmRegistry {
    decoders: HashMap<String, CcAlgorithmDecoder>,
}

impl CcAlgorithmRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the decoders shipped by this crate
    /// (`vegas`, `dctcp`, `bbr`).
    pub fn builtin() -> Self {
        Self::new()
            .with_decoder(VegasInfo::ALGORITHM, parse_vegas)
            .with_decoder(DctcpInfo::ALGORITHM, parse_dctcp)
            .with_decoder(BbrInfo::ALGORITHM, parse_bbr)
    }

    /// Add a decoder, replacing any previous one for the same name.
    pub fn with_decoder(mut self, name: impl Into<String>, decoder: CcAlgorithmDecoder) -> Self {
        self.decoders.insert(name.into(), decoder);
        self
    }

    /// Whether a decoder is registered for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.decoders.contains_key(name)
    }

    /// Registered algorithm names, sorted.
    pub fn algorithms(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.decoders.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Decode `data` with the decoder registered for `name`.
    pub fn parse(&self, name: &str, data: &[u8]) -> Result<Box<dyn CcAlgorithmInfo>> {
        let decoder = self.decoders.get(name).ok_or_else(|| {
            tracing::debug!(algorithm = name, "no decoder for congestion control algorithm");
            Error::not_supported(format!("congestion control algorithm {name:?}"))
        })?;
        decoder(data)
    }
}

impl fmt::Debug for CcAlgorithmRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CcAlgorithmRegistry")
            .field("algorithms", &self.algorithms())
            .finish()
    }
}

static BUILTIN: LazyLock<CcAlgorithmRegistry> = LazyLock::new(CcAlgorithmRegistry::builtin);

/// The process-wide registry of built-in decoders.
pub fn builtin_registry() -> &'static CcAlgorithmRegistry {
    &BUILTIN
}

/// Decode `TCP_CC_INFO` bytes for algorithm `name` using the built-in
/// decoders.
pub fn parse_cc_algorithm_info(name: &str, data: &[u8]) -> Result<Box<dyn CcAlgorithmInfo>> {
    BUILTIN.parse(name, data)
}

fn read_exact<T>(data: &[u8]) -> Result<T>
where
    T: FromBytes + KnownLayout + Immutable,
{
    T::read_from_prefix(data)
        .map(|(v, _)| v)
        .map_err(|_| Error::BufferTooShort {
            needed: std::mem::size_of::<T>(),
            have: data.len(),
        })
}

macro_rules! impl_cc_algorithm_info {
    ($ty:ty) => {
        impl CcAlgorithmInfo for $ty {
            fn algorithm(&self) -> &str {
                Self::ALGORITHM
            }

            fn to_json(&self) -> serde_json::Value {
                serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
            }

            fn as_any(&self) -> &dyn Any {
                self
            }
        }
    };
}

/// Kernel `struct tcpvegas_info`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
struct VegasInfoRaw {
    enabled: u32,
    rttcnt: u32,
    rtt: u32,
    minrtt: u32,
}

/// Vegas (and other delay-based algorithms reporting `tcpvegas_info`)
/// information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VegasInfo {
    pub enabled: bool,
    /// RTTs measured in the current round.
    #[serde(rename = "rnd_trips")]
    pub round_trips: u32,
    #[serde(serialize_with = "serialize_nanos")]
    pub rtt: Duration,
    #[serde(serialize_with = "serialize_nanos")]
    pub min_rtt: Duration,
}

impl VegasInfo {
    pub const ALGORITHM: &'static str = "vegas";
}

impl_cc_algorithm_info!(VegasInfo);

fn parse_vegas(data: &[u8]) -> Result<Box<dyn CcAlgorithmInfo>> {
    let raw: VegasInfoRaw = read_exact(data)?;
    Ok(Box::new(VegasInfo {
        enabled: raw.enabled != 0,
        round_trips: raw.rttcnt,
        rtt: Duration::from_micros(raw.rtt.into()),
        min_rtt: Duration::from_micros(raw.minrtt.into()),
    }))
}

/// Kernel `struct tcp_dctcp_info`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
struct DctcpInfoRaw {
    enabled: u16,
    ce_state: u16,
    alpha: u32,
    ab_ecn: u32,
    ab_tot: u32,
}

/// Data center TCP information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DctcpInfo {
    pub enabled: bool,
    /// Congestion encountered state.
    pub ce_state: u16,
    /// Fraction of marked bytes, scaled by 1024.
    pub alpha: u32,
    /// Bytes acked with ECE set.
    #[serde(rename = "ecn_bytes")]
    pub ecn_acked_bytes: u32,
    /// Total bytes acked.
    #[serde(rename = "total_bytes")]
    pub total_acked_bytes: u32,
}

impl DctcpInfo {
    pub const ALGORITHM: &'static str = "dctcp";
}

impl_cc_algorithm_info!(DctcpInfo);

fn parse_dctcp(data: &[u8]) -> Result<Box<dyn CcAlgorithmInfo>> {
    let raw: DctcpInfoRaw = read_exact(data)?;
    Ok(Box::new(DctcpInfo {
        enabled: raw.enabled != 0,
        ce_state: raw.ce_state,
        alpha: raw.alpha,
        ecn_acked_bytes: raw.ab_ecn,
        total_acked_bytes: raw.ab_tot,
    }))
}

/// Kernel `struct tcp_bbr_info`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
struct BbrInfoRaw {
    bw_lo: u32,
    bw_hi: u32,
    min_rtt: u32,
    pacing_gain: u32,
    cwnd_gain: u32,
}

/// Bottleneck bandwidth and RTT information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BbrInfo {
    /// Maximum bandwidth estimate in bytes/sec.
    #[serde(rename = "max_bw")]
    pub max_bandwidth: u64,
    /// Minimum RTT estimate.
    #[serde(serialize_with = "serialize_nanos")]
    pub min_rtt: Duration,
    /// Pacing gain, fixed point shifted left by 8.
    pub pacing_gain: u32,
    /// Congestion window gain, fixed point shifted left by 8.
    #[serde(rename = "cwnd_gain")]
    pub congestion_window_gain: u32,
}

impl BbrInfo {
    pub const ALGORITHM: &'static str = "bbr";

    /// Maximum bandwidth estimate in bits/sec.
    pub fn bandwidth_bps(&self) -> u64 {
        self.max_bandwidth.saturating_mul(8)
    }
}

impl_cc_algorithm_info!(BbrInfo);

fn parse_bbr(data: &[u8]) -> Result<Box<dyn CcAlgorithmInfo>> {
    let raw: BbrInfoRaw = read_exact(data)?;
    Ok(Box::new(BbrInfo {
        max_bandwidth: (u64::from(raw.bw_hi) << 32) | u64::from(raw.bw_lo),
        min_rtt: Duration::from_micros(raw.min_rtt.into()),
        pacing_gain: raw.pacing_gain,
        congestion_window_gain: raw.cwnd_gain,
    }))
}
