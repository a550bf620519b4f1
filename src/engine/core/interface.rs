//! Codec capability table and interface resolution.

use std::fmt;
use tracing::{debug, warn};

use super::types::UsageProfile;
use crate::engine::error::EncoderError;

/// Bitstream family an implementation produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecFamily {
    Vp8,
    Vp9,
    Av1,
}

impl CodecFamily {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Vp8 => "VP8",
            Self::Vp9 => "VP9",
            Self::Av1 => "AV1",
        }
    }
}

/// Whether an implementation can be handed out by `resolve`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Full,
    /// Present but missing pieces; the string says what
    Partial(&'static str),
}

/// One row of the capability table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecCapabilities {
    /// Name accepted by `resolve` (e.g., "vp8", "baseline")
    pub kind: &'static str,
    pub family: CodecFamily,
    pub description: &'static str,
    pub abi_version: u32,
    pub availability: Availability,
    /// Largest width or height accepted, in pixels
    pub max_dimension: u32,
    pub max_bitrate_kbps: u32,
    /// Ceiling on width * height * fps for realtime usage
    pub max_realtime_pixel_rate: u64,
    pub usages: &'static [UsageProfile],
}

impl CodecCapabilities {
    pub fn supports_usage(&self, usage: UsageProfile) -> bool {
        self.usages.contains(&usage)
    }

    pub fn is_available(&self) -> bool {
        self.availability == Availability::Full
    }
}

const ALL_USAGES: &[UsageProfile] = &[
    UsageProfile::GoodQuality,
    UsageProfile::Realtime,
    UsageProfile::BestQuality,
];

const VP8_REALTIME_PIXEL_RATE: u64 = 1920 * 1080 * 60;
const VP9_REALTIME_PIXEL_RATE: u64 = 3840 * 2160 * 60;

static CODECS: &[CodecCapabilities] = &[
    CodecCapabilities {
        kind: "baseline",
        family: CodecFamily::Vp8,
        description: "Reference software encoder (VP8 bitstream)",
        abi_version: 4,
        availability: Availability::Full,
        max_dimension: 16383,
        max_bitrate_kbps: 100_000,
        max_realtime_pixel_rate: VP8_REALTIME_PIXEL_RATE,
        usages: ALL_USAGES,
    },
    CodecCapabilities {
        kind: "vp8",
        family: CodecFamily::Vp8,
        description: "VP8 software encoder",
        abi_version: 4,
        availability: Availability::Full,
        max_dimension: 16383,
        max_bitrate_kbps: 100_000,
        max_realtime_pixel_rate: VP8_REALTIME_PIXEL_RATE,
        usages: ALL_USAGES,
    },
    CodecCapabilities {
        kind: "vp9",
        family: CodecFamily::Vp9,
        description: "VP9 software encoder",
        abi_version: 5,
        availability: Availability::Full,
        max_dimension: 65535,
        max_bitrate_kbps: 250_000,
        max_realtime_pixel_rate: VP9_REALTIME_PIXEL_RATE,
        usages: ALL_USAGES,
    },
    CodecCapabilities {
        kind: "av1",
        family: CodecFamily::Av1,
        description: "AV1 software encoder",
        abi_version: 1,
        availability: Availability::Partial("realtime rate control is not built in"),
        max_dimension: 65535,
        max_bitrate_kbps: 250_000,
        max_realtime_pixel_rate: 0,
        usages: &[UsageProfile::GoodQuality, UsageProfile::BestQuality],
    },
];

/// Opaque handle naming one codec implementation and ABI version.
///
/// Obtained from [`resolve`]; carries no resources and can be copied freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CodecInterface {
    kind: &'static str,
    abi_version: u32,
}

impl CodecInterface {
    /// Build a handle without consulting the table.
    ///
    /// For callers that carry interface identities across a boundary.
    /// Anything that does not match a fully available row is rejected
    /// later with `InvalidInterface`.
    pub fn unchecked(kind: &'static str, abi_version: u32) -> Self {
        Self { kind, abi_version }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn abi_version(&self) -> u32 {
        self.abi_version
    }

    /// Table row this handle was resolved from
    pub fn capabilities(&self) -> Result<&'static CodecCapabilities, EncoderError> {
        CODECS
            .iter()
            .find(|caps| {
                caps.kind == self.kind && caps.abi_version == self.abi_version && caps.is_available()
            })
            .ok_or_else(|| EncoderError::InvalidInterface {
                kind: self.kind.to_string(),
                abi_version: self.abi_version,
            })
    }
}

impl fmt::Display for CodecInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (abi {})", self.kind, self.abi_version)
    }
}

/// Resolve a codec kind name to an interface handle
pub fn resolve(kind: &str) -> Result<CodecInterface, EncoderError> {
    let wanted = kind.trim();
    let caps = CODECS
        .iter()
        .find(|caps| caps.kind.eq_ignore_ascii_case(wanted))
        .ok_or_else(|| EncoderError::NotSupported {
            kind: wanted.to_string(),
            reason: "no implementation with that name",
        })?;

    if let Availability::Partial(reason) = caps.availability {
        warn!(kind = caps.kind, reason, "refusing partially available codec");
        return Err(EncoderError::NotSupported {
            kind: caps.kind.to_string(),
            reason,
        });
    }

    debug!(kind = caps.kind, abi = caps.abi_version, "resolved codec interface");
    Ok(CodecInterface {
        kind: caps.kind,
        abi_version: caps.abi_version,
    })
}

/// Every row of the table, including partially available ones
pub fn capability_table() -> &'static [CodecCapabilities] {
    CODECS
}

/// Handles for every implementation `resolve` accepts
pub fn available_interfaces() -> impl Iterator<Item = CodecInterface> {
    CODECS
        .iter()
        .filter(|caps| caps.is_available())
        .map(|caps| CodecInterface {
            kind: caps.kind,
            abi_version: caps.abi_version,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::error::ErrorCode;

    #[test]
    fn test_resolve_known_kinds() {
        for kind in ["baseline", "vp8", "vp9"] {
            let iface = resolve(kind).expect("kind should resolve");
            assert_eq!(iface.kind(), kind);
            assert!(iface.capabilities().is_ok());
        }
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let iface = resolve("  VP9 ").unwrap();
        assert_eq!(iface.kind(), "vp9");
        assert_eq!(iface.abi_version(), 5);
    }

    #[test]
    fn test_resolve_unknown_kind() {
        let err = resolve("nonexistent").unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotSupported);
        assert!(err.to_string().contains("nonexistent"));
    }

    #[test]
    fn test_resolve_refuses_partial_implementation() {
        let err = resolve("av1").unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotSupported);
        assert!(err.to_string().contains("realtime rate control"));
    }

    #[test]
    fn test_unchecked_handles_are_validated() {
        assert!(CodecInterface::unchecked("vp8", 4).capabilities().is_ok());

        // Wrong ABI
        let err = CodecInterface::unchecked("vp8", 3).capabilities().unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidInterface);

        // Partial rows never validate
        let err = CodecInterface::unchecked("av1", 1).capabilities().unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidInterface);
    }

    #[test]
    fn test_available_interfaces_match_resolve() {
        let available: Vec<_> = available_interfaces().collect();
        assert_eq!(available.len(), 3);
        for iface in available {
            assert_eq!(resolve(iface.kind()).unwrap(), iface);
        }
        assert_eq!(capability_table().len(), 4);
    }

    #[test]
    fn test_table_rows_are_consistent() {
        let mut seen = std::collections::HashSet::new();
        for caps in capability_table() {
            assert!(seen.insert(caps.kind), "Duplicate codec kind '{}'", caps.kind);
            assert!(caps.max_dimension > 0);
            assert!(caps.max_bitrate_kbps > 0);
            if caps.is_available() {
                assert!(caps.supports_usage(UsageProfile::Realtime));
                assert!(caps.max_realtime_pixel_rate > 0);
            }
        }
    }
}
