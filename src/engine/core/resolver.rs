//! Baseline configuration lookup and override merging.
//!
//! Nothing here validates ranges. A zero width survives both functions and is
//! rejected by `EncoderSession::init`.

use tracing::debug;

use super::interface::CodecInterface;
use super::types::{ConfigOverrides, EncoderConfig, Rational, UsageProfile};
use crate::engine::error::EncoderError;

const DEFAULT_WIDTH: u32 = 320;
const DEFAULT_HEIGHT: u32 = 240;
const DEFAULT_FPS: u32 = 30;
const DEFAULT_BITRATE_KBPS: u32 = 256;
const DEFAULT_THREADS: u32 = 1;

/// Baseline configuration an implementation starts from for `usage`
pub fn get_default(
    interface: &CodecInterface,
    usage: UsageProfile,
) -> Result<EncoderConfig, EncoderError> {
    let caps = interface.capabilities()?;

    let config = EncoderConfig {
        width: DEFAULT_WIDTH,
        height: DEFAULT_HEIGHT,
        timebase: Rational::per_second(DEFAULT_FPS),
        target_bitrate_kbps: DEFAULT_BITRATE_KBPS,
        usage,
        lag_in_frames: usage.default_lag_in_frames(),
        threads: DEFAULT_THREADS,
    };
    debug!(kind = caps.kind, %usage, "derived baseline config");
    Ok(config)
}

/// Field-wise merge; fields missing from `overrides` keep the base value
pub fn apply_overrides(base: EncoderConfig, overrides: &ConfigOverrides) -> EncoderConfig {
    EncoderConfig {
        width: overrides.width.unwrap_or(base.width),
        height: overrides.height.unwrap_or(base.height),
        timebase: overrides.timebase.unwrap_or(base.timebase),
        target_bitrate_kbps: overrides
            .target_bitrate_kbps
            .unwrap_or(base.target_bitrate_kbps),
        usage: overrides.usage.unwrap_or(base.usage),
        lag_in_frames: overrides.lag_in_frames.unwrap_or(base.lag_in_frames),
        threads: overrides.threads.unwrap_or(base.threads),
    }
}
