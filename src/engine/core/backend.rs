//! Resource acquisition behind an encoder session.
//!
//! A backend turns a validated config into an [`EncoderContext`]. Dropping the
//! context releases everything it holds, so the session never has to pair
//! acquire and release calls by hand.

use tracing::{debug, trace};

use super::interface::CodecInterface;
use super::types::{EncoderConfig, RawFrame};
use crate::engine::error::EncoderError;

/// Frames kept besides the look-ahead queue (source + reconstruction)
const EXTRA_POOL_FRAMES: u64 = 2;

/// Live encoder resources. Dropping the context releases them.
pub trait EncoderContext {
    /// Accept one frame. No bitstream is produced.
    fn submit(&mut self, frame: &RawFrame) -> Result<(), EncoderError>;

    /// Bytes currently held
    fn allocated_bytes(&self) -> u64;
}

/// Acquires the resources an encoder instance needs
pub trait EncoderBackend {
    fn open(
        &self,
        interface: &CodecInterface,
        config: &EncoderConfig,
    ) -> Result<Box<dyn EncoderContext>, EncoderError>;
}

/// Bytes in one I420 frame (full-size luma, quarter-size chroma planes)
pub fn i420_frame_bytes(width: u32, height: u32) -> Option<u64> {
    let luma = u64::from(width).checked_mul(u64::from(height))?;
    luma.checked_mul(3).map(|n| n / 2)
}

/// Total frame pool a config needs
pub fn frame_pool_bytes(config: &EncoderConfig) -> Option<u64> {
    let frames = u64::from(config.lag_in_frames).checked_add(EXTRA_POOL_FRAMES)?;
    i420_frame_bytes(config.width, config.height)?.checked_mul(frames)
}

/// In-process backend that reserves a frame pool on the heap
#[derive(Debug, Clone, Default)]
pub struct SoftwareBackend {
    memory_limit_bytes: Option<u64>,
}

impl SoftwareBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse any pool larger than `bytes`
    pub fn with_memory_limit(bytes: u64) -> Self {
        Self {
            memory_limit_bytes: Some(bytes),
        }
    }
}

impl EncoderBackend for SoftwareBackend {
    fn open(
        &self,
        interface: &CodecInterface,
        config: &EncoderConfig,
    ) -> Result<Box<dyn EncoderContext>, EncoderError> {
        let requested = frame_pool_bytes(config).ok_or_else(|| EncoderError::MemoryAllocation {
            requested: None,
            detail: format!(
                "frame pool size for {}x{} overflows",
                config.width, config.height
            ),
        })?;

        if let Some(limit) = self.memory_limit_bytes {
            if requested > limit {
                return Err(EncoderError::MemoryAllocation {
                    requested: Some(requested),
                    detail: format!("memory limit is {} bytes", limit),
                });
            }
        }

        let capacity = usize::try_from(requested).map_err(|_| EncoderError::MemoryAllocation {
            requested: Some(requested),
            detail: "exceeds the address space".to_string(),
        })?;

        let mut pool: Vec<u8> = Vec::new();
        pool.try_reserve_exact(capacity)
            .map_err(|e| EncoderError::MemoryAllocation {
                requested: Some(requested),
                detail: e.to_string(),
            })?;

        debug!(
            kind = interface.kind(),
            bytes = requested,
            frames = u64::from(config.lag_in_frames) + EXTRA_POOL_FRAMES,
            "reserved encoder frame pool"
        );
        Ok(Box::new(SoftwareContext {
            kind: interface.kind(),
            pool,
            reserved: requested,
            frames_seen: 0,
        }))
    }
}

struct SoftwareContext {
    kind: &'static str,
    pool: Vec<u8>,
    reserved: u64,
    frames_seen: u64,
}

impl EncoderContext for SoftwareContext {
    fn submit(&mut self, frame: &RawFrame) -> Result<(), EncoderError> {
        self.frames_seen += 1;
        trace!(kind = self.kind, pts = frame.pts, "frame submitted");
        Ok(())
    }

    fn allocated_bytes(&self) -> u64 {
        self.reserved
    }
}

impl Drop for SoftwareContext {
    fn drop(&mut self) {
        debug!(
            kind = self.kind,
            bytes = self.pool.capacity(),
            frames = self.frames_seen,
            "released encoder frame pool"
        );
    }
}
