//! Encoder session lifecycle: `Uninitialized -> Initialized -> Destroyed`.
//!
//! The session owns at most one encoder instance. `init` is the only place a
//! config is judged; a failed `init` leaves nothing allocated. `destroy` is
//! idempotent, and dropping the session releases a live instance.

use std::fmt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::backend::{EncoderBackend, EncoderContext, SoftwareBackend};
use super::interface::{CodecCapabilities, CodecInterface};
use super::types::{EncoderConfig, RawFrame, UsageProfile};
use crate::engine::error::EncoderError;

/// Deepest look-ahead queue an implementation accepts
pub const MAX_LAG_IN_FRAMES: u32 = 25;

/// Most worker threads an implementation accepts
pub const MAX_THREADS: u32 = 64;

/// Observable lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initialized,
    Destroyed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Uninitialized => write!(f, "uninitialized"),
            SessionState::Initialized => write!(f, "initialized"),
            SessionState::Destroyed => write!(f, "destroyed"),
        }
    }
}

/// What a call to `destroy` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Teardown {
    /// The instance existed and its resources were released
    Released,
    /// Nothing to release (never initialized, or already destroyed)
    NoOp,
}

struct EncoderInstance {
    interface: CodecInterface,
    config: EncoderConfig,
    context: Box<dyn EncoderContext>,
    frames_submitted: u64,
}

enum Lifecycle {
    Uninitialized,
    Initialized(EncoderInstance),
    Destroyed,
}

/// Sole owner of one encoder instance
pub struct EncoderSession {
    id: Uuid,
    backend: Box<dyn EncoderBackend>,
    lifecycle: Lifecycle,
}

impl Default for EncoderSession {
    fn default() -> Self {
        Self::new()
    }
}

impl EncoderSession {
    /// Session backed by the in-process software backend
    pub fn new() -> Self {
        Self::with_backend(SoftwareBackend::new())
    }

    pub fn with_backend(backend: impl EncoderBackend + 'static) -> Self {
        Self {
            id: Uuid::new_v4(),
            backend: Box::new(backend),
            lifecycle: Lifecycle::Uninitialized,
        }
    }

    pub fn state(&self) -> SessionState {
        match self.lifecycle {
            Lifecycle::Uninitialized => SessionState::Uninitialized,
            Lifecycle::Initialized(_) => SessionState::Initialized,
            Lifecycle::Destroyed => SessionState::Destroyed,
        }
    }

    pub fn interface(&self) -> Option<&CodecInterface> {
        match &self.lifecycle {
            Lifecycle::Initialized(instance) => Some(&instance.interface),
            _ => None,
        }
    }

    pub fn config(&self) -> Option<&EncoderConfig> {
        match &self.lifecycle {
            Lifecycle::Initialized(instance) => Some(&instance.config),
            _ => None,
        }
    }

    pub fn frames_submitted(&self) -> u64 {
        match &self.lifecycle {
            Lifecycle::Initialized(instance) => instance.frames_submitted,
            _ => 0,
        }
    }

    /// Bytes held by the live instance, 0 when there is none
    pub fn allocated_bytes(&self) -> u64 {
        match &self.lifecycle {
            Lifecycle::Initialized(instance) => instance.context.allocated_bytes(),
            _ => 0,
        }
    }

    /// Validate `config` and bring up an encoder instance for it.
    ///
    /// Only valid while uninitialized. On error the session stays
    /// uninitialized and holds no resources.
    pub fn init(
        &mut self,
        interface: &CodecInterface,
        config: EncoderConfig,
    ) -> Result<(), EncoderError> {
        let state = self.state();
        if state != SessionState::Uninitialized {
            warn!(session = %self.id, %state, "init called out of sequence");
            return Err(EncoderError::IllegalState {
                operation: "init",
                state,
            });
        }

        let caps = interface.capabilities()?;
        check_invariants(&config)?;
        check_combination(caps, &config)?;

        let context = self.backend.open(interface, &config)?;
        info!(
            session = %self.id,
            kind = interface.kind(),
            width = config.width,
            height = config.height,
            timebase = %config.timebase,
            bitrate_kbps = config.target_bitrate_kbps,
            usage = %config.usage,
            bytes = context.allocated_bytes(),
            "encoder initialized"
        );
        self.lifecycle = Lifecycle::Initialized(EncoderInstance {
            interface: *interface,
            config,
            context,
            frames_submitted: 0,
        });
        Ok(())
    }

    /// Hand a frame to the live instance. No bitstream is produced.
    pub fn encode(&mut self, frame: &RawFrame) -> Result<(), EncoderError> {
        let state = self.state();
        let Lifecycle::Initialized(instance) = &mut self.lifecycle else {
            return Err(EncoderError::IllegalState {
                operation: "encode",
                state,
            });
        };

        if frame.width != instance.config.width || frame.height != instance.config.height {
            return Err(EncoderError::invalid_param(
                "frame",
                format!(
                    "frame is {}x{} but the encoder was initialized for {}x{}",
                    frame.width, frame.height, instance.config.width, instance.config.height
                ),
            ));
        }

        instance.context.submit(frame)?;
        instance.frames_submitted += 1;
        Ok(())
    }

    /// Release the instance. Extra calls, or calls before `init`, do nothing.
    pub fn destroy(&mut self) -> Teardown {
        match self.lifecycle {
            Lifecycle::Initialized(_) => {
                // Dropping the instance drops its context, which releases it
                let released = std::mem::replace(&mut self.lifecycle, Lifecycle::Destroyed);
                drop(released);
                info!(session = %self.id, "encoder destroyed");
                Teardown::Released
            }
            Lifecycle::Uninitialized | Lifecycle::Destroyed => {
                debug!(session = %self.id, state = %self.state(), "destroy is a no-op");
                Teardown::NoOp
            }
        }
    }
}

impl Drop for EncoderSession {
    fn drop(&mut self) {
        if let Lifecycle::Initialized(_) = self.lifecycle {
            debug!(session = %self.id, "session dropped while initialized");
            self.destroy();
        }
    }
}

impl fmt::Debug for EncoderSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncoderSession")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("config", &self.config())
            .finish()
    }
}

fn check_invariants(config: &EncoderConfig) -> Result<(), EncoderError> {
    let positive = [
        ("width", config.width),
        ("height", config.height),
        ("timebase.num", config.timebase.num),
        ("timebase.den", config.timebase.den),
        ("target_bitrate_kbps", config.target_bitrate_kbps),
        ("threads", config.threads),
    ];
    for (field, value) in positive {
        if value == 0 {
            return Err(EncoderError::invalid_param(
                field,
                "must be greater than zero",
            ));
        }
    }
    Ok(())
}

fn check_combination(
    caps: &'static CodecCapabilities,
    config: &EncoderConfig,
) -> Result<(), EncoderError> {
    if config.width > caps.max_dimension || config.height > caps.max_dimension {
        return Err(EncoderError::unsupported(
            caps.kind,
            format!(
                "{}x{} exceeds the {} pixel dimension limit",
                config.width, config.height, caps.max_dimension
            ),
        ));
    }

    if config.target_bitrate_kbps > caps.max_bitrate_kbps {
        return Err(EncoderError::unsupported(
            caps.kind,
            format!(
                "bitrate {} kbps exceeds the {} kbps limit",
                config.target_bitrate_kbps, caps.max_bitrate_kbps
            ),
        ));
    }

    if !caps.supports_usage(config.usage) {
        return Err(EncoderError::UnsupportedUsage {
            kind: caps.kind,
            usage: config.usage,
        });
    }

    if config.lag_in_frames > MAX_LAG_IN_FRAMES {
        return Err(EncoderError::unsupported(
            caps.kind,
            format!(
                "lag_in_frames {} exceeds {}",
                config.lag_in_frames, MAX_LAG_IN_FRAMES
            ),
        ));
    }

    if config.threads > MAX_THREADS {
        return Err(EncoderError::unsupported(
            caps.kind,
            format!("{} threads exceeds {}", config.threads, MAX_THREADS),
        ));
    }

    if config.usage == UsageProfile::Realtime {
        if config.lag_in_frames > 0 {
            return Err(EncoderError::unsupported(
                caps.kind,
                "realtime usage cannot buffer look-ahead frames (lag_in_frames must be 0)",
            ));
        }

        // width * height * (den / num) compared without division
        let pixels_per_tick = u128::from(config.width) * u128::from(config.height);
        let rate_scaled = pixels_per_tick * u128::from(config.timebase.den);
        let ceiling_scaled =
            u128::from(caps.max_realtime_pixel_rate) * u128::from(config.timebase.num);
        if rate_scaled > ceiling_scaled {
            return Err(EncoderError::unsupported(
                caps.kind,
                format!(
                    "realtime pixel rate for {}x{} at {} exceeds {} pixels/s",
                    config.width, config.height, config.timebase, caps.max_realtime_pixel_rate
                ),
            ));
        }
    }

    Ok(())
}
