//! Error taxonomy for the encoder setup/teardown contract.
//!
//! `ErrorCode` is the closed set of outcomes callers branch on. `EncoderError`
//! carries the context for each code (which field, which codec, how many bytes)
//! and renders the message printed by the binary.
use std::fmt;
use thiserror::Error;

use super::core::{SessionState, UsageProfile};

/// Closed set of failure categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotSupported,
    InvalidParam,
    InvalidInterface,
    MemoryAllocationFailure,
    UnsupportedConfig,
    InternalError,
    IllegalState,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 7] = [
        ErrorCode::NotSupported,
        ErrorCode::InvalidParam,
        ErrorCode::InvalidInterface,
        ErrorCode::MemoryAllocationFailure,
        ErrorCode::UnsupportedConfig,
        ErrorCode::InternalError,
        ErrorCode::IllegalState,
    ];

    /// Tag name as it appears in diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            Self::NotSupported => "NotSupported",
            Self::InvalidParam => "InvalidParam",
            Self::InvalidInterface => "InvalidInterface",
            Self::MemoryAllocationFailure => "MemoryAllocationFailure",
            Self::UnsupportedConfig => "UnsupportedConfig",
            Self::InternalError => "InternalError",
            Self::IllegalState => "IllegalState",
        }
    }

    /// Process exit status used by the binary (never 0)
    pub fn exit_status(&self) -> i32 {
        match self {
            Self::InternalError => 1,
            Self::NotSupported => 3,
            Self::InvalidInterface => 4,
            Self::InvalidParam => 5,
            Self::UnsupportedConfig => 6,
            Self::MemoryAllocationFailure => 7,
            Self::IllegalState => 8,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned by every fallible engine operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncoderError {
    #[error("codec '{kind}' is not supported: {reason}")]
    NotSupported { kind: String, reason: &'static str },

    #[error("invalid parameter '{field}': {reason}")]
    InvalidParam { field: &'static str, reason: String },

    #[error("interface '{kind}' (abi {abi_version}) was not produced by the codec table")]
    InvalidInterface { kind: String, abi_version: u32 },

    /// `requested` is `None` when the size itself could not be computed
    #[error("could not allocate {} for encoder buffers ({detail})", byte_count(.requested))]
    MemoryAllocation {
        requested: Option<u64>,
        detail: String,
    },

    #[error("'{kind}' rejects the configuration: {reason}")]
    UnsupportedConfig { kind: &'static str, reason: String },

    #[error("'{kind}' does not support usage profile '{usage}'")]
    UnsupportedUsage {
        kind: &'static str,
        usage: UsageProfile,
    },

    #[error("internal encoder error: {0}")]
    Internal(String),

    #[error("cannot {operation} a session that is {state}")]
    IllegalState {
        operation: &'static str,
        state: SessionState,
    },
}

fn byte_count(requested: &Option<u64>) -> String {
    match requested {
        Some(bytes) => format!("{} bytes", bytes),
        None => "an unrepresentable number of bytes".to_string(),
    }
}

impl EncoderError {
    /// Collapse the error onto its closed category
    pub fn code(&self) -> ErrorCode {
        match self {
            EncoderError::NotSupported { .. } => ErrorCode::NotSupported,
            EncoderError::InvalidParam { .. } => ErrorCode::InvalidParam,
            EncoderError::InvalidInterface { .. } => ErrorCode::InvalidInterface,
            EncoderError::MemoryAllocation { .. } => ErrorCode::MemoryAllocationFailure,
            EncoderError::UnsupportedConfig { .. } | EncoderError::UnsupportedUsage { .. } => {
                ErrorCode::UnsupportedConfig
            }
            EncoderError::Internal(_) => ErrorCode::InternalError,
            EncoderError::IllegalState { .. } => ErrorCode::IllegalState,
        }
    }

    pub(crate) fn invalid_param(field: &'static str, reason: impl Into<String>) -> Self {
        EncoderError::InvalidParam {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported(kind: &'static str, reason: impl Into<String>) -> Self {
        EncoderError::UnsupportedConfig {
            kind,
            reason: reason.into(),
        }
    }
}
