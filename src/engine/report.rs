//! Human-readable diagnostics for engine failures.

use std::fmt;

use super::error::{EncoderError, ErrorCode};

/// Step of the lifecycle run a failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolve,
    Configure,
    Init,
    Encode,
    Destroy,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Resolve => write!(f, "codec resolution"),
            Stage::Configure => write!(f, "default config"),
            Stage::Init => write!(f, "encoder initialization"),
            Stage::Encode => write!(f, "encode"),
            Stage::Destroy => write!(f, "encoder teardown"),
        }
    }
}

/// Short explanation of an error code
pub fn describe(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::NotSupported => "no fully available implementation for the requested codec",
        ErrorCode::InvalidParam => "a configuration value violates its invariant",
        ErrorCode::InvalidInterface => "the interface handle was not produced by codec resolution",
        ErrorCode::MemoryAllocationFailure => {
            "memory allocation failure while acquiring encoder resources"
        }
        ErrorCode::UnsupportedConfig => "the implementation rejects this combination of settings",
        ErrorCode::InternalError => "the implementation reported an internal error",
        ErrorCode::IllegalState => "operation called in the wrong lifecycle state",
    }
}

/// Lines to print on stderr for one failure.
///
/// Always one line naming the code; allocation failures get a second line
/// so callers can tell them apart from internal errors at a glance.
pub fn diagnostics(stage: Stage, err: &EncoderError) -> Vec<String> {
    let code = err.code();
    let mut lines = vec![format!(
        "error: {} failed: {} ({}: {})",
        stage,
        err,
        code.name(),
        describe(code)
    )];
    if code == ErrorCode::MemoryAllocationFailure {
        lines.push(format!(
            "error: {} indicates a memory allocation failure; free memory or reduce the \
             resolution, look-ahead or memory limit and retry",
            code.name()
        ));
    }
    lines
}
