// Encoder setup engine - independent of the CLI

pub mod core;
pub mod error;
pub mod report;

pub use self::core::*;
pub use error::{EncoderError, ErrorCode};
