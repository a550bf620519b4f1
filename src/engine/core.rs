mod backend;
mod interface;
mod resolver;
mod session;
mod types;

pub use backend::{
    EncoderBackend, EncoderContext, SoftwareBackend, frame_pool_bytes, i420_frame_bytes,
};
pub use interface::{
    Availability, CodecCapabilities, CodecFamily, CodecInterface, available_interfaces,
    capability_table, resolve,
};
pub use resolver::{apply_overrides, get_default};
pub use session::{EncoderSession, MAX_LAG_IN_FRAMES, MAX_THREADS, SessionState, Teardown};
pub use types::{ConfigOverrides, EncoderConfig, Rational, RawFrame, UsageProfile};
