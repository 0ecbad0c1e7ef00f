//! Capability traits
//!
//! These traits define the seams between the modem link and the rest of
//! the firmware: where decoded frames go, and who reacts to link events
//! reported while a response is being scanned.

pub mod hooks;
pub mod sink;

pub use hooks::LinkHooks;
pub use sink::{ColorChannel, FrameSink, SinkError};
