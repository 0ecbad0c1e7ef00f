//! Modem link
//!
//! Everything the ingestion core does with the WiFi modem: scanning the
//! response stream, routing inbound TCP bytes into the frame decoder, and
//! keeping the association and TCP connection alive.
//!
//! ```text
//! ByteLink ─▶ scan_response ─┬─ terminal line ─▶ caller
//!                            ├─ CLOSED / WIFI DISCONNECT ─▶ LinkHooks, then return
//!                            └─ +IPD bytes ─▶ FrameDecoder ─▶ LinkHooks::on_frame
//! ```

pub mod context;
pub mod scanner;
pub mod state;
pub mod supervisor;

pub use context::ConnectionContext;
pub use scanner::{scan_response, Scan, SCAN_CAPACITY};
pub use state::{Outcome, Phase};
pub use supervisor::{LinkEvents, LinkSupervisor};
