//! Per-core main loops
//!
//! Neither loop returns: core 1 runs [`ingest`], core 0 runs [`scanout`].

pub mod ingest;
pub mod scanout;
