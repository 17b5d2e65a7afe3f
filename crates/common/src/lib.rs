//! Cross-cutting service plumbing: logging setup and shutdown signaling.

pub mod logging;
pub mod shutdown;
