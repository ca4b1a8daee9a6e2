//! Request handler module
//!
//! Responsible for request routing dispatch: health checks, plain
//! pass-through to the upstream, and direct archive resolution.

pub mod router;

// Re-export main entry point
pub use router::handle_request;
